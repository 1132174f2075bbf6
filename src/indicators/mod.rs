// Technical indicators module
// Volume & value, VWAP, market structure, EMA crossover and RSI over session candles

pub mod market_analysis;
pub mod moving_average;
pub mod rsi;
pub mod vwap;

pub use market_analysis::{calculate_average_volume, MarketStructureIndicator, VolumeValueIndicator};
pub use moving_average::{calculate_ema, calculate_sma, EmaCrossoverIndicator};
pub use rsi::{calculate_rsi, RsiIndicator};
pub use vwap::VwapIndicator;

use crate::models::{IndicatorKind, IndicatorResult, Snapshot};
use crate::session::{CandleSeries, CANDLE_INTERVAL_MINUTES};

/// Everything an indicator may look at for one analysis call
#[derive(Debug, Clone, Copy)]
pub struct IndicatorInput<'a> {
    pub candles: &'a CandleSeries,
    pub snapshot: &'a Snapshot,
}

/// Common interface of the scored indicators
pub trait Indicator: Send + Sync {
    fn kind(&self) -> IndicatorKind;

    /// Closed candles needed before the indicator is meaningful
    fn min_closed_candles(&self) -> usize;

    /// Session minutes needed to close `min_closed_candles` buckets
    fn minimum_minutes_required(&self) -> i64 {
        self.min_closed_candles() as i64 * CANDLE_INTERVAL_MINUTES
    }

    /// Classify the input. Called only once the candle requirement is met,
    /// but must still degrade to an unavailable result rather than panic.
    fn compute(&self, input: &IndicatorInput) -> IndicatorResult;
}

/// Run an indicator behind its availability gate
///
/// The closed-candle count decides; elapsed minutes only feed the reason.
pub fn evaluate(
    indicator: &dyn Indicator,
    input: &IndicatorInput,
    elapsed_minutes: i64,
) -> IndicatorResult {
    let have = input.candles.closed_count();
    let need = indicator.min_closed_candles();

    if have < need {
        let need_minutes = indicator.minimum_minutes_required();
        let reason = if elapsed_minutes < need_minutes {
            format!("need {}+ min, have {} min", need_minutes, elapsed_minutes)
        } else {
            format!("need {} closed candles, have {} (gaps in trading)", need, have)
        };
        tracing::debug!("{} skipped: {}", indicator.kind().display_name(), reason);
        return IndicatorResult::unavailable(indicator.kind(), reason);
    }

    let result = indicator.compute(input);
    tracing::debug!(
        "{}: {} (available={}, bullish={})",
        indicator.kind().display_name(),
        result.signal,
        result.available,
        result.bullish
    );
    result
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::models::{Candle, Snapshot};
    use chrono::{DateTime, Duration, TimeZone, Utc};

    pub fn session_open() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 5, 3, 45, 0).unwrap()
    }

    /// Candles from (high, low, close, volume) with open = previous close
    pub fn candles(rows: &[(f64, f64, f64, f64)]) -> Vec<Candle> {
        let mut prev_close = rows.first().map(|r| r.2).unwrap_or(0.0);
        rows.iter()
            .enumerate()
            .map(|(i, &(high, low, close, volume))| {
                let start = session_open() + Duration::minutes(5 * i as i64);
                let candle = Candle {
                    bucket_start: start,
                    bucket_end: start + Duration::minutes(5),
                    open: prev_close,
                    high,
                    low,
                    close,
                    volume,
                    value: close * volume,
                };
                prev_close = close;
                candle
            })
            .collect()
    }

    pub fn candles_from_closes(closes: &[f64]) -> Vec<Candle> {
        let rows: Vec<(f64, f64, f64, f64)> =
            closes.iter().map(|&c| (c + 0.5, c - 0.5, c, 1000.0)).collect();
        candles(&rows)
    }

    pub fn snapshot(ltp: f64, vwap: Option<f64>) -> Snapshot {
        Snapshot {
            timestamp: session_open(),
            ltp,
            vwap,
            day_high: ltp,
            day_low: ltp,
            volume: 1000.0,
            value: ltp * 1000.0,
        }
    }
}
