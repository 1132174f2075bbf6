//! Market structure and volume analysis
//!
//! Price structure of the last two closed candles (higher high / higher low)
//! and participation of the latest candle against the session average.

use super::{Indicator, IndicatorInput};
use crate::models::{Candle, IndicatorKind, IndicatorResult, IndicatorSignal};

/// Average volume and value over a set of candles
///
/// Returns `(avg_volume, avg_value)`, or None for an empty slice.
pub fn calculate_average_volume(candles: &[Candle]) -> Option<(f64, f64)> {
    if candles.is_empty() {
        return None;
    }

    let n = candles.len() as f64;
    let total_volume: f64 = candles.iter().map(|c| c.volume).sum();
    let total_value: f64 = candles.iter().map(|c| c.value).sum();
    Some((total_volume / n, total_value / n))
}

/// Higher-high / higher-low check between the two latest closed candles
#[derive(Debug, Clone, Copy, Default)]
pub struct MarketStructureIndicator;

impl MarketStructureIndicator {
    pub fn classify(previous: &Candle, current: &Candle) -> IndicatorSignal {
        let higher_high = current.high > previous.high;
        let higher_low = current.low > previous.low;

        match (higher_high, higher_low) {
            (true, true) => IndicatorSignal::BullishHhHl,
            (true, false) => IndicatorSignal::HhNoHl,
            (false, true) => IndicatorSignal::HlNoHh,
            (false, false) => IndicatorSignal::NoHhHl,
        }
    }
}

impl Indicator for MarketStructureIndicator {
    fn kind(&self) -> IndicatorKind {
        IndicatorKind::MarketStructure
    }

    fn min_closed_candles(&self) -> usize {
        2
    }

    fn compute(&self, input: &IndicatorInput) -> IndicatorResult {
        let closed = &input.candles.closed;
        let [previous, current] = match closed.len() {
            n if n >= 2 => [&closed[n - 2], &closed[n - 1]],
            n => {
                return IndicatorResult::unavailable(
                    self.kind(),
                    format!("need 2 closed candles, have {}", n),
                )
            }
        };

        IndicatorResult::classified(self.kind(), Self::classify(previous, current))
            .with_value("prev_high", previous.high)
            .with_value("prev_low", previous.low)
            .with_value("curr_high", current.high)
            .with_value("curr_low", current.low)
    }
}

/// Participation of the latest closed candle vs the session average
///
/// Available from the first tick. Before any candle has closed there is
/// nothing to compare against and the result is neutral.
#[derive(Debug, Clone, Copy, Default)]
pub struct VolumeValueIndicator;

impl VolumeValueIndicator {
    fn classify(closed: &[Candle], latest: &Candle, avg_volume: f64, avg_value: f64) -> IndicatorSignal {
        let price_up = match closed.len() {
            n if n >= 2 => latest.close > closed[n - 2].close,
            _ => latest.close > latest.open,
        };

        if latest.volume > avg_volume && latest.value > avg_value {
            IndicatorSignal::HighVolumeHighValue
        } else if latest.volume > avg_volume && latest.value < avg_value {
            // Heavy turnover in cheap prints
            IndicatorSignal::HighVolumeLowValue
        } else if latest.volume < avg_volume && price_up {
            // Move without participation, unlikely to sustain
            IndicatorSignal::LowVolumePriceUp
        } else {
            IndicatorSignal::Neutral
        }
    }
}

impl Indicator for VolumeValueIndicator {
    fn kind(&self) -> IndicatorKind {
        IndicatorKind::VolumeValue
    }

    fn min_closed_candles(&self) -> usize {
        0
    }

    fn compute(&self, input: &IndicatorInput) -> IndicatorResult {
        let closed = &input.candles.closed;

        let (latest, (avg_volume, avg_value)) =
            match (closed.last(), calculate_average_volume(closed)) {
                (Some(latest), Some(averages)) => (latest, averages),
                _ => {
                    let mut result = IndicatorResult::classified(
                        self.kind(),
                        IndicatorSignal::InsufficientComparison,
                    );
                    if let Some(open) = &input.candles.open {
                        result = result
                            .with_value("volume", open.volume)
                            .with_value("value", open.value)
                            .with_value("avg_volume", open.volume)
                            .with_value("avg_value", open.value);
                    }
                    return result;
                }
            };

        IndicatorResult::classified(
            self.kind(),
            Self::classify(closed, latest, avg_volume, avg_value),
        )
        .with_value("volume", latest.volume)
        .with_value("value", latest.value)
        .with_value("avg_volume", avg_volume)
        .with_value("avg_value", avg_value)
    }
}
