use super::{Indicator, IndicatorInput};
use crate::models::{IndicatorKind, IndicatorResult, IndicatorSignal};

/// Price position against the session VWAP
///
/// VWAP comes from the session-to-date cumulative value and volume carried
/// on the latest tick, not from the candles. It is unavailable only while
/// the session has no traded volume.
#[derive(Debug, Clone, Copy, Default)]
pub struct VwapIndicator;

impl Indicator for VwapIndicator {
    fn kind(&self) -> IndicatorKind {
        IndicatorKind::Vwap
    }

    fn min_closed_candles(&self) -> usize {
        0
    }

    fn compute(&self, input: &IndicatorInput) -> IndicatorResult {
        let snapshot = input.snapshot;

        let vwap = match snapshot.vwap {
            Some(vwap) if vwap.is_finite() && vwap > 0.0 => vwap,
            _ => return IndicatorResult::unavailable(self.kind(), "no traded volume yet"),
        };

        let signal = if snapshot.ltp > vwap {
            IndicatorSignal::PriceAboveVwap
        } else if snapshot.ltp < vwap {
            IndicatorSignal::PriceBelowVwap
        } else {
            IndicatorSignal::PriceAtVwap
        };

        IndicatorResult::classified(self.kind(), signal)
            .with_value("vwap", vwap)
            .with_value("ltp", snapshot.ltp)
            .with_value("deviation_pct", (snapshot.ltp - vwap) / vwap * 100.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::test_support::snapshot;
    use crate::session::CandleSeries;

    fn run(ltp: f64, vwap: Option<f64>) -> IndicatorResult {
        let series = CandleSeries::default();
        let snap = snapshot(ltp, vwap);
        VwapIndicator.compute(&IndicatorInput {
            candles: &series,
            snapshot: &snap,
        })
    }

    #[test]
    fn test_price_above_vwap_is_bullish() {
        let result = run(102.0, Some(100.0));
        assert!(result.bullish);
        assert_eq!(result.signal, IndicatorSignal::PriceAboveVwap);
        assert!((result.value("deviation_pct").unwrap() - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_price_below_or_at_vwap_is_not_bullish() {
        assert_eq!(run(98.0, Some(100.0)).signal, IndicatorSignal::PriceBelowVwap);
        let at = run(100.0, Some(100.0));
        assert!(at.available);
        assert!(!at.bullish);
        assert_eq!(at.signal, IndicatorSignal::PriceAtVwap);
    }

    #[test]
    fn test_zero_volume_is_unavailable() {
        let result = run(100.0, None);
        assert!(!result.available);
        assert_eq!(result.reason.as_deref(), Some("no traded volume yet"));
    }
}
