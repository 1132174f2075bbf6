use super::{Indicator, IndicatorInput};
use crate::models::{IndicatorKind, IndicatorResult, IndicatorSignal};

/// Calculate Relative Strength Index (RSI) with Wilder smoothing
///
/// The first average gain/loss is the simple mean of the first `period`
/// changes; every later change is folded in as
/// `avg = (avg * (period - 1) + change) / period`.
///
/// Degenerate averages resolve to fixed values instead of NaN:
/// - no losses, some gains: 100
/// - no gains, no losses (flat): 50
///
pub fn calculate_rsi(prices: &[f64], period: usize) -> Option<f64> {
    if period == 0 || prices.len() < period + 1 {
        return None;
    }

    let changes: Vec<f64> = prices.windows(2).map(|w| w[1] - w[0]).collect();
    let (seed, rest) = changes.split_at(period);
    let period_f = period as f64;

    let mut avg_gain = seed.iter().map(|c| c.max(0.0)).sum::<f64>() / period_f;
    let mut avg_loss = seed.iter().map(|c| (-c).max(0.0)).sum::<f64>() / period_f;

    for change in rest {
        avg_gain = (avg_gain * (period_f - 1.0) + change.max(0.0)) / period_f;
        avg_loss = (avg_loss * (period_f - 1.0) + (-change).max(0.0)) / period_f;
    }

    if avg_loss == 0.0 {
        return Some(if avg_gain > 0.0 { 100.0 } else { 50.0 });
    }

    let rs = avg_gain / avg_loss;
    Some(100.0 - (100.0 / (1.0 + rs)))
}

/// RSI momentum check on closed-candle closes
///
/// Only the "optimal momentum zone" counts as bullish; overbought readings
/// are flagged, not rewarded.
#[derive(Debug, Clone)]
pub struct RsiIndicator {
    pub period: usize,
    pub zone_low: f64,
    pub zone_high: f64,
    pub oversold: f64,
}

impl Default for RsiIndicator {
    fn default() -> Self {
        Self {
            period: 14,
            zone_low: 55.0,
            zone_high: 70.0,
            oversold: 30.0,
        }
    }
}

impl RsiIndicator {
    pub fn classify(&self, rsi: f64) -> IndicatorSignal {
        if rsi >= self.zone_low && rsi <= self.zone_high {
            IndicatorSignal::RsiBullishZone
        } else if rsi > self.zone_high {
            IndicatorSignal::RsiOverbought
        } else if rsi < self.oversold {
            IndicatorSignal::RsiOversold
        } else {
            IndicatorSignal::RsiWeak
        }
    }
}

impl Indicator for RsiIndicator {
    fn kind(&self) -> IndicatorKind {
        IndicatorKind::Rsi
    }

    fn min_closed_candles(&self) -> usize {
        self.period + 1
    }

    fn compute(&self, input: &IndicatorInput) -> IndicatorResult {
        let closes = input.candles.closes();

        match calculate_rsi(&closes, self.period) {
            Some(rsi) if rsi.is_finite() => {
                IndicatorResult::classified(self.kind(), self.classify(rsi)).with_value("rsi", rsi)
            }
            Some(_) => IndicatorResult::unavailable(self.kind(), "RSI is not finite (bad prices)"),
            None => IndicatorResult::unavailable(
                self.kind(),
                format!("need {} closed candles, have {}", self.period + 1, closes.len()),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::test_support::{candles_from_closes, snapshot};
    use crate::session::CandleSeries;

    #[test]
    fn test_rsi_calculation() {
        // Classic Wilder example data
        let prices = vec![
            44.34, 44.09, 44.15, 43.61, 44.33, 44.83, 45.10, 45.42, 45.84, 46.08, 45.89, 46.03,
            45.61, 46.28, 46.28, 46.00, 46.03, 46.41, 46.22, 45.64,
        ];

        let rsi = calculate_rsi(&prices, 14).unwrap();
        assert!(rsi > 0.0 && rsi < 100.0);
        // First RSI value of the classic table is ~70.5
        let first = calculate_rsi(&prices[..15], 14).unwrap();
        assert!((first - 70.46).abs() < 0.1, "got {}", first);
    }

    #[test]
    fn test_rsi_insufficient_data() {
        let prices = vec![100.0, 102.0, 101.0];
        assert!(calculate_rsi(&prices, 14).is_none());
        assert!(calculate_rsi(&prices, 0).is_none());
    }

    #[test]
    fn test_rsi_all_gains() {
        let prices: Vec<f64> = (0..20).map(|i| 100.0 + i as f64).collect();
        assert_eq!(calculate_rsi(&prices, 14), Some(100.0));
    }

    #[test]
    fn test_rsi_all_losses() {
        let prices: Vec<f64> = (0..20).map(|i| 100.0 - i as f64).collect();
        assert_eq!(calculate_rsi(&prices, 14), Some(0.0));
    }

    #[test]
    fn test_rsi_flat_market_is_neutral() {
        let prices = vec![100.0; 20];
        assert_eq!(calculate_rsi(&prices, 14), Some(50.0));
    }

    #[test]
    fn test_classification_zones() {
        let rsi = RsiIndicator::default();
        assert_eq!(rsi.classify(55.0), IndicatorSignal::RsiBullishZone);
        assert_eq!(rsi.classify(70.0), IndicatorSignal::RsiBullishZone);
        assert_eq!(rsi.classify(70.1), IndicatorSignal::RsiOverbought);
        assert_eq!(rsi.classify(54.9), IndicatorSignal::RsiWeak);
        assert_eq!(rsi.classify(25.0), IndicatorSignal::RsiOversold);
    }

    #[test]
    fn test_overbought_is_not_bullish() {
        let series = CandleSeries {
            closed: candles_from_closes(&(0..20).map(|i| 100.0 + i as f64).collect::<Vec<_>>()),
            open: None,
        };
        let snap = snapshot(119.0, Some(110.0));
        let input = IndicatorInput {
            candles: &series,
            snapshot: &snap,
        };

        let result = RsiIndicator::default().compute(&input);
        assert!(result.available);
        assert!(!result.bullish);
        assert_eq!(result.signal, IndicatorSignal::RsiOverbought);
        assert_eq!(result.value("rsi"), Some(100.0));
    }
}
