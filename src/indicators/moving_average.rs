use super::{Indicator, IndicatorInput};
use crate::models::{IndicatorKind, IndicatorResult, IndicatorSignal};

/// Calculate Simple Moving Average (SMA) of the last `period` prices
pub fn calculate_sma(prices: &[f64], period: usize) -> Option<f64> {
    if period == 0 || prices.len() < period {
        return None;
    }

    let sum: f64 = prices.iter().rev().take(period).sum();
    Some(sum / period as f64)
}

/// Calculate Exponential Moving Average (EMA)
///
/// Seeded with the SMA of the first `period` prices, then
/// `ema = price * k + ema * (1 - k)` with `k = 2 / (period + 1)`.
pub fn calculate_ema(prices: &[f64], period: usize) -> Option<f64> {
    if period == 0 || prices.len() < period {
        return None;
    }

    let multiplier = 2.0 / (period as f64 + 1.0);

    // Start with SMA
    let initial_sma = calculate_sma(&prices[0..period], period)?;

    let mut ema = initial_sma;
    for price in &prices[period..] {
        ema = (price - ema) * multiplier + ema;
    }

    Some(ema)
}

/// Fast/slow EMA crossover on closed-candle closes
///
/// Never computed on a short-seeded EMA: the slow span must be fully
/// covered by closed candles.
#[derive(Debug, Clone)]
pub struct EmaCrossoverIndicator {
    pub fast_span: usize,
    pub slow_span: usize,
}

impl Default for EmaCrossoverIndicator {
    fn default() -> Self {
        Self {
            fast_span: 20,
            slow_span: 50,
        }
    }
}

impl Indicator for EmaCrossoverIndicator {
    fn kind(&self) -> IndicatorKind {
        IndicatorKind::EmaCrossover
    }

    fn min_closed_candles(&self) -> usize {
        self.slow_span.max(self.fast_span)
    }

    fn compute(&self, input: &IndicatorInput) -> IndicatorResult {
        let closes = input.candles.closes();

        let (fast, slow) = match (
            calculate_ema(&closes, self.fast_span),
            calculate_ema(&closes, self.slow_span),
        ) {
            (Some(fast), Some(slow)) => (fast, slow),
            _ => {
                return IndicatorResult::unavailable(
                    self.kind(),
                    format!(
                        "need {} closed candles, have {}",
                        self.min_closed_candles(),
                        closes.len()
                    ),
                )
            }
        };

        if !fast.is_finite() || !slow.is_finite() {
            return IndicatorResult::unavailable(self.kind(), "EMA is not finite (bad prices)");
        }

        let signal = if fast > slow {
            IndicatorSignal::Ema20AboveEma50
        } else {
            IndicatorSignal::Ema20BelowEma50
        };

        IndicatorResult::classified(self.kind(), signal)
            .with_value("ema_fast", fast)
            .with_value("ema_slow", slow)
    }
}
