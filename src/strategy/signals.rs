use crate::error::AnalysisError;
use crate::indicators::{
    EmaCrossoverIndicator, Indicator, MarketStructureIndicator, RsiIndicator, VolumeValueIndicator,
    VwapIndicator,
};
use crate::models::{IndicatorResult, ScoreResult, VerdictTier};
use crate::Result;
use serde::{Deserialize, Serialize};

/// Configuration for signal generation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SignalConfig {
    pub rsi_period: usize,
    pub rsi_zone_low: f64,  // Bullish momentum zone, inclusive
    pub rsi_zone_high: f64,
    pub rsi_oversold: f64,
    pub ema_fast_span: usize,
    pub ema_slow_span: usize,
    pub target_1_pct: f64, // Profit targets above entry
    pub target_2_pct: f64,
}

impl Default for SignalConfig {
    fn default() -> Self {
        Self {
            rsi_period: 14,
            rsi_zone_low: 55.0,
            rsi_zone_high: 70.0,
            rsi_oversold: 30.0,
            ema_fast_span: 20,
            ema_slow_span: 50,
            target_1_pct: 1.0,
            target_2_pct: 1.5,
        }
    }
}

impl SignalConfig {
    pub fn validate(&self) -> Result<()> {
        if self.rsi_period == 0 {
            return Err(AnalysisError::InvalidInput("rsi_period must be > 0".into()));
        }
        if self.rsi_zone_low > self.rsi_zone_high {
            return Err(AnalysisError::InvalidInput(format!(
                "rsi zone {}..{} is inverted",
                self.rsi_zone_low, self.rsi_zone_high
            )));
        }
        if self.ema_fast_span == 0 || self.ema_fast_span >= self.ema_slow_span {
            return Err(AnalysisError::InvalidInput(format!(
                "ema spans must satisfy 0 < fast ({}) < slow ({})",
                self.ema_fast_span, self.ema_slow_span
            )));
        }
        if self.target_1_pct <= 0.0 || self.target_2_pct < self.target_1_pct {
            return Err(AnalysisError::InvalidInput(format!(
                "targets must satisfy 0 < target_1 ({}) <= target_2 ({})",
                self.target_1_pct, self.target_2_pct
            )));
        }
        Ok(())
    }

    /// The five scored indicators, in report order
    pub fn build_indicators(&self) -> Vec<Box<dyn Indicator>> {
        vec![
            Box::new(VolumeValueIndicator),
            Box::new(VwapIndicator),
            Box::new(MarketStructureIndicator),
            Box::new(EmaCrossoverIndicator {
                fast_span: self.ema_fast_span,
                slow_span: self.ema_slow_span,
            }),
            Box::new(RsiIndicator {
                period: self.rsi_period,
                zone_low: self.rsi_zone_low,
                zone_high: self.rsi_zone_high,
                oversold: self.rsi_oversold,
            }),
        ]
    }
}

/// Lower bound of each verdict tier, highest first
const VERDICT_TABLE: [(f64, VerdictTier); 4] = [
    (80.0, VerdictTier::StrongBullish),
    (60.0, VerdictTier::CautiousBullish),
    (40.0, VerdictTier::NeutralWait),
    (f64::NEG_INFINITY, VerdictTier::Avoid),
];

/// Map a bullish percentage to its verdict tier
pub fn verdict_for(percentage: f64) -> VerdictTier {
    VERDICT_TABLE
        .iter()
        .find(|(floor, _)| percentage >= *floor)
        .map(|(_, tier)| *tier)
        .unwrap_or(VerdictTier::Avoid)
}

/// Score the indicators that are available
///
/// The percentage is taken over the available count, so an early session
/// with two indicators is graded on the same scale as a full one.
pub fn score_indicators(results: &[IndicatorResult]) -> Result<ScoreResult> {
    let available_count = results.iter().filter(|r| r.available).count();
    let bullish_count = results.iter().filter(|r| r.available && r.bullish).count();

    if available_count == 0 {
        return Err(AnalysisError::ScoringImpossible);
    }

    let percentage = (bullish_count as f64 * 100.0) / available_count as f64;

    Ok(ScoreResult {
        available_count,
        bullish_count,
        percentage,
        verdict: verdict_for(percentage),
    })
}
