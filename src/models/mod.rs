use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A single trade print for an instrument
///
/// Cumulative fields are session-to-date totals as reported by the exchange
/// at the time of the tick.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Tick {
    pub timestamp: DateTime<Utc>,
    pub price: f64,
    pub volume: f64,
    pub cumulative_value: f64,
    pub cumulative_volume: f64,
}

impl Tick {
    /// Traded value contributed by this tick alone
    pub fn traded_value(&self) -> f64 {
        self.price * self.volume
    }
}

/// Build ticks with running session totals from raw `(time, price, qty)` prints
pub fn accumulate_trades<I>(trades: I) -> Vec<Tick>
where
    I: IntoIterator<Item = (DateTime<Utc>, f64, f64)>,
{
    let mut cumulative_value = 0.0;
    let mut cumulative_volume = 0.0;

    trades
        .into_iter()
        .map(|(timestamp, price, volume)| {
            cumulative_value += price * volume;
            cumulative_volume += volume;
            Tick {
                timestamp,
                price,
                volume,
                cumulative_value,
                cumulative_volume,
            }
        })
        .collect()
}

/// OHLCV candlestick for one bucket of the session
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Candle {
    pub bucket_start: DateTime<Utc>,
    pub bucket_end: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
    /// Sum of `price * volume` over the bucket's ticks, not the change in
    /// `Tick::cumulative_value` across the bucket
    pub value: f64,
}

/// The five indicators scored by the engine
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum IndicatorKind {
    VolumeValue,
    Vwap,
    MarketStructure,
    EmaCrossover,
    Rsi,
}

impl IndicatorKind {
    pub fn display_name(&self) -> &'static str {
        match self {
            IndicatorKind::VolumeValue => "Volume & Value",
            IndicatorKind::Vwap => "VWAP",
            IndicatorKind::MarketStructure => "Market Structure",
            IndicatorKind::EmaCrossover => "EMA Crossover",
            IndicatorKind::Rsi => "RSI",
        }
    }
}

/// Classification label produced by an indicator
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IndicatorSignal {
    // Volume & value
    HighVolumeHighValue,
    HighVolumeLowValue,
    LowVolumePriceUp,
    Neutral,
    InsufficientComparison,
    // VWAP
    PriceAboveVwap,
    PriceBelowVwap,
    PriceAtVwap,
    // Market structure
    BullishHhHl,
    HhNoHl,
    HlNoHh,
    NoHhHl,
    // EMA crossover
    Ema20AboveEma50,
    Ema20BelowEma50,
    // RSI
    RsiBullishZone,
    RsiOverbought,
    RsiOversold,
    RsiWeak,
    /// Indicator could not be computed for this call
    InsufficientData,
}

impl IndicatorSignal {
    /// Whether this label counts towards the bullish score
    pub fn is_bullish(&self) -> bool {
        matches!(
            self,
            IndicatorSignal::HighVolumeHighValue
                | IndicatorSignal::PriceAboveVwap
                | IndicatorSignal::BullishHhHl
                | IndicatorSignal::Ema20AboveEma50
                | IndicatorSignal::RsiBullishZone
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            IndicatorSignal::HighVolumeHighValue => "HIGH_VOLUME_HIGH_VALUE",
            IndicatorSignal::HighVolumeLowValue => "HIGH_VOLUME_LOW_VALUE",
            IndicatorSignal::LowVolumePriceUp => "LOW_VOLUME_PRICE_UP",
            IndicatorSignal::Neutral => "NEUTRAL",
            IndicatorSignal::InsufficientComparison => "INSUFFICIENT_COMPARISON",
            IndicatorSignal::PriceAboveVwap => "PRICE_ABOVE_VWAP",
            IndicatorSignal::PriceBelowVwap => "PRICE_BELOW_VWAP",
            IndicatorSignal::PriceAtVwap => "PRICE_AT_VWAP",
            IndicatorSignal::BullishHhHl => "BULLISH_HH_HL",
            IndicatorSignal::HhNoHl => "HH_NO_HL",
            IndicatorSignal::HlNoHh => "HL_NO_HH",
            IndicatorSignal::NoHhHl => "NO_HH_HL",
            IndicatorSignal::Ema20AboveEma50 => "EMA20_ABOVE_EMA50",
            IndicatorSignal::Ema20BelowEma50 => "EMA20_BELOW_EMA50",
            IndicatorSignal::RsiBullishZone => "RSI_BULLISH_ZONE",
            IndicatorSignal::RsiOverbought => "RSI_OVERBOUGHT",
            IndicatorSignal::RsiOversold => "RSI_OVERSOLD",
            IndicatorSignal::RsiWeak => "RSI_WEAK",
            IndicatorSignal::InsufficientData => "INSUFFICIENT_DATA",
        }
    }
}

impl fmt::Display for IndicatorSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of one indicator for one analysis call
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IndicatorResult {
    pub kind: IndicatorKind,
    pub available: bool,
    pub bullish: bool,
    pub signal: IndicatorSignal,
    /// Why the indicator was skipped (only set when unavailable)
    pub reason: Option<String>,
    pub values: Vec<(String, f64)>,
}

impl IndicatorResult {
    /// Available result; bullishness follows the label
    pub fn classified(kind: IndicatorKind, signal: IndicatorSignal) -> Self {
        Self {
            kind,
            available: true,
            bullish: signal.is_bullish(),
            signal,
            reason: None,
            values: Vec::new(),
        }
    }

    pub fn unavailable(kind: IndicatorKind, reason: impl Into<String>) -> Self {
        Self {
            kind,
            available: false,
            bullish: false,
            signal: IndicatorSignal::InsufficientData,
            reason: Some(reason.into()),
            values: Vec::new(),
        }
    }

    pub fn with_value(mut self, name: &str, value: f64) -> Self {
        self.values.push((name.to_string(), value));
        self
    }

    /// Look up a supporting value by name
    pub fn value(&self, name: &str) -> Option<f64> {
        self.values
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, v)| *v)
    }

    pub fn name(&self) -> &'static str {
        self.kind.display_name()
    }
}

/// Overall trend verdict
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VerdictTier {
    StrongBullish,
    CautiousBullish,
    NeutralWait,
    Avoid,
}

impl VerdictTier {
    /// Tiers that produce a trade setup
    pub fn is_actionable(&self) -> bool {
        matches!(self, VerdictTier::StrongBullish | VerdictTier::CautiousBullish)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            VerdictTier::StrongBullish => "STRONG_BULLISH",
            VerdictTier::CautiousBullish => "CAUTIOUS_BULLISH",
            VerdictTier::NeutralWait => "NEUTRAL_WAIT",
            VerdictTier::Avoid => "AVOID",
        }
    }

    /// Short trading action shown next to the verdict
    pub fn action(&self) -> &'static str {
        match self {
            VerdictTier::StrongBullish => "BUY NOW",
            VerdictTier::CautiousBullish => "CAUTIOUS BUY",
            VerdictTier::NeutralWait => "WAIT",
            VerdictTier::Avoid => "AVOID",
        }
    }
}

impl fmt::Display for VerdictTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Bullish score normalised over the available indicators
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScoreResult {
    pub available_count: usize,
    pub bullish_count: usize,
    pub percentage: f64,
    pub verdict: VerdictTier,
}

/// Entry, stop and targets for an actionable verdict
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TradeSetup {
    pub entry: f64,
    pub stop_loss: f64,
    pub target_1: f64,
    pub target_2: f64,
}

/// Point-in-time market picture of one session
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Snapshot {
    pub timestamp: DateTime<Utc>,
    pub ltp: f64,
    /// None while the session has no traded volume
    pub vwap: Option<f64>,
    pub day_high: f64,
    pub day_low: f64,
    pub volume: f64,
    pub value: f64,
}

impl Snapshot {
    /// Snapshot of the latest state of a timestamp-ordered tick sequence
    ///
    /// The last tick wins, so duplicates at the same timestamp resolve to
    /// the one recorded later.
    pub fn from_ticks(ticks: &[Tick]) -> Option<Self> {
        let latest = ticks.last()?;

        let (day_high, day_low) = ticks.iter().fold(
            (f64::NEG_INFINITY, f64::INFINITY),
            |(high, low), t| (high.max(t.price), low.min(t.price)),
        );

        let vwap = if latest.cumulative_volume > 0.0 {
            Some(latest.cumulative_value / latest.cumulative_volume)
        } else {
            None
        };

        Some(Self {
            timestamp: latest.timestamp,
            ltp: latest.price,
            vwap,
            day_high,
            day_low,
            volume: latest.cumulative_volume,
            value: latest.cumulative_value,
        })
    }

    /// Signed distance of price from VWAP as a fraction of VWAP
    pub fn vwap_deviation(&self) -> Option<f64> {
        self.vwap
            .filter(|vwap| *vwap != 0.0)
            .map(|vwap| (self.ltp - vwap) / vwap)
    }
}
