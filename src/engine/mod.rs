// Analysis engine: ticks -> candles -> indicators -> score -> verdict -> trade setup
use crate::error::AnalysisError;
use crate::feed::TickSource;
use crate::indicators::{evaluate, Indicator, IndicatorInput};
use crate::models::{IndicatorResult, ScoreResult, Snapshot, TradeSetup, VerdictTier};
use crate::session::{
    aggregate_candles, Clock, MarketStatus, SessionClock, SystemClock, CANDLE_INTERVAL_MINUTES,
};
use crate::strategy::{build_trade_setup, rank_by, score_indicators, SignalConfig};
use crate::Result;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::Serialize;
use tracing::{info, warn};

/// Full result of analyzing one instrument at one instant
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Analysis {
    pub instrument: String,
    pub session_date: NaiveDate,
    pub analyzed_at: DateTime<Utc>,
    pub market_status: MarketStatus,
    pub elapsed_minutes: i64,
    pub closed_candles: usize,
    pub indicators: Vec<IndicatorResult>,
    pub score: ScoreResult,
    pub trade_setup: Option<TradeSetup>,
    pub snapshot: Snapshot,
}

impl Analysis {
    pub fn verdict(&self) -> VerdictTier {
        self.score.verdict
    }

    /// Indicators excluded from scoring
    pub fn skipped_indicators(&self) -> impl Iterator<Item = &IndicatorResult> {
        self.indicators.iter().filter(|r| !r.available)
    }
}

/// An instrument a scan could not analyze
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SkippedInstrument {
    pub instrument: String,
    pub reason: String,
}

/// Ranked scan over many instruments
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ScanReport {
    pub session_date: NaiveDate,
    pub analyzed_at: DateTime<Utc>,
    /// Best opportunity first
    pub ranked: Vec<Analysis>,
    pub skipped: Vec<SkippedInstrument>,
}

impl ScanReport {
    pub fn top_pick(&self) -> Option<&Analysis> {
        self.ranked.first()
    }
}

/// Progressive indicator engine over a tick source
pub struct TrendEngine<S: TickSource, C: Clock = SystemClock> {
    source: S,
    clock: C,
    session_clock: SessionClock,
    indicators: Vec<Box<dyn Indicator>>,
    config: SignalConfig,
}

impl<S: TickSource> TrendEngine<S, SystemClock> {
    pub fn new(source: S, session_clock: SessionClock, config: SignalConfig) -> Self {
        Self::with_clock(source, SystemClock, session_clock, config)
    }
}

impl<S: TickSource, C: Clock> TrendEngine<S, C> {
    pub fn with_clock(source: S, clock: C, session_clock: SessionClock, config: SignalConfig) -> Self {
        let indicators = config.build_indicators();
        Self {
            source,
            clock,
            session_clock,
            indicators,
            config,
        }
    }

    pub fn session_clock(&self) -> &SessionClock {
        &self.session_clock
    }

    /// Analyze an instrument as of the engine clock
    pub fn analyze(&self, instrument: &str) -> Result<Analysis> {
        self.analyze_at(instrument, self.clock.now())
    }

    /// Analyze an instrument as of `now`
    ///
    /// Only ticks of the session `now` falls in, and not later than `now`,
    /// are considered, so replaying a past instant gives the answer the
    /// engine would have given live.
    pub fn analyze_at(&self, instrument: &str, now: DateTime<Utc>) -> Result<Analysis> {
        let date = self.session_clock.session_date(now);

        let mut ticks = self.source.session_ticks(instrument, date)?;
        ticks.retain(|t| t.timestamp <= now);
        ticks.sort_by_key(|t| t.timestamp);

        let snapshot = Snapshot::from_ticks(&ticks).ok_or_else(|| AnalysisError::NoData {
            instrument: instrument.to_string(),
            date,
        })?;

        let candles = aggregate_candles(
            &ticks,
            self.session_clock.session_start(date),
            Duration::minutes(CANDLE_INTERVAL_MINUTES),
            now,
        );
        let elapsed_minutes = self.session_clock.elapsed_minutes(now);

        let input = IndicatorInput {
            candles: &candles,
            snapshot: &snapshot,
        };
        let indicators: Vec<IndicatorResult> = self
            .indicators
            .iter()
            .map(|indicator| evaluate(indicator.as_ref(), &input, elapsed_minutes))
            .collect();

        let score = score_indicators(&indicators)?;
        let trade_setup = build_trade_setup(
            &score,
            &snapshot,
            self.config.target_1_pct,
            self.config.target_2_pct,
        );

        info!(
            "📊 {}: {}/{} bullish ({:.0}%) -> {} [{} ticks, {} closed candles, {} min]",
            instrument,
            score.bullish_count,
            score.available_count,
            score.percentage,
            score.verdict,
            ticks.len(),
            candles.closed_count(),
            elapsed_minutes
        );

        Ok(Analysis {
            instrument: instrument.to_string(),
            session_date: date,
            analyzed_at: now,
            market_status: self.session_clock.market_status(now),
            elapsed_minutes,
            closed_candles: candles.closed_count(),
            indicators,
            score,
            trade_setup,
            snapshot,
        })
    }

    /// Analyze and rank the given instruments as of the engine clock
    pub fn scan<I, T>(&self, instruments: I) -> ScanReport
    where
        I: IntoIterator<Item = T>,
        T: AsRef<str>,
    {
        self.scan_at(instruments, self.clock.now())
    }

    /// Analyze and rank the given instruments as of `now`
    ///
    /// A failing instrument is reported in `skipped` and never aborts the
    /// rest of the scan.
    pub fn scan_at<I, T>(&self, instruments: I, now: DateTime<Utc>) -> ScanReport
    where
        I: IntoIterator<Item = T>,
        T: AsRef<str>,
    {
        let mut ranked = Vec::new();
        let mut skipped = Vec::new();

        for instrument in instruments {
            let instrument = instrument.as_ref();
            match self.analyze_at(instrument, now) {
                Ok(analysis) => ranked.push(analysis),
                Err(e) => {
                    warn!("Skipping {}: {}", instrument, e);
                    skipped.push(SkippedInstrument {
                        instrument: instrument.to_string(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        rank_by(&mut ranked, |a| (&a.score, &a.snapshot));

        if let Some(top) = ranked.first() {
            info!(
                "🏆 Top pick: {} ({:.0}%, {})",
                top.instrument, top.score.percentage, top.score.verdict
            );
        }

        ScanReport {
            session_date: self.session_clock.session_date(now),
            analyzed_at: now,
            ranked,
            skipped,
        }
    }

    /// Scan every instrument with data in the current session
    pub fn scan_all(&self) -> Result<ScanReport> {
        self.scan_all_at(self.clock.now())
    }

    pub fn scan_all_at(&self, now: DateTime<Utc>) -> Result<ScanReport> {
        let date = self.session_clock.session_date(now);
        let instruments = self.source.instruments(date)?;
        info!("🔍 Scanning {} instruments for {}", instruments.len(), date);
        Ok(self.scan_at(instruments.iter().map(|a| a.instrument.as_str()), now))
    }
}
