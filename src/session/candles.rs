use crate::models::{Candle, Tick};
use chrono::{DateTime, Duration, Utc};
use std::collections::BTreeMap;

/// Width of one candle bucket
pub const CANDLE_INTERVAL_MINUTES: i64 = 5;

/// Folds ticks of one bucket into a candle
#[derive(Debug, Clone)]
pub struct CandleBuilder {
    pub bucket_start: DateTime<Utc>,
    pub bucket_end: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
    pub value: f64,
}

impl CandleBuilder {
    /// Start a bucket from its first tick
    pub fn new(tick: &Tick, bucket_start: DateTime<Utc>, bucket_end: DateTime<Utc>) -> Self {
        Self {
            bucket_start,
            bucket_end,
            open: tick.price,
            high: tick.price,
            low: tick.price,
            close: tick.price,
            volume: tick.volume,
            value: tick.traded_value(),
        }
    }

    pub fn update(&mut self, tick: &Tick) {
        self.high = self.high.max(tick.price);
        self.low = self.low.min(tick.price);
        self.close = tick.price;
        self.volume += tick.volume;
        self.value += tick.traded_value();
    }

    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        at >= self.bucket_start && at < self.bucket_end
    }

    pub fn finish(&self) -> Candle {
        Candle {
            bucket_start: self.bucket_start,
            bucket_end: self.bucket_end,
            open: self.open,
            high: self.high,
            low: self.low,
            close: self.close,
            volume: self.volume,
            value: self.value,
        }
    }
}

/// Candles of a session as seen at one instant
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CandleSeries {
    /// Buckets whose interval has fully elapsed, oldest first
    pub closed: Vec<Candle>,
    /// The in-progress bucket, if any tick landed in it
    pub open: Option<Candle>,
}

impl CandleSeries {
    pub fn is_empty(&self) -> bool {
        self.closed.is_empty() && self.open.is_none()
    }

    pub fn closed_count(&self) -> usize {
        self.closed.len()
    }

    /// Most recent candle, open or closed
    pub fn latest(&self) -> Option<&Candle> {
        self.open.as_ref().or_else(|| self.closed.last())
    }

    /// Closing prices of the closed candles
    pub fn closes(&self) -> Vec<f64> {
        self.closed.iter().map(|c| c.close).collect()
    }
}

/// Aggregate session ticks into buckets aligned to `session_start`
///
/// Bucket membership depends only on tick timestamps, so the result is the
/// same whatever order the ticks arrived in. Ticks sharing a timestamp keep
/// their relative order (the later one sets the close). Empty buckets are
/// not materialised.
pub fn aggregate_candles(
    ticks: &[Tick],
    session_start: DateTime<Utc>,
    interval: Duration,
    now: DateTime<Utc>,
) -> CandleSeries {
    let interval_ms = interval.num_milliseconds().max(1);

    let mut ordered: Vec<&Tick> = ticks.iter().collect();
    ordered.sort_by_key(|t| t.timestamp);

    let mut buckets: BTreeMap<i64, CandleBuilder> = BTreeMap::new();
    for tick in ordered {
        let offset_ms = (tick.timestamp - session_start).num_milliseconds();
        let index = offset_ms.div_euclid(interval_ms);

        buckets
            .entry(index)
            .and_modify(|builder| builder.update(tick))
            .or_insert_with(|| {
                let start = session_start + Duration::milliseconds(index * interval_ms);
                CandleBuilder::new(tick, start, start + Duration::milliseconds(interval_ms))
            });
    }

    let mut series = CandleSeries::default();
    for builder in buckets.values() {
        if builder.bucket_end <= now {
            series.closed.push(builder.finish());
        } else {
            // Only the last bucket can still be open
            series.open = Some(builder.finish());
        }
    }

    series
}
