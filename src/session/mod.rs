// Session state: trading clock, tick-to-candle aggregation, live store
pub mod candles;
pub mod clock;
pub mod store;

pub use candles::{aggregate_candles, CandleBuilder, CandleSeries, CANDLE_INTERVAL_MINUTES};
pub use clock::{Clock, FixedClock, MarketStatus, SessionClock, SystemClock};
pub use store::SessionStore;

use crate::models::Tick;
use chrono::NaiveDate;

/// One trading day of ticks for one instrument
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub instrument: String,
    pub date: NaiveDate,
    /// Ascending by timestamp; equal timestamps keep arrival order
    pub ticks: Vec<Tick>,
}

impl Session {
    pub fn new(instrument: &str, date: NaiveDate) -> Self {
        Self {
            instrument: instrument.to_string(),
            date,
            ticks: Vec::new(),
        }
    }

    /// Insert a tick at its chronological position
    pub fn record(&mut self, tick: Tick) {
        let idx = self.ticks.partition_point(|t| t.timestamp <= tick.timestamp);
        self.ticks.insert(idx, tick);
    }
}
