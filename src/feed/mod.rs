// Tick sources feeding the engine
pub mod sqlite;

pub use sqlite::SqliteTickSource;

use crate::models::Tick;
use crate::Result;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// An instrument with data in a session and how many ticks it has
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InstrumentActivity {
    pub instrument: String,
    pub ticks: usize,
}

/// Read access to recorded ticks
pub trait TickSource {
    /// Ticks of one instrument inside the trading window of `date`,
    /// ascending by timestamp. Empty when nothing was recorded.
    fn session_ticks(&self, instrument: &str, date: NaiveDate) -> Result<Vec<Tick>>;

    /// Instruments with at least one tick in the session, busiest first
    fn instruments(&self, date: NaiveDate) -> Result<Vec<InstrumentActivity>>;
}

/// Sort activity busiest first, ties by instrument id
pub(crate) fn sort_by_activity(list: &mut [InstrumentActivity]) {
    list.sort_by(|a, b| b.ticks.cmp(&a.ticks).then_with(|| a.instrument.cmp(&b.instrument)));
}
