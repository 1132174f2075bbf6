use chrono::NaiveDate;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("no tick data for {instrument} in the {date} session")]
    NoData { instrument: String, date: NaiveDate },

    #[error("scoring impossible: no indicator is available")]
    ScoringImpossible,

    #[error("storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("config error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("session store lock poisoned: {0}")]
    LockPoisoned(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),
}

impl AnalysisError {
    /// True when the instrument simply has nothing to analyze yet.
    pub fn is_no_data(&self) -> bool {
        matches!(self, AnalysisError::NoData { .. })
    }
}
