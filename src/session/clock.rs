use crate::error::AnalysisError;
use crate::Result;
use chrono::{DateTime, Duration, FixedOffset, NaiveDate, NaiveTime, Offset, Utc};
use serde::{Deserialize, Serialize};

const IST_OFFSET_SECS: i32 = 5 * 3600 + 30 * 60;

/// Source of "now" for the engine
pub trait Clock {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock pinned to one instant (replays and tests)
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MarketStatus {
    PreMarket,
    Open,
    Closed,
}

/// Trading-hours calendar for one exchange
///
/// Hours are exchange-local; everything else in the crate is UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionClock {
    open: NaiveTime,
    close: NaiveTime,
    offset: FixedOffset,
}

impl Default for SessionClock {
    /// NSE cash market: 09:15 - 15:30 IST
    fn default() -> Self {
        let hm = |h, m| NaiveTime::from_hms_opt(h, m, 0).unwrap_or_default();
        Self {
            open: hm(9, 15),
            close: hm(15, 30),
            offset: FixedOffset::east_opt(IST_OFFSET_SECS).unwrap_or(Utc.fix()),
        }
    }
}

impl SessionClock {
    pub fn new(open: NaiveTime, close: NaiveTime, utc_offset_minutes: i32) -> Result<Self> {
        if close <= open {
            return Err(AnalysisError::InvalidInput(format!(
                "market close {} must be after open {}",
                close, open
            )));
        }

        let offset = FixedOffset::east_opt(utc_offset_minutes * 60).ok_or_else(|| {
            AnalysisError::InvalidInput(format!("utc offset {} min out of range", utc_offset_minutes))
        })?;

        Ok(Self { open, close, offset })
    }

    pub fn open_time(&self) -> NaiveTime {
        self.open
    }

    pub fn close_time(&self) -> NaiveTime {
        self.close
    }

    pub fn offset(&self) -> FixedOffset {
        self.offset
    }

    /// Exchange-local calendar date of an instant
    pub fn session_date(&self, at: DateTime<Utc>) -> NaiveDate {
        at.with_timezone(&self.offset).date_naive()
    }

    pub fn session_start(&self, date: NaiveDate) -> DateTime<Utc> {
        self.local_instant(date, self.open)
    }

    pub fn session_end(&self, date: NaiveDate) -> DateTime<Utc> {
        self.local_instant(date, self.close)
    }

    pub fn session_length_minutes(&self) -> i64 {
        (self.close - self.open).num_minutes()
    }

    /// Whether a tick time falls inside the trading window of `date`
    pub fn in_session(&self, date: NaiveDate, at: DateTime<Utc>) -> bool {
        at >= self.session_start(date) && at < self.session_end(date)
    }

    /// Minutes since the open of the session `now` belongs to,
    /// clamped to the trading window
    pub fn elapsed_minutes(&self, now: DateTime<Utc>) -> i64 {
        let date = self.session_date(now);
        let elapsed = (now - self.session_start(date)).num_minutes();
        elapsed.clamp(0, self.session_length_minutes())
    }

    pub fn market_is_open(&self, now: DateTime<Utc>) -> bool {
        let local = now.with_timezone(&self.offset).time();
        local >= self.open && local <= self.close
    }

    pub fn market_status(&self, now: DateTime<Utc>) -> MarketStatus {
        let local = now.with_timezone(&self.offset).time();
        if local < self.open {
            MarketStatus::PreMarket
        } else if local <= self.close {
            MarketStatus::Open
        } else {
            MarketStatus::Closed
        }
    }

    /// UTC instant of an exchange-local wall time
    pub fn local_instant(&self, date: NaiveDate, time: NaiveTime) -> DateTime<Utc> {
        let local = date.and_time(time);
        (local - Duration::seconds(self.offset.local_minus_utc() as i64)).and_utc()
    }
}
