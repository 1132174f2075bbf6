use super::clock::SessionClock;
use super::Session;
use crate::error::AnalysisError;
use crate::feed::{sort_by_activity, InstrumentActivity, TickSource};
use crate::models::Tick;
use crate::Result;
use chrono::NaiveDate;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// Thread-safe in-memory store of live sessions
///
/// Holds exactly one session per instrument. The first tick of a later
/// trading date replaces the instrument's session wholesale.
#[derive(Clone)]
pub struct SessionStore {
    data: Arc<RwLock<HashMap<String, Session>>>,
    clock: SessionClock,
}

impl SessionStore {
    pub fn new(clock: SessionClock) -> Self {
        Self {
            data: Arc::new(RwLock::new(HashMap::new())),
            clock,
        }
    }

    /// Record a tick for an instrument
    ///
    /// Ticks for a date older than the instrument's current session are
    /// dropped.
    pub fn ingest(&self, instrument: &str, tick: Tick) -> Result<()> {
        let date = self.clock.session_date(tick.timestamp);
        let mut data = self.data.write().map_err(|e| AnalysisError::LockPoisoned(e.to_string()))?;

        let session = data
            .entry(instrument.to_string())
            .or_insert_with(|| Session::new(instrument, date));

        if date > session.date {
            tracing::info!(
                "🔄 New session for {}: {} -> {} (dropping {} ticks)",
                instrument,
                session.date,
                date,
                session.ticks.len()
            );
            *session = Session::new(instrument, date);
        } else if date < session.date {
            tracing::warn!(
                "Dropping stale tick for {} from {} (current session {})",
                instrument,
                date,
                session.date
            );
            return Ok(());
        }

        session.record(tick);
        Ok(())
    }

    /// Copy of an instrument's current session
    pub fn session(&self, instrument: &str) -> Result<Option<Session>> {
        let data = self.data.read().map_err(|e| AnalysisError::LockPoisoned(e.to_string()))?;
        Ok(data.get(instrument).cloned())
    }

    pub fn tick_count(&self, instrument: &str) -> Result<usize> {
        let data = self.data.read().map_err(|e| AnalysisError::LockPoisoned(e.to_string()))?;
        Ok(data.get(instrument).map(|s| s.ticks.len()).unwrap_or(0))
    }

    /// Forget an instrument entirely
    pub fn clear_instrument(&self, instrument: &str) -> Result<()> {
        let mut data = self.data.write().map_err(|e| AnalysisError::LockPoisoned(e.to_string()))?;
        data.remove(instrument);
        Ok(())
    }
}

impl TickSource for SessionStore {
    fn session_ticks(&self, instrument: &str, date: NaiveDate) -> Result<Vec<Tick>> {
        let data = self.data.read().map_err(|e| AnalysisError::LockPoisoned(e.to_string()))?;

        Ok(data
            .get(instrument)
            .filter(|session| session.date == date)
            .map(|session| {
                session
                    .ticks
                    .iter()
                    .filter(|t| self.clock.in_session(date, t.timestamp))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    fn instruments(&self, date: NaiveDate) -> Result<Vec<InstrumentActivity>> {
        let data = self.data.read().map_err(|e| AnalysisError::LockPoisoned(e.to_string()))?;

        let mut list: Vec<InstrumentActivity> = data
            .values()
            .filter(|session| session.date == date && !session.ticks.is_empty())
            .map(|session| InstrumentActivity {
                instrument: session.instrument.clone(),
                ticks: session.ticks.len(),
            })
            .collect();

        sort_by_activity(&mut list);
        Ok(list)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Duration, TimeZone, Utc};

    fn open() -> DateTime<Utc> {
        // 2026-01-05 09:15 IST
        Utc.with_ymd_and_hms(2026, 1, 5, 3, 45, 0).unwrap()
    }

    fn tick_at(at: DateTime<Utc>, price: f64) -> Tick {
        Tick {
            timestamp: at,
            price,
            volume: 10.0,
            cumulative_value: price * 10.0,
            cumulative_volume: 10.0,
        }
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 1, 5).unwrap()
    }

    #[test]
    fn test_ingest_and_read() {
        let store = SessionStore::new(SessionClock::default());
        store.ingest("17939", tick_at(open(), 100.0)).unwrap();
        store
            .ingest("17939", tick_at(open() + Duration::seconds(5), 101.0))
            .unwrap();

        assert_eq!(store.tick_count("17939").unwrap(), 2);
        let ticks = store.session_ticks("17939", date()).unwrap();
        assert_eq!(ticks.len(), 2);
        assert_eq!(ticks[1].price, 101.0);
    }

    #[test]
    fn test_out_of_order_ingest_is_kept_sorted() {
        let store = SessionStore::new(SessionClock::default());
        store
            .ingest("A", tick_at(open() + Duration::seconds(30), 102.0))
            .unwrap();
        store.ingest("A", tick_at(open(), 100.0)).unwrap();
        store
            .ingest("A", tick_at(open() + Duration::seconds(10), 101.0))
            .unwrap();

        let prices: Vec<f64> = store
            .session_ticks("A", date())
            .unwrap()
            .iter()
            .map(|t| t.price)
            .collect();
        assert_eq!(prices, vec![100.0, 101.0, 102.0]);
    }

    #[test]
    fn test_new_date_resets_session() {
        let store = SessionStore::new(SessionClock::default());
        store.ingest("A", tick_at(open(), 100.0)).unwrap();
        store.ingest("A", tick_at(open() + Duration::seconds(1), 100.5)).unwrap();

        let next_day = open() + Duration::days(1);
        store.ingest("A", tick_at(next_day, 110.0)).unwrap();

        let session = store.session("A").unwrap().unwrap();
        assert_eq!(session.date, NaiveDate::from_ymd_opt(2026, 1, 6).unwrap());
        assert_eq!(session.ticks.len(), 1);
        assert!(store.session_ticks("A", date()).unwrap().is_empty());

        // A late tick from the previous day is ignored
        store.ingest("A", tick_at(open() + Duration::minutes(5), 99.0)).unwrap();
        assert_eq!(store.tick_count("A").unwrap(), 1);
    }

    #[test]
    fn test_ticks_outside_trading_window_are_excluded() {
        let store = SessionStore::new(SessionClock::default());
        store
            .ingest("A", tick_at(open() - Duration::minutes(10), 99.0))
            .unwrap();
        store.ingest("A", tick_at(open(), 100.0)).unwrap();

        assert_eq!(store.tick_count("A").unwrap(), 2);
        assert_eq!(store.session_ticks("A", date()).unwrap().len(), 1);
    }

    #[test]
    fn test_instruments_busiest_first() {
        let store = SessionStore::new(SessionClock::default());
        store.ingest("A", tick_at(open(), 100.0)).unwrap();
        for i in 0..3 {
            store
                .ingest("B", tick_at(open() + Duration::seconds(i), 50.0))
                .unwrap();
        }

        let list = store.instruments(date()).unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(list[0].instrument, "B");
        assert_eq!(list[0].ticks, 3);
        assert_eq!(list[1].instrument, "A");
    }

    #[test]
    fn test_clear_instrument() {
        let store = SessionStore::new(SessionClock::default());
        store.ingest("A", tick_at(open(), 100.0)).unwrap();
        store.ingest("B", tick_at(open(), 200.0)).unwrap();

        store.clear_instrument("A").unwrap();
        assert_eq!(store.tick_count("A").unwrap(), 0);
        assert_eq!(store.tick_count("B").unwrap(), 1);
    }

    #[test]
    fn test_concurrent_ingest() {
        use std::thread;

        let store = SessionStore::new(SessionClock::default());
        let store_clone = store.clone();

        let handle = thread::spawn(move || {
            for i in 0..50 {
                store_clone
                    .ingest("A", tick_at(open() + Duration::seconds(i), 100.0))
                    .unwrap();
            }
        });

        for i in 50..100 {
            store
                .ingest("A", tick_at(open() + Duration::seconds(i), 100.0))
                .unwrap();
        }

        handle.join().unwrap();
        assert_eq!(store.tick_count("A").unwrap(), 100);
    }
}
