use super::{sort_by_activity, InstrumentActivity, TickSource};
use crate::models::Tick;
use crate::session::SessionClock;
use crate::Result;
use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{named_params, Connection, OpenFlags};
use std::path::Path;
use tracing::{debug, warn};

/// Schema of the feed collector's tick table
pub const MARKET_TICKS_SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS market_ticks (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        token TEXT,
        exchange_timestamp INTEGER,
        ltp REAL,
        last_traded_qty INTEGER,
        avg_traded_price REAL,
        volume INTEGER,
        received_at INTEGER
    );

    CREATE INDEX IF NOT EXISTS idx_token_ts
    ON market_ticks (token, exchange_timestamp);

    CREATE UNIQUE INDEX IF NOT EXISTS uniq_token_exchange_ts
    ON market_ticks (token, exchange_timestamp);
"#;

/// Interpret an epoch number in seconds, millis, micros or nanos
///
/// The unit is picked from the magnitude of the value.
pub fn epoch_to_utc(raw: i64) -> Option<DateTime<Utc>> {
    match raw.unsigned_abs() {
        n if n > 1_000_000_000_000_000_000 => Some(DateTime::from_timestamp_nanos(raw)),
        n if n > 1_000_000_000_000_000 => DateTime::from_timestamp_micros(raw),
        n if n > 1_000_000_000_000 => DateTime::from_timestamp_millis(raw),
        _ => DateTime::from_timestamp(raw, 0),
    }
}

/// Session-window condition on `exchange_timestamp`, one range per epoch unit
const SESSION_WINDOW: &str = r#"(
    (exchange_timestamp >= :s_lo AND exchange_timestamp < :s_hi)
    OR (exchange_timestamp >= :ms_lo AND exchange_timestamp < :ms_hi)
    OR (exchange_timestamp >= :us_lo AND exchange_timestamp < :us_hi)
    OR (exchange_timestamp >= :ns_lo AND exchange_timestamp < :ns_hi)
)"#;

/// Half-open `[lo, hi)` bounds of a UTC window in seconds, millis, micros and nanos
///
/// The unit ranges do not overlap for present-day instants, so matching any
/// of them selects exactly the rows `epoch_to_utc` places in the window.
pub fn epoch_windows(start: DateTime<Utc>, end: DateTime<Utc>) -> [(i64, i64); 4] {
    let nanos = |at: DateTime<Utc>| at.timestamp_nanos_opt().unwrap_or(i64::MAX);
    [
        (start.timestamp(), end.timestamp()),
        (start.timestamp_millis(), end.timestamp_millis()),
        (start.timestamp_micros(), end.timestamp_micros()),
        (nanos(start), nanos(end)),
    ]
}

struct RawTick {
    timestamp: DateTime<Utc>,
    ltp: f64,
    last_traded_qty: f64,
    avg_traded_price: Option<f64>,
    volume: f64,
}

/// Tick source over the collector's SQLite database
pub struct SqliteTickSource {
    conn: Connection,
    clock: SessionClock,
}

impl SqliteTickSource {
    /// Open an existing database read-only
    pub fn open(path: impl AsRef<Path>, clock: SessionClock) -> Result<Self> {
        let conn = Connection::open_with_flags(
            path.as_ref(),
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        debug!("Opened tick database {}", path.as_ref().display());
        Ok(Self { conn, clock })
    }

    pub fn from_connection(conn: Connection, clock: SessionClock) -> Self {
        Self { conn, clock }
    }

    /// Create the tick table if it does not exist
    pub fn ensure_schema(conn: &Connection) -> Result<()> {
        conn.execute_batch(MARKET_TICKS_SCHEMA)?;
        Ok(())
    }

    fn session_windows(&self, date: NaiveDate) -> [(i64, i64); 4] {
        epoch_windows(self.clock.session_start(date), self.clock.session_end(date))
    }

    /// Complete rows of one token inside the session window, oldest first
    ///
    /// Rows missing the time, price, traded quantity or cumulative volume
    /// are skipped.
    fn load_rows(&self, instrument: &str, date: NaiveDate) -> Result<Vec<RawTick>> {
        let [s, ms, us, ns] = self.session_windows(date);
        let mut stmt = self.conn.prepare(&format!(
            r#"
            SELECT exchange_timestamp, ltp, last_traded_qty, avg_traded_price, volume
            FROM market_ticks
            WHERE token = :token AND {}
            ORDER BY exchange_timestamp ASC, id ASC
            "#,
            SESSION_WINDOW
        ))?;

        let rows = stmt.query_map(
            named_params! {
                ":token": instrument,
                ":s_lo": s.0, ":s_hi": s.1,
                ":ms_lo": ms.0, ":ms_hi": ms.1,
                ":us_lo": us.0, ":us_hi": us.1,
                ":ns_lo": ns.0, ":ns_hi": ns.1,
            },
            |row| {
                Ok((
                    row.get::<_, Option<i64>>(0)?,
                    row.get::<_, Option<f64>>(1)?,
                    row.get::<_, Option<f64>>(2)?,
                    row.get::<_, Option<f64>>(3)?,
                    row.get::<_, Option<f64>>(4)?,
                ))
            },
        )?;

        let mut raw = Vec::new();
        let mut skipped = 0usize;
        for row in rows {
            let (ts, ltp, qty, atp, volume) = row?;

            let timestamp = ts
                .and_then(epoch_to_utc)
                .filter(|at| self.clock.in_session(date, *at));
            let ltp = ltp.filter(|p| p.is_finite() && *p > 0.0);
            let qty = qty.filter(|q| q.is_finite() && *q >= 0.0);
            let volume = volume.filter(|v| v.is_finite() && *v >= 0.0);

            match (timestamp, ltp, qty, volume) {
                (Some(timestamp), Some(ltp), Some(last_traded_qty), Some(volume)) => {
                    raw.push(RawTick {
                        timestamp,
                        ltp,
                        last_traded_qty,
                        avg_traded_price: atp.filter(|p| p.is_finite() && *p > 0.0),
                        volume,
                    })
                }
                _ => skipped += 1,
            }
        }

        if skipped > 0 {
            warn!("⚠️  {}: skipped {} incomplete rows", instrument, skipped);
        }

        // Mixed epoch units can arrive out of SQL order
        raw.sort_by_key(|r| r.timestamp);
        Ok(raw)
    }
}

/// Turn collector rows into ticks with per-tick volume
///
/// The collector stores the exchange's day-cumulative volume, so a tick's
/// own volume is the increase since the previous row; the first row falls
/// back to its last traded quantity. Cumulative value comes from the
/// exchange's average traded price when present.
fn rows_to_ticks(rows: &[RawTick]) -> Vec<Tick> {
    let mut ticks = Vec::with_capacity(rows.len());
    let mut cumulative_volume: Option<f64> = None;
    let mut cumulative_value = 0.0;

    for row in rows {
        let volume = match cumulative_volume {
            Some(prev) => (row.volume - prev).max(0.0),
            None => row.last_traded_qty,
        };

        // Cumulative volume never moves backwards
        let cumulative = cumulative_volume.map_or(row.volume, |prev| prev.max(row.volume));
        cumulative_volume = Some(cumulative);

        cumulative_value = match row.avg_traded_price {
            Some(atp) if cumulative > 0.0 => atp * cumulative,
            _ => cumulative_value + row.ltp * volume,
        };

        ticks.push(Tick {
            timestamp: row.timestamp,
            price: row.ltp,
            volume,
            cumulative_value,
            cumulative_volume: cumulative,
        });
    }

    ticks
}

impl TickSource for SqliteTickSource {
    fn session_ticks(&self, instrument: &str, date: NaiveDate) -> Result<Vec<Tick>> {
        let rows = self.load_rows(instrument, date)?;
        debug!("{}: {} rows in the {} session", instrument, rows.len(), date);
        Ok(rows_to_ticks(&rows))
    }

    fn instruments(&self, date: NaiveDate) -> Result<Vec<InstrumentActivity>> {
        let [s, ms, us, ns] = self.session_windows(date);
        let mut stmt = self.conn.prepare(&format!(
            r#"
            SELECT token, COUNT(*)
            FROM market_ticks
            WHERE token IS NOT NULL AND {}
            GROUP BY token
            "#,
            SESSION_WINDOW
        ))?;

        let rows = stmt.query_map(
            named_params! {
                ":s_lo": s.0, ":s_hi": s.1,
                ":ms_lo": ms.0, ":ms_hi": ms.1,
                ":us_lo": us.0, ":us_hi": us.1,
                ":ns_lo": ns.0, ":ns_hi": ns.1,
            },
            |row| {
                Ok(InstrumentActivity {
                    instrument: row.get(0)?,
                    ticks: row.get::<_, i64>(1)?.max(0) as usize,
                })
            },
        )?;

        let mut list = rows.collect::<std::result::Result<Vec<_>, _>>()?;
        sort_by_activity(&mut list);
        Ok(list)
    }
}
