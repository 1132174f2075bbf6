use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use intraday_trend::feed::SqliteTickSource;
use intraday_trend::models::{accumulate_trades, IndicatorKind, ScoreResult, Snapshot, Tick};
use intraday_trend::session::{FixedClock, MarketStatus, SessionClock, SessionStore};
use intraday_trend::simulation::{MarketScenario, SyntheticSessionGenerator};
use intraday_trend::strategy::{rank_by, verdict_for, SignalConfig};
use intraday_trend::{AnalysisError, TrendEngine, VerdictTier};
use rusqlite::{params, Connection};

fn date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 1, 5).unwrap()
}

/// Exchange-local wall time on the test date
fn at(h: u32, m: u32) -> DateTime<Utc> {
    SessionClock::default().local_instant(date(), NaiveTime::from_hms_opt(h, m, 0).unwrap())
}

fn store_with(sessions: &[(&str, MarketScenario)]) -> SessionStore {
    let clock = SessionClock::default();
    let store = SessionStore::new(clock);
    let mut generator = SyntheticSessionGenerator::new(7);
    for (instrument, scenario) in sessions {
        for tick in generator.generate(*scenario, &clock, date()) {
            store.ingest(instrument, tick).unwrap();
        }
    }
    store
}

fn engine(store: SessionStore, now: DateTime<Utc>) -> TrendEngine<SessionStore, FixedClock> {
    TrendEngine::with_clock(
        store,
        FixedClock(now),
        SessionClock::default(),
        SignalConfig::default(),
    )
}

#[test]
fn test_no_data_is_distinct_from_single_tick_session() {
    let store = SessionStore::new(SessionClock::default());
    let ticks = accumulate_trades(vec![(at(9, 15) + chrono::Duration::seconds(30), 250.0, 100.0)]);
    store.ingest("EARLY", ticks[0].clone()).unwrap();

    let engine = engine(store, at(9, 16));

    let early = engine.analyze("EARLY").unwrap();
    assert_eq!(early.market_status, MarketStatus::Open);
    assert_eq!(early.elapsed_minutes, 1);
    assert_eq!(early.score.available_count, 2);
    assert_eq!(early.snapshot.vwap, Some(250.0));
    assert!(early.trade_setup.is_none());

    let err = engine.analyze("MISSING").unwrap_err();
    assert!(err.is_no_data());
    assert!(matches!(err, AnalysisError::NoData { .. }));
}

#[test]
fn test_analysis_is_idempotent() {
    let engine = engine(store_with(&[("UP", MarketScenario::Uptrend)]), at(11, 2));
    let first = engine.analyze("UP").unwrap();
    let second = engine.analyze("UP").unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_availability_grows_through_the_session() {
    let engine = engine(store_with(&[("SIDE", MarketScenario::Sideways)]), at(15, 45));

    let checkpoints = [
        (at(9, 16), 2),
        (at(9, 30), 3),
        (at(10, 30), 4),
        (at(13, 30), 5),
        (at(15, 30), 5),
    ];

    let mut previous: Vec<bool> = vec![false; 5];
    for (now, expected) in checkpoints {
        let analysis = engine.analyze_at("SIDE", now).unwrap();
        assert_eq!(analysis.score.available_count, expected, "at {}", now);

        let available: Vec<bool> = analysis.indicators.iter().map(|r| r.available).collect();
        for (was, is) in previous.iter().zip(&available) {
            assert!(!was || *is, "availability regressed at {}", now);
        }
        previous = available;
    }
}

#[test]
fn test_early_session_reason_mentions_minutes() {
    let engine = engine(store_with(&[("SIDE", MarketScenario::Sideways)]), at(9, 45));
    let analysis = engine.analyze("SIDE").unwrap();

    let rsi = analysis
        .indicators
        .iter()
        .find(|r| r.kind == IndicatorKind::Rsi)
        .unwrap();
    assert!(!rsi.available);
    assert_eq!(rsi.reason.as_deref(), Some("need 75+ min, have 30 min"));
}

#[test]
fn test_trading_gaps_delay_availability() {
    let engine = engine(store_with(&[("GAPS", MarketScenario::WithGaps)]), at(10, 30));
    let analysis = engine.analyze("GAPS").unwrap();

    // 09:45-10:00 had no trades, so only 12 of 15 buckets exist
    assert_eq!(analysis.closed_candles, 12);
    let rsi = analysis
        .indicators
        .iter()
        .find(|r| r.kind == IndicatorKind::Rsi)
        .unwrap();
    assert!(!rsi.available);
    assert!(rsi.reason.as_deref().unwrap().contains("gaps in trading"));
}

#[test]
fn test_full_session_after_close() {
    let engine = engine(store_with(&[("UP", MarketScenario::Uptrend)]), at(16, 0));
    let analysis = engine.analyze("UP").unwrap();

    assert_eq!(analysis.market_status, MarketStatus::Closed);
    assert_eq!(analysis.elapsed_minutes, 375);
    assert_eq!(analysis.closed_candles, 75);
    assert_eq!(analysis.score.available_count, 5);
}

#[test]
fn test_identical_prices_vwap_equals_price() {
    let engine = engine(store_with(&[("FLAT", MarketScenario::Flat)]), at(12, 0));
    let analysis = engine.analyze("FLAT").unwrap();

    assert_eq!(analysis.snapshot.vwap, Some(1500.0));
    let vwap = analysis
        .indicators
        .iter()
        .find(|r| r.kind == IndicatorKind::Vwap)
        .unwrap();
    assert!(vwap.available);
    assert!(!vwap.bullish);
}

#[test]
fn test_score_bounds_for_every_scenario() {
    let sessions: Vec<(&str, MarketScenario)> = MarketScenario::ALL
        .iter()
        .map(|s| (s.as_str(), *s))
        .collect();
    let engine = engine(store_with(&sessions), at(15, 30));

    for now in [at(9, 20), at(10, 0), at(11, 30), at(14, 0), at(15, 30)] {
        for (instrument, _) in &sessions {
            let score = engine.analyze_at(instrument, now).unwrap().score;
            assert!(score.percentage >= 0.0 && score.percentage <= 100.0);
            assert!(score.bullish_count <= score.available_count);
            assert!(score.available_count >= 2 && score.available_count <= 5);
            assert_eq!(score.verdict, verdict_for(score.percentage));
        }
    }
}

#[test]
fn test_actionable_verdicts_carry_a_trade_setup() {
    let sessions: Vec<(&str, MarketScenario)> = MarketScenario::ALL
        .iter()
        .map(|s| (s.as_str(), *s))
        .collect();
    let engine = engine(store_with(&sessions), at(14, 0));
    let report = engine.scan_all().unwrap();

    for analysis in &report.ranked {
        assert_eq!(
            analysis.trade_setup.is_some(),
            analysis.verdict().is_actionable(),
            "{}",
            analysis.instrument
        );
        if let Some(setup) = &analysis.trade_setup {
            assert_eq!(setup.entry, analysis.snapshot.ltp);
            assert!(setup.target_1 > setup.entry);
            assert!(setup.target_2 > setup.target_1);
        }
    }
}

#[test]
fn test_scan_skips_failures_and_ranks_the_rest() {
    let engine = engine(
        store_with(&[
            ("UP", MarketScenario::Uptrend),
            ("DOWN", MarketScenario::Downtrend),
        ]),
        at(13, 0),
    );
    let report = engine.scan(["UP", "NOPE", "DOWN"]);

    assert_eq!(report.ranked.len(), 2);
    assert_eq!(report.skipped.len(), 1);
    assert_eq!(report.skipped[0].instrument, "NOPE");

    let top = report.top_pick().unwrap();
    let second = &report.ranked[1];
    assert!(top.score.percentage >= second.score.percentage);
}

#[test]
fn test_ranking_breaks_ties_on_vwap_distance() {
    fn entry(name: &'static str, bullish: usize, ltp: f64) -> (&'static str, ScoreResult, Snapshot) {
        let percentage = bullish as f64 * 100.0 / 5.0;
        (
            name,
            ScoreResult {
                available_count: 5,
                bullish_count: bullish,
                percentage,
                verdict: verdict_for(percentage),
            },
            Snapshot {
                timestamp: Utc::now(),
                ltp,
                vwap: Some(100.0),
                day_high: ltp,
                day_low: ltp,
                volume: 1.0,
                value: 100.0,
            },
        )
    }

    let mut items = vec![entry("A", 4, 101.0), entry("B", 4, 103.0), entry("C", 2, 104.0)];
    rank_by(&mut items, |(_, score, snap)| (score, snap));

    let order: Vec<&str> = items.iter().map(|(name, _, _)| *name).collect();
    assert_eq!(order, vec!["B", "A", "C"]);
    assert_eq!(items[0].1.verdict, VerdictTier::StrongBullish);
}

#[test]
fn test_new_session_date_replaces_previous_day() {
    let clock = SessionClock::default();
    let store = SessionStore::new(clock);
    let yesterday = NaiveDate::from_ymd_opt(2026, 1, 2).unwrap();

    let mut generator = SyntheticSessionGenerator::new(1);
    for tick in generator.generate(MarketScenario::Sideways, &clock, yesterday) {
        store.ingest("X", tick).unwrap();
    }
    let today: Vec<Tick> = accumulate_trades(vec![(at(9, 20), 100.0, 10.0)]);
    store.ingest("X", today[0].clone()).unwrap();

    let engine = engine(store, at(9, 30));
    assert_eq!(engine.analyze("X").unwrap().snapshot.ltp, 100.0);

    let replay = clock.local_instant(yesterday, NaiveTime::from_hms_opt(12, 0, 0).unwrap());
    assert!(engine.analyze_at("X", replay).unwrap_err().is_no_data());
}

#[test]
fn test_sqlite_source_end_to_end() {
    let conn = Connection::open_in_memory().unwrap();
    SqliteTickSource::ensure_schema(&conn).unwrap();

    // Collector rows: millisecond epochs, day-cumulative volume
    let open_ms = at(9, 15).timestamp_millis();
    let mut cumulative = 10_000i64;
    for i in 0..120i64 {
        let price = 500.0 + i as f64 * 0.1;
        cumulative += 50;
        conn.execute(
            "INSERT INTO market_ticks (token, exchange_timestamp, ltp, last_traded_qty, avg_traded_price, volume, received_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?2)",
            params!["3045", open_ms + i * 30_000, price, 50, 500.0, cumulative],
        )
        .unwrap();
    }

    let source = SqliteTickSource::from_connection(conn, SessionClock::default());
    let engine = TrendEngine::with_clock(
        source,
        FixedClock(at(10, 15)),
        SessionClock::default(),
        SignalConfig::default(),
    );

    let analysis = engine.analyze("3045").unwrap();
    assert_eq!(analysis.snapshot.vwap, Some(500.0));
    assert!(analysis.snapshot.ltp > 500.0);
    assert_eq!(analysis.closed_candles, 12);
    assert_eq!(analysis.score.available_count, 3);

    let report = engine.scan_all().unwrap();
    assert_eq!(report.ranked.len(), 1);
    assert_eq!(report.top_pick().unwrap().instrument, "3045");
}
