//! CLI entry point for the intraday trend analyzer.
//!
//! Subcommands:
//!   - `analyze` : verdict for one instrument from the tick database
//!   - `scan`    : rank several (or all) instruments of the session
//!   - `tokens`  : list instruments with ticks in the session
//!   - `demo`    : analyze seeded synthetic sessions, no database needed

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use clap::{Parser, Subcommand};
use intraday_trend::engine::{Analysis, ScanReport, TrendEngine};
use intraday_trend::feed::{SqliteTickSource, TickSource};
use intraday_trend::report::{render_analysis, render_scan};
use intraday_trend::session::{SessionClock, SessionStore};
use intraday_trend::settings::Settings;
use intraday_trend::simulation::{MarketScenario, SyntheticSessionGenerator};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "intraday-trend",
    version,
    about = "Live intraday trend verdicts from exchange tick data",
    propagate_version = true
)]
struct Cli {
    /// Settings file (TOML); defaults to config/default.toml when present
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Tick database, overrides storage.db_path
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Print JSON instead of the text report
    #[arg(long, global = true, default_value_t = false)]
    json: bool,

    /// Session date (YYYY-MM-DD); defaults to today's exchange date
    #[arg(long, global = true)]
    date: Option<NaiveDate>,

    /// Exchange-local time to analyze at (HH:MM:SS); defaults to now,
    /// or to the close when --date is given
    #[arg(long, global = true)]
    at: Option<NaiveTime>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze one instrument
    Analyze {
        /// Instrument token
        token: String,
    },
    /// Analyze and rank instruments (all of the session when none given)
    Scan {
        tokens: Vec<String>,
    },
    /// List instruments with ticks in the session, busiest first
    Tokens,
    /// Analyze synthetic sessions for every scenario
    Demo {
        /// RNG seed for reproducible sessions
        #[arg(long, default_value_t = 42)]
        seed: u64,
    },
}

fn setup_logging(default_filter: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Resolve the analysis instant from --date / --at
fn analysis_instant(cli: &Cli, clock: &SessionClock) -> DateTime<Utc> {
    let now = Utc::now();
    match (cli.date, cli.at) {
        (None, None) => now,
        (date, at) => {
            let date = date.unwrap_or_else(|| clock.session_date(now));
            let time = at.unwrap_or_else(|| clock.close_time());
            clock.local_instant(date, time)
        }
    }
}

fn print_analysis(analysis: &Analysis, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(analysis)?);
    } else {
        print!("{}", render_analysis(analysis));
    }
    Ok(())
}

fn print_scan(report: &ScanReport, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
    } else {
        print!("{}", render_scan(report));
    }
    Ok(())
}

fn run_demo(settings: &Settings, clock: SessionClock, now: DateTime<Utc>, seed: u64, json: bool) -> Result<()> {
    let date = clock.session_date(now);
    let store = SessionStore::new(clock);
    let mut generator = SyntheticSessionGenerator::new(seed);

    for scenario in MarketScenario::ALL {
        for tick in generator.generate(scenario, &clock, date) {
            store.ingest(scenario.as_str(), tick)?;
        }
    }
    tracing::info!("🧪 Generated {} synthetic sessions for {}", MarketScenario::ALL.len(), date);

    let engine = TrendEngine::new(store, clock, settings.signals.clone());
    let report = engine.scan_all_at(now)?;

    if !json {
        for analysis in &report.ranked {
            print!("{}", render_analysis(analysis));
        }
    }
    print_scan(&report, json)
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let settings = Settings::load(cli.config.as_deref()).context("Failed to load settings")?;
    setup_logging(&settings.logging.filter);

    let clock = settings.session_clock()?;
    let now = analysis_instant(&cli, &clock);
    tracing::debug!("Analysis instant {} (session {})", now, clock.session_date(now));

    if let Commands::Demo { seed } = cli.command {
        // Demo sessions are full days; default to midday when no time is pinned
        let now = match (cli.date, cli.at) {
            (None, None) => clock.local_instant(
                clock.session_date(now),
                NaiveTime::from_hms_opt(12, 30, 0).unwrap_or_default(),
            ),
            _ => now,
        };
        return run_demo(&settings, clock, now, seed, cli.json);
    }

    let db_path = cli.db.clone().unwrap_or_else(|| settings.storage.db_path.clone());
    let source = SqliteTickSource::open(&db_path, clock)
        .with_context(|| format!("Failed to open tick database {}", db_path.display()))?;

    match &cli.command {
        Commands::Analyze { token } => {
            let engine = TrendEngine::new(source, clock, settings.signals.clone());
            let analysis = engine
                .analyze_at(token, now)
                .with_context(|| format!("Analysis of {} failed", token))?;
            print_analysis(&analysis, cli.json)?;
        }
        Commands::Scan { tokens } => {
            let engine = TrendEngine::new(source, clock, settings.signals.clone());
            let report = if tokens.is_empty() {
                engine.scan_all_at(now)?
            } else {
                engine.scan_at(tokens, now)
            };
            print_scan(&report, cli.json)?;
        }
        Commands::Tokens => {
            let date = clock.session_date(now);
            let list = source.instruments(date)?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&list)?);
            } else if list.is_empty() {
                println!("❌ No ticks recorded for the {} session", date);
            } else {
                println!("📋 Instruments with ticks on {}:", date);
                for (i, activity) in list.iter().enumerate() {
                    println!("  {:>3}. {:<12} {:>8} ticks", i + 1, activity.instrument, activity.ticks);
                }
            }
        }
        Commands::Demo { .. } => {}
    }

    Ok(())
}
