// Layered settings: built-in defaults, then a TOML file, then TREND__* env vars
use crate::session::SessionClock;
use crate::strategy::SignalConfig;
use crate::Result;
use chrono::NaiveTime;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_FILE: &str = "config/default";
pub const ENV_PREFIX: &str = "TREND";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct MarketSettings {
    pub open: NaiveTime,
    pub close: NaiveTime,
    /// Exchange offset from UTC, IST by default
    pub utc_offset_minutes: i32,
}

impl Default for MarketSettings {
    fn default() -> Self {
        let clock = SessionClock::default();
        Self {
            open: clock.open_time(),
            close: clock.close_time(),
            utc_offset_minutes: clock.offset().local_minus_utc() / 60,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StorageSettings {
    pub db_path: PathBuf,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from("market_data.db"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LoggingSettings {
    /// Default `EnvFilter` directive; RUST_LOG wins when set
    pub filter: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            filter: "intraday_trend=info".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Settings {
    pub market: MarketSettings,
    pub signals: SignalConfig,
    pub storage: StorageSettings,
    pub logging: LoggingSettings,
}

impl Settings {
    /// Load settings
    ///
    /// An explicit `path` must exist; otherwise `config/default.toml` is read
    /// when present. Environment variables such as
    /// `TREND__MARKET__UTC_OFFSET_MINUTES=330` override both.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let file = match path {
            Some(path) => File::from(path).required(true),
            None => File::with_name(DEFAULT_CONFIG_FILE).required(false),
        };

        let settings: Settings = Config::builder()
            .add_source(file)
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<()> {
        self.session_clock()?;
        self.signals.validate()
    }

    pub fn session_clock(&self) -> Result<SessionClock> {
        SessionClock::new(
            self.market.open,
            self.market.close,
            self.market.utc_offset_minutes,
        )
    }
}
