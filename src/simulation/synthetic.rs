use crate::models::{accumulate_trades, Tick};
use crate::session::SessionClock;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

/// Intraday scenario types for synthetic sessions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarketScenario {
    /// Steady climb through the session (+4%)
    Uptrend,
    /// Steady decline through the session (-4%)
    Downtrend,
    /// Mean-reverting chop around the open
    Sideways,
    /// Large tick-to-tick swings
    Volatile,
    /// Random walk with a 15-minute trading halt every hour
    WithGaps,
    /// Constant price
    Flat,
}

impl MarketScenario {
    pub const ALL: [MarketScenario; 6] = [
        MarketScenario::Uptrend,
        MarketScenario::Downtrend,
        MarketScenario::Sideways,
        MarketScenario::Volatile,
        MarketScenario::WithGaps,
        MarketScenario::Flat,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MarketScenario::Uptrend => "uptrend",
            MarketScenario::Downtrend => "downtrend",
            MarketScenario::Sideways => "sideways",
            MarketScenario::Volatile => "volatile",
            MarketScenario::WithGaps => "with_gaps",
            MarketScenario::Flat => "flat",
        }
    }
}

/// Generates seeded tick streams covering one trading session
pub struct SyntheticSessionGenerator {
    rng: StdRng,
    base_price: f64,
    base_volume: f64,
    tick_interval_secs: i64,
}

impl SyntheticSessionGenerator {
    /// Create a new generator with a seed for reproducibility
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            base_price: 1500.0,
            base_volume: 200.0,
            tick_interval_secs: 15,
        }
    }

    /// Ticks from the open of `date` up to (not including) the close
    pub fn generate(
        &mut self,
        scenario: MarketScenario,
        clock: &SessionClock,
        date: NaiveDate,
    ) -> Vec<Tick> {
        let start = clock.session_start(date);
        self.generate_between(scenario, start, clock.session_end(date))
    }

    /// Ticks every `tick_interval_secs` in `[start, end)`
    pub fn generate_between(
        &mut self,
        scenario: MarketScenario,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Vec<Tick> {
        let step = Duration::seconds(self.tick_interval_secs);
        let num_ticks = ((end - start).num_seconds() / self.tick_interval_secs).max(0) as usize;

        // Per-tick drift that compounds to the scenario's session move
        let drift_per_tick = match scenario {
            MarketScenario::Uptrend => 0.04 / num_ticks.max(1) as f64,
            MarketScenario::Downtrend => -0.04 / num_ticks.max(1) as f64,
            _ => 0.0,
        };

        let mut trades = Vec::with_capacity(num_ticks);
        let mut price = self.base_price;

        for i in 0..num_ticks {
            let timestamp = start + step * i as i32;

            if scenario == MarketScenario::WithGaps {
                // No trading from :30 to :45 of every session hour
                let minute = (timestamp - start).num_minutes() % 60;
                if (30..45).contains(&minute) {
                    continue;
                }
            }

            price = match scenario {
                MarketScenario::Uptrend | MarketScenario::Downtrend => {
                    price * (1.0 + drift_per_tick + self.rng.gen_range(-0.0002..0.0002))
                }
                MarketScenario::Sideways => {
                    let reversion = (self.base_price - price) * 0.05;
                    price + reversion + price * self.rng.gen_range(-0.0005..0.0005)
                }
                MarketScenario::Volatile => {
                    (price * (1.0 + self.rng.gen_range(-0.004..0.004))).max(self.base_price * 0.5)
                }
                MarketScenario::WithGaps => price * (1.0 + self.rng.gen_range(-0.0005..0.0005)),
                MarketScenario::Flat => self.base_price,
            };

            // Tick prices are quoted to the paisa
            let quoted = (price * 100.0).round() / 100.0;
            let volume = (self.base_volume * self.rng.gen_range(0.5..1.5)).round();

            trades.push((timestamp, quoted, volume));
        }

        accumulate_trades(trades)
    }
}
