// Scoring, verdicts, trade setups and opportunity ranking
pub mod ranker;
pub mod signals;
pub mod trade_setup;

pub use ranker::{compare_opportunity, rank_by};
pub use signals::{score_indicators, verdict_for, SignalConfig};
pub use trade_setup::build_trade_setup;
