// Synthetic tick sessions for demos and tests
pub mod synthetic;

pub use synthetic::{MarketScenario, SyntheticSessionGenerator};
