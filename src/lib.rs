// Core modules
pub mod engine;
pub mod error;
pub mod feed;
pub mod indicators;
pub mod models;
pub mod report;
pub mod session;
pub mod settings;
pub mod simulation;
pub mod strategy;

// Re-export commonly used types
pub use engine::{Analysis, ScanReport, TrendEngine};
pub use error::AnalysisError;
pub use models::*;

// Error handling
pub type Result<T> = std::result::Result<T, AnalysisError>;
