pub mod config;
pub mod validation;

pub use config::ScoringConfig;
pub use validation::{validate_scoring, ScoringError};
