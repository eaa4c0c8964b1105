//! Vital-Sign Classifier
//!
//! Compares readings against per-vital threshold tables and confirms
//! sustained trends over a rolling window. Thresholds are validated at
//! load time; evaluation never fails.

mod classify;
mod error;
mod thresholds;

pub use classify::{Classification, Classifier, TrendPolicy};
pub use error::ConfigError;
pub use thresholds::{ThresholdSet, ThresholdTable};
