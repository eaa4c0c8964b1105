//! Classifier Configuration Errors

use thiserror::Error;
use vitals::VitalKind;

/// Errors rejected at configuration load, never at evaluation time
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    /// Threshold boundaries are not strictly ordered
    #[error("{vital}: {detail}")]
    UnorderedThresholds { vital: VitalKind, detail: String },

    /// Trend policy is unsatisfiable
    #[error("trend policy invalid: {0}")]
    BadTrendPolicy(String),
}
