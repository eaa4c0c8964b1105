//! Classification with Trend Confirmation

use crate::error::ConfigError;
use crate::thresholds::ThresholdTable;
use serde::{Deserialize, Serialize};
use tracing::debug;
use trend_window::{TrendSample, TrendWindow};
use vitals::{Reading, Severity, VitalKind};

/// Trend confirmation policy: at least `required` of the last `window`
/// samples must agree before a Warning counts as sustained.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TrendPolicy {
    /// Window size N
    pub window: usize,
    /// Required agreeing samples K
    pub required: usize,
}

impl Default for TrendPolicy {
    fn default() -> Self {
        Self {
            window: 5,
            required: 3,
        }
    }
}

impl TrendPolicy {
    /// Reject unsatisfiable policies (K > N, zero sizes)
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.window == 0 {
            return Err(ConfigError::BadTrendPolicy(
                "window size must be at least 1".to_string(),
            ));
        }
        if self.required == 0 {
            return Err(ConfigError::BadTrendPolicy(
                "required sample count must be at least 1".to_string(),
            ));
        }
        if self.required > self.window {
            return Err(ConfigError::BadTrendPolicy(format!(
                "required samples {} exceeds window size {}",
                self.required, self.window
            )));
        }
        Ok(())
    }
}

/// Outcome of classifying one reading
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    /// Which vital was classified
    pub vital: VitalKind,
    /// Severity of this sample
    pub severity: Severity,
    /// Value in the vital's base unit
    pub value: f64,
    /// Whether enough recent samples agree at this severity.
    /// Always true for Critical: a single critical sample is reported.
    pub trend_confirmed: bool,
    /// Clinical description of the finding
    pub message: String,
}

/// Stateless classifier over a validated threshold table.
/// Safe to share across vital paths; the per-vital window is passed in
/// by the caller and is the only thing mutated.
#[derive(Debug, Clone)]
pub struct Classifier {
    thresholds: ThresholdTable,
    trend: TrendPolicy,
}

impl Classifier {
    /// Create a classifier, rejecting invalid configuration
    pub fn new(thresholds: ThresholdTable, trend: TrendPolicy) -> Result<Self, ConfigError> {
        thresholds.validate()?;
        trend.validate()?;
        Ok(Self { thresholds, trend })
    }

    /// A fresh trend window sized to this classifier's policy
    pub fn make_window(&self) -> TrendWindow {
        TrendWindow::new(self.trend.window)
    }

    /// The threshold table in use
    pub fn thresholds(&self) -> &ThresholdTable {
        &self.thresholds
    }

    /// Classify one reading, appending it to the vital's window
    pub fn classify(&self, reading: &Reading, window: &mut TrendWindow) -> Classification {
        let value = reading.base_value();
        let set = self.thresholds.get(reading.vital);
        let severity = set.severity_of(value);

        window.push(TrendSample {
            value,
            severity,
            timestamp_ms: reading.timestamp_ms,
        });

        // Critical is reported on the first sample; trend confirmation
        // only gates Warning-level escalation.
        let trend_confirmed = severity == Severity::Critical
            || window.count_at_or_above(severity) >= self.trend.required;

        let message = describe(reading.vital, severity, value, set.crossed_bound(value, severity));

        debug!(
            vital = %reading.vital,
            %severity,
            value,
            trend_confirmed,
            "classified reading"
        );

        Classification {
            vital: reading.vital,
            severity,
            value,
            trend_confirmed,
            message,
        }
    }
}

/// Clinical wording for a classified value
fn describe(vital: VitalKind, severity: Severity, value: f64, bound: Option<f64>) -> String {
    let text = match (vital, severity) {
        (_, Severity::Normal) => format!("{} within normal range", vital),
        (VitalKind::HeartRate, Severity::Critical) if below(value, bound) => format!(
            "Critical bradycardia detected: {:.0} bpm (extremely low heart rate)",
            value
        ),
        (VitalKind::HeartRate, Severity::Critical) => format!(
            "Critical tachycardia detected: {:.0} bpm (extremely high heart rate)",
            value
        ),
        (VitalKind::HeartRate, Severity::Warning) if below(value, bound) => {
            format!("Bradycardia detected: {:.0} bpm (low heart rate)", value)
        }
        (VitalKind::HeartRate, Severity::Warning) => {
            format!("Tachycardia detected: {:.0} bpm (high heart rate)", value)
        }
        (VitalKind::SpO2, Severity::Critical) => format!(
            "Critical hypoxemia detected: {:.0}% (dangerously low blood oxygen)",
            value
        ),
        (VitalKind::SpO2, Severity::Warning) => {
            format!("Low blood oxygen detected: {:.0}%", value)
        }
        (VitalKind::Temperature, Severity::Critical) if below(value, bound) => format!(
            "Critical hypothermia detected: {:.1}°C (dangerously low temperature)",
            value
        ),
        (VitalKind::Temperature, Severity::Critical) => format!(
            "Critical hyperthermia detected: {:.1}°C (dangerously high temperature)",
            value
        ),
        (VitalKind::Temperature, Severity::Warning) if below(value, bound) => {
            format!("Low body temperature detected: {:.1}°C", value)
        }
        (VitalKind::Temperature, Severity::Warning) => {
            format!("Fever detected: {:.1}°C", value)
        }
    };
    match (severity, bound) {
        (Severity::Normal, _) | (_, None) => text,
        (_, Some(b)) => format!("{} (threshold {})", text, b),
    }
}

fn below(value: f64, bound: Option<f64>) -> bool {
    bound.map_or(false, |b| value < b)
}
