//! Per-Vital Threshold Tables

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use vitals::{Severity, VitalKind};

/// Clinical boundaries for one vital.
///
/// Every vital has lower bounds; the upper bounds are optional because
/// oxygen saturation above 100% is not a hazard.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThresholdSet {
    /// Below this the reading is critical
    pub critical_low: f64,
    /// Below this (but above `critical_low`) the reading is a warning
    pub low: f64,
    /// Above this the reading is a warning, if present
    #[serde(default)]
    pub high: Option<f64>,
    /// Above this the reading is critical, if present
    #[serde(default)]
    pub critical_high: Option<f64>,
}

impl ThresholdSet {
    /// Check strict boundary ordering: critical_low < low < high < critical_high.
    /// Equal boundaries would create zero-width severity bands, so they are
    /// rejected along with reversed ones.
    pub fn validate(&self, vital: VitalKind) -> Result<(), ConfigError> {
        if self.critical_low >= self.low {
            return Err(ConfigError::UnorderedThresholds {
                vital,
                detail: format!(
                    "critical_low {} must be below low {}",
                    self.critical_low, self.low
                ),
            });
        }
        match (self.high, self.critical_high) {
            (Some(high), Some(critical_high)) => {
                if self.low >= high {
                    return Err(ConfigError::UnorderedThresholds {
                        vital,
                        detail: format!("low {} must be below high {}", self.low, high),
                    });
                }
                if high >= critical_high {
                    return Err(ConfigError::UnorderedThresholds {
                        vital,
                        detail: format!(
                            "high {} must be below critical_high {}",
                            high, critical_high
                        ),
                    });
                }
            }
            (None, None) => {}
            _ => {
                return Err(ConfigError::UnorderedThresholds {
                    vital,
                    detail: "high and critical_high must be configured together".to_string(),
                });
            }
        }
        Ok(())
    }

    /// Severity of a value in the vital's base unit
    pub fn severity_of(&self, value: f64) -> Severity {
        if value < self.critical_low {
            return Severity::Critical;
        }
        if let Some(critical_high) = self.critical_high {
            if value > critical_high {
                return Severity::Critical;
            }
        }
        if value < self.low {
            return Severity::Warning;
        }
        if let Some(high) = self.high {
            if value > high {
                return Severity::Warning;
            }
        }
        Severity::Normal
    }

    /// The boundary a value of the given severity crossed, for messages
    pub fn crossed_bound(&self, value: f64, severity: Severity) -> Option<f64> {
        match severity {
            Severity::Critical if value < self.critical_low => Some(self.critical_low),
            Severity::Critical => self.critical_high,
            Severity::Warning if value < self.low => Some(self.low),
            Severity::Warning => self.high,
            Severity::Normal => None,
        }
    }
}

/// Read-only table of thresholds for every tracked vital.
/// Shared across all vital paths after load; reconfiguration swaps the
/// whole table, never individual fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThresholdTable {
    pub heart_rate: ThresholdSet,
    pub spo2: ThresholdSet,
    pub temperature: ThresholdSet,
}

impl ThresholdTable {
    /// Thresholds for one vital
    pub fn get(&self, vital: VitalKind) -> &ThresholdSet {
        match vital {
            VitalKind::HeartRate => &self.heart_rate,
            VitalKind::SpO2 => &self.spo2,
            VitalKind::Temperature => &self.temperature,
        }
    }

    /// Validate every set, reporting the first violation
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.heart_rate.validate(VitalKind::HeartRate)?;
        self.spo2.validate(VitalKind::SpO2)?;
        self.temperature.validate(VitalKind::Temperature)?;
        Ok(())
    }
}

impl Default for ThresholdTable {
    fn default() -> Self {
        Self {
            heart_rate: ThresholdSet {
                critical_low: 40.0,
                low: 60.0,
                high: Some(100.0),
                critical_high: Some(150.0),
            },
            spo2: ThresholdSet {
                critical_low: 90.0,
                low: 95.0,
                high: None,
                critical_high: None,
            },
            temperature: ThresholdSet {
                critical_low: 35.0,
                low: 36.1,
                high: Some(37.8),
                critical_high: Some(39.0),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_table_valid() {
        assert!(ThresholdTable::default().validate().is_ok());
    }

    #[test]
    fn test_unordered_bounds_rejected() {
        let set = ThresholdSet {
            critical_low: 70.0,
            low: 60.0,
            high: Some(100.0),
            critical_high: Some(150.0),
        };
        assert!(set.validate(VitalKind::HeartRate).is_err());

        let set = ThresholdSet {
            critical_low: 40.0,
            low: 60.0,
            high: Some(160.0),
            critical_high: Some(150.0),
        };
        assert!(set.validate(VitalKind::HeartRate).is_err());
    }

    #[test]
    fn test_equal_bounds_rejected() {
        // Zero-width severity bands
        let set = ThresholdSet {
            critical_low: 40.0,
            low: 60.0,
            high: Some(60.0),
            critical_high: Some(150.0),
        };
        assert!(set.validate(VitalKind::HeartRate).is_err());

        let set = ThresholdSet {
            critical_low: 90.0,
            low: 90.0,
            high: None,
            critical_high: None,
        };
        assert!(set.validate(VitalKind::SpO2).is_err());
    }

    #[test]
    fn test_lone_upper_bound_rejected() {
        let set = ThresholdSet {
            critical_low: 90.0,
            low: 95.0,
            high: Some(99.0),
            critical_high: None,
        };
        assert!(set.validate(VitalKind::SpO2).is_err());
    }

    #[test]
    fn test_severity_bands() {
        let hr = ThresholdTable::default().heart_rate;
        assert_eq!(hr.severity_of(72.0), Severity::Normal);
        assert_eq!(hr.severity_of(55.0), Severity::Warning);
        assert_eq!(hr.severity_of(110.0), Severity::Warning);
        assert_eq!(hr.severity_of(35.0), Severity::Critical);
        assert_eq!(hr.severity_of(160.0), Severity::Critical);
    }

    #[test]
    fn test_spo2_has_no_upper_hazard() {
        let spo2 = ThresholdTable::default().spo2;
        assert_eq!(spo2.severity_of(100.0), Severity::Normal);
        assert_eq!(spo2.severity_of(92.0), Severity::Warning);
        assert_eq!(spo2.severity_of(88.0), Severity::Critical);
    }
}
