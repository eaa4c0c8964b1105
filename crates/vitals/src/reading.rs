//! Reading and Severity Types

use serde::{Deserialize, Serialize};

/// The vital signs tracked by the monitor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VitalKind {
    /// Heart rate in beats per minute
    HeartRate,
    /// Blood oxygen saturation in percent
    SpO2,
    /// Body temperature
    Temperature,
}

impl VitalKind {
    /// All tracked vital kinds
    pub const ALL: [VitalKind; 3] = [VitalKind::HeartRate, VitalKind::SpO2, VitalKind::Temperature];

    /// Short name used in logs and stored records
    pub fn as_str(&self) -> &'static str {
        match self {
            VitalKind::HeartRate => "heart_rate",
            VitalKind::SpO2 => "spo2",
            VitalKind::Temperature => "temperature",
        }
    }

    /// The base unit readings of this vital are evaluated in
    pub fn base_unit(&self) -> Unit {
        match self {
            VitalKind::HeartRate => Unit::Bpm,
            VitalKind::SpO2 => Unit::Percent,
            VitalKind::Temperature => Unit::Celsius,
        }
    }
}

impl std::fmt::Display for VitalKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Measurement unit of a reading
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Unit {
    /// Beats per minute
    Bpm,
    /// Percent (0-100)
    Percent,
    /// Degrees Celsius
    Celsius,
    /// Degrees Fahrenheit
    Fahrenheit,
}

impl Unit {
    /// Unit suffix for display
    pub fn suffix(&self) -> &'static str {
        match self {
            Unit::Bpm => "bpm",
            Unit::Percent => "%",
            Unit::Celsius => "°C",
            Unit::Fahrenheit => "°F",
        }
    }
}

/// A single vital-sign measurement, immutable once created
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    /// Which vital was measured
    pub vital: VitalKind,
    /// Measured value in `unit`
    pub value: f64,
    /// Unit the value was measured in
    pub unit: Unit,
    /// Acquisition time (milliseconds since the Unix epoch)
    pub timestamp_ms: u64,
}

impl Reading {
    /// Create a reading in the vital's base unit
    pub fn new(vital: VitalKind, value: f64, timestamp_ms: u64) -> Self {
        Self {
            vital,
            value,
            unit: vital.base_unit(),
            timestamp_ms,
        }
    }

    /// Create a reading in an explicit unit
    pub fn with_unit(vital: VitalKind, value: f64, unit: Unit, timestamp_ms: u64) -> Self {
        Self {
            vital,
            value,
            unit,
            timestamp_ms,
        }
    }

    /// Value converted to the vital's base unit (°F readings become °C)
    pub fn base_value(&self) -> f64 {
        match (self.unit, self.vital.base_unit()) {
            (Unit::Fahrenheit, Unit::Celsius) => (self.value - 32.0) * 5.0 / 9.0,
            _ => self.value,
        }
    }
}

/// How abnormal a classified reading is, totally ordered
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
pub enum Severity {
    /// Within normal bounds
    #[default]
    Normal,
    /// Outside normal bounds but within critical bounds
    Warning,
    /// Outside critical bounds
    Critical,
}

impl Severity {
    /// Label used in logs and stored records
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Normal => "normal",
            Severity::Warning => "warning",
            Severity::Critical => "critical",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
