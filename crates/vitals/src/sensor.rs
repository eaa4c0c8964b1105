//! Sensor Acquisition Boundary
//!
//! The engine consumes `SensorInput`s from anything implementing
//! `ReadingSource`. Real hardware (pulse oximeter on I2C, 1-Wire
//! thermometer) lives behind this boundary; `SimulatedSensor` stands in
//! when no hardware is attached.

use crate::reading::{Reading, VitalKind};
use thiserror::Error;
use tracing::{debug, info};

/// Errors reported by a sensor instead of a value
#[derive(Debug, Clone, Error)]
pub enum SensorError {
    /// The device did not answer within its read window
    #[error("sensor read failed: {0}")]
    ReadFailed(String),

    /// The device produced a value outside its physical range
    #[error("{vital} value {value} outside physical range [{min}, {max}]")]
    OutOfPhysicalRange {
        vital: VitalKind,
        value: f64,
        min: f64,
        max: f64,
    },

    /// The device is not connected or not initialized
    #[error("sensor not connected")]
    NotConnected,
}

/// One acquisition result for one vital
#[derive(Debug, Clone)]
pub enum SensorInput {
    /// A valid measurement
    Sample(Reading),
    /// The sensor for this vital could not produce a value
    Offline { vital: VitalKind, error: SensorError },
}

impl SensorInput {
    /// The vital this input refers to
    pub fn vital(&self) -> VitalKind {
        match self {
            SensorInput::Sample(r) => r.vital,
            SensorInput::Offline { vital, .. } => *vital,
        }
    }
}

/// Source of vital-sign inputs, polled once per acquisition tick
pub trait ReadingSource: Send {
    /// Produce one input per attached vital for the current tick
    fn poll(&mut self, timestamp_ms: u64) -> Vec<SensorInput>;
}

/// Physical plausibility bounds enforced at the acquisition boundary.
/// Values outside these are sensor faults, not clinical events.
const HR_PHYSICAL: (f64, f64) = (30.0, 250.0);
const SPO2_PHYSICAL: (f64, f64) = (70.0, 100.0);
const TEMP_PHYSICAL: (f64, f64) = (30.0, 42.0);

/// Validate a raw value against the vital's physical range
pub(crate) fn check_physical(vital: VitalKind, value: f64) -> Result<f64, SensorError> {
    let (min, max) = match vital {
        VitalKind::HeartRate => HR_PHYSICAL,
        VitalKind::SpO2 => SPO2_PHYSICAL,
        VitalKind::Temperature => TEMP_PHYSICAL,
    };
    if value < min || value > max {
        Err(SensorError::OutOfPhysicalRange {
            vital,
            value,
            min,
            max,
        })
    } else {
        Ok(value)
    }
}

/// Simulated sensor bank (no hardware required)
///
/// Generates pseudo-random but deterministic values hashed from the
/// timestamp, so runs are reproducible for a given tick sequence.
pub struct SimulatedSensor {
    /// Inject an offline result for every vital once every N polls (0 = never)
    offline_every: u64,
    /// Polls performed so far
    poll_count: u64,
}

impl SimulatedSensor {
    /// Create a simulated sensor that never goes offline
    pub fn new() -> Self {
        info!("Creating simulated sensor bank");
        Self {
            offline_every: 0,
            poll_count: 0,
        }
    }

    /// Create a simulated sensor that reports offline every `n`th poll
    pub fn with_offline_every(n: u64) -> Self {
        info!("Creating simulated sensor bank (offline every {} polls)", n);
        Self {
            offline_every: n,
            poll_count: 0,
        }
    }

    fn hash_for(&self, vital: VitalKind, timestamp_ms: u64) -> u64 {
        use std::collections::hash_map::DefaultHasher;
        use std::hash::{Hash, Hasher};

        let mut hasher = DefaultHasher::new();
        timestamp_ms.hash(&mut hasher);
        vital.as_str().hash(&mut hasher);
        hasher.finish()
    }

    fn simulate(&self, vital: VitalKind, timestamp_ms: u64) -> Reading {
        let hash = self.hash_for(vital, timestamp_ms);
        let value = match vital {
            // Resting heart rate 70-80 bpm
            VitalKind::HeartRate => 70.0 + (hash % 11) as f64,
            // Healthy saturation 95-99%
            VitalKind::SpO2 => 95.0 + (hash % 5) as f64,
            // Normothermia 36.5-37.1°C
            VitalKind::Temperature => 36.5 + (hash % 7) as f64 / 10.0,
        };
        Reading::new(vital, value, timestamp_ms)
    }
}

impl Default for SimulatedSensor {
    fn default() -> Self {
        Self::new()
    }
}

impl ReadingSource for SimulatedSensor {
    fn poll(&mut self, timestamp_ms: u64) -> Vec<SensorInput> {
        self.poll_count += 1;

        if self.offline_every != 0 && self.poll_count % self.offline_every == 0 {
            debug!("Simulated sensor bank offline for poll {}", self.poll_count);
            return VitalKind::ALL
                .iter()
                .map(|&vital| SensorInput::Offline {
                    vital,
                    error: SensorError::ReadFailed("simulated dropout".to_string()),
                })
                .collect();
        }

        VitalKind::ALL
            .iter()
            .map(|&vital| {
                let reading = self.simulate(vital, timestamp_ms);
                match check_physical(vital, reading.value) {
                    Ok(_) => SensorInput::Sample(reading),
                    Err(error) => SensorInput::Offline { vital, error },
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simulated_values_in_physical_range() {
        let mut sensor = SimulatedSensor::new();
        for tick in 0..100u64 {
            for input in sensor.poll(tick * 1000) {
                match input {
                    SensorInput::Sample(r) => {
                        assert!(check_physical(r.vital, r.value).is_ok());
                    }
                    SensorInput::Offline { .. } => panic!("unexpected offline"),
                }
            }
        }
    }

    #[test]
    fn test_simulated_values_deterministic() {
        let mut a = SimulatedSensor::new();
        let mut b = SimulatedSensor::new();
        let left = a.poll(42_000);
        let right = b.poll(42_000);
        for (l, r) in left.iter().zip(right.iter()) {
            match (l, r) {
                (SensorInput::Sample(x), SensorInput::Sample(y)) => assert_eq!(x.value, y.value),
                _ => panic!("expected samples"),
            }
        }
    }

    #[test]
    fn test_offline_injection() {
        let mut sensor = SimulatedSensor::with_offline_every(3);
        let mut offline_polls = 0;
        for tick in 0..9u64 {
            let inputs = sensor.poll(tick * 1000);
            if matches!(inputs[0], SensorInput::Offline { .. }) {
                offline_polls += 1;
            }
        }
        assert_eq!(offline_polls, 3);
    }

    #[test]
    fn test_physical_range_rejection() {
        assert!(check_physical(VitalKind::HeartRate, 300.0).is_err());
        assert!(check_physical(VitalKind::SpO2, 50.0).is_err());
        assert!(check_physical(VitalKind::Temperature, 36.8).is_ok());
    }
}
