//! Vital-Sign Data Model
//!
//! Core types shared across the monitoring pipeline: vital kinds, readings,
//! severities, and the sensor acquisition boundary.

mod reading;
mod sensor;

pub use reading::{Reading, Severity, Unit, VitalKind};
pub use sensor::{ReadingSource, SensorError, SensorInput, SimulatedSensor};
