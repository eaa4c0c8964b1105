//! Alert Decision Layer
//!
//! Turns classifications into notifications: opens, escalates, and closes
//! incidents per vital, enforces per-severity cooldowns and close
//! hysteresis, and escalates persistent sensor unavailability.

mod clock;
mod incident;
mod manager;

pub use clock::{Clock, ManualClock, MonotonicClock};
pub use incident::{Incident, IncidentTracker};
pub use manager::{AlertError, AlertLevel, AlertManager, AlertManagerConfig, Notification};
