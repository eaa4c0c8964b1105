//! Per-Vital Incident State

use std::collections::HashMap;
use std::time::Instant;
use tracing::warn;
use vitals::{Severity, VitalKind};

/// An open abnormal episode for one vital
#[derive(Debug, Clone)]
pub struct Incident {
    /// Maximum severity seen since the incident opened
    pub severity: Severity,
    /// When the incident opened
    pub opened_at: Instant,
    /// When the last notification for it was sent
    pub last_notified_at: Instant,
    /// Repeat notifications are suppressed until this instant
    pub cooldown_until: Instant,
    /// Consecutive Normal classifications seen since the last abnormal one
    pub normal_run: u32,
}

/// Tracks at most one open incident per vital kind
#[derive(Debug, Default)]
pub struct IncidentTracker {
    incidents: HashMap<VitalKind, Incident>,
}

impl IncidentTracker {
    /// Create an empty tracker
    pub fn new() -> Self {
        Self::default()
    }

    /// The open incident for a vital, if any
    pub fn get(&self, vital: VitalKind) -> Option<&Incident> {
        self.incidents.get(&vital)
    }

    /// Mutable access to the open incident for a vital
    pub fn get_mut(&mut self, vital: VitalKind) -> Option<&mut Incident> {
        self.incidents.get_mut(&vital)
    }

    /// Open an incident. Invariant: the vital must not already have one;
    /// in debug builds a violation panics, in release the stale incident
    /// is replaced and logged.
    pub fn open(&mut self, vital: VitalKind, severity: Severity, now: Instant, cooldown_until: Instant) {
        let replaced = self.incidents.insert(
            vital,
            Incident {
                severity,
                opened_at: now,
                last_notified_at: now,
                cooldown_until,
                normal_run: 0,
            },
        );
        if replaced.is_some() {
            debug_assert!(false, "duplicate incident for {vital}");
            warn!(%vital, "replaced stale incident; invariant violated");
        }
    }

    /// Close the incident for a vital, returning it
    pub fn close(&mut self, vital: VitalKind) -> Option<Incident> {
        self.incidents.remove(&vital)
    }

    /// Number of currently open incidents
    pub fn open_count(&self) -> usize {
        self.incidents.len()
    }
}
