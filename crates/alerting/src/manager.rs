//! Alert Manager Implementation

use crate::clock::Clock;
use crate::incident::IncidentTracker;
use chrono::{DateTime, Utc};
use classifier::Classification;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;
use vitals::{SensorError, Severity, VitalKind};

/// Alerting configuration errors, rejected at startup
#[derive(Debug, Clone, Error)]
pub enum AlertError {
    /// Configuration value is unusable
    #[error("invalid alert configuration: {0}")]
    Config(String),
}

/// Alert manager configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertManagerConfig {
    /// Cooldown between repeat Warning notifications
    pub warning_cooldown: Duration,
    /// Cooldown between repeat Critical notifications (shorter: critical
    /// conditions are re-announced sooner)
    pub critical_cooldown: Duration,
    /// Consecutive Normal classifications required to close an incident
    pub hysteresis: u32,
    /// Consecutive offline inputs tolerated before a "sensor offline"
    /// warning is raised
    pub offline_grace: u32,
}

impl Default for AlertManagerConfig {
    fn default() -> Self {
        Self {
            warning_cooldown: Duration::from_secs(15 * 60),
            critical_cooldown: Duration::from_secs(2 * 60),
            hysteresis: 3,
            offline_grace: 5,
        }
    }
}

impl AlertManagerConfig {
    /// Reject zero durations and counts
    pub fn validate(&self) -> Result<(), AlertError> {
        if self.warning_cooldown.is_zero() || self.critical_cooldown.is_zero() {
            return Err(AlertError::Config(
                "cooldown durations must be non-zero".to_string(),
            ));
        }
        if self.hysteresis == 0 {
            return Err(AlertError::Config(
                "hysteresis count must be at least 1".to_string(),
            ));
        }
        if self.offline_grace == 0 {
            return Err(AlertError::Config(
                "offline grace count must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    fn cooldown_for(&self, severity: Severity) -> Duration {
        match severity {
            Severity::Critical => self.critical_cooldown,
            _ => self.warning_cooldown,
        }
    }
}

/// Urgency of a notification as delivered to channels
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AlertLevel {
    /// Informational (incident resolved)
    Info,
    /// Abnormal but not immediately dangerous
    Warning,
    /// Immediately dangerous
    Critical,
}

impl AlertLevel {
    /// Label used in logs and stored records
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertLevel::Info => "info",
            AlertLevel::Warning => "warning",
            AlertLevel::Critical => "critical",
        }
    }
}

impl std::fmt::Display for AlertLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<Severity> for AlertLevel {
    fn from(severity: Severity) -> Self {
        match severity {
            Severity::Normal => AlertLevel::Info,
            Severity::Warning => AlertLevel::Warning,
            Severity::Critical => AlertLevel::Critical,
        }
    }
}

/// A single approved alert, consumed once by the dispatcher
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    /// Unique notification id
    pub id: Uuid,
    /// Vital the alert concerns
    pub vital: VitalKind,
    /// Delivery urgency
    pub level: AlertLevel,
    /// Human-readable description
    pub message: String,
    /// Offending value, absent for sensor-offline and resolved alerts
    pub value: Option<f64>,
    /// Wall-clock creation time, for display and history only
    pub created_at: DateTime<Utc>,
}

impl Notification {
    fn new(vital: VitalKind, level: AlertLevel, message: String, value: Option<f64>) -> Self {
        Self {
            id: Uuid::new_v4(),
            vital,
            level,
            message,
            value,
            created_at: Utc::now(),
        }
    }
}

/// Decides which classifications become notifications.
///
/// Owns the per-vital incident state; all timing decisions go through the
/// injected monotonic clock.
pub struct AlertManager {
    config: AlertManagerConfig,
    tracker: IncidentTracker,
    offline_runs: HashMap<VitalKind, u32>,
    clock: Arc<dyn Clock>,
}

impl AlertManager {
    /// Create a manager, rejecting invalid configuration
    pub fn new(config: AlertManagerConfig, clock: Arc<dyn Clock>) -> Result<Self, AlertError> {
        config.validate()?;
        info!(?config, "Creating alert manager");
        Ok(Self {
            config,
            tracker: IncidentTracker::new(),
            offline_runs: HashMap::new(),
            clock,
        })
    }

    /// Evaluate one classification against the vital's incident state
    pub fn evaluate(&mut self, classification: &Classification) -> Option<Notification> {
        // A valid sample means the sensor is back
        self.offline_runs.remove(&classification.vital);

        self.evaluate_inner(
            classification.vital,
            classification.severity,
            classification.trend_confirmed,
            classification.message.clone(),
            Some(classification.value),
        )
    }

    /// Record an offline input for a vital. Informational until the
    /// configured grace count is exceeded, then raised as a Warning
    /// through the normal incident path.
    pub fn evaluate_offline(&mut self, vital: VitalKind, error: &SensorError) -> Option<Notification> {
        let run = self.offline_runs.entry(vital).or_insert(0);
        *run += 1;
        let run = *run;

        if run < self.config.offline_grace {
            debug!(%vital, run, %error, "sensor offline, within grace");
            return None;
        }

        let message = format!(
            "{} sensor offline for {} consecutive reads ({})",
            vital, run, error
        );
        self.evaluate_inner(vital, Severity::Warning, true, message, None)
    }

    fn evaluate_inner(
        &mut self,
        vital: VitalKind,
        severity: Severity,
        trend_confirmed: bool,
        message: String,
        value: Option<f64>,
    ) -> Option<Notification> {
        let now = self.clock.now();

        if self.tracker.get(vital).is_none() {
            if severity == Severity::Normal {
                return None;
            }
            if severity == Severity::Warning && !trend_confirmed {
                debug!(%vital, "warning not trend-confirmed, suppressed");
                return None;
            }

            let cooldown_until = now + self.config.cooldown_for(severity);
            self.tracker.open(vital, severity, now, cooldown_until);
            info!(%vital, %severity, "incident opened");
            return Some(Notification::new(vital, severity.into(), message, value));
        }

        let incident = self.tracker.get_mut(vital)?;

        if severity == Severity::Normal {
            incident.normal_run += 1;
            if incident.normal_run < self.config.hysteresis {
                debug!(
                    %vital,
                    run = incident.normal_run,
                    needed = self.config.hysteresis,
                    "normal classification counts toward hysteresis"
                );
                return None;
            }

            let closed = self.tracker.close(vital)?;
            info!(%vital, severity = %closed.severity, "incident resolved");
            let message = format!("{} recovered: back within normal range", vital);
            return Some(Notification::new(vital, AlertLevel::Info, message, value));
        }

        // Any abnormal classification interrupts a closing run
        incident.normal_run = 0;

        if severity > incident.severity {
            // Escalation always notifies; cooldown never suppresses an upgrade
            incident.severity = severity;
            incident.last_notified_at = now;
            incident.cooldown_until = now + self.config.cooldown_for(severity);
            warn!(%vital, %severity, "incident escalated");
            return Some(Notification::new(vital, severity.into(), message, value));
        }

        if severity < incident.severity {
            // Residual abnormality below the incident's peak: keep the
            // incident at its maximum severity, do not re-announce
            debug!(%vital, %severity, incident_severity = %incident.severity, "below incident severity");
            return None;
        }

        if now < incident.cooldown_until {
            debug!(%vital, %severity, "repeat notification suppressed by cooldown");
            return None;
        }

        incident.last_notified_at = now;
        incident.cooldown_until = now + self.config.cooldown_for(severity);
        info!(%vital, %severity, "repeat notification after cooldown");
        Some(Notification::new(vital, severity.into(), message, value))
    }

    /// The underlying incident tracker (read-only)
    pub fn incidents(&self) -> &IncidentTracker {
        &self.tracker
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use classifier::Classification;

    fn manager(clock: Arc<ManualClock>) -> AlertManager {
        let config = AlertManagerConfig {
            warning_cooldown: Duration::from_secs(900),
            critical_cooldown: Duration::from_secs(120),
            hysteresis: 3,
            offline_grace: 5,
        };
        AlertManager::new(config, clock).unwrap()
    }

    fn classification(severity: Severity, confirmed: bool) -> Classification {
        Classification {
            vital: VitalKind::HeartRate,
            severity,
            value: 55.0,
            trend_confirmed: confirmed,
            message: "test finding".to_string(),
        }
    }

    #[test]
    fn test_zero_cooldown_rejected() {
        let config = AlertManagerConfig {
            warning_cooldown: Duration::ZERO,
            ..Default::default()
        };
        assert!(AlertManager::new(config, Arc::new(ManualClock::new())).is_err());
    }

    #[test]
    fn test_normal_while_closed_is_idempotent() {
        let clock = Arc::new(ManualClock::new());
        let mut manager = manager(clock);
        for _ in 0..10 {
            assert!(manager
                .evaluate(&classification(Severity::Normal, true))
                .is_none());
        }
        assert_eq!(manager.incidents().open_count(), 0);
    }

    #[test]
    fn test_unconfirmed_warning_does_not_open() {
        let clock = Arc::new(ManualClock::new());
        let mut manager = manager(clock);
        assert!(manager
            .evaluate(&classification(Severity::Warning, false))
            .is_none());
        assert_eq!(manager.incidents().open_count(), 0);
    }

    #[test]
    fn test_cooldown_suppresses_repeat() {
        let clock = Arc::new(ManualClock::new());
        let mut manager = manager(clock.clone());

        let first = manager.evaluate(&classification(Severity::Warning, true));
        assert!(first.is_some());

        // Within cooldown: exactly one notification was produced
        clock.advance(Duration::from_secs(60));
        assert!(manager
            .evaluate(&classification(Severity::Warning, true))
            .is_none());

        // Past cooldown: re-announced
        clock.advance(Duration::from_secs(900));
        assert!(manager
            .evaluate(&classification(Severity::Warning, true))
            .is_some());
    }

    #[test]
    fn test_escalation_bypasses_cooldown() {
        let clock = Arc::new(ManualClock::new());
        let mut manager = manager(clock.clone());

        manager.evaluate(&classification(Severity::Warning, true));
        clock.advance(Duration::from_secs(1));

        let escalated = manager.evaluate(&classification(Severity::Critical, true));
        assert_eq!(escalated.unwrap().level, AlertLevel::Critical);
        assert_eq!(
            manager
                .incidents()
                .get(VitalKind::HeartRate)
                .unwrap()
                .severity,
            Severity::Critical
        );
    }

    #[test]
    fn test_downgrade_keeps_severity_and_stays_quiet() {
        let clock = Arc::new(ManualClock::new());
        let mut manager = manager(clock.clone());

        manager.evaluate(&classification(Severity::Critical, true));
        clock.advance(Duration::from_secs(300));

        // Residual Warning after a Critical peak: no notification
        assert!(manager
            .evaluate(&classification(Severity::Warning, true))
            .is_none());
        assert_eq!(
            manager
                .incidents()
                .get(VitalKind::HeartRate)
                .unwrap()
                .severity,
            Severity::Critical
        );
    }

    #[test]
    fn test_hysteresis_closes_after_consecutive_normals() {
        let clock = Arc::new(ManualClock::new());
        let mut manager = manager(clock);

        manager.evaluate(&classification(Severity::Warning, true));

        assert!(manager
            .evaluate(&classification(Severity::Normal, true))
            .is_none());
        assert!(manager
            .evaluate(&classification(Severity::Normal, true))
            .is_none());

        let resolved = manager.evaluate(&classification(Severity::Normal, true));
        let resolved = resolved.unwrap();
        assert_eq!(resolved.level, AlertLevel::Info);
        assert!(resolved.message.contains("recovered"));
        assert_eq!(manager.incidents().open_count(), 0);
    }

    #[test]
    fn test_abnormal_resets_hysteresis() {
        let clock = Arc::new(ManualClock::new());
        let mut manager = manager(clock);

        manager.evaluate(&classification(Severity::Warning, true));
        manager.evaluate(&classification(Severity::Normal, true));
        manager.evaluate(&classification(Severity::Normal, true));

        // Abnormal sample interrupts the closing run
        manager.evaluate(&classification(Severity::Warning, true));

        manager.evaluate(&classification(Severity::Normal, true));
        manager.evaluate(&classification(Severity::Normal, true));
        assert_eq!(manager.incidents().open_count(), 1);

        let resolved = manager.evaluate(&classification(Severity::Normal, true));
        assert!(resolved.is_some());
    }

    #[test]
    fn test_offline_grace_then_warning() {
        let clock = Arc::new(ManualClock::new());
        let mut manager = manager(clock);
        let error = SensorError::NotConnected;

        for _ in 0..4 {
            assert!(manager
                .evaluate_offline(VitalKind::SpO2, &error)
                .is_none());
        }

        let raised = manager.evaluate_offline(VitalKind::SpO2, &error).unwrap();
        assert_eq!(raised.level, AlertLevel::Warning);
        assert!(raised.message.contains("offline"));
        assert!(raised.value.is_none());
    }

    #[test]
    fn test_sample_resets_offline_run() {
        let clock = Arc::new(ManualClock::new());
        let mut manager = manager(clock);
        let error = SensorError::NotConnected;

        for _ in 0..4 {
            manager.evaluate_offline(VitalKind::HeartRate, &error);
        }
        manager.evaluate(&classification(Severity::Normal, true));

        // The run restarts: four more offline inputs stay informational
        for _ in 0..4 {
            assert!(manager
                .evaluate_offline(VitalKind::HeartRate, &error)
                .is_none());
        }
    }
}
