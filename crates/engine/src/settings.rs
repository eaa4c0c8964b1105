//! Engine Configuration
//!
//! Layered defaults plus an optional configuration file. Every tunable
//! the pipeline exposes lives here; all of it is validated at load, and
//! none of it is mutated at runtime (reload swaps the whole engine).

use alerting::AlertManagerConfig;
use channels::{DispatchConfig, EmailConfig, LocalConfig, SmsConfig};
use classifier::{ThresholdTable, TrendPolicy};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use storage::RetentionConfig;
use thiserror::Error;
use tracing::info;

/// Fatal engine errors. Configuration problems surface here at startup;
/// nothing in this enum is produced while readings are being processed.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Configuration file could not be read or parsed
    #[error("configuration file error: {0}")]
    ConfigFile(#[from] config::ConfigError),

    /// Threshold table or trend policy invalid
    #[error(transparent)]
    Thresholds(#[from] classifier::ConfigError),

    /// Alerting configuration invalid
    #[error(transparent)]
    Alerts(#[from] alerting::AlertError),

    /// Any other invalid configuration value
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Cooldown, hysteresis, and offline tolerance settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertsConfig {
    /// Cooldown between repeat Warning notifications (seconds)
    pub warning_cooldown_secs: u64,
    /// Cooldown between repeat Critical notifications (seconds)
    pub critical_cooldown_secs: u64,
    /// Consecutive Normal classifications required to close an incident
    pub hysteresis: u32,
    /// Consecutive offline reads tolerated before a warning
    pub offline_grace: u32,
}

impl Default for AlertsConfig {
    fn default() -> Self {
        Self {
            warning_cooldown_secs: 15 * 60,
            critical_cooldown_secs: 2 * 60,
            hysteresis: 3,
            offline_grace: 5,
        }
    }
}

impl AlertsConfig {
    /// Convert to the alert manager's internal configuration
    pub fn to_manager_config(&self) -> AlertManagerConfig {
        AlertManagerConfig {
            warning_cooldown: Duration::from_secs(self.warning_cooldown_secs),
            critical_cooldown: Duration::from_secs(self.critical_cooldown_secs),
            hysteresis: self.hysteresis,
            offline_grace: self.offline_grace,
        }
    }
}

/// Per-channel configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChannelsConfig {
    pub email: EmailConfig,
    pub sms: SmsConfig,
    pub local: LocalConfig,
}

/// Complete engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Acquisition interval in milliseconds (default 1 Hz)
    pub sample_interval_ms: u64,
    /// Bounded depth of the per-vital and dispatch queues
    pub queue_depth: usize,
    /// Clinical thresholds per vital
    pub thresholds: ThresholdTable,
    /// Trend confirmation policy (K of N)
    pub trend: TrendPolicy,
    /// Cooldown/hysteresis settings
    pub alerts: AlertsConfig,
    /// Dispatch retry and timeout settings
    pub dispatch: DispatchConfig,
    /// Channel enablement and credentials
    pub channels: ChannelsConfig,
    /// History retention limits
    pub retention: RetentionConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            sample_interval_ms: 1000,
            queue_depth: 64,
            thresholds: ThresholdTable::default(),
            trend: TrendPolicy::default(),
            alerts: AlertsConfig::default(),
            dispatch: DispatchConfig::default(),
            channels: ChannelsConfig::default(),
            retention: RetentionConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Load configuration: built-in defaults overlaid with an optional
    /// file. Everything is validated before the engine starts.
    pub fn load(path: Option<&str>) -> Result<Self, EngineError> {
        let mut builder =
            config::Config::builder().add_source(config::Config::try_from(&EngineConfig::default())?);

        if let Some(path) = path {
            info!(path, "Loading configuration file");
            builder = builder.add_source(config::File::with_name(path));
        }

        let loaded: EngineConfig = builder.build()?.try_deserialize()?;
        loaded.validate()?;
        Ok(loaded)
    }

    /// Reject invalid configuration before any reading is processed
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.sample_interval_ms == 0 {
            return Err(EngineError::Invalid(
                "sample_interval_ms must be non-zero".to_string(),
            ));
        }
        if self.queue_depth == 0 {
            return Err(EngineError::Invalid(
                "queue_depth must be non-zero".to_string(),
            ));
        }
        if self.dispatch.attempt_timeout_ms == 0 {
            return Err(EngineError::Invalid(
                "dispatch.attempt_timeout_ms must be non-zero".to_string(),
            ));
        }
        self.thresholds.validate()?;
        self.trend.validate()?;
        self.alerts.to_manager_config().validate()?;
        Ok(())
    }
}
