//! Channel Dispatcher Implementation

use crate::channel::{Channel, ChannelError, ChannelKind};
use alerting::Notification;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Dispatch retry and timeout configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchConfig {
    /// Retries after the first attempt for transient failures
    pub max_retries: u8,
    /// Backoff base between attempts (multiplied by the attempt number)
    pub retry_backoff_ms: u64,
    /// Hard timeout per delivery attempt
    pub attempt_timeout_ms: u64,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            max_retries: 2,
            retry_backoff_ms: 250,
            attempt_timeout_ms: 2000,
        }
    }
}

/// Outcome of delivering one notification to one channel
#[derive(Debug)]
pub struct ChannelOutcome {
    /// Which channel was attempted
    pub kind: ChannelKind,
    /// Attempts made, including the successful one
    pub attempts: u8,
    /// Final result after retries
    pub result: Result<(), ChannelError>,
}

/// Aggregate delivery state of one notification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Delivery {
    /// Every eligible channel accepted the notification
    Delivered,
    /// Some channels accepted it, some did not
    Partial,
    /// No eligible channel accepted it
    Failed,
}

impl Delivery {
    /// Label used in logs and stored records
    pub fn as_str(&self) -> &'static str {
        match self {
            Delivery::Delivered => "delivered",
            Delivery::Partial => "partial",
            Delivery::Failed => "failed",
        }
    }
}

impl std::fmt::Display for Delivery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-channel results for one dispatched notification
#[derive(Debug)]
pub struct DispatchReport {
    /// Which notification this report covers
    pub notification_id: Uuid,
    /// One outcome per attempted channel
    pub outcomes: Vec<ChannelOutcome>,
}

impl DispatchReport {
    /// Collapse per-channel outcomes into one delivery state.
    /// A notification no channel was eligible for counts as delivered.
    pub fn delivery(&self) -> Delivery {
        let total = self.outcomes.len();
        let ok = self.outcomes.iter().filter(|o| o.result.is_ok()).count();
        if ok == total {
            Delivery::Delivered
        } else if ok > 0 {
            Delivery::Partial
        } else {
            Delivery::Failed
        }
    }
}

/// Fans notifications out to every eligible channel independently.
/// One channel failing or timing out never affects the others, and no
/// failure propagates to the caller.
pub struct ChannelDispatcher {
    channels: Vec<Channel>,
    config: DispatchConfig,
}

impl ChannelDispatcher {
    /// Create a dispatcher over a fixed channel set
    pub fn new(channels: Vec<Channel>, config: DispatchConfig) -> Self {
        info!(
            channel_count = channels.len(),
            max_retries = config.max_retries,
            "Creating channel dispatcher"
        );
        Self { channels, config }
    }

    /// The configured channels
    pub fn channels(&self) -> &[Channel] {
        &self.channels
    }

    /// Deliver one notification to every enabled channel at or below its
    /// level, with bounded retry per channel
    pub async fn dispatch(&self, notification: &Notification) -> DispatchReport {
        let mut outcomes = Vec::new();

        for channel in &self.channels {
            if !channel.enabled() {
                debug!(channel = %channel.kind(), "channel disabled, skipped");
                continue;
            }
            if notification.level < channel.min_level() {
                debug!(
                    channel = %channel.kind(),
                    level = %notification.level,
                    "below channel level, skipped"
                );
                continue;
            }

            let outcome = self.deliver(channel, notification).await;
            match &outcome.result {
                Ok(()) => debug!(
                    channel = %outcome.kind,
                    attempts = outcome.attempts,
                    "notification delivered"
                ),
                Err(e) => warn!(
                    channel = %outcome.kind,
                    attempts = outcome.attempts,
                    error = %e,
                    "notification delivery failed"
                ),
            }
            outcomes.push(outcome);
        }

        let report = DispatchReport {
            notification_id: notification.id,
            outcomes,
        };

        if report.delivery() != Delivery::Delivered {
            warn!(
                notification = %notification.id,
                delivery = %report.delivery(),
                "notification not fully delivered"
            );
        }
        report
    }

    async fn deliver(&self, channel: &Channel, notification: &Notification) -> ChannelOutcome {
        let timeout = Duration::from_millis(self.config.attempt_timeout_ms);
        let max_attempts = 1 + self.config.max_retries;
        let mut attempts = 0u8;

        loop {
            attempts += 1;

            let result = match tokio::time::timeout(timeout, channel.send(notification)).await {
                Ok(result) => result,
                Err(_) => Err(ChannelError::Timeout),
            };

            match result {
                Ok(()) => {
                    return ChannelOutcome {
                        kind: channel.kind(),
                        attempts,
                        result: Ok(()),
                    }
                }
                Err(e) if e.is_transient() && attempts < max_attempts => {
                    let backoff =
                        Duration::from_millis(self.config.retry_backoff_ms * attempts as u64);
                    debug!(
                        channel = %channel.kind(),
                        attempt = attempts,
                        error = %e,
                        ?backoff,
                        "transient failure, retrying"
                    );
                    tokio::time::sleep(backoff).await;
                }
                Err(e) => {
                    return ChannelOutcome {
                        kind: channel.kind(),
                        attempts,
                        result: Err(e),
                    }
                }
            }
        }
    }
}
