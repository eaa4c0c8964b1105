//! Channel Variants

use alerting::{AlertLevel, Notification};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU32, Ordering};
use thiserror::Error;
use tracing::{debug, info, warn};

/// SMS body length limit
const SMS_MAX_LEN: usize = 160;

/// Errors from a single channel delivery attempt
#[derive(Debug, Clone, Error)]
pub enum ChannelError {
    /// The transport did not answer within the attempt timeout
    #[error("transport timeout")]
    Timeout,

    /// Transient transport failure, eligible for retry
    #[error("transport failure: {0}")]
    Transport(String),

    /// Permanent failure (bad credentials, misconfiguration); not retried
    #[error("permanent channel failure: {0}")]
    Permanent(String),
}

impl ChannelError {
    /// Whether a retry could plausibly succeed
    pub fn is_transient(&self) -> bool {
        matches!(self, ChannelError::Timeout | ChannelError::Transport(_))
    }
}

/// Identity of a channel, for logs and reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChannelKind {
    Email,
    Sms,
    Local,
}

impl ChannelKind {
    /// Label used in logs and stored records
    pub fn as_str(&self) -> &'static str {
        match self {
            ChannelKind::Email => "email",
            ChannelKind::Sms => "sms",
            ChannelKind::Local => "local",
        }
    }
}

impl std::fmt::Display for ChannelKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Email channel configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailConfig {
    pub enabled: bool,
    pub smtp_server: String,
    pub smtp_port: u16,
    pub username: String,
    pub password: String,
    pub recipient: String,
    /// Defaults to `username` when absent
    #[serde(default)]
    pub from_address: Option<String>,
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            smtp_server: "smtp.example.com".to_string(),
            smtp_port: 587,
            username: String::new(),
            password: String::new(),
            recipient: String::new(),
            from_address: None,
        }
    }
}

/// SMS channel configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SmsConfig {
    pub enabled: bool,
    pub account_sid: String,
    pub auth_token: String,
    pub from_number: String,
    pub to_number: String,
}

/// Local buzzer/LED configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocalConfig {
    pub buzzer_enabled: bool,
    pub led_enabled: bool,
}

impl Default for LocalConfig {
    fn default() -> Self {
        Self {
            buzzer_enabled: true,
            led_enabled: true,
        }
    }
}

/// Email delivery over SMTP (transport stubbed; no network in this crate)
pub struct EmailChannel {
    config: EmailConfig,
}

impl EmailChannel {
    /// Create an email channel
    pub fn new(config: EmailConfig) -> Self {
        if config.enabled {
            info!(server = %config.smtp_server, "Email alerts enabled");
        } else {
            info!("Email alerts disabled");
        }
        Self { config }
    }

    fn subject(&self, notification: &Notification) -> String {
        format!(
            "EdgePulse Alert: {} - {}",
            notification.level.as_str().to_uppercase(),
            notification.vital
        )
    }

    async fn send(&self, notification: &Notification) -> Result<(), ChannelError> {
        if self.config.username.is_empty() || self.config.recipient.is_empty() {
            return Err(ChannelError::Permanent(
                "email credentials not configured".to_string(),
            ));
        }

        let subject = self.subject(notification);

        // In a real deployment we would:
        // 1. Open a TLS session to smtp_server:smtp_port
        // 2. Authenticate with username/password
        // 3. Send a multipart text/plain + text/html message
        debug!(%subject, recipient = %self.config.recipient, "email composed");

        info!(recipient = %self.config.recipient, "Email alert sent");
        Ok(())
    }
}

/// SMS delivery through a gateway (transport stubbed)
pub struct SmsChannel {
    config: SmsConfig,
}

impl SmsChannel {
    /// Create an SMS channel
    pub fn new(config: SmsConfig) -> Self {
        if config.enabled {
            info!("SMS alerts enabled");
        } else {
            info!("SMS alerts disabled");
        }
        Self { config }
    }

    fn body(&self, notification: &Notification) -> String {
        let mut body = format!(
            "EdgePulse Alert\n{}: {}",
            notification.level.as_str().to_uppercase(),
            notification.message
        );
        if let Some(value) = notification.value {
            body.push_str(&format!("\nValue: {value:.1}"));
        }
        // Truncate on a char boundary; messages may contain degree signs
        if body.len() > SMS_MAX_LEN {
            let mut end = SMS_MAX_LEN;
            while !body.is_char_boundary(end) {
                end -= 1;
            }
            body.truncate(end);
        }
        body
    }

    async fn send(&self, notification: &Notification) -> Result<(), ChannelError> {
        if self.config.account_sid.is_empty() || self.config.auth_token.is_empty() {
            return Err(ChannelError::Permanent(
                "SMS gateway credentials not configured".to_string(),
            ));
        }

        let body = self.body(notification);

        // In a real deployment we would POST the message to the gateway
        // REST API authenticated with account_sid/auth_token.
        debug!(to = %self.config.to_number, len = body.len(), "SMS composed");

        info!(to = %self.config.to_number, "SMS alert sent");
        Ok(())
    }
}

/// Local buzzer and LED indicators (GPIO stubbed; best-effort)
pub struct LocalChannel {
    config: LocalConfig,
}

impl LocalChannel {
    /// Create the local indicator channel
    pub fn new(config: LocalConfig) -> Self {
        info!(
            buzzer = config.buzzer_enabled,
            led = config.led_enabled,
            "Local alerts configured"
        );
        Self { config }
    }

    fn led_color(level: AlertLevel) -> &'static str {
        match level {
            AlertLevel::Critical => "red",
            AlertLevel::Warning => "yellow",
            AlertLevel::Info => "blue",
        }
    }

    /// Beep duration (ms) and count per level
    fn beep_pattern(level: AlertLevel) -> (u64, u32) {
        match level {
            AlertLevel::Critical => (500, 3),
            AlertLevel::Warning => (200, 2),
            AlertLevel::Info => (100, 1),
        }
    }

    async fn send(&self, notification: &Notification) -> Result<(), ChannelError> {
        if self.config.led_enabled {
            debug!(color = Self::led_color(notification.level), "LED set");
        }
        if self.config.buzzer_enabled {
            let (duration_ms, count) = Self::beep_pattern(notification.level);
            debug!(duration_ms, count, "buzzer fired");
        }
        info!(level = %notification.level, "Local alert triggered");
        Ok(())
    }
}

/// Scripted behavior for `MockChannel`
#[derive(Debug, Clone)]
pub enum MockBehavior {
    /// Every attempt succeeds
    Succeed,
    /// The first `n` attempts fail transiently, then attempts succeed
    TransientFailures(u32),
    /// Every attempt fails permanently
    PermanentFailure,
    /// Every attempt sleeps this long before succeeding (for timeout tests)
    Slow(std::time::Duration),
}

/// Scriptable channel for tests and dry runs (no transport at all)
pub struct MockChannel {
    kind: ChannelKind,
    behavior: MockBehavior,
    attempts: AtomicU32,
    delivered: AtomicU32,
}

impl MockChannel {
    /// Create a mock channel reporting as `kind`
    pub fn new(kind: ChannelKind, behavior: MockBehavior) -> Self {
        Self {
            kind,
            behavior,
            attempts: AtomicU32::new(0),
            delivered: AtomicU32::new(0),
        }
    }

    /// Total send attempts observed
    pub fn attempts(&self) -> u32 {
        self.attempts.load(Ordering::Relaxed)
    }

    /// Successfully delivered notifications
    pub fn delivered(&self) -> u32 {
        self.delivered.load(Ordering::Relaxed)
    }

    async fn send(&self, _notification: &Notification) -> Result<(), ChannelError> {
        let attempt = self.attempts.fetch_add(1, Ordering::Relaxed) + 1;
        match &self.behavior {
            MockBehavior::Succeed => {
                self.delivered.fetch_add(1, Ordering::Relaxed);
                Ok(())
            }
            MockBehavior::TransientFailures(n) => {
                if attempt <= *n {
                    Err(ChannelError::Transport(format!(
                        "scripted transient failure {attempt}"
                    )))
                } else {
                    self.delivered.fetch_add(1, Ordering::Relaxed);
                    Ok(())
                }
            }
            MockBehavior::PermanentFailure => {
                Err(ChannelError::Permanent("scripted permanent failure".to_string()))
            }
            MockBehavior::Slow(delay) => {
                tokio::time::sleep(*delay).await;
                self.delivered.fetch_add(1, Ordering::Relaxed);
                Ok(())
            }
        }
    }
}

/// A configured delivery channel
pub enum Channel {
    Email(EmailChannel),
    Sms(SmsChannel),
    Local(LocalChannel),
    Mock(MockChannel),
}

impl Channel {
    /// Which channel this is, for logs and reports
    pub fn kind(&self) -> ChannelKind {
        match self {
            Channel::Email(_) => ChannelKind::Email,
            Channel::Sms(_) => ChannelKind::Sms,
            Channel::Local(_) => ChannelKind::Local,
            Channel::Mock(m) => m.kind,
        }
    }

    /// Whether this channel is enabled by configuration
    pub fn enabled(&self) -> bool {
        match self {
            Channel::Email(c) => c.config.enabled,
            Channel::Sms(c) => c.config.enabled,
            Channel::Local(c) => c.config.buzzer_enabled || c.config.led_enabled,
            Channel::Mock(_) => true,
        }
    }

    /// Remote channels report delivery outcome; local ones are best-effort
    pub fn is_remote(&self) -> bool {
        matches!(self.kind(), ChannelKind::Email | ChannelKind::Sms)
    }

    /// Minimum level this channel receives: local indicators take
    /// everything, email takes warnings and up, SMS only criticals
    pub fn min_level(&self) -> AlertLevel {
        match self.kind() {
            ChannelKind::Local => AlertLevel::Info,
            ChannelKind::Email => AlertLevel::Warning,
            ChannelKind::Sms => AlertLevel::Critical,
        }
    }

    /// Attempt one delivery
    pub async fn send(&self, notification: &Notification) -> Result<(), ChannelError> {
        match self {
            Channel::Email(c) => c.send(notification).await,
            Channel::Sms(c) => c.send(notification).await,
            Channel::Local(c) => c.send(notification).await,
            Channel::Mock(c) => c.send(notification).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vitals::VitalKind;

    fn notification(level: AlertLevel) -> Notification {
        Notification {
            id: uuid::Uuid::new_v4(),
            vital: VitalKind::HeartRate,
            level,
            message: "Tachycardia detected: 120 bpm (high heart rate)".to_string(),
            value: Some(120.0),
            created_at: chrono::Utc::now(),
        }
    }

    #[test]
    fn test_routing_levels() {
        let local = Channel::Local(LocalChannel::new(LocalConfig::default()));
        let email = Channel::Email(EmailChannel::new(EmailConfig::default()));
        let sms = Channel::Sms(SmsChannel::new(SmsConfig::default()));

        assert!(AlertLevel::Info >= local.min_level());
        assert!(AlertLevel::Info < email.min_level());
        assert!(AlertLevel::Warning >= email.min_level());
        assert!(AlertLevel::Warning < sms.min_level());
        assert!(AlertLevel::Critical >= sms.min_level());
    }

    #[tokio::test]
    async fn test_unconfigured_email_is_permanent_failure() {
        let channel = EmailChannel::new(EmailConfig {
            enabled: true,
            ..Default::default()
        });
        let err = channel.send(&notification(AlertLevel::Warning)).await.unwrap_err();
        assert!(!err.is_transient());
    }

    #[tokio::test]
    async fn test_sms_body_truncated() {
        let channel = SmsChannel::new(SmsConfig::default());
        let mut n = notification(AlertLevel::Critical);
        n.message = "x".repeat(400);
        assert!(channel.body(&n).len() <= SMS_MAX_LEN);
    }

    #[tokio::test]
    async fn test_mock_transient_then_success() {
        let mock = MockChannel::new(ChannelKind::Email, MockBehavior::TransientFailures(2));
        let n = notification(AlertLevel::Warning);
        assert!(mock.send(&n).await.is_err());
        assert!(mock.send(&n).await.is_err());
        assert!(mock.send(&n).await.is_ok());
        assert_eq!(mock.delivered(), 1);
    }
}
