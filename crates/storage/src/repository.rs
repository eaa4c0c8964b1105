//! Repository Implementation

use crate::StorageError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::Mutex;
use tracing::{debug, info};
use uuid::Uuid;
use vitals::Reading;

/// One stored vital-sign reading
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadingRecord {
    /// Acquisition time (milliseconds since the Unix epoch)
    pub timestamp_ms: u64,
    /// Vital name
    pub vital: String,
    /// Value in the measured unit
    pub value: f64,
    /// Unit suffix
    pub unit: String,
}

impl From<&Reading> for ReadingRecord {
    fn from(reading: &Reading) -> Self {
        Self {
            timestamp_ms: reading.timestamp_ms,
            vital: reading.vital.as_str().to_string(),
            value: reading.value,
            unit: reading.unit.suffix().to_string(),
        }
    }
}

/// One stored alert with its delivery outcome
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertRecord {
    /// Notification id
    pub id: Uuid,
    /// Wall-clock creation time
    pub timestamp: DateTime<Utc>,
    /// Vital name
    pub vital: String,
    /// Alert level label
    pub level: String,
    /// Human-readable description
    pub message: String,
    /// Offending value, if any
    pub value: Option<f64>,
    /// Delivery outcome label: delivered, partial, or failed
    pub delivery: String,
}

/// Retention limits for the in-memory history
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RetentionConfig {
    /// Maximum retained readings (~27 hours at 1 Hz per vital)
    pub max_reading_records: usize,
    /// Maximum retained alerts
    pub max_alert_records: usize,
}

impl Default for RetentionConfig {
    fn default() -> Self {
        Self {
            max_reading_records: 100_000,
            max_alert_records: 1_000,
        }
    }
}

/// History repository for readings and alerts
pub struct Repository {
    readings: Mutex<VecDeque<ReadingRecord>>,
    alerts: Mutex<VecDeque<AlertRecord>>,
    retention: RetentionConfig,
}

impl Repository {
    /// Create an empty repository with the given retention limits
    pub fn new(retention: RetentionConfig) -> Self {
        info!(?retention, "Creating in-memory repository");
        Self {
            readings: Mutex::new(VecDeque::with_capacity(1024)),
            alerts: Mutex::new(VecDeque::with_capacity(64)),
            retention,
        }
    }

    /// Append a reading, evicting the oldest past retention
    pub fn insert_reading(&self, record: ReadingRecord) -> Result<(), StorageError> {
        let mut readings = self
            .readings
            .lock()
            .map_err(|e| StorageError::Lock(e.to_string()))?;

        while readings.len() >= self.retention.max_reading_records {
            readings.pop_front();
        }
        readings.push_back(record);
        Ok(())
    }

    /// Append an alert record, evicting the oldest past retention
    pub fn insert_alert(&self, record: AlertRecord) -> Result<(), StorageError> {
        let mut alerts = self
            .alerts
            .lock()
            .map_err(|e| StorageError::Lock(e.to_string()))?;

        while alerts.len() >= self.retention.max_alert_records {
            alerts.pop_front();
        }
        debug!(id = %record.id, level = %record.level, "alert recorded");
        alerts.push_back(record);
        Ok(())
    }

    /// Most recent readings, newest first
    pub fn recent_readings(&self, limit: usize) -> Result<Vec<ReadingRecord>, StorageError> {
        let readings = self
            .readings
            .lock()
            .map_err(|e| StorageError::Lock(e.to_string()))?;
        Ok(readings.iter().rev().take(limit).cloned().collect())
    }

    /// Readings at or after a timestamp
    pub fn readings_since(&self, since_ms: u64) -> Result<Vec<ReadingRecord>, StorageError> {
        let readings = self
            .readings
            .lock()
            .map_err(|e| StorageError::Lock(e.to_string()))?;
        Ok(readings
            .iter()
            .filter(|r| r.timestamp_ms >= since_ms)
            .cloned()
            .collect())
    }

    /// Most recent alerts, newest first, optionally filtered by level
    pub fn recent_alerts(
        &self,
        level: Option<&str>,
        limit: usize,
    ) -> Result<Vec<AlertRecord>, StorageError> {
        let alerts = self
            .alerts
            .lock()
            .map_err(|e| StorageError::Lock(e.to_string()))?;
        Ok(alerts
            .iter()
            .rev()
            .filter(|a| level.map_or(true, |l| a.level == l))
            .take(limit)
            .cloned()
            .collect())
    }

    /// Number of retained readings
    pub fn reading_count(&self) -> usize {
        self.readings.lock().map(|r| r.len()).unwrap_or(0)
    }

    /// Number of retained alerts
    pub fn alert_count(&self) -> usize {
        self.alerts.lock().map(|a| a.len()).unwrap_or(0)
    }

    /// Drop all history (for tests)
    pub fn clear(&self) {
        if let Ok(mut readings) = self.readings.lock() {
            readings.clear();
        }
        if let Ok(mut alerts) = self.alerts.lock() {
            alerts.clear();
        }
    }
}

impl Default for Repository {
    fn default() -> Self {
        Self::new(RetentionConfig::default())
    }
}
