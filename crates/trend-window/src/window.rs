//! Rolling Window Implementation

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use vitals::Severity;

/// Default window capacity (covers ~5 samples at 1 Hz)
pub const DEFAULT_CAPACITY: usize = 5;

/// One classified sample retained in the window
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrendSample {
    /// Value in the vital's base unit
    pub value: f64,
    /// Severity this sample classified at on its own
    pub severity: Severity,
    /// Acquisition time (milliseconds since the Unix epoch)
    pub timestamp_ms: u64,
}

/// Summary statistics over the current window contents
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct WindowStats {
    /// Most recent value
    pub current: f64,
    /// Mean of retained values
    pub mean: f64,
    /// Minimum retained value
    pub min: f64,
    /// Maximum retained value
    pub max: f64,
    /// Number of retained samples
    pub count: usize,
}

/// Fixed-capacity window of the last N samples for one vital.
/// Oldest sample is evicted on overflow; arrival order is preserved.
#[derive(Debug, Clone)]
pub struct TrendWindow {
    samples: VecDeque<TrendSample>,
    capacity: usize,
}

impl TrendWindow {
    /// Create a window holding at most `capacity` samples
    pub fn new(capacity: usize) -> Self {
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity: capacity.max(1),
        }
    }

    /// Append a sample, evicting the oldest if the window is full
    pub fn push(&mut self, sample: TrendSample) {
        if self.samples.len() >= self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(sample);
    }

    /// Number of retained samples
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Whether the window holds no samples
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Maximum number of retained samples
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Most recent sample, if any
    pub fn latest(&self) -> Option<&TrendSample> {
        self.samples.back()
    }

    /// Count retained samples that classified at or above `severity`
    pub fn count_at_or_above(&self, severity: Severity) -> usize {
        self.samples.iter().filter(|s| s.severity >= severity).count()
    }

    /// Iterate retained samples, oldest first
    pub fn iter(&self) -> impl Iterator<Item = &TrendSample> {
        self.samples.iter()
    }

    /// Summary statistics over the retained values
    pub fn stats(&self) -> WindowStats {
        if self.samples.is_empty() {
            return WindowStats::default();
        }

        let mut min = f64::MAX;
        let mut max = f64::MIN;
        let mut sum = 0.0;
        for s in &self.samples {
            min = min.min(s.value);
            max = max.max(s.value);
            sum += s.value;
        }

        WindowStats {
            current: self.samples.back().map(|s| s.value).unwrap_or(0.0),
            mean: sum / self.samples.len() as f64,
            min,
            max,
            count: self.samples.len(),
        }
    }

    /// Drop all retained samples
    pub fn clear(&mut self) {
        self.samples.clear();
    }
}

impl Default for TrendWindow {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(value: f64, severity: Severity) -> TrendSample {
        TrendSample {
            value,
            severity,
            timestamp_ms: 0,
        }
    }

    #[test]
    fn test_eviction_preserves_order() {
        let mut window = TrendWindow::new(3);
        for i in 0..5 {
            window.push(sample(i as f64, Severity::Normal));
        }

        assert_eq!(window.len(), 3);
        let values: Vec<f64> = window.iter().map(|s| s.value).collect();
        assert_eq!(values, vec![2.0, 3.0, 4.0]);
    }

    #[test]
    fn test_count_at_or_above() {
        let mut window = TrendWindow::new(5);
        window.push(sample(55.0, Severity::Warning));
        window.push(sample(72.0, Severity::Normal));
        window.push(sample(160.0, Severity::Critical));
        window.push(sample(58.0, Severity::Warning));

        assert_eq!(window.count_at_or_above(Severity::Warning), 3);
        assert_eq!(window.count_at_or_above(Severity::Critical), 1);
        assert_eq!(window.count_at_or_above(Severity::Normal), 4);
    }

    #[test]
    fn test_stats() {
        let mut window = TrendWindow::new(4);
        for v in [60.0, 70.0, 80.0] {
            window.push(sample(v, Severity::Normal));
        }

        let stats = window.stats();
        assert_eq!(stats.current, 80.0);
        assert!((stats.mean - 70.0).abs() < 0.001);
        assert_eq!(stats.min, 60.0);
        assert_eq!(stats.max, 80.0);
        assert_eq!(stats.count, 3);
    }

    #[test]
    fn test_empty_stats() {
        let window = TrendWindow::new(5);
        let stats = window.stats();
        assert_eq!(stats.count, 0);
        assert_eq!(stats.mean, 0.0);
    }
}
