//! Trend Window
//!
//! A fixed-capacity rolling window of the most recent classified samples
//! for one vital, used to distinguish sustained deviation from transient
//! spikes.

mod window;

pub use window::{TrendSample, TrendWindow, WindowStats};
