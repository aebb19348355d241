//! Stopwatch core module
//!
//! This module contains the stopwatch state machine, duration formatting,
//! lap analysis and the wall-clock abstraction. Nothing here performs I/O.

pub mod clock;
pub mod format;
pub mod laps;
pub mod state;

// Re-export main types
pub use clock::{Clock, ManualClock, SystemClock};
pub use format::{format_duration, FormattedDuration};
pub use laps::{fastest_and_slowest, LapExtremes, LapHighlight};
pub use state::{Lap, Phase, Snapshot, StopwatchState};
