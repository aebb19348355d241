//! Background tasks module
//!
//! This module contains the periodic work that runs alongside the stopwatches.

pub mod refresh_tick;

// Re-export main functions
pub use refresh_tick::refresh_tick_task;
