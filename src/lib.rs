//! Lap Clock - A board of persistent lap stopwatches
//!
//! This library provides the stopwatch state machine with lap tracking,
//! snapshot persistence into a local key-value store, and an HTTP surface
//! that renders the board and forwards start/stop/lap/reset intents.

pub mod config;
pub mod stopwatch;
pub mod storage;
pub mod state;
pub mod api;
pub mod tasks;
pub mod utils;

// Re-export commonly used types
pub use config::Config;
pub use state::{AppState, Stopwatch};
pub use api::create_router;
pub use utils::signals::shutdown_signal;
