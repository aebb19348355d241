//! State management module
//!
//! This module contains the live stopwatch instances, their change
//! notifications and presentation model, and the board that owns them.

pub mod app_state;
pub mod events;
pub mod stopwatch;
pub mod view;

// Re-export main types
pub use app_state::{AppState, IdGenerator};
pub use events::{ChangeEvent, ChangeKind, ChangeObserver, StopwatchId};
pub use stopwatch::{storage_key, Stopwatch, REFRESH_INTERVAL};
pub use view::{LapView, StopwatchView};
