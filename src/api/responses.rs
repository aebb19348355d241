//! API response structures

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::state::StopwatchView;

/// API response structure for stopwatch action endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionResponse {
    pub status: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    pub stopwatch: StopwatchView,
}

impl ActionResponse {
    /// Create a new API response
    pub fn new(status: String, message: String, stopwatch: StopwatchView) -> Self {
        Self {
            status,
            message,
            timestamp: Utc::now(),
            stopwatch,
        }
    }

    /// The requested transition was applied
    pub fn applied(message: String, stopwatch: StopwatchView) -> Self {
        Self::new("applied".to_string(), message, stopwatch)
    }

    /// The transition's precondition did not hold, nothing changed
    pub fn ignored(message: String, stopwatch: StopwatchView) -> Self {
        Self::new("ignored".to_string(), message, stopwatch)
    }
}

/// Board-wide status
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    pub stopwatches: usize,
    pub running: usize,
    pub uptime: String,
    pub port: u16,
    pub host: String,
    pub last_action: Option<String>,
    pub last_action_time: Option<DateTime<Utc>>,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub version: String,
}

impl HealthResponse {
    /// Create a new health response
    pub fn ok() -> Self {
        Self {
            status: "ok".to_string(),
            timestamp: Utc::now(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}
