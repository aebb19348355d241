//! Main application state management

use std::{
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc, Mutex,
    },
    time::Instant,
};
use chrono::{DateTime, Utc};
use tracing::info;

use super::{Stopwatch, StopwatchId, StopwatchView};
use crate::{stopwatch::Clock, storage::KeyValueStore};

/// Hands out stopwatch ids in construction order
#[derive(Debug, Default)]
pub struct IdGenerator {
    next: AtomicU64,
}

impl IdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_id(&self) -> StopwatchId {
        self.next.fetch_add(1, Ordering::Relaxed)
    }
}

/// Main application state: the board of stopwatches plus server metadata
#[derive(Debug)]
pub struct AppState {
    /// Stopwatches in mount order
    pub stopwatches: Vec<Arc<Stopwatch>>,
    /// Server metadata
    pub start_time: Instant,
    pub port: u16,
    pub host: String,
    /// Last action tracking
    pub last_action: Arc<Mutex<Option<String>>>,
    pub last_action_time: Arc<Mutex<Option<DateTime<Utc>>>>,
}

impl AppState {
    /// Mount `count` stopwatches backed by `store`
    pub fn new(
        port: u16,
        host: String,
        count: usize,
        store: Arc<dyn KeyValueStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let ids = IdGenerator::new();
        let stopwatches: Vec<Arc<Stopwatch>> = (0..count)
            .map(|_| Stopwatch::mount(ids.next_id(), Arc::clone(&store), Arc::clone(&clock)))
            .collect();

        info!("Mounted {} stopwatches", stopwatches.len());

        Self {
            stopwatches,
            start_time: Instant::now(),
            port,
            host,
            last_action: Arc::new(Mutex::new(None)),
            last_action_time: Arc::new(Mutex::new(None)),
        }
    }

    /// Look up a stopwatch by id
    pub fn stopwatch(&self, id: StopwatchId) -> Option<Arc<Stopwatch>> {
        self.stopwatches.iter().find(|s| s.id() == id).cloned()
    }

    /// Render every stopwatch
    pub fn views(&self) -> Result<Vec<StopwatchView>, String> {
        self.stopwatches.iter().map(|s| s.view()).collect()
    }

    /// Number of stopwatches currently running
    pub fn running_count(&self) -> Result<usize, String> {
        let mut running = 0;
        for stopwatch in &self.stopwatches {
            if stopwatch.snapshot()?.running {
                running += 1;
            }
        }
        Ok(running)
    }

    /// Remember the last applied action
    pub fn record_action(&self, action: &str, id: StopwatchId) {
        if let Ok(mut last_action) = self.last_action.lock() {
            *last_action = Some(format!("{} #{}", action, id));
        }
        if let Ok(mut last_time) = self.last_action_time.lock() {
            *last_time = Some(Utc::now());
        }
    }

    /// Calculate server uptime as a formatted string
    pub fn get_uptime(&self) -> String {
        let duration = self.start_time.elapsed();
        let hours = duration.as_secs() / 3600;
        let minutes = (duration.as_secs() % 3600) / 60;
        let seconds = duration.as_secs() % 60;

        if hours > 0 {
            format!("{}h {}m {}s", hours, minutes, seconds)
        } else if minutes > 0 {
            format!("{}m {}s", minutes, seconds)
        } else {
            format!("{}s", seconds)
        }
    }

    /// Get last action information
    pub fn get_last_action(&self) -> (Option<String>, Option<DateTime<Utc>>) {
        let last_action = self.last_action.lock().ok().and_then(|a| a.clone());
        let last_action_time = self.last_action_time.lock().ok().and_then(|t| *t);
        (last_action, last_action_time)
    }

    /// Cancel every refresh tick. Saved snapshots stay as they are, so
    /// running stopwatches resume on the next start.
    pub fn shutdown(&self) {
        for stopwatch in &self.stopwatches {
            stopwatch.shutdown();
        }
        info!("All stopwatch refresh ticks cancelled");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{stopwatch::ManualClock, storage::MemoryStore};

    fn board(store: Arc<MemoryStore>, clock: Arc<ManualClock>) -> AppState {
        AppState::new(20554, "127.0.0.1".to_string(), 3, store, clock)
    }

    #[test]
    fn ids_follow_construction_order() {
        let ids = IdGenerator::new();
        assert_eq!(ids.next_id(), 0);
        assert_eq!(ids.next_id(), 1);
        assert_eq!(ids.next_id(), 2);
    }

    #[tokio::test]
    async fn stopwatches_are_independent() {
        let store = Arc::new(MemoryStore::new());
        let clock = Arc::new(ManualClock::new(0));
        let state = board(store.clone(), clock.clone());

        let first = state.stopwatch(0).unwrap();
        let second = state.stopwatch(1).unwrap();
        assert!(state.stopwatch(3).is_none());

        first.start().unwrap();
        clock.advance(100);
        first.stop().unwrap();

        assert_eq!(first.snapshot().unwrap().duration, 100);
        assert_eq!(second.snapshot().unwrap().duration, 0);
        assert_eq!(store.len(), 1);
        assert_eq!(state.running_count().unwrap(), 0);
    }

    #[tokio::test]
    async fn board_restores_by_position() {
        let store = Arc::new(MemoryStore::new());
        let clock = Arc::new(ManualClock::new(0));

        {
            let state = board(store.clone(), clock.clone());
            let third = state.stopwatch(2).unwrap();
            third.start().unwrap();
            clock.advance(300);
            third.lap().unwrap();
            state.shutdown();
        }

        clock.advance(1_000);
        let state = board(store, clock.clone());
        let third = state.stopwatch(2).unwrap();
        let snapshot = third.snapshot().unwrap();
        assert!(snapshot.running);
        assert_eq!(snapshot.duration, 300);
        assert_eq!(snapshot.laps.len(), 1);
        assert_eq!(state.running_count().unwrap(), 1);

        clock.advance(25);
        third.refresh().unwrap();
        assert_eq!(third.snapshot().unwrap().duration, 325);
        state.shutdown();
    }

    #[tokio::test]
    async fn records_last_action() {
        let state = board(Arc::new(MemoryStore::new()), Arc::new(ManualClock::new(0)));
        assert_eq!(state.get_last_action(), (None, None));

        state.record_action("start", 1);
        let (action, time) = state.get_last_action();
        assert_eq!(action.as_deref(), Some("start #1"));
        assert!(time.is_some());
        assert_eq!(state.get_uptime(), "0s");
    }
}
