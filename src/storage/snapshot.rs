//! Snapshot persistence on top of a key-value store

use std::sync::{Arc, Mutex};

use tracing::{debug, error, warn};

use super::{KeyValueStore, StorageError};
use crate::{
    state::{ChangeEvent, ChangeKind, ChangeObserver},
    stopwatch::{Snapshot, StopwatchState},
};

/// Serialize the state and write it under `key`
pub fn save(store: &dyn KeyValueStore, key: &str, state: &StopwatchState) -> Result<(), StorageError> {
    save_snapshot(store, key, &state.snapshot())
}

/// Write an already captured snapshot under `key`
pub fn save_snapshot(store: &dyn KeyValueStore, key: &str, snapshot: &Snapshot) -> Result<(), StorageError> {
    let encoded = serde_json::to_string(snapshot)?;
    store.set(key, &encoded)?;
    debug!("Saved snapshot for {} (duration={}ms, running={}, laps={})",
           key, snapshot.duration, snapshot.running, snapshot.laps.len());
    Ok(())
}

/// Read the snapshot under `key`.
///
/// Unreadable or malformed data counts as no saved state.
pub fn load(store: &dyn KeyValueStore, key: &str) -> Option<Snapshot> {
    let raw = match store.get(key) {
        Ok(Some(raw)) => raw,
        Ok(None) => return None,
        Err(e) => {
            warn!("Failed to read saved state for {}: {}", key, e);
            return None;
        }
    };

    let snapshot: Snapshot = match serde_json::from_str(&raw) {
        Ok(snapshot) => snapshot,
        Err(e) => {
            warn!("Ignoring malformed saved state for {}: {}", key, e);
            return None;
        }
    };

    match snapshot.validate() {
        Ok(()) => Some(snapshot),
        Err(e) => {
            warn!("Ignoring inconsistent saved state for {}: {}", key, e);
            None
        }
    }
}

/// Remove the snapshot under `key`
pub fn clear(store: &dyn KeyValueStore, key: &str) -> Result<(), StorageError> {
    store.remove(key)?;
    debug!("Cleared snapshot for {}", key);
    Ok(())
}

/// Minimum growth of the duration between two saves driven by refresh ticks
pub const TICK_SAVE_INTERVAL_MS: u64 = 1_000;

/// Observer that mirrors every change of one stopwatch into storage.
///
/// A reset removes the snapshot. Transitions are saved immediately; refresh
/// ticks only once the duration has grown by `TICK_SAVE_INTERVAL_MS` since
/// the last save.
pub struct SnapshotPersister {
    store: Arc<dyn KeyValueStore>,
    key: String,
    // duration at the last save, None after a reset or before the first save
    last_saved: Mutex<Option<u64>>,
}

impl SnapshotPersister {
    pub fn new(store: Arc<dyn KeyValueStore>, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
            last_saved: Mutex::new(None),
        }
    }

    fn tick_is_due(&self, duration: u64) -> bool {
        match self.last_saved.lock().map(|last| *last) {
            Ok(Some(last)) => duration >= last.saturating_add(TICK_SAVE_INTERVAL_MS),
            Ok(None) => true,
            Err(_) => true,
        }
    }

    fn remember(&self, saved: Option<u64>) {
        if let Ok(mut last) = self.last_saved.lock() {
            *last = saved;
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }
}

impl ChangeObserver for SnapshotPersister {
    fn on_change(&self, event: &ChangeEvent) {
        let result = match event.kind {
            ChangeKind::Reset => {
                self.remember(None);
                clear(self.store.as_ref(), &self.key)
            }
            ChangeKind::Tick if !self.tick_is_due(event.snapshot.duration) => return,
            _ => {
                self.remember(Some(event.snapshot.duration));
                save_snapshot(self.store.as_ref(), &self.key, &event.snapshot)
            }
        };

        if let Err(e) = result {
            error!("Failed to persist {:?} change for {}: {}", event.kind, self.key, e);
        }
    }
}
