//! Change notifications emitted by stopwatches

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::stopwatch::Snapshot;

/// Identifier of a stopwatch on the board
pub type StopwatchId = u64;

/// What kind of change a stopwatch went through
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    Started,
    Stopped,
    Lap,
    Reset,
    Tick,
    /// Final save before the process exits
    Shutdown,
}

/// Notification sent after every applied transition and refresh tick
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeEvent {
    pub id: StopwatchId,
    pub kind: ChangeKind,
    pub snapshot: Snapshot,
}

/// Receives change notifications synchronously, in transition order
pub trait ChangeObserver: Send + Sync {
    fn on_change(&self, event: &ChangeEvent);
}

impl ChangeObserver for broadcast::Sender<ChangeEvent> {
    fn on_change(&self, event: &ChangeEvent) {
        // no receivers is fine, nobody is watching right now
        let _ = self.send(event.clone());
    }
}
