//! Live stopwatch instance: state machine, refresh tick and notifications

use std::{
    sync::{Arc, Mutex, MutexGuard},
    time::Duration,
};
use tokio::{sync::broadcast, task::JoinHandle};
use tracing::{debug, error, info};

use super::{ChangeEvent, ChangeKind, ChangeObserver, StopwatchId, StopwatchView};
use crate::{
    stopwatch::{Clock, Lap, Snapshot, StopwatchState},
    storage::{self, KeyValueStore, SnapshotPersister},
    tasks::refresh_tick_task,
};

/// Period of the display refresh while running
pub const REFRESH_INTERVAL: Duration = Duration::from_millis(10);

const STORAGE_KEY_PREFIX: &str = "lap-clock:stopwatch__";

/// Storage key for the stopwatch with the given id
pub fn storage_key(id: StopwatchId) -> String {
    format!("{}{}", STORAGE_KEY_PREFIX, id)
}

/// Aborts the refresh task when dropped
#[derive(Debug)]
struct TickGuard(JoinHandle<()>);

impl Drop for TickGuard {
    fn drop(&mut self) {
        self.0.abort();
    }
}

/// One stopwatch on the board
pub struct Stopwatch {
    id: StopwatchId,
    clock: Arc<dyn Clock>,
    state: Mutex<StopwatchState>,
    observers: Vec<Box<dyn ChangeObserver>>,
    change_tx: broadcast::Sender<ChangeEvent>,
    tick: Mutex<Option<TickGuard>>,
}

impl Stopwatch {
    /// Mount a stopwatch, rehydrating it from storage when a snapshot exists.
    ///
    /// Mounting never writes to storage. A restored running stopwatch resumes
    /// its refresh tick, so this must be called inside a tokio runtime.
    pub fn mount(id: StopwatchId, store: Arc<dyn KeyValueStore>, clock: Arc<dyn Clock>) -> Arc<Self> {
        let key = storage_key(id);
        let state = match storage::load(store.as_ref(), &key) {
            Some(snapshot) => {
                info!("Restoring stopwatch {} (duration={}ms, running={}, laps={})",
                      id, snapshot.duration, snapshot.running, snapshot.laps.len());
                StopwatchState::restore(snapshot, clock.now_ms())
            }
            None => {
                debug!("No saved state for stopwatch {}, starting fresh", id);
                StopwatchState::new()
            }
        };

        let running = state.is_running();
        let persister: Box<dyn ChangeObserver> = Box::new(SnapshotPersister::new(store, key));
        let (change_tx, _) = broadcast::channel(256);
        let stopwatch = Arc::new(Self {
            id,
            clock,
            state: Mutex::new(state),
            observers: vec![persister],
            change_tx,
            tick: Mutex::new(None),
        });

        if running {
            if let Err(e) = stopwatch.spawn_tick() {
                error!("Failed to resume refresh tick for stopwatch {}: {}", id, e);
            }
        }

        stopwatch
    }

    pub fn id(&self) -> StopwatchId {
        self.id
    }

    pub fn storage_key(&self) -> String {
        storage_key(self.id)
    }

    /// Subscribe to change notifications
    pub fn subscribe(&self) -> broadcast::Receiver<ChangeEvent> {
        self.change_tx.subscribe()
    }

    fn lock_state(&self) -> Result<MutexGuard<'_, StopwatchState>, String> {
        self.state.lock()
            .map_err(|e| format!("Failed to lock stopwatch {} state: {}", self.id, e))
    }

    /// Notify observers while the state lock is still held, so storage and
    /// subscribers see changes in the order they happened.
    fn notify(&self, kind: ChangeKind, state: &StopwatchState) {
        let event = ChangeEvent {
            id: self.id,
            kind,
            snapshot: state.snapshot(),
        };
        for observer in &self.observers {
            observer.on_change(&event);
        }
        self.change_tx.on_change(&event);
    }

    fn spawn_tick(self: &Arc<Self>) -> Result<(), String> {
        let mut tick = self.tick.lock()
            .map_err(|e| format!("Failed to lock stopwatch {} tick: {}", self.id, e))?;
        let handle = tokio::spawn(refresh_tick_task(Arc::downgrade(self), REFRESH_INTERVAL));
        *tick = Some(TickGuard(handle));
        Ok(())
    }

    fn cancel_tick(&self) {
        if let Ok(mut tick) = self.tick.lock() {
            if tick.take().is_some() {
                debug!("Cancelled refresh tick for stopwatch {}", self.id);
            }
        }
    }

    /// Whether a refresh tick task is currently attached
    pub fn has_tick(&self) -> bool {
        self.tick.lock().map(|tick| tick.is_some()).unwrap_or(false)
    }

    /// Start the clock. Returns false if it was already running.
    ///
    /// The tick is attached before the state lock is released, so a racing
    /// `stop` always finds it.
    pub fn start(self: &Arc<Self>) -> Result<bool, String> {
        let mut state = self.lock_state()?;
        if !state.start(self.clock.now_ms()) {
            return Ok(false);
        }
        self.notify(ChangeKind::Started, &state);
        self.spawn_tick()?;
        drop(state);

        info!("Stopwatch {} started", self.id);
        Ok(true)
    }

    /// Stop the clock. Returns false if it was not running.
    pub fn stop(&self) -> Result<bool, String> {
        let mut state = self.lock_state()?;
        if !state.stop(self.clock.now_ms()) {
            return Ok(false);
        }
        self.notify(ChangeKind::Stopped, &state);
        self.cancel_tick();
        drop(state);

        info!("Stopwatch {} stopped", self.id);
        Ok(true)
    }

    /// Record a lap. Returns `None` while stopped.
    pub fn lap(&self) -> Result<Option<Lap>, String> {
        let mut state = self.lock_state()?;
        let lap = state.lap(self.clock.now_ms());
        if let Some(lap) = lap {
            self.notify(ChangeKind::Lap, &state);
            info!("Stopwatch {} recorded lap {} ({}ms)", self.id, state.laps().len(), lap.duration);
        }
        Ok(lap)
    }

    /// Return to zero and drop the saved snapshot. Only applies while stopped
    /// with elapsed time.
    pub fn reset(&self) -> Result<bool, String> {
        let mut state = self.lock_state()?;
        if !state.reset() {
            return Ok(false);
        }
        self.notify(ChangeKind::Reset, &state);
        info!("Stopwatch {} reset", self.id);
        Ok(true)
    }

    /// Recompute the live duration for the display. Returns false once the
    /// stopwatch is no longer running.
    pub fn refresh(&self) -> Result<bool, String> {
        let mut state = self.lock_state()?;
        if !state.is_running() {
            return Ok(false);
        }
        if state.refresh(self.clock.now_ms()) {
            self.notify(ChangeKind::Tick, &state);
        }
        Ok(true)
    }

    /// Copy of the current persisted-form state
    pub fn snapshot(&self) -> Result<Snapshot, String> {
        self.lock_state().map(|state| state.snapshot())
    }

    /// Render the current state for presentation
    pub fn view(&self) -> Result<StopwatchView, String> {
        let state = self.lock_state()?;
        Ok(StopwatchView::render(self.id, &state))
    }

    /// Save the latest duration and cancel the refresh tick. The stopwatch
    /// keeps its running flag, so it resumes on the next mount.
    pub fn shutdown(&self) {
        match self.lock_state() {
            Ok(mut state) => {
                // stopped stopwatches were saved by their last transition
                if state.is_running() {
                    state.refresh(self.clock.now_ms());
                    self.notify(ChangeKind::Shutdown, &state);
                }
                self.cancel_tick();
            }
            Err(e) => {
                error!("{}", e);
                self.cancel_tick();
            }
        }
    }
}

impl std::fmt::Debug for Stopwatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Stopwatch")
            .field("id", &self.id)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        stopwatch::{ManualClock, Phase},
        storage::MemoryStore,
    };

    const T0: i64 = 1_700_000_000_000;

    fn setup() -> (Arc<MemoryStore>, Arc<ManualClock>) {
        (Arc::new(MemoryStore::new()), Arc::new(ManualClock::new(T0)))
    }

    #[tokio::test]
    async fn mount_fresh_does_not_save() {
        let (store, clock) = setup();
        let stopwatch = Stopwatch::mount(7, store.clone(), clock);

        assert_eq!(stopwatch.storage_key(), "lap-clock:stopwatch__7");
        assert_eq!(stopwatch.snapshot().unwrap(), Snapshot::default());
        assert!(store.is_empty());
        assert!(!stopwatch.has_tick());
    }

    #[tokio::test]
    async fn transitions_save_and_notify() {
        let (store, clock) = setup();
        let stopwatch = Stopwatch::mount(0, store.clone(), clock.clone());
        let mut rx = stopwatch.subscribe();

        assert!(stopwatch.start().unwrap());
        assert!(stopwatch.has_tick());
        assert_eq!(rx.recv().await.unwrap().kind, ChangeKind::Started);
        assert!(storage::load(store.as_ref(), &stopwatch.storage_key()).unwrap().running);

        clock.advance(100);
        assert_eq!(stopwatch.lap().unwrap(), Some(Lap { cumulative_start: 0, duration: 100 }));
        clock.advance(150);
        assert_eq!(stopwatch.lap().unwrap(), Some(Lap { cumulative_start: 100, duration: 150 }));

        clock.advance(50);
        assert!(stopwatch.stop().unwrap());
        assert!(!stopwatch.has_tick());
        assert!(!stopwatch.stop().unwrap());

        let saved = storage::load(store.as_ref(), &stopwatch.storage_key()).unwrap();
        assert_eq!(saved.duration, 300);
        assert!(!saved.running);
        assert_eq!(saved.laps.len(), 2);

        let kinds: Vec<ChangeKind> = std::iter::from_fn(|| rx.try_recv().ok())
            .map(|event| event.kind)
            .filter(|kind| *kind != ChangeKind::Tick)
            .collect();
        assert_eq!(kinds, vec![ChangeKind::Lap, ChangeKind::Lap, ChangeKind::Stopped]);
    }

    #[tokio::test]
    async fn reset_removes_snapshot() {
        let (store, clock) = setup();
        let stopwatch = Stopwatch::mount(0, store.clone(), clock.clone());

        stopwatch.start().unwrap();
        clock.advance(80);
        stopwatch.lap().unwrap();
        assert!(!stopwatch.reset().unwrap());
        stopwatch.stop().unwrap();

        assert!(stopwatch.reset().unwrap());
        assert_eq!(stopwatch.snapshot().unwrap(), Snapshot::default());
        assert_eq!(storage::load(store.as_ref(), &stopwatch.storage_key()), None);
        assert!(!stopwatch.reset().unwrap());
    }

    #[tokio::test]
    async fn lap_while_stopped_is_ignored() {
        let (store, clock) = setup();
        let stopwatch = Stopwatch::mount(0, store.clone(), clock);
        assert_eq!(stopwatch.lap().unwrap(), None);
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn restores_running_snapshot_and_resumes() {
        let (store, clock) = setup();
        let snapshot = Snapshot {
            duration: 500,
            running: true,
            laps: vec![Lap { cumulative_start: 0, duration: 500 }],
        };
        storage::save_snapshot(store.as_ref(), &storage_key(3), &snapshot).unwrap();

        let stopwatch = Stopwatch::mount(3, store.clone(), clock.clone());
        assert!(stopwatch.has_tick());
        assert_eq!(stopwatch.snapshot().unwrap(), snapshot);

        clock.advance(40);
        assert!(stopwatch.refresh().unwrap());
        assert_eq!(stopwatch.snapshot().unwrap().duration, 540);

        stopwatch.stop().unwrap();
        assert!(!stopwatch.refresh().unwrap());
        let view = stopwatch.view().unwrap();
        assert_eq!(view.phase, Phase::StoppedWithElapsed);
    }

    #[tokio::test]
    async fn shutdown_saves_latest_duration() {
        let (store, clock) = setup();
        let stopwatch = Stopwatch::mount(0, store.clone(), clock.clone());

        stopwatch.start().unwrap();
        clock.advance(300);
        stopwatch.refresh().unwrap();
        // a short tick is not written through
        assert_eq!(storage::load(store.as_ref(), &stopwatch.storage_key()).unwrap().duration, 0);

        clock.advance(20);
        stopwatch.shutdown();
        assert!(!stopwatch.has_tick());
        let saved = storage::load(store.as_ref(), &stopwatch.storage_key()).unwrap();
        assert_eq!(saved.duration, 320);
        assert!(saved.running);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn tick_follows_running_under_concurrent_start_stop() {
        let store = Arc::new(MemoryStore::new());
        let stopwatch = Stopwatch::mount(0, store, Arc::new(crate::stopwatch::SystemClock));

        for round in 0..500 {
            let starter = Arc::clone(&stopwatch);
            let stopper = Arc::clone(&stopwatch);
            let start = tokio::task::spawn_blocking(move || starter.start().unwrap());
            let stop = tokio::task::spawn_blocking(move || stopper.stop().unwrap());
            start.await.unwrap();
            stop.await.unwrap();

            let running = stopwatch.snapshot().unwrap().running;
            assert_eq!(stopwatch.has_tick(), running, "round {}", round);
            stopwatch.stop().unwrap();
            assert!(!stopwatch.has_tick(), "round {}", round);
        }
    }

    #[tokio::test]
    async fn refresh_tick_advances_duration() {
        let store = Arc::new(MemoryStore::new());
        let stopwatch = Stopwatch::mount(0, store, Arc::new(crate::stopwatch::SystemClock));

        stopwatch.start().unwrap();
        tokio::time::sleep(Duration::from_millis(60)).await;
        let live = stopwatch.snapshot().unwrap().duration;
        assert!(live > 0);

        stopwatch.stop().unwrap();
        let frozen = stopwatch.snapshot().unwrap().duration;
        assert!(frozen >= 50 && frozen >= live);

        tokio::time::sleep(Duration::from_millis(30)).await;
        assert_eq!(stopwatch.snapshot().unwrap().duration, frozen);
    }
}
