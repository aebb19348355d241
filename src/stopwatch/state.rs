//! Stopwatch state machine
//!
//! Every transition takes the current wall-clock instant explicitly so the
//! machine stays pure and deterministic under test.

use serde::{Deserialize, Serialize};

/// A single recorded lap
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Lap {
    /// Cumulative elapsed time at which this lap began
    pub cumulative_start: u64,
    /// Split time of this lap alone
    pub duration: u64,
}

impl Lap {
    /// Cumulative elapsed time at which this lap ended
    pub fn cumulative_end(&self) -> u64 {
        self.cumulative_start.saturating_add(self.duration)
    }
}

/// Offset of a duration from a wall-clock instant, clamped to the i64 range
fn anchor_for(now: i64, duration: u64) -> i64 {
    now.saturating_sub(i64::try_from(duration).unwrap_or(i64::MAX))
}

/// Persisted form of a stopwatch. The anchor is wall-clock relative and
/// is recomputed on load, so it is not part of the snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Snapshot {
    pub duration: u64,
    pub running: bool,
    pub laps: Vec<Lap>,
}

impl Snapshot {
    /// Check that a snapshot read back from storage is one this machine could
    /// have produced: the duration fits a wall-clock offset, laps chain end to
    /// start from zero, and no lap ends past the duration.
    pub fn validate(&self) -> Result<(), String> {
        if i64::try_from(self.duration).is_err() {
            return Err(format!("duration {}ms is out of range", self.duration));
        }

        let mut expected_start = 0u64;
        for (index, lap) in self.laps.iter().enumerate() {
            if lap.cumulative_start != expected_start {
                return Err(format!(
                    "lap {} starts at {}ms, expected {}ms",
                    index + 1, lap.cumulative_start, expected_start
                ));
            }
            expected_start = lap
                .cumulative_start
                .checked_add(lap.duration)
                .filter(|end| *end <= self.duration)
                .ok_or_else(|| format!("lap {} ends past {}ms", index + 1, self.duration))?;
        }

        Ok(())
    }
}

/// Coarse phase of a stopwatch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    StoppedAtZero,
    StoppedWithElapsed,
    Running,
}

/// Running/stopped status, elapsed duration and recorded laps of one stopwatch
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StopwatchState {
    running: bool,
    anchor: Option<i64>,
    duration: u64,
    laps: Vec<Lap>,
}

impl StopwatchState {
    /// Create a stopwatch stopped at zero
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a stopwatch from a snapshot. A running snapshot gets a fresh
    /// anchor so elapsed time carries on from the saved duration.
    pub fn restore(snapshot: Snapshot, now: i64) -> Self {
        let anchor = snapshot
            .running
            .then(|| anchor_for(now, snapshot.duration));

        Self {
            running: snapshot.running,
            anchor,
            duration: snapshot.duration,
            laps: snapshot.laps,
        }
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            duration: self.duration,
            running: self.running,
            laps: self.laps.clone(),
        }
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn duration(&self) -> u64 {
        self.duration
    }

    pub fn anchor(&self) -> Option<i64> {
        self.anchor
    }

    pub fn laps(&self) -> &[Lap] {
        &self.laps
    }

    pub fn phase(&self) -> Phase {
        if self.running {
            Phase::Running
        } else if self.duration == 0 {
            Phase::StoppedAtZero
        } else {
            Phase::StoppedWithElapsed
        }
    }

    /// Start the clock. Returns false if it was already running.
    pub fn start(&mut self, now: i64) -> bool {
        if self.running {
            return false;
        }
        self.anchor = Some(anchor_for(now, self.duration));
        self.running = true;
        true
    }

    /// Recompute the live duration. Returns true if it changed.
    pub fn refresh(&mut self, now: i64) -> bool {
        let Some(anchor) = self.anchor.filter(|_| self.running) else {
            return false;
        };

        let elapsed = now.saturating_sub(anchor).max(0) as u64;
        // a wall clock stepping backwards must not rewind the display
        if elapsed > self.duration {
            self.duration = elapsed;
            true
        } else {
            false
        }
    }

    /// Stop the clock, freezing the duration. Returns false if not running.
    pub fn stop(&mut self, now: i64) -> bool {
        if !self.running {
            return false;
        }
        self.refresh(now);
        self.running = false;
        self.anchor = None;
        true
    }

    /// Record a lap ending now. Returns the new lap, or `None` when stopped.
    pub fn lap(&mut self, now: i64) -> Option<Lap> {
        if !self.running {
            return None;
        }
        self.refresh(now);

        let cumulative_start = self.laps.last().map_or(0, Lap::cumulative_end);
        let lap = Lap {
            cumulative_start,
            duration: self.duration.saturating_sub(cumulative_start),
        };
        self.laps.push(lap);
        Some(lap)
    }

    /// Return to zero. Only applies while stopped with elapsed time.
    pub fn reset(&mut self) -> bool {
        if self.phase() != Phase::StoppedWithElapsed {
            return false;
        }
        self.duration = 0;
        self.laps.clear();
        true
    }
}
