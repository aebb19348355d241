//! Presentation model of a stopwatch

use serde::{Deserialize, Serialize};

use super::StopwatchId;
use crate::stopwatch::{
    fastest_and_slowest, format_duration, FormattedDuration, Lap, LapHighlight, Phase, Snapshot, StopwatchState,
};

/// Everything a client needs to draw one stopwatch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StopwatchView {
    pub id: StopwatchId,
    pub phase: Phase,
    pub running: bool,
    pub duration: u64,
    pub clock: FormattedDuration,
    pub show_hours: bool,
    pub display: String,
    /// The lap/reset control is disabled at zero
    pub lap_or_reset_enabled: bool,
    /// Newest lap first
    pub laps: Vec<LapView>,
}

/// One row of the lap list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LapView {
    /// 1-based position in recording order
    pub number: usize,
    pub cumulative_start: u64,
    pub duration: u64,
    pub display: String,
    pub highlight: Option<LapHighlight>,
}

impl StopwatchView {
    pub fn render(id: StopwatchId, state: &StopwatchState) -> Self {
        Self::from_parts(id, state.phase(), state.duration(), state.laps())
    }

    /// Render a snapshot carried by a change notification
    pub fn from_snapshot(id: StopwatchId, snapshot: &Snapshot) -> Self {
        let phase = match (snapshot.running, snapshot.duration) {
            (true, _) => Phase::Running,
            (false, 0) => Phase::StoppedAtZero,
            (false, _) => Phase::StoppedWithElapsed,
        };
        Self::from_parts(id, phase, snapshot.duration, &snapshot.laps)
    }

    fn from_parts(id: StopwatchId, phase: Phase, duration: u64, laps: &[Lap]) -> Self {
        let clock = format_duration(duration);
        let extremes = fastest_and_slowest(laps);

        let laps = laps
            .iter()
            .enumerate()
            .rev()
            .map(|(index, lap)| LapView {
                number: index + 1,
                cumulative_start: lap.cumulative_start,
                duration: lap.duration,
                display: format_duration(lap.duration).to_string(),
                highlight: extremes.and_then(|extremes| extremes.highlight(index)),
            })
            .collect();

        Self {
            id,
            phase,
            running: phase == Phase::Running,
            duration,
            show_hours: clock.show_hours(),
            display: clock.to_string(),
            clock,
            lap_or_reset_enabled: duration > 0,
            laps,
        }
    }
}
