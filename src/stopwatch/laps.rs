//! Fastest and slowest lap detection

use serde::{Deserialize, Serialize};

use super::Lap;

/// Indices of the fastest and slowest laps
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LapExtremes {
    pub fastest: usize,
    pub slowest: usize,
}

/// Highlight applied to a lap when rendering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LapHighlight {
    Fastest,
    Slowest,
}

impl LapExtremes {
    /// Highlight for the lap at `index`, if any. A lap that is both fastest
    /// and slowest (all durations equal) is shown as fastest.
    pub fn highlight(&self, index: usize) -> Option<LapHighlight> {
        if index == self.fastest {
            Some(LapHighlight::Fastest)
        } else if index == self.slowest {
            Some(LapHighlight::Slowest)
        } else {
            None
        }
    }
}

/// Find the laps with the minimum and maximum duration.
///
/// Returns `None` with fewer than two laps. Ties go to the first occurrence.
pub fn fastest_and_slowest(laps: &[Lap]) -> Option<LapExtremes> {
    if laps.len() < 2 {
        return None;
    }

    let mut extremes = LapExtremes { fastest: 0, slowest: 0 };
    for (index, lap) in laps.iter().enumerate().skip(1) {
        if lap.duration < laps[extremes.fastest].duration {
            extremes.fastest = index;
        }
        if lap.duration > laps[extremes.slowest].duration {
            extremes.slowest = index;
        }
    }

    Some(extremes)
}
