//! Duration formatting for display

use std::fmt;

use serde::{Deserialize, Serialize};

const MS_PER_HOUR: u64 = 3_600_000;
const MS_PER_MINUTE: u64 = 60_000;
const MS_PER_SECOND: u64 = 1_000;

/// A duration split into display fields
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormattedDuration {
    pub hours: String,
    pub minutes: String,
    pub seconds: String,
    pub hundredths: String,
}

impl FormattedDuration {
    /// Hours are only shown once at least one full hour has elapsed
    pub fn show_hours(&self) -> bool {
        self.hours.chars().any(|c| c != '0')
    }
}

impl fmt::Display for FormattedDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.show_hours() {
            write!(f, "{}:", self.hours)?;
        }
        write!(f, "{}:{}.{}", self.minutes, self.seconds, self.hundredths)
    }
}

/// Split a millisecond duration into hours, minutes, seconds and hundredths.
///
/// Hundredths are padded on the right, so a value of 5 renders as `"50"`.
pub fn format_duration(ms: u64) -> FormattedDuration {
    let hours = ms / MS_PER_HOUR;
    let minutes = (ms / MS_PER_MINUTE) % 60;
    let seconds = (ms / MS_PER_SECOND) % 60;
    let hundredths = (ms % MS_PER_SECOND) / 10;

    FormattedDuration {
        hours: format!("{:0>2}", hours),
        minutes: format!("{:0>2}", minutes),
        seconds: format!("{:0>2}", seconds),
        hundredths: format!("{:0<2}", hundredths),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_zero() {
        let formatted = format_duration(0);
        assert_eq!(formatted.hours, "00");
        assert_eq!(formatted.minutes, "00");
        assert_eq!(formatted.seconds, "00");
        assert_eq!(formatted.hundredths, "00");
        assert!(!formatted.show_hours());
        assert_eq!(formatted.to_string(), "00:00.00");
    }

    #[test]
    fn formats_every_field() {
        let formatted = format_duration(3_661_230);
        assert_eq!(formatted.hours, "01");
        assert_eq!(formatted.minutes, "01");
        assert_eq!(formatted.seconds, "01");
        assert_eq!(formatted.hundredths, "23");
        assert!(formatted.show_hours());
        assert_eq!(formatted.to_string(), "01:01:01.23");
    }

    #[test]
    fn single_digit_hundredths_pad_right() {
        assert_eq!(format_duration(50).hundredths, "50");
        assert_eq!(format_duration(1_059).hundredths, "50");
        assert_eq!(format_duration(9).hundredths, "00");
    }

    #[test]
    fn hundredths_always_two_chars() {
        for ms in (0..5_000).step_by(7) {
            assert_eq!(format_duration(ms).hundredths.len(), 2, "ms = {}", ms);
        }
    }

    #[test]
    fn large_hours_are_not_truncated() {
        let formatted = format_duration(125 * MS_PER_HOUR);
        assert_eq!(formatted.hours, "125");
        assert_eq!(formatted.to_string(), "125:00:00.00");
    }
}
