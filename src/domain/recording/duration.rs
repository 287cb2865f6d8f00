//! Duration value object

use std::fmt;
use std::str::FromStr;
use std::time::Duration as StdDuration;

use crate::domain::error::DurationParseError;

/// Default capture duration (2.5 seconds)
pub const DEFAULT_DURATION_MS: u64 = 2_500;

/// Longest capture that can still plausibly fit a single QR payload
pub const MAX_CAPTURE_MS: u64 = 10_000;

/// Value object representing a capture duration.
/// Immutable, millisecond precision, validated on creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Duration {
    milliseconds: u64,
}

impl Duration {
    /// Create a Duration from milliseconds
    pub const fn from_millis(ms: u64) -> Self {
        Self { milliseconds: ms }
    }

    /// Create a Duration from seconds
    pub const fn from_secs(secs: u64) -> Self {
        Self {
            milliseconds: secs * 1000,
        }
    }

    /// Default capture duration (2.5 seconds)
    pub const fn default_duration() -> Self {
        Self::from_millis(DEFAULT_DURATION_MS)
    }

    /// Upper bound for a single capture
    pub const fn max_capture() -> Self {
        Self::from_millis(MAX_CAPTURE_MS)
    }

    /// Get duration in milliseconds
    pub const fn as_millis(&self) -> u64 {
        self.milliseconds
    }

    /// Get duration in fractional seconds
    pub fn as_secs_f64(&self) -> f64 {
        self.milliseconds as f64 / 1000.0
    }

    /// Number of frames this duration spans at `sample_rate`
    pub fn frames_at(&self, sample_rate: u32) -> usize {
        (self.milliseconds * sample_rate as u64 / 1000) as usize
    }

    /// Convert to std::time::Duration
    pub const fn as_std(&self) -> StdDuration {
        StdDuration::from_millis(self.milliseconds)
    }

    /// Whether this duration is longer than a single capture allows
    pub const fn exceeds_capture_limit(&self) -> bool {
        self.milliseconds > MAX_CAPTURE_MS
    }
}

impl FromStr for Duration {
    type Err = DurationParseError;

    /// Parse a duration string into a Duration value object.
    /// Supported formats: "2.5s", "1600ms", "1m", "1m30s"
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let input = s.trim().to_lowercase();
        let invalid = || DurationParseError::Malformed(s.to_string());

        let mut chars = input.chars().peekable();
        let mut total_ms = 0.0f64;
        let mut current_num = String::new();
        let mut found_any = false;

        while let Some(ch) = chars.next() {
            if ch.is_ascii_digit() || ch == '.' {
                current_num.push(ch);
                continue;
            }
            if current_num.is_empty() {
                return Err(invalid());
            }

            let value: f64 = current_num.parse().map_err(|_| invalid())?;
            let factor = match ch {
                'm' if chars.peek() == Some(&'s') => {
                    chars.next();
                    1.0
                }
                'm' => 60_000.0,
                's' => 1_000.0,
                _ => return Err(invalid()),
            };

            total_ms += value * factor;
            current_num.clear();
            found_any = true;
        }

        // Leftover digits without a unit
        if !current_num.is_empty() || !found_any {
            return Err(invalid());
        }

        let milliseconds = total_ms.round() as u64;
        if milliseconds == 0 {
            return Err(DurationParseError::Zero(s.to_string()));
        }

        Ok(Self { milliseconds })
    }
}

impl fmt::Display for Duration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let minutes = self.milliseconds / 60_000;
        let rest_ms = self.milliseconds % 60_000;

        let seconds = if rest_ms % 1000 == 0 {
            format!("{}s", rest_ms / 1000)
        } else {
            format!("{}s", rest_ms as f64 / 1000.0)
        };

        if minutes == 0 {
            write!(f, "{}", seconds)
        } else if rest_ms == 0 {
            write!(f, "{}m", minutes)
        } else {
            write!(f, "{}m{}", minutes, seconds)
        }
    }
}

impl Default for Duration {
    fn default() -> Self {
        Self::default_duration()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_seconds_only() {
        let d: Duration = "30s".parse().unwrap();
        assert_eq!(d.as_millis(), 30_000);
    }

    #[test]
    fn parse_fractional_seconds() {
        let d: Duration = "2.5s".parse().unwrap();
        assert_eq!(d.as_millis(), 2_500);

        let d: Duration = "1.6s".parse().unwrap();
        assert_eq!(d.as_millis(), 1_600);
    }

    #[test]
    fn parse_milliseconds() {
        let d: Duration = "1600ms".parse().unwrap();
        assert_eq!(d.as_millis(), 1_600);
    }

    #[test]
    fn parse_minutes_and_seconds() {
        let d: Duration = "1m30s".parse().unwrap();
        assert_eq!(d.as_millis(), 90_000);
    }

    #[test]
    fn parse_case_insensitive_and_trimmed() {
        let d: Duration = "  2.5S ".parse().unwrap();
        assert_eq!(d.as_millis(), 2_500);
    }

    #[test]
    fn parse_invalid_inputs() {
        assert!("".parse::<Duration>().is_err());
        assert!("2.5".parse::<Duration>().is_err());
        assert!("abc".parse::<Duration>().is_err());
        assert!("1.2.3s".parse::<Duration>().is_err());
        assert!("s".parse::<Duration>().is_err());
        assert!("3x".parse::<Duration>().is_err());
    }

    #[test]
    fn parse_invalid_zero() {
        assert_eq!(
            "0s".parse::<Duration>(),
            Err(DurationParseError::Zero("0s".to_string()))
        );
        assert!("0ms".parse::<Duration>().is_err());
        assert!("0.0001s".parse::<Duration>().is_err());
    }

    #[test]
    fn display_formats() {
        assert_eq!(Duration::from_millis(2_500).to_string(), "2.5s");
        assert_eq!(Duration::from_secs(3).to_string(), "3s");
        assert_eq!(Duration::from_secs(120).to_string(), "2m");
        assert_eq!(Duration::from_millis(90_500).to_string(), "1m30.5s");
    }

    #[test]
    fn frames_at_sample_rate() {
        let d = Duration::from_millis(1_600);
        assert_eq!(d.frames_at(48_000), 76_800);
        assert_eq!(d.frames_at(8_000), 12_800);
    }

    #[test]
    fn capture_limit() {
        assert!(!Duration::from_secs(10).exceeds_capture_limit());
        assert!(Duration::from_millis(10_001).exceeds_capture_limit());
    }

    #[test]
    fn default_is_two_and_a_half_seconds() {
        assert_eq!(Duration::default().as_millis(), 2_500);
        assert_eq!(Duration::default().as_std(), StdDuration::from_millis(2_500));
    }
}
