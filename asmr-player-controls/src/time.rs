use std::{fmt::Display, time::Duration};

/// Millisecond playback time.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Default, Debug, Hash)]
pub struct Time(u64);

impl Time {
    pub const ZERO: Time = Time(0);

    pub fn from_mseconds(value: u64) -> Self {
        Self(value)
    }

    pub fn from_seconds(value: u64) -> Self {
        Self(value * 1000)
    }

    /// Fractional seconds as reported by the catalog; negative or NaN become zero.
    pub fn from_seconds_f64(value: f64) -> Self {
        if value.is_finite() && value > 0.0 {
            Self((value * 1000.0).round() as u64)
        } else {
            Self::ZERO
        }
    }

    pub fn mseconds(&self) -> u64 {
        self.0
    }

    pub fn seconds(&self) -> u64 {
        self.0 / 1000
    }
}

/// `m:ss`, minutes unbounded.
impl Display for Time {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let seconds = self.seconds();
        write!(f, "{}:{:02}", seconds / 60, seconds % 60)
    }
}

impl From<Duration> for Time {
    fn from(value: Duration) -> Self {
        Self(value.as_millis() as u64)
    }
}

impl From<Time> for Duration {
    fn from(value: Time) -> Self {
        Duration::from_millis(value.0)
    }
}

/// Elapsed and total time of the current entry, rendered as `1:05 / 2:05`.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct Progress {
    pub position: Time,
    pub duration: Option<Time>,
}

impl Progress {
    /// Fraction in `0.0..=1.0`, when the duration is known.
    pub fn ratio(&self) -> Option<f64> {
        match self.duration {
            Some(duration) if duration.mseconds() > 0 => {
                Some((self.position.mseconds() as f64 / duration.mseconds() as f64).min(1.0))
            }
            _ => None,
        }
    }
}

impl Display for Progress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} / {}",
            self.position,
            self.duration.unwrap_or_default()
        )
    }
}
