//! Timer interval derived from a sampling period

use std::time::Duration;

/// Largest accepted sampling period in seconds.
///
/// The interval is decomposed into a 32-bit seconds field, so anything above
/// `i32::MAX` seconds is rejected.
pub const MAX_PERIOD_SECS: f64 = 2_147_483_647.0;

/// Timer interval split into whole seconds and microseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Interval {
    /// Whole seconds
    pub secs: u32,
    /// Sub-second part, always < 1_000_000
    pub micros: u32,
}

impl Interval {
    /// Convert a sampling period into an interval.
    ///
    /// Returns `None` unless `0 < period <= MAX_PERIOD_SECS` (NaN included).
    /// Accepted periods shorter than a microsecond become one microsecond,
    /// so an accepted period never yields a zero interval.
    pub fn from_period(period: f64) -> Option<Self> {
        if !Self::is_valid_period(period) {
            return None;
        }
        let secs = period.trunc();
        let micros = ((period - secs) * 1_000_000.0).round() as u32;
        // Rounding can carry into the next second (e.g. 1.9999999)
        if micros >= 1_000_000 {
            Some(Self {
                secs: secs as u32 + 1,
                micros: micros - 1_000_000,
            })
        } else {
            Some(Self {
                secs: secs as u32,
                micros: if secs == 0.0 { micros.max(1) } else { micros },
            })
        }
    }

    /// True if `period` is a usable timer period.
    #[inline]
    pub fn is_valid_period(period: f64) -> bool {
        period > 0.0 && period <= MAX_PERIOD_SECS
    }

    /// As a `std::time::Duration`.
    #[inline]
    pub fn as_duration(&self) -> Duration {
        Duration::from_secs(self.secs as u64) + Duration::from_micros(self.micros as u64)
    }

    /// As fractional seconds.
    #[inline]
    pub fn as_secs_f64(&self) -> f64 {
        self.secs as f64 + self.micros as f64 / 1_000_000.0
    }
}

impl From<Interval> for Duration {
    fn from(interval: Interval) -> Self {
        interval.as_duration()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_period() {
        let iv = Interval::from_period(2.5).unwrap();
        assert_eq!(iv, Interval { secs: 2, micros: 500_000 });
        assert_eq!(iv.as_duration(), Duration::from_millis(2500));
    }

    #[test]
    fn test_sub_second_period() {
        let iv = Interval::from_period(0.001).unwrap();
        assert_eq!(iv, Interval { secs: 0, micros: 1_000 });
    }

    #[test]
    fn test_tiny_period_never_zero() {
        let iv = Interval::from_period(1e-7).unwrap();
        assert_eq!(iv, Interval { secs: 0, micros: 1 });
        assert!(!iv.as_duration().is_zero());

        let iv = Interval::from_period(f64::MIN_POSITIVE).unwrap();
        assert_eq!(iv.micros, 1);
    }

    #[test]
    fn test_rounding_carries_into_seconds() {
        let iv = Interval::from_period(1.999_999_9).unwrap();
        assert_eq!(iv, Interval { secs: 2, micros: 0 });
    }

    #[test]
    fn test_range_bounds() {
        assert!(Interval::from_period(0.0).is_none());
        assert!(Interval::from_period(-1.0).is_none());
        assert!(Interval::from_period(f64::NAN).is_none());
        assert!(Interval::from_period(f64::INFINITY).is_none());
        assert!(Interval::from_period(2_147_483_648.0).is_none());

        let max = Interval::from_period(MAX_PERIOD_SECS).unwrap();
        assert_eq!(max.secs, i32::MAX as u32);
        assert_eq!(max.micros, 0);
    }
}
