//! Simulation time.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Sub};
use std::time::Duration;

/// Simulation time in microseconds since the start of the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SimTime(u64);

impl SimTime {
    /// The start of the simulation.
    pub const ZERO: SimTime = SimTime(0);

    /// Create a time from microseconds.
    pub const fn from_micros(us: u64) -> Self {
        SimTime(us)
    }

    /// Create a time from milliseconds, saturating at the largest time.
    pub const fn from_millis(ms: u64) -> Self {
        SimTime(ms.saturating_mul(1_000))
    }

    /// Create a time from whole seconds.
    pub const fn from_secs(secs: u64) -> Self {
        SimTime(secs.saturating_mul(1_000_000))
    }

    /// Create a time from fractional seconds, rounded to the nearest microsecond.
    ///
    /// Negative and non-finite inputs map to [`SimTime::ZERO`].
    pub fn from_secs_f64(secs: f64) -> Self {
        if secs.is_finite() && secs > 0.0 {
            SimTime((secs * 1_000_000.0).round() as u64)
        } else {
            SimTime::ZERO
        }
    }

    /// Microseconds since the start of the run.
    pub const fn as_micros(&self) -> u64 {
        self.0
    }

    /// Milliseconds since the start of the run (truncated).
    pub const fn as_millis(&self) -> u64 {
        self.0 / 1_000
    }

    /// Seconds since the start of the run.
    pub fn as_secs_f64(&self) -> f64 {
        self.0 as f64 / 1_000_000.0
    }

    /// Time elapsed since `earlier`, or zero if `earlier` is in the future.
    pub fn saturating_since(&self, earlier: SimTime) -> SimTime {
        SimTime(self.0.saturating_sub(earlier.0))
    }
}

impl Add for SimTime {
    type Output = SimTime;

    fn add(self, rhs: SimTime) -> SimTime {
        SimTime(self.0.saturating_add(rhs.0))
    }
}

impl AddAssign for SimTime {
    fn add_assign(&mut self, rhs: SimTime) {
        self.0 = self.0.saturating_add(rhs.0);
    }
}

impl Sub for SimTime {
    type Output = SimTime;

    fn sub(self, rhs: SimTime) -> SimTime {
        self.saturating_since(rhs)
    }
}

impl From<Duration> for SimTime {
    fn from(d: Duration) -> Self {
        SimTime(d.as_micros().min(u64::MAX as u128) as u64)
    }
}

impl From<SimTime> for Duration {
    fn from(t: SimTime) -> Self {
        Duration::from_micros(t.0)
    }
}

impl fmt::Display for SimTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.6}s", self.as_secs_f64())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conversions() {
        assert_eq!(SimTime::from_millis(5).as_micros(), 5_000);
        assert_eq!(SimTime::from_secs(2).as_millis(), 2_000);
        assert_eq!(SimTime::from_secs_f64(0.0015).as_micros(), 1_500);
        assert_eq!(SimTime::from_secs_f64(-1.0), SimTime::ZERO);
        assert_eq!(SimTime::from_secs_f64(f64::NAN), SimTime::ZERO);
    }

    #[test]
    fn test_arithmetic_saturates() {
        let a = SimTime::from_millis(10);
        let b = SimTime::from_millis(30);
        assert_eq!(b - a, SimTime::from_millis(20));
        assert_eq!(a - b, SimTime::ZERO);
        assert_eq!(a + b, SimTime::from_millis(40));
    }

    #[test]
    fn test_large_inputs_saturate() {
        assert_eq!(SimTime::from_millis(u64::MAX).as_micros(), u64::MAX);
        assert_eq!(SimTime::from_secs(20_000_000_000_000).as_micros(), u64::MAX);
        assert_eq!(SimTime::from_millis(18_446_744_073_709).as_micros(), 18_446_744_073_709_000);
    }

    #[test]
    fn test_display() {
        assert_eq!(SimTime::from_millis(1500).to_string(), "1.500000s");
    }
}
