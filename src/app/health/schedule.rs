//! Probe cadence
//!
//! The interval grows by a fixed factor after each failed probe, capped at a
//! ceiling, and snaps back to the base interval after the next success.

use std::time::Duration;

/// Self-tuning probe interval
#[derive(Debug, Clone)]
pub struct ProbeSchedule {
    base: Duration,
    current: Duration,
    factor: f64,
    max: Duration,
}

impl ProbeSchedule {
    /// Create a schedule starting at the base interval
    pub fn new(base: Duration, factor: f64, max: Duration) -> Self {
        Self {
            base,
            current: base,
            factor,
            max: max.max(base),
        }
    }

    /// Interval until the next probe
    pub fn current(&self) -> Duration {
        self.current
    }

    /// Base interval
    pub fn base(&self) -> Duration {
        self.base
    }

    /// Whether the interval is currently stretched by failures
    pub fn is_backed_off(&self) -> bool {
        self.current > self.base
    }

    /// Stretch the interval after a failed probe
    ///
    /// A product that does not fit in a `Duration` saturates at the ceiling.
    pub fn on_failure(&mut self) -> Duration {
        let stretched = Duration::try_from_secs_f64(self.current.as_secs_f64() * self.factor)
            .unwrap_or(self.max);
        self.current = stretched.min(self.max);
        self.current
    }

    /// Reset the interval after a successful probe
    pub fn on_success(&mut self) -> Duration {
        self.current = self.base;
        self.current
    }

    /// Apply a probe outcome
    pub fn record(&mut self, healthy: bool) -> Duration {
        if healthy {
            self.on_success()
        } else {
            self.on_failure()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schedule() -> ProbeSchedule {
        ProbeSchedule::new(Duration::from_secs(10), 1.5, Duration::from_secs(30))
    }

    #[test]
    fn test_failure_multiplies_interval() {
        let mut schedule = schedule();
        assert_eq!(schedule.on_failure(), Duration::from_secs(15));
        assert_eq!(schedule.on_failure(), Duration::from_millis(22_500));
        assert!(schedule.is_backed_off());
    }

    #[test]
    fn test_interval_is_capped() {
        let mut schedule = schedule();
        for _ in 0..10 {
            schedule.on_failure();
        }
        assert_eq!(schedule.current(), Duration::from_secs(30));
    }

    #[test]
    fn test_success_returns_to_base() {
        let mut schedule = schedule();
        schedule.record(false);
        schedule.record(false);
        assert_eq!(schedule.record(true), Duration::from_secs(10));
        assert!(!schedule.is_backed_off());
        assert_eq!(schedule.current(), schedule.base());
    }

    #[test]
    fn test_huge_ceiling_does_not_overflow() {
        let mut schedule = ProbeSchedule::new(
            Duration::from_secs(u64::MAX / 4 * 3),
            1.5,
            Duration::MAX,
        );
        assert_eq!(schedule.on_failure(), Duration::MAX);
        assert_eq!(schedule.on_failure(), Duration::MAX);

        let mut schedule = ProbeSchedule::new(Duration::from_secs(10), f64::INFINITY, Duration::MAX);
        assert_eq!(schedule.on_failure(), Duration::MAX);
    }
}
