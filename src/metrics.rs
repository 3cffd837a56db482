//! Throughput reporting for the rollout worker.
//!
//! Gating follows the shared global step rather than the worker's own step
//! count, so workers running side by side report at staggered points of one
//! global timeline.

use std::fmt;
use std::time::{Duration, Instant};

/// Training throughput measured at a global step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Throughput {
    /// Global step at measurement time.
    pub global_step: u64,
    /// Time since the training start time.
    pub elapsed: Duration,
    /// Global steps per second since the start time.
    pub steps_per_sec: f64,
}

impl Throughput {
    /// Computes the rate for `global_step` steps over `elapsed`.
    pub fn new(global_step: u64, elapsed: Duration) -> Self {
        let secs = elapsed.as_secs_f64();
        let steps_per_sec = if secs > 0.0 {
            global_step as f64 / secs
        } else {
            0.0
        };
        Self {
            global_step,
            elapsed,
            steps_per_sec,
        }
    }

    /// Extrapolated millions of steps per hour.
    pub fn millions_per_hour(&self) -> f64 {
        self.steps_per_sec * 3600.0 / 1_000_000.0
    }
}

impl fmt::Display for Throughput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "### Performance : {} STEPS in {:.0} sec. {:.0} STEPS/sec. {:.2}M STEPS/hour",
            self.global_step,
            self.elapsed.as_secs_f64(),
            self.steps_per_sec,
            self.millions_per_hour()
        )
    }
}

/// Decides when a worker emits a throughput line.
#[derive(Debug, Clone)]
pub struct PerformanceMonitor {
    start: Instant,
    last_logged_step: u64,
    interval: u64,
}

impl PerformanceMonitor {
    /// Creates a monitor starting now, reporting every `interval` global steps.
    pub fn new(interval: u64) -> Self {
        Self {
            start: Instant::now(),
            last_logged_step: 0,
            interval,
        }
    }

    /// Sets the instant throughput is measured from (usually the driver's start).
    pub fn set_start_time(&mut self, start: Instant) {
        self.start = start;
    }

    /// Global step of the last report checkpoint.
    pub fn last_logged_step(&self) -> u64 {
        self.last_logged_step
    }

    /// Reports throughput if `global_step` has moved at least one interval past
    /// the last checkpoint, advancing the checkpoint by exactly one interval.
    pub fn observe(&mut self, global_step: u64) -> Option<Throughput> {
        self.observe_at(global_step, Instant::now())
    }

    /// [`PerformanceMonitor::observe`] with an explicit clock reading.
    pub fn observe_at(&mut self, global_step: u64, now: Instant) -> Option<Throughput> {
        if (global_step + 1).saturating_sub(self.last_logged_step) < self.interval {
            return None;
        }
        self.last_logged_step += self.interval;
        Some(Throughput::new(
            global_step,
            now.saturating_duration_since(self.start),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn throughput_rates() {
        let t = Throughput::new(2000, Duration::from_secs(4));
        assert!((t.steps_per_sec - 500.0).abs() < 1e-10);
        assert!((t.millions_per_hour() - 1.8).abs() < 1e-10);
    }

    #[test]
    fn zero_elapsed_gives_zero_rate() {
        let t = Throughput::new(10, Duration::ZERO);
        assert_eq!(t.steps_per_sec, 0.0);
    }

    #[test]
    fn display_format() {
        let t = Throughput::new(2000, Duration::from_secs(4));
        assert_eq!(
            t.to_string(),
            "### Performance : 2000 STEPS in 4 sec. 500 STEPS/sec. 1.80M STEPS/hour"
        );
    }

    #[test]
    fn gate_opens_one_interval_at_a_time() {
        let start = Instant::now();
        let mut monitor = PerformanceMonitor::new(100);
        monitor.set_start_time(start);

        assert!(monitor.observe_at(50, start).is_none());
        // (98 + 1) - 0 < 100
        assert!(monitor.observe_at(98, start).is_none());
        let report = monitor.observe_at(99, start + Duration::from_secs(1)).unwrap();
        assert_eq!(report.global_step, 99);
        assert_eq!(monitor.last_logged_step(), 100);

        // A large jump still advances the checkpoint by one interval per report.
        assert!(monitor.observe_at(450, start).is_some());
        assert_eq!(monitor.last_logged_step(), 200);
        assert!(monitor.observe_at(450, start).is_some());
        assert_eq!(monitor.last_logged_step(), 300);
    }

    #[test]
    fn elapsed_measured_from_start_time() {
        let start = Instant::now();
        let mut monitor = PerformanceMonitor::new(10);
        monitor.set_start_time(start);
        let report = monitor
            .observe_at(20, start + Duration::from_secs(2))
            .unwrap();
        assert_eq!(report.elapsed, Duration::from_secs(2));
        assert!((report.steps_per_sec - 10.0).abs() < 1e-10);
    }
}
