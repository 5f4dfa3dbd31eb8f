// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Wall-clock source for block timestamps.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

pub trait Clock: Send + Sync {
    /// Unix time in seconds.
    fn now(&self) -> f64;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> f64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs_f64())
            .unwrap_or(0.0)
    }
}

/// Deterministic clock: returns `start`, then `start + step`, `start + 2*step`, ...
#[derive(Debug)]
pub struct FixedClock {
    start: f64,
    step: f64,
    ticks: AtomicU64,
}

impl FixedClock {
    pub fn new(start: f64, step: f64) -> Self {
        Self {
            start,
            step,
            ticks: AtomicU64::new(0),
        }
    }

    /// A clock frozen at `at`.
    pub fn frozen(at: f64) -> Self {
        Self::new(at, 0.0)
    }
}

impl Clock for FixedClock {
    fn now(&self) -> f64 {
        let n = self.ticks.fetch_add(1, Ordering::Relaxed);
        self.start + self.step * n as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_clock_steps() {
        let c = FixedClock::new(100.0, 0.5);
        assert_eq!(c.now(), 100.0);
        assert_eq!(c.now(), 100.5);
        assert_eq!(c.now(), 101.0);
    }

    #[test]
    fn test_system_clock_is_past_2020() {
        assert!(SystemClock.now() > 1_577_836_800.0);
    }
}
