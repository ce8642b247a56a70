use std::time::SystemTime;

/// Anything that can say what time it is.
///
/// Sector timestamps come from the sender's wall clock, so the display
/// compares them against wall-clock time as well.
pub trait Clock {
    fn now(&self) -> SystemTime;
}

/// The host's wall clock.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> SystemTime {
        SystemTime::now()
    }
}

/// Age of `timestamp` at `now` in seconds. Timestamps from the future are age 0.
pub fn age_secs(now: SystemTime, timestamp: SystemTime) -> f64 {
    now.duration_since(timestamp)
        .map(|d| d.as_secs_f64())
        .unwrap_or(0.0)
}

#[cfg(test)]
pub use manual::ManualClock;

#[cfg(test)]
mod manual {
    use std::cell::Cell;
    use std::rc::Rc;
    use std::time::{Duration, SystemTime};

    use super::Clock;

    /// Hand-driven clock for deterministic tests. Clones share the same time.
    #[derive(Clone)]
    pub struct ManualClock {
        now: Rc<Cell<SystemTime>>,
    }

    impl ManualClock {
        pub fn new() -> Self {
            Self {
                now: Rc::new(Cell::new(SystemTime::UNIX_EPOCH + Duration::from_secs(1_000_000))),
            }
        }

        pub fn advance_secs(&self, secs: f64) {
            self.now.set(self.now.get() + Duration::from_secs_f64(secs));
        }
    }

    impl Clock for ManualClock {
        fn now(&self) -> SystemTime {
            self.now.get()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn age_counts_forward() {
        let t0 = SystemTime::UNIX_EPOCH;
        assert_eq!(age_secs(t0 + Duration::from_millis(1500), t0), 1.5);
    }

    #[test]
    fn future_timestamps_are_fresh() {
        let t0 = SystemTime::UNIX_EPOCH + Duration::from_secs(10);
        assert_eq!(age_secs(SystemTime::UNIX_EPOCH, t0), 0.0);
    }

    #[test]
    fn manual_clock_clones_share_time() {
        let a = ManualClock::new();
        let b = a.clone();
        let before = b.now();
        a.advance_secs(2.0);
        assert_eq!(age_secs(b.now(), before), 2.0);
    }
}
