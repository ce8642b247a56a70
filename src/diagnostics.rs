use std::time::{Duration, SystemTime};

use crate::clock::age_secs;

/// Default minimum interval between two stale-data warnings.
pub const DEFAULT_STALE_WARN_INTERVAL: Duration = Duration::from_secs(5);

pub struct StaleDataWarning {
    min_interval: Duration,
    last_warned: Option<SystemTime>,
    suppressed: u64,
}

impl StaleDataWarning {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_warned: None,
            suppressed: 0,
        }
    }

    /// Note a sector whose age at arrival is `age_secs`. Logs a warning if it
    /// is already past `fade_secs` and no warning went out recently.
    /// Returns true if a warning was emitted.
    pub fn check(&mut self, now: SystemTime, age_secs_at_arrival: f64, fade_secs: f64) -> bool {
        if age_secs_at_arrival < fade_secs {
            return false;
        }

        let due = match self.last_warned {
            None => true,
            Some(last) => age_secs(now, last) >= self.min_interval.as_secs_f64(),
        };
        if !due {
            self.suppressed += 1;
            return false;
        }

        if self.suppressed > 0 {
            log::warn!(
                "Received radar data is {:.2} s old, older than the {:.2} s fade time; check clock sync ({} similar warnings suppressed)",
                age_secs_at_arrival,
                fade_secs,
                self.suppressed
            );
        } else {
            log::warn!(
                "Received radar data is {:.2} s old, older than the {:.2} s fade time; check clock sync",
                age_secs_at_arrival,
                fade_secs
            );
        }
        self.last_warned = Some(now);
        self.suppressed = 0;
        true
    }
}

impl Default for StaleDataWarning {
    fn default() -> Self {
        Self::new(DEFAULT_STALE_WARN_INTERVAL)
    }
}
