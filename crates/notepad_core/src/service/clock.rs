//! Wall-clock source for record timestamps.

use std::time::{SystemTime, UNIX_EPOCH};

/// Supplies epoch milliseconds for `created_at`/`modified_at`.
pub trait Clock: Send + Sync {
    fn now_epoch_ms(&self) -> i64;
}

/// Reads the system wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_epoch_ms(&self) -> i64 {
        match SystemTime::now().duration_since(UNIX_EPOCH) {
            Ok(elapsed) => i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX),
            // Pre-epoch system time; the update merge keeps stored values monotonic.
            Err(_) => 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Clock, SystemClock};

    #[test]
    fn system_clock_is_after_2020() {
        assert!(SystemClock.now_epoch_ms() > 1_577_836_800_000);
    }
}
