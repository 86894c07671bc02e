//! Politeness throttle between upstream dataset requests.

use std::time::Duration;

/// Default pause before each dataset request.
pub const DEFAULT_DELAY: Duration = Duration::from_millis(2000);

/// Blocks before an outbound dataset request.
pub trait Throttle {
    fn wait(&self);
}

/// Sleeps the current thread for a fixed delay.
#[derive(Debug, Clone, Copy)]
pub struct FixedDelay {
    delay: Duration,
}

impl FixedDelay {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }
}

impl Default for FixedDelay {
    fn default() -> Self {
        Self::new(DEFAULT_DELAY)
    }
}

impl Throttle for FixedDelay {
    fn wait(&self) {
        if !self.delay.is_zero() {
            std::thread::sleep(self.delay);
        }
    }
}
