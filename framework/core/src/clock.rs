use std::time::{Duration, Instant};

/// Monotonic time source and sleep primitive.
///
/// The scheduler tick and the VU inter-iteration pause both go through this trait so that
/// the whole engine shares one definition of elapsed time.
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;

    fn sleep(&self, duration: Duration);
}

/// The OS monotonic clock. Used everywhere outside of tests.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}
