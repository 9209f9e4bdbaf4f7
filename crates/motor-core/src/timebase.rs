use std::time::{Instant, SystemTime, UNIX_EPOCH};

/// Source of monotonic milliseconds. The fault monitor's rate limiter reads
/// time only through this trait so tests can drive it by hand.
pub trait Clock: Send {
    fn now_ms(&self) -> u64;
}

/// Process clock anchored at construction.
#[derive(Debug, Clone, Copy)]
pub struct TimeBase {
    start: Instant,
}

impl TimeBase {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    /// Wall-clock microseconds since Unix epoch, stamped on published
    /// messages. Never used for intervals.
    pub fn unix_us(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_micros() as u64)
            .unwrap_or(0)
    }
}

impl Default for TimeBase {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for TimeBase {
    fn now_ms(&self) -> u64 {
        self.start.elapsed().as_millis() as u64
    }
}
