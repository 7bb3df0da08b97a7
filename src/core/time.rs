//! Fixed-interval tick timing
//!
//! Decouples simulation ticks from however often the driver loop runs.

use std::time::{Duration, Instant};

/// Accumulates elapsed time and reports how many ticks are due
#[derive(Debug, Clone)]
pub struct TickTimer {
    interval: Duration,
    accumulated: Duration,
    last: Option<Instant>,
}

impl TickTimer {
    /// Create a timer firing every `interval` (clamped to at least 1 ms)
    #[must_use]
    pub fn new(interval: Duration) -> Self {
        Self {
            interval: interval.max(Duration::from_millis(1)),
            accumulated: Duration::ZERO,
            last: None,
        }
    }

    #[must_use]
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Add `elapsed` and return the number of whole intervals now due
    pub fn advance(&mut self, elapsed: Duration) -> u32 {
        self.accumulated += elapsed;
        let mut due = 0;
        while self.accumulated >= self.interval {
            self.accumulated -= self.interval;
            due += 1;
        }
        due
    }

    /// Advance by the wall-clock time since the previous call
    pub fn update(&mut self) -> u32 {
        let now = Instant::now();
        let elapsed = self.last.map_or(Duration::ZERO, |last| now - last);
        self.last = Some(now);
        self.advance(elapsed)
    }

    /// Time left until the next tick is due
    #[must_use]
    pub fn until_next(&self) -> Duration {
        self.interval.saturating_sub(self.accumulated)
    }

    pub fn reset(&mut self) {
        self.accumulated = Duration::ZERO;
        self.last = None;
    }
}
