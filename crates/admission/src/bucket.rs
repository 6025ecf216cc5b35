use std::time::{Duration, Instant};

/// Continuous token bucket.
///
/// The level stays in `[0, capacity]`: refill is clamped at capacity and a
/// token is only taken when a whole one is available.
#[derive(Debug, Clone)]
pub struct TokenBucket {
    capacity: f64,
    refill_per_sec: f64,
    tokens: f64,
    last_seen: Instant,
}

impl TokenBucket {
    /// A bucket that starts full at `now`.
    pub fn full(capacity: f64, refill_per_sec: f64, now: Instant) -> Self {
        Self {
            capacity,
            refill_per_sec,
            tokens: capacity,
            last_seen: now,
        }
    }

    fn refill(&mut self, now: Instant) {
        // Instants older than the last observation add nothing.
        let elapsed = now.saturating_duration_since(self.last_seen);
        if elapsed.is_zero() {
            return;
        }
        self.tokens = (self.tokens + elapsed.as_secs_f64() * self.refill_per_sec).min(self.capacity);
        self.last_seen = now;
    }

    /// Take one token if available.
    pub fn try_acquire(&mut self, now: Instant) -> bool {
        self.refill(now);
        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            true
        } else {
            false
        }
    }

    /// Current level as of the last observation.
    pub fn tokens(&self) -> f64 {
        self.tokens
    }

    /// Time since the bucket was last observed.
    pub fn idle_for(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.last_seen)
    }
}
