use std::time::Duration;

use thiserror::Error;

/// Lower bound for the default idle TTL.
const MIN_DEFAULT_IDLE_TTL: Duration = Duration::from_secs(60);

#[derive(Debug, Error, Clone, PartialEq)]
pub enum LimiterConfigError {
    #[error("capacity must be a finite number of at least one token (got {0})")]
    Capacity(f64),

    #[error("refill rate must be a positive finite number (got {0})")]
    RefillRate(f64),

    #[error("refill time {capacity} / {refill_per_sec} per second is out of range")]
    RefillTime { capacity: f64, refill_per_sec: f64 },

    #[error("idle ttl {ttl:?} is shorter than the full refill time {refill:?}")]
    IdleTtlTooShort { ttl: Duration, refill: Duration },
}

/// Token-bucket policy shared by every caller.
#[derive(Debug, Clone, PartialEq)]
pub struct LimiterConfig {
    /// Maximum tokens a bucket holds (burst size).
    pub capacity: f64,
    /// Tokens added per second.
    pub refill_per_sec: f64,
    /// Buckets idle for at least this long may be evicted.
    pub idle_ttl: Duration,
}

impl LimiterConfig {
    /// Validated config. `idle_ttl = None` picks the default TTL.
    ///
    /// The TTL may not be shorter than an empty bucket's refill time; otherwise
    /// eviction would hand a caller a full bucket early.
    pub fn new(
        capacity: f64,
        refill_per_sec: f64,
        idle_ttl: Option<Duration>,
    ) -> Result<Self, LimiterConfigError> {
        // A bucket below one token can never admit anything.
        if !(capacity.is_finite() && capacity >= 1.0) {
            return Err(LimiterConfigError::Capacity(capacity));
        }
        if !(refill_per_sec.is_finite() && refill_per_sec > 0.0) {
            return Err(LimiterConfigError::RefillRate(refill_per_sec));
        }

        let refill = Duration::try_from_secs_f64(capacity / refill_per_sec).map_err(|_| {
            LimiterConfigError::RefillTime {
                capacity,
                refill_per_sec,
            }
        })?;
        let idle_ttl = match idle_ttl {
            Some(ttl) if ttl < refill => {
                return Err(LimiterConfigError::IdleTtlTooShort { ttl, refill });
            }
            Some(ttl) => ttl,
            None => refill.max(MIN_DEFAULT_IDLE_TTL),
        };

        Ok(Self {
            capacity,
            refill_per_sec,
            idle_ttl,
        })
    }
}

impl Default for LimiterConfig {
    /// 10-token burst, 1 token per second.
    fn default() -> Self {
        Self {
            capacity: 10.0,
            refill_per_sec: 1.0,
            idle_ttl: MIN_DEFAULT_IDLE_TTL,
        }
    }
}
