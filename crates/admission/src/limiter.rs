use std::sync::Arc;
use std::time::Instant;

use dashmap::DashMap;
use parking_lot::Mutex;
use tracing::debug;

use crate::bucket::TokenBucket;
use crate::config::LimiterConfig;

/// Per-caller token-bucket gate.
///
/// The map is only locked (per shard) to look up or create a bucket; token
/// arithmetic then happens under that bucket's own mutex, so different callers
/// never wait on each other's arithmetic.
#[derive(Debug)]
pub struct AdmissionLimiter {
    config: LimiterConfig,
    buckets: DashMap<String, Arc<Mutex<TokenBucket>>>,
}

impl AdmissionLimiter {
    pub fn new(config: LimiterConfig) -> Self {
        Self {
            config,
            buckets: DashMap::new(),
        }
    }

    pub fn config(&self) -> &LimiterConfig {
        &self.config
    }

    /// Try to admit one request from `caller`.
    pub fn allow(&self, caller: &str) -> bool {
        self.allow_at(caller, Instant::now())
    }

    /// Like [`allow`](Self::allow) with an explicit clock reading.
    pub fn allow_at(&self, caller: &str, now: Instant) -> bool {
        let bucket = self.bucket(caller, now);
        let allowed = bucket.lock().try_acquire(now);
        if !allowed {
            debug!(caller, "admission denied");
        }
        allowed
    }

    fn bucket(&self, caller: &str, now: Instant) -> Arc<Mutex<TokenBucket>> {
        if let Some(existing) = self.buckets.get(caller) {
            return Arc::clone(existing.value());
        }

        let entry = self.buckets.entry(caller.to_owned()).or_insert_with(|| {
            debug!(caller, "creating admission bucket");
            Arc::new(Mutex::new(TokenBucket::full(
                self.config.capacity,
                self.config.refill_per_sec,
                now,
            )))
        });
        Arc::clone(entry.value())
    }

    /// Remove buckets idle for at least the configured TTL. Returns how many
    /// were removed.
    ///
    /// A bucket idle that long has refilled completely, so dropping it is
    /// indistinguishable from keeping it. Buckets currently held by an
    /// in-flight `allow` are skipped.
    pub fn sweep_idle(&self, now: Instant) -> usize {
        let ttl = self.config.idle_ttl;
        let mut removed = 0;

        self.buckets.retain(|caller, bucket| {
            let in_use = Arc::strong_count(bucket) > 1;
            let keep = in_use || bucket.lock().idle_for(now) < ttl;
            if !keep {
                debug!(caller = caller.as_str(), "evicting idle admission bucket");
                removed += 1;
            }
            keep
        });

        removed
    }

    /// Number of tracked callers.
    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }
}

impl Default for AdmissionLimiter {
    fn default() -> Self {
        Self::new(LimiterConfig::default())
    }
}
