use std::sync::Arc;
use std::time::{Duration, Instant};

use tally_admission::AdmissionLimiter;
use tally_ledger::{InMemoryLedgerStore, LedgerService};
use tokio::task::JoinHandle;
use tracing::debug;

use crate::config::ApiConfig;

/// Shared application services handed to handlers and middleware.
pub struct AppServices {
    pub ledger: LedgerService,
    pub limiter: Arc<AdmissionLimiter>,
}

/// Wire the in-memory ledger store and the admission limiter.
pub fn build_services(config: &ApiConfig) -> AppServices {
    let store = Arc::new(InMemoryLedgerStore::new());

    AppServices {
        ledger: LedgerService::new(store),
        limiter: Arc::new(AdmissionLimiter::new(config.limiter.clone())),
    }
}

/// Periodically evict idle admission buckets. Runs until the handle is aborted.
pub fn spawn_bucket_sweeper(limiter: Arc<AdmissionLimiter>, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        // The first tick completes immediately.
        ticker.tick().await;
        loop {
            ticker.tick().await;
            let removed = limiter.sweep_idle(Instant::now());
            debug!(removed, tracked = limiter.len(), "admission buckets swept");
        }
    })
}
