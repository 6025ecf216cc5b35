//! Per-caller admission control (token buckets).
//!
//! Denial is a normal outcome (`false`), not an error. The limiter knows nothing
//! about the ledger; it gates purely on the caller key it is handed.

pub mod bucket;
pub mod config;
pub mod limiter;

pub use bucket::TokenBucket;
pub use config::{LimiterConfig, LimiterConfigError};
pub use limiter::AdmissionLimiter;
