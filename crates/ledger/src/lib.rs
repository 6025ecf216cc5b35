//! Ledger store boundary and its in-memory implementation.
//!
//! The store owns account balances and the transaction log; the service wraps a
//! store with logging for callers such as the HTTP API.

pub mod in_memory;
pub mod service;
pub mod store;

pub use in_memory::InMemoryLedgerStore;
pub use service::LedgerService;
pub use store::LedgerStore;
