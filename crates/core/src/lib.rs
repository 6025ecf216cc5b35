//! `tally-core` — ledger domain building blocks.
//!
//! This crate contains **pure domain** types (no locking, no IO). Stores and the
//! HTTP boundary build on top of it.

pub mod account;
pub mod entity;
pub mod error;
pub mod id;
pub mod transaction;

pub use account::Account;
pub use entity::Entity;
pub use error::{LedgerError, LedgerResult};
pub use id::{AccountId, TransactionId};
pub use transaction::{Receipt, Transaction, TransactionKind, TransferRequest};
