//! Ledger error model.

use thiserror::Error;

use crate::id::AccountId;

/// Result type used across the ledger layer.
pub type LedgerResult<T> = Result<T, LedgerError>;

/// Ledger-level error.
///
/// Every variant is a caller-correctable condition. A store returning any of these
/// has left its state untouched.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum LedgerError {
    /// An account with the same identifier is already present.
    #[error("account already exists: {0}")]
    AlreadyExists(AccountId),

    /// The requested account does not exist.
    #[error("account not found: {0}")]
    NotFound(AccountId),

    /// The debited side of a transaction does not resolve to an account.
    #[error("sender account not found")]
    SenderNotFound,

    /// The credited side of a transaction does not resolve to an account.
    #[error("recipient account not found")]
    RecipientNotFound,

    /// The sender's balance is lower than the requested amount.
    #[error("insufficient funds: balance {balance}, requested {requested}")]
    InsufficientFunds { balance: f64, requested: f64 },

    /// Amount was zero, negative or not a finite number.
    #[error("invalid amount: {0} (must be a positive finite number)")]
    InvalidAmount(f64),

    /// Transfer whose sender and recipient are the same account.
    #[error("sender and recipient must be different accounts")]
    SelfTransfer,

    /// The store could not be accessed (e.g. a poisoned lock).
    #[error("ledger unavailable: {0}")]
    Unavailable(String),
}

impl LedgerError {
    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self::Unavailable(msg.into())
    }

    /// Stable machine-readable code for the error kind.
    pub fn code(&self) -> &'static str {
        match self {
            LedgerError::AlreadyExists(_) => "already_exists",
            LedgerError::NotFound(_) => "not_found",
            LedgerError::SenderNotFound => "sender_not_found",
            LedgerError::RecipientNotFound => "recipient_not_found",
            LedgerError::InsufficientFunds { .. } => "insufficient_funds",
            LedgerError::InvalidAmount(_) => "invalid_amount",
            LedgerError::SelfTransfer => "self_transfer",
            LedgerError::Unavailable(_) => "store_unavailable",
        }
    }
}
