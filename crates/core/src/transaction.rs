use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::account::Account;
use crate::error::{LedgerError, LedgerResult};
use crate::id::{AccountId, TransactionId};

/// Kind of money movement.
///
/// Deposits and withdrawals have one external (unrecorded) side; a transfer moves
/// money between two accounts held by the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    Deposit,
    Withdrawal,
    Transfer,
}

impl TransactionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::Deposit => "deposit",
            TransactionKind::Withdrawal => "withdrawal",
            TransactionKind::Transfer => "transfer",
        }
    }

    /// Whether this kind debits an account held by the ledger.
    pub fn debits(&self) -> bool {
        matches!(self, TransactionKind::Withdrawal | TransactionKind::Transfer)
    }

    /// Whether this kind credits an account held by the ledger.
    pub fn credits(&self) -> bool {
        matches!(self, TransactionKind::Deposit | TransactionKind::Transfer)
    }
}

impl core::fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A transaction as submitted, before the store has committed it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransferRequest {
    pub kind: TransactionKind,
    pub amount: f64,
    pub from_id: Option<AccountId>,
    pub to_id: Option<AccountId>,
}

impl TransferRequest {
    pub fn transfer(from: impl Into<AccountId>, to: impl Into<AccountId>, amount: f64) -> Self {
        Self {
            kind: TransactionKind::Transfer,
            amount,
            from_id: Some(from.into()),
            to_id: Some(to.into()),
        }
    }

    pub fn deposit(to: impl Into<AccountId>, amount: f64) -> Self {
        Self {
            kind: TransactionKind::Deposit,
            amount,
            from_id: None,
            to_id: Some(to.into()),
        }
    }

    pub fn withdrawal(from: impl Into<AccountId>, amount: f64) -> Self {
        Self {
            kind: TransactionKind::Withdrawal,
            amount,
            from_id: Some(from.into()),
            to_id: None,
        }
    }

    /// Checks that need no account state: amount and self-transfer.
    pub fn validate(&self) -> LedgerResult<()> {
        if !(self.amount.is_finite() && self.amount > 0.0) {
            return Err(LedgerError::InvalidAmount(self.amount));
        }

        if self.kind == TransactionKind::Transfer {
            if let (Some(from), Some(to)) = (&self.from_id, &self.to_id) {
                if from == to {
                    return Err(LedgerError::SelfTransfer);
                }
            }
        }

        Ok(())
    }

    /// Account debited by this request, if its kind debits one.
    ///
    /// An endpoint the kind does not use is ignored.
    pub fn debited(&self) -> Option<Option<&AccountId>> {
        self.kind.debits().then_some(self.from_id.as_ref())
    }

    /// Account credited by this request, if its kind credits one.
    pub fn credited(&self) -> Option<Option<&AccountId>> {
        self.kind.credits().then_some(self.to_id.as_ref())
    }
}

/// A committed entry of the transaction log. Never mutated after commit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: TransactionId,
    /// 1-based position in the commit order.
    pub sequence: u64,
    #[serde(rename = "type")]
    pub kind: TransactionKind,
    pub amount: f64,
    pub from_id: Option<AccountId>,
    pub to_id: Option<AccountId>,
    pub timestamp: DateTime<Utc>,
}

impl Transaction {
    /// Build the log entry for a request being committed at `at`.
    pub fn commit(request: &TransferRequest, sequence: u64, at: DateTime<Utc>) -> Self {
        Self {
            id: TransactionId::new(),
            sequence,
            kind: request.kind,
            amount: request.amount,
            from_id: request.debited().flatten().cloned(),
            to_id: request.credited().flatten().cloned(),
            timestamp: at,
        }
    }
}

/// Result of a committed transaction: the log entry plus the post-commit state of
/// every account it touched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Receipt {
    pub transaction: Transaction,
    pub from: Option<Account>,
    pub to: Option<Account>,
}
