use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entity::Entity;
use crate::id::AccountId;

/// A balance-holding account.
///
/// The initial balance is whatever the caller supplies (negative included). After
/// creation the balance only moves through committed transactions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub id: AccountId,
    pub name: String,
    pub balance: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Account {
    /// Open an account; both timestamps are set to `now`.
    pub fn open(id: AccountId, name: impl Into<String>, balance: f64, now: DateTime<Utc>) -> Self {
        Self {
            id,
            name: name.into(),
            balance,
            created_at: now,
            updated_at: now,
        }
    }

    /// Add `amount` to the balance.
    pub fn credit(&mut self, amount: f64, at: DateTime<Utc>) {
        self.balance += amount;
        self.updated_at = at;
    }

    /// Subtract `amount` from the balance.
    ///
    /// No funds check here: the caller decides whether the debit is allowed.
    pub fn debit(&mut self, amount: f64, at: DateTime<Utc>) {
        self.balance -= amount;
        self.updated_at = at;
    }

    pub fn can_cover(&self, amount: f64) -> bool {
        self.balance >= amount
    }
}

impl Entity for Account {
    type Id = AccountId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
