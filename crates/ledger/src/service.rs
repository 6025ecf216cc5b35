use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};

use tally_core::{Account, AccountId, LedgerResult, Receipt, Transaction, TransferRequest};

use crate::store::LedgerStore;

/// Thin service layer over a `LedgerStore`.
///
/// Callers depend on this (and through it on the store trait), never on a
/// concrete store. Results are passed through unchanged; the service only adds
/// logging and account construction.
#[derive(Clone)]
pub struct LedgerService {
    store: Arc<dyn LedgerStore>,
}

impl LedgerService {
    pub fn new(store: Arc<dyn LedgerStore>) -> Self {
        Self { store }
    }

    /// Open an account. A missing id is generated.
    pub fn open_account(
        &self,
        id: Option<AccountId>,
        name: String,
        balance: f64,
    ) -> LedgerResult<Account> {
        let id = id.unwrap_or_else(AccountId::generate);
        let account = Account::open(id, name, balance, Utc::now());

        match self.store.create_account(account) {
            Ok(acc) => {
                info!(account_id = %acc.id, balance = acc.balance, "account created");
                Ok(acc)
            }
            Err(e) => {
                warn!(error = %e, "account creation rejected");
                Err(e)
            }
        }
    }

    pub fn account(&self, id: &AccountId) -> LedgerResult<Account> {
        self.store.get_account(id)
    }

    pub fn accounts(&self) -> LedgerResult<Vec<Account>> {
        self.store.list_accounts()
    }

    /// Submit a deposit, withdrawal or transfer for execution.
    pub fn submit(&self, request: TransferRequest) -> LedgerResult<Receipt> {
        let kind = request.kind;
        let amount = request.amount;

        match self.store.execute_transfer(request) {
            Ok(receipt) => {
                let tx = &receipt.transaction;
                info!(
                    transaction_id = %tx.id,
                    sequence = tx.sequence,
                    kind = %tx.kind,
                    amount = tx.amount,
                    from_id = tx.from_id.as_ref().map(|id| id.as_str()),
                    to_id = tx.to_id.as_ref().map(|id| id.as_str()),
                    "transaction committed"
                );
                Ok(receipt)
            }
            Err(e) => {
                warn!(%kind, amount, error = %e, "transaction rejected");
                Err(e)
            }
        }
    }

    /// Committed transactions in commit order.
    pub fn history(&self) -> LedgerResult<Vec<Transaction>> {
        self.store.list_transactions()
    }
}
