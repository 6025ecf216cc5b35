use std::sync::Arc;

use tally_core::{Account, AccountId, LedgerResult, Receipt, Transaction, TransferRequest};

/// Capability set of a ledger store.
///
/// Implementations must make `execute_transfer` indivisible: either every
/// effect of a request (debit, credit, log append) is observable, or none is.
/// Any error return leaves the store unchanged.
pub trait LedgerStore: Send + Sync {
    /// Insert a new account unchanged. Fails with `AlreadyExists` on a duplicate id.
    fn create_account(&self, account: Account) -> LedgerResult<Account>;

    /// Latest committed state of an account.
    fn get_account(&self, id: &AccountId) -> LedgerResult<Account>;

    /// All accounts, ordered by id.
    fn list_accounts(&self) -> LedgerResult<Vec<Account>>;

    /// Validate and commit a deposit, withdrawal or transfer.
    fn execute_transfer(&self, request: TransferRequest) -> LedgerResult<Receipt>;

    /// The committed transaction log, in commit order.
    fn list_transactions(&self) -> LedgerResult<Vec<Transaction>>;
}

impl<S> LedgerStore for Arc<S>
where
    S: LedgerStore + ?Sized,
{
    fn create_account(&self, account: Account) -> LedgerResult<Account> {
        (**self).create_account(account)
    }

    fn get_account(&self, id: &AccountId) -> LedgerResult<Account> {
        (**self).get_account(id)
    }

    fn list_accounts(&self) -> LedgerResult<Vec<Account>> {
        (**self).list_accounts()
    }

    fn execute_transfer(&self, request: TransferRequest) -> LedgerResult<Receipt> {
        (**self).execute_transfer(request)
    }

    fn list_transactions(&self) -> LedgerResult<Vec<Transaction>> {
        (**self).list_transactions()
    }
}
