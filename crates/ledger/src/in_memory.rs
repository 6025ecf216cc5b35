use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, Utc};

use tally_core::{
    Account, AccountId, Entity, LedgerError, LedgerResult, Receipt, Transaction, TransferRequest,
};

use crate::store::LedgerStore;

/// Accounts and the transaction log, guarded together as one unit.
#[derive(Debug, Default)]
struct LedgerState {
    accounts: HashMap<AccountId, Account>,
    transactions: Vec<Transaction>,
}

impl LedgerState {
    /// Resolve one side of a request. `None` means the kind does not use that side.
    fn resolve(
        &self,
        side: Option<Option<&AccountId>>,
        missing: LedgerError,
    ) -> LedgerResult<Option<AccountId>> {
        match side {
            None => Ok(None),
            Some(Some(id)) if self.accounts.contains_key(id) => Ok(Some(id.clone())),
            Some(_) => Err(missing),
        }
    }

    fn update(
        &mut self,
        id: &AccountId,
        f: impl FnOnce(&mut Account),
    ) -> LedgerResult<Account> {
        let account = self
            .accounts
            .get_mut(id)
            .ok_or_else(|| LedgerError::NotFound(id.clone()))?;
        f(account);
        Ok(account.clone())
    }

    fn commit(&mut self, request: &TransferRequest, at: DateTime<Utc>) -> LedgerResult<Receipt> {
        let from_id = self.resolve(request.debited(), LedgerError::SenderNotFound)?;
        let to_id = self.resolve(request.credited(), LedgerError::RecipientNotFound)?;

        if let Some(id) = &from_id {
            let from = self
                .accounts
                .get(id)
                .ok_or(LedgerError::SenderNotFound)?;
            if !from.can_cover(request.amount) {
                return Err(LedgerError::InsufficientFunds {
                    balance: from.balance,
                    requested: request.amount,
                });
            }
        }

        // A credit that would leave the balance unrepresentable is refused.
        if let Some(id) = &to_id {
            let to = self
                .accounts
                .get(id)
                .ok_or(LedgerError::RecipientNotFound)?;
            if !(to.balance + request.amount).is_finite() {
                return Err(LedgerError::InvalidAmount(request.amount));
            }
        }

        // All checks passed under the write lock; the updates below cannot fail.
        let amount = request.amount;
        let from = from_id
            .map(|id| self.update(&id, |acc| acc.debit(amount, at)))
            .transpose()?;
        let to = to_id
            .map(|id| self.update(&id, |acc| acc.credit(amount, at)))
            .transpose()?;

        let sequence = self.transactions.len() as u64 + 1;
        let transaction = Transaction::commit(request, sequence, at);
        self.transactions.push(transaction.clone());

        Ok(Receipt {
            transaction,
            from,
            to,
        })
    }
}

/// In-memory ledger store.
///
/// One reader/writer lock covers the account map and the log, so every mutation
/// is totally ordered and the log order is the commit order. Reads share the lock.
#[derive(Debug, Default)]
pub struct InMemoryLedgerStore {
    state: RwLock<LedgerState>,
}

impl InMemoryLedgerStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> LedgerResult<RwLockReadGuard<'_, LedgerState>> {
        self.state
            .read()
            .map_err(|_| LedgerError::unavailable("lock poisoned"))
    }

    fn write(&self) -> LedgerResult<RwLockWriteGuard<'_, LedgerState>> {
        self.state
            .write()
            .map_err(|_| LedgerError::unavailable("lock poisoned"))
    }
}

impl LedgerStore for InMemoryLedgerStore {
    fn create_account(&self, account: Account) -> LedgerResult<Account> {
        if !account.balance.is_finite() {
            return Err(LedgerError::InvalidAmount(account.balance));
        }

        let mut state = self.write()?;

        if state.accounts.contains_key(&account.id) {
            return Err(LedgerError::AlreadyExists(account.id));
        }

        state.accounts.insert(account.id.clone(), account.clone());
        Ok(account)
    }

    fn get_account(&self, id: &AccountId) -> LedgerResult<Account> {
        let state = self.read()?;
        state
            .accounts
            .get(id)
            .cloned()
            .ok_or_else(|| LedgerError::NotFound(id.clone()))
    }

    fn list_accounts(&self) -> LedgerResult<Vec<Account>> {
        let mut accounts: Vec<Account> = self.read()?.accounts.values().cloned().collect();
        accounts.sort_by(|a, b| a.id().cmp(b.id()));
        Ok(accounts)
    }

    fn execute_transfer(&self, request: TransferRequest) -> LedgerResult<Receipt> {
        request.validate()?;

        let mut state = self.write()?;
        // Timestamp is taken inside the critical section so it follows commit order.
        state.commit(&request, Utc::now())
    }

    fn list_transactions(&self) -> LedgerResult<Vec<Transaction>> {
        Ok(self.read()?.transactions.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::sync::Mutex;
    use tally_core::TransactionKind;

    fn store_with(accounts: &[(&str, f64)]) -> InMemoryLedgerStore {
        let store = InMemoryLedgerStore::new();
        for (id, balance) in accounts {
            store
                .create_account(Account::open(AccountId::new(*id), *id, *balance, Utc::now()))
                .unwrap();
        }
        store
    }

    fn balance(store: &InMemoryLedgerStore, id: &str) -> f64 {
        store.get_account(&AccountId::new(id)).unwrap().balance
    }

    fn total(store: &InMemoryLedgerStore) -> f64 {
        store.list_accounts().unwrap().iter().map(|a| a.balance).sum()
    }

    #[test]
    fn transfer_then_overdraft_scenario() {
        let store = store_with(&[("A", 100.0), ("B", 0.0)]);

        let receipt = store
            .execute_transfer(TransferRequest::transfer("A", "B", 40.0))
            .unwrap();
        assert_eq!(receipt.from.unwrap().balance, 60.0);
        assert_eq!(receipt.to.unwrap().balance, 40.0);
        assert_eq!(store.list_transactions().unwrap().len(), 1);

        let err = store
            .execute_transfer(TransferRequest::transfer("A", "B", 100.0))
            .unwrap_err();
        assert_eq!(
            err,
            LedgerError::InsufficientFunds {
                balance: 60.0,
                requested: 100.0
            }
        );
        assert_eq!(balance(&store, "A"), 60.0);
        assert_eq!(balance(&store, "B"), 40.0);
        assert_eq!(store.list_transactions().unwrap().len(), 1);
    }

    #[test]
    fn duplicate_account_is_rejected_and_original_kept() {
        let store = store_with(&[("A", 100.0)]);

        let err = store
            .create_account(Account::open(AccountId::new("A"), "other", 5.0, Utc::now()))
            .unwrap_err();
        assert_eq!(err, LedgerError::AlreadyExists(AccountId::new("A")));
        assert_eq!(balance(&store, "A"), 100.0);
    }

    #[test]
    fn create_account_may_start_negative() {
        let store = store_with(&[("debtor", -25.0)]);
        assert_eq!(balance(&store, "debtor"), -25.0);
    }

    #[test]
    fn missing_account_is_not_found() {
        let store = InMemoryLedgerStore::new();
        let err = store.get_account(&AccountId::new("nope")).unwrap_err();
        assert_eq!(err, LedgerError::NotFound(AccountId::new("nope")));
    }

    #[test]
    fn credit_overflowing_the_balance_is_refused() {
        let store = store_with(&[("A", f64::MAX), ("B", f64::MAX)]);

        let err = store
            .execute_transfer(TransferRequest::deposit("A", f64::MAX))
            .unwrap_err();
        assert_eq!(err, LedgerError::InvalidAmount(f64::MAX));

        let err = store
            .execute_transfer(TransferRequest::transfer("A", "B", f64::MAX))
            .unwrap_err();
        assert_eq!(err, LedgerError::InvalidAmount(f64::MAX));

        assert_eq!(balance(&store, "A"), f64::MAX);
        assert_eq!(balance(&store, "B"), f64::MAX);
        assert!(store.list_transactions().unwrap().is_empty());
    }

    #[test]
    fn non_finite_opening_balance_is_refused() {
        let store = InMemoryLedgerStore::new();
        let err = store
            .create_account(Account::open(AccountId::new("A"), "A", f64::INFINITY, Utc::now()))
            .unwrap_err();
        assert_eq!(err, LedgerError::InvalidAmount(f64::INFINITY));
        assert!(store.list_accounts().unwrap().is_empty());
    }

    #[test]
    fn unknown_sender_and_recipient_change_nothing() {
        let store = store_with(&[("A", 100.0)]);

        let err = store
            .execute_transfer(TransferRequest::transfer("ghost", "A", 1.0))
            .unwrap_err();
        assert_eq!(err, LedgerError::SenderNotFound);

        let err = store
            .execute_transfer(TransferRequest::transfer("A", "ghost", 1.0))
            .unwrap_err();
        assert_eq!(err, LedgerError::RecipientNotFound);

        assert_eq!(balance(&store, "A"), 100.0);
        assert!(store.list_transactions().unwrap().is_empty());
    }

    #[test]
    fn sender_is_checked_before_recipient() {
        let store = InMemoryLedgerStore::new();
        let err = store
            .execute_transfer(TransferRequest::transfer("x", "y", 1.0))
            .unwrap_err();
        assert_eq!(err, LedgerError::SenderNotFound);
    }

    #[test]
    fn amount_is_checked_before_accounts() {
        let store = InMemoryLedgerStore::new();
        let err = store
            .execute_transfer(TransferRequest::transfer("x", "y", 0.0))
            .unwrap_err();
        assert_eq!(err, LedgerError::InvalidAmount(0.0));
    }

    #[test]
    fn self_transfer_changes_nothing() {
        let store = store_with(&[("A", 100.0)]);
        let err = store
            .execute_transfer(TransferRequest::transfer("A", "A", 10.0))
            .unwrap_err();
        assert_eq!(err, LedgerError::SelfTransfer);
        assert_eq!(balance(&store, "A"), 100.0);
        assert!(store.list_transactions().unwrap().is_empty());
    }

    #[test]
    fn deposit_and_withdrawal_touch_one_account() {
        let store = store_with(&[("A", 10.0)]);

        let receipt = store
            .execute_transfer(TransferRequest::deposit("A", 15.0))
            .unwrap();
        assert!(receipt.from.is_none());
        assert_eq!(receipt.to.unwrap().balance, 25.0);

        let receipt = store
            .execute_transfer(TransferRequest::withdrawal("A", 20.0))
            .unwrap();
        assert!(receipt.to.is_none());
        assert_eq!(receipt.from.unwrap().balance, 5.0);

        let err = store
            .execute_transfer(TransferRequest::withdrawal("A", 6.0))
            .unwrap_err();
        assert!(matches!(err, LedgerError::InsufficientFunds { .. }));

        let err = store
            .execute_transfer(TransferRequest::deposit("ghost", 1.0))
            .unwrap_err();
        assert_eq!(err, LedgerError::RecipientNotFound);

        let kinds: Vec<_> = store
            .list_transactions()
            .unwrap()
            .into_iter()
            .map(|t| t.kind)
            .collect();
        assert_eq!(kinds, vec![TransactionKind::Deposit, TransactionKind::Withdrawal]);
    }

    #[test]
    fn transfer_refreshes_updated_at_on_both_sides() {
        let store = store_with(&[("A", 100.0), ("B", 0.0)]);
        let before = store.get_account(&AccountId::new("A")).unwrap().updated_at;

        let receipt = store
            .execute_transfer(TransferRequest::transfer("A", "B", 1.0))
            .unwrap();
        let at = receipt.transaction.timestamp;
        assert!(at >= before);
        assert_eq!(receipt.from.unwrap().updated_at, at);
        assert_eq!(receipt.to.unwrap().updated_at, at);
    }

    #[test]
    fn log_preserves_commit_order() {
        let store = store_with(&[("A", 100.0), ("B", 100.0)]);
        let mut committed = Vec::new();
        for i in 1..=5 {
            let req = if i % 2 == 0 {
                TransferRequest::transfer("A", "B", i as f64)
            } else {
                TransferRequest::transfer("B", "A", i as f64)
            };
            committed.push(store.execute_transfer(req).unwrap().transaction);
        }

        let log = store.list_transactions().unwrap();
        assert_eq!(log, committed);
        assert!(log.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));
    }

    #[test]
    fn concurrent_transfers_debit_exactly_once() {
        const N: usize = 64;
        const AMOUNT: f64 = 2.5;

        let mut accounts = vec![("X".to_string(), N as f64 * AMOUNT)];
        accounts.extend((0..N).map(|i| (format!("R{i}"), 0.0)));
        let store = InMemoryLedgerStore::new();
        for (id, bal) in &accounts {
            store
                .create_account(Account::open(AccountId::new(id.as_str()), id.as_str(), *bal, Utc::now()))
                .unwrap();
        }

        let sequences = Mutex::new(Vec::new());
        std::thread::scope(|s| {
            for i in 0..N {
                let store = &store;
                let sequences = &sequences;
                s.spawn(move || {
                    let receipt = store
                        .execute_transfer(TransferRequest::transfer("X", format!("R{i}"), AMOUNT))
                        .unwrap();
                    sequences.lock().unwrap().push(receipt.transaction);
                });
            }
        });

        assert_eq!(balance(&store, "X"), 0.0);
        for i in 0..N {
            assert_eq!(balance(&store, &format!("R{i}")), AMOUNT);
        }

        let log = store.list_transactions().unwrap();
        assert_eq!(log.len(), N);
        for (idx, tx) in log.iter().enumerate() {
            assert_eq!(tx.sequence, idx as u64 + 1);
        }
        for tx in sequences.into_inner().unwrap() {
            assert_eq!(log[(tx.sequence - 1) as usize], tx);
        }
    }

    #[test]
    fn concurrent_overdraft_attempts_never_go_negative() {
        let store = store_with(&[("X", 10.0), ("Y", 0.0)]);

        let successes = Mutex::new(0usize);
        std::thread::scope(|s| {
            for _ in 0..40 {
                s.spawn(|| {
                    if store
                        .execute_transfer(TransferRequest::transfer("X", "Y", 1.0))
                        .is_ok()
                    {
                        *successes.lock().unwrap() += 1;
                    }
                });
            }
        });

        assert_eq!(successes.into_inner().unwrap(), 10);
        assert_eq!(balance(&store, "X"), 0.0);
        assert_eq!(balance(&store, "Y"), 10.0);
    }

    #[test]
    fn concurrent_duplicate_creation_succeeds_once() {
        let store = InMemoryLedgerStore::new();
        let results = Mutex::new(Vec::new());

        std::thread::scope(|s| {
            for _ in 0..2 {
                s.spawn(|| {
                    let r = store.create_account(Account::open(
                        AccountId::new("dup"),
                        "dup",
                        1.0,
                        Utc::now(),
                    ));
                    results.lock().unwrap().push(r);
                });
            }
        });

        let results = results.into_inner().unwrap();
        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
        assert!(results
            .iter()
            .any(|r| matches!(r, Err(LedgerError::AlreadyExists(_)))));
    }

    fn op_strategy() -> impl Strategy<Value = (usize, usize, u32)> {
        (0usize..4, 0usize..4, 1u32..500)
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256,
            ..ProptestConfig::default()
        })]

        /// Property: transfers between held accounts never change the total.
        #[test]
        fn transfers_conserve_total_balance(
            initial in prop::collection::vec(0u32..1_000, 4),
            ops in prop::collection::vec(op_strategy(), 1..40)
        ) {
            let store = InMemoryLedgerStore::new();
            for (i, bal) in initial.iter().enumerate() {
                store.create_account(Account::open(
                    AccountId::new(format!("acc{i}")),
                    "p",
                    *bal as f64,
                    Utc::now(),
                )).unwrap();
            }
            let before = total(&store);

            for (from, to, amount) in ops {
                let _ = store.execute_transfer(TransferRequest::transfer(
                    format!("acc{from}"),
                    format!("acc{to}"),
                    amount as f64,
                ));
            }

            prop_assert_eq!(total(&store), before);
        }

        /// Property: no executed transaction drives a balance negative, and
        /// rejected ones leave every account and the log untouched.
        #[test]
        fn failures_change_nothing_and_balances_stay_non_negative(
            initial in prop::collection::vec(0u32..200, 3),
            ops in prop::collection::vec((0u8..3, op_strategy()), 1..40)
        ) {
            let store = InMemoryLedgerStore::new();
            for (i, bal) in initial.iter().enumerate() {
                store.create_account(Account::open(
                    AccountId::new(format!("acc{i}")),
                    "p",
                    *bal as f64,
                    Utc::now(),
                )).unwrap();
            }

            for (kind, (from, to, amount)) in ops {
                let from = format!("acc{from}");
                let to = format!("acc{to}");
                let req = match kind {
                    0 => TransferRequest::deposit(to, amount as f64),
                    1 => TransferRequest::withdrawal(from, amount as f64),
                    _ => TransferRequest::transfer(from, to, amount as f64),
                };

                let accounts_before = store.list_accounts().unwrap();
                let log_before = store.list_transactions().unwrap().len();

                if store.execute_transfer(req).is_err() {
                    prop_assert_eq!(store.list_accounts().unwrap(), accounts_before);
                    prop_assert_eq!(store.list_transactions().unwrap().len(), log_before);
                }

                for acc in store.list_accounts().unwrap() {
                    prop_assert!(acc.balance >= 0.0);
                }
            }
        }
    }
}
