use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use rust_decimal::Decimal;
use tokio::sync::Mutex;
use tracing::{info, warn};
use uuid::Uuid;

use eva_core::models::transaction::{Transaction, TransactionType};
use eva_core::models::user::User;

use crate::error::LedgerError;
use crate::store::LedgerStore;

/// Number of transactions returned alongside a balance by default.
pub const RECENT_TRANSACTIONS: usize = 10;

/// Balance check, debit and credit over a [`LedgerStore`].
///
/// All mutations for one user run inside that user's critical section, so
/// two concurrent debits can never both observe the same pre-debit balance.
pub struct Ledger {
    store: Arc<dyn LedgerStore>,
    locks: Mutex<HashMap<Uuid, Arc<Mutex<()>>>>,
}

impl Ledger {
    pub fn new(store: Arc<dyn LedgerStore>) -> Self {
        Self {
            store,
            locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn store(&self) -> &Arc<dyn LedgerStore> {
        &self.store
    }

    /// Run `work` inside the user's critical section.
    ///
    /// The lock entry is dropped from the map once no other caller holds or
    /// waits on it. Clones are taken and released under the map lock, so a
    /// count of two (map plus this caller) means nobody else is using it.
    async fn serialized<T>(&self, user_id: Uuid, work: impl Future<Output = T>) -> T {
        let lock = {
            let mut locks = self.locks.lock().await;
            locks.entry(user_id).or_default().clone()
        };

        let result = {
            let _guard = lock.lock().await;
            work.await
        };

        let mut locks = self.locks.lock().await;
        if Arc::strong_count(&lock) == 2 {
            locks.remove(&user_id);
        }
        drop(lock);
        drop(locks);
        result
    }

    /// Charge `amount` to the user.
    ///
    /// Rejected with `InsufficientFunds` when `balance < amount`; an exactly
    /// sufficient balance is debited to zero. On success exactly one
    /// transaction with `-amount` is appended; on failure nothing changes.
    pub async fn debit(
        &self,
        user_id: Uuid,
        amount: Decimal,
        kind: TransactionType,
        description: &str,
    ) -> Result<Transaction, LedgerError> {
        ensure_positive(amount)?;
        self.serialized(user_id, self.apply_debit(user_id, amount, kind, description))
            .await
    }

    async fn apply_debit(
        &self,
        user_id: Uuid,
        amount: Decimal,
        kind: TransactionType,
        description: &str,
    ) -> Result<Transaction, LedgerError> {
        let mut user = self
            .store
            .find_user(user_id)
            .await?
            .ok_or(LedgerError::UserNotFound(user_id))?;

        if user.balance < amount {
            warn!(
                user_id = %user_id,
                balance = %user.balance,
                required = %amount,
                kind = kind.as_str(),
                "debit rejected: insufficient funds"
            );
            return Err(LedgerError::InsufficientFunds {
                balance: user.balance,
                required: amount,
            });
        }

        user.balance -= amount;
        user.updated_at = jiff::Timestamp::now();
        let transaction = Transaction::completed(user_id, kind, -amount, description);

        self.store.commit(&user, &transaction).await?;

        info!(
            user_id = %user_id,
            transaction_id = %transaction.id,
            amount = %amount,
            balance = %user.balance,
            kind = kind.as_str(),
            "balance debited"
        );

        Ok(transaction)
    }

    /// Add `amount` to the user's balance. Refused only for unknown users
    /// and for a sum that does not fit in a `Decimal`.
    pub async fn credit(
        &self,
        user_id: Uuid,
        amount: Decimal,
        kind: TransactionType,
        description: &str,
    ) -> Result<Transaction, LedgerError> {
        ensure_positive(amount)?;
        self.serialized(user_id, self.apply_credit(user_id, amount, kind, description))
            .await
    }

    async fn apply_credit(
        &self,
        user_id: Uuid,
        amount: Decimal,
        kind: TransactionType,
        description: &str,
    ) -> Result<Transaction, LedgerError> {
        let mut user = self
            .store
            .find_user(user_id)
            .await?
            .ok_or(LedgerError::UserNotFound(user_id))?;

        user.balance = user
            .balance
            .checked_add(amount)
            .ok_or(LedgerError::BalanceOverflow {
                balance: user.balance,
                amount,
            })?;
        user.updated_at = jiff::Timestamp::now();
        let transaction = Transaction::completed(user_id, kind, amount, description);

        self.store.commit(&user, &transaction).await?;

        info!(
            user_id = %user_id,
            transaction_id = %transaction.id,
            amount = %amount,
            balance = %user.balance,
            kind = kind.as_str(),
            "balance credited"
        );

        Ok(transaction)
    }

    pub async fn balance(&self, user_id: Uuid) -> Result<Decimal, LedgerError> {
        let user = self
            .store
            .find_user(user_id)
            .await?
            .ok_or(LedgerError::UserNotFound(user_id))?;
        Ok(user.balance)
    }

    /// Newest-first transactions for an existing user.
    pub async fn recent_transactions(
        &self,
        user_id: Uuid,
        limit: usize,
    ) -> Result<Vec<Transaction>, LedgerError> {
        if self.store.find_user(user_id).await?.is_none() {
            return Err(LedgerError::UserNotFound(user_id));
        }
        Ok(self.store.transactions_for(user_id, limit).await?)
    }

    /// Create a user and grant the starting balance as a deposit.
    pub async fn open_account(
        &self,
        email: &str,
        initial_balance: Decimal,
    ) -> Result<User, LedgerError> {
        self.ensure_account(Uuid::new_v4(), email, initial_balance)
            .await
    }

    /// Return the user with `user_id`, creating the account with the
    /// starting balance if it does not exist yet.
    ///
    /// A new user and its `Initial balance` deposit are stored together.
    pub async fn ensure_account(
        &self,
        user_id: Uuid,
        email: &str,
        initial_balance: Decimal,
    ) -> Result<User, LedgerError> {
        self.serialized(user_id, self.provision(user_id, email, initial_balance))
            .await
    }

    async fn provision(
        &self,
        user_id: Uuid,
        email: &str,
        initial_balance: Decimal,
    ) -> Result<User, LedgerError> {
        if let Some(user) = self.store.find_user(user_id).await? {
            return Ok(user);
        }

        let opening = initial_balance.max(Decimal::ZERO);
        let mut user = User::new(email, opening);
        user.id = user_id;

        if opening > Decimal::ZERO {
            let deposit = Transaction::completed(
                user_id,
                TransactionType::Deposit,
                opening,
                "Initial balance",
            );
            self.store.open_account(&user, &deposit).await?;
        } else {
            self.store.insert_user(&user).await?;
        }

        info!(user_id = %user_id, balance = %user.balance, "account opened");
        Ok(user)
    }

    /// Number of users with a live lock entry.
    #[cfg(test)]
    async fn tracked_locks(&self) -> usize {
        self.locks.lock().await.len()
    }
}

fn ensure_positive(amount: Decimal) -> Result<(), LedgerError> {
    if amount <= Decimal::ZERO {
        return Err(LedgerError::InvalidAmount(amount));
    }
    Ok(())
}
