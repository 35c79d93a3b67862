use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use uuid::Uuid;

use eva_core::models::companion::Companion;
use eva_core::models::transaction::Transaction;
use eva_core::models::user::User;

use crate::error::StoreError;
use crate::store::{BoxFuture, LedgerStore};

/// Everything a store holds. Also the on-disk shape of a snapshot.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LedgerState {
    pub users: HashMap<Uuid, User>,
    /// Append order, oldest first.
    pub transactions: Vec<Transaction>,
    pub companions: Vec<Companion>,
}

impl LedgerState {
    pub(crate) fn insert_user(&mut self, user: &User) -> Result<(), StoreError> {
        if self.users.contains_key(&user.id) {
            return Err(StoreError::DuplicateUser(user.id));
        }
        self.users.insert(user.id, user.clone());
        Ok(())
    }

    pub(crate) fn open_account(&mut self, user: &User, deposit: &Transaction) -> Result<(), StoreError> {
        self.insert_user(user)?;
        self.transactions.push(deposit.clone());
        Ok(())
    }

    pub(crate) fn commit(&mut self, user: &User, transaction: &Transaction) -> Result<(), StoreError> {
        let slot = self
            .users
            .get_mut(&user.id)
            .ok_or(StoreError::UserNotFound(user.id))?;
        *slot = user.clone();
        self.transactions.push(transaction.clone());
        Ok(())
    }

    pub(crate) fn save_companion(&mut self, companion: &Companion) {
        match self.companions.iter_mut().find(|c| c.id == companion.id) {
            Some(existing) => *existing = companion.clone(),
            None => self.companions.push(companion.clone()),
        }
    }
}

/// In-process store. Used directly in tests and as the backing map for
/// [`crate::snapshot::SnapshotStore`].
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: RwLock<LedgerState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_state(state: LedgerState) -> Self {
        Self {
            state: RwLock::new(state),
        }
    }

    /// Copy of the full state, for snapshots and assertions.
    pub async fn state(&self) -> LedgerState {
        self.state.read().await.clone()
    }

    pub async fn transaction_count(&self) -> usize {
        self.state.read().await.transactions.len()
    }

    pub(crate) async fn replace(&self, state: LedgerState) {
        *self.state.write().await = state;
    }
}

impl LedgerStore for MemoryStore {
    fn find_user(&self, id: Uuid) -> BoxFuture<'_, Result<Option<User>, StoreError>> {
        Box::pin(async move { Ok(self.state.read().await.users.get(&id).cloned()) })
    }

    fn insert_user<'a>(&'a self, user: &'a User) -> BoxFuture<'a, Result<(), StoreError>> {
        Box::pin(async move { self.state.write().await.insert_user(user) })
    }

    fn open_account<'a>(
        &'a self,
        user: &'a User,
        deposit: &'a Transaction,
    ) -> BoxFuture<'a, Result<(), StoreError>> {
        Box::pin(async move { self.state.write().await.open_account(user, deposit) })
    }

    fn commit<'a>(
        &'a self,
        user: &'a User,
        transaction: &'a Transaction,
    ) -> BoxFuture<'a, Result<(), StoreError>> {
        Box::pin(async move { self.state.write().await.commit(user, transaction) })
    }

    fn transactions_for(
        &self,
        user_id: Uuid,
        limit: usize,
    ) -> BoxFuture<'_, Result<Vec<Transaction>, StoreError>> {
        Box::pin(async move {
            let state = self.state.read().await;
            Ok(state
                .transactions
                .iter()
                .rev()
                .filter(|t| t.user_id == user_id)
                .take(limit)
                .cloned()
                .collect())
        })
    }

    fn save_companion<'a>(
        &'a self,
        companion: &'a Companion,
    ) -> BoxFuture<'a, Result<(), StoreError>> {
        Box::pin(async move {
            self.state.write().await.save_companion(companion);
            Ok(())
        })
    }

    fn companions_for(&self, user_id: Uuid) -> BoxFuture<'_, Result<Vec<Companion>, StoreError>> {
        Box::pin(async move {
            let state = self.state.read().await;
            Ok(state
                .companions
                .iter()
                .filter(|c| c.user_id == user_id)
                .cloned()
                .collect())
        })
    }
}
