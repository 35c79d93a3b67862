use std::path::PathBuf;

use tokio::sync::Mutex;
use uuid::Uuid;

use eva_core::models::companion::Companion;
use eva_core::models::transaction::Transaction;
use eva_core::models::user::User;

use crate::error::StoreError;
use crate::memory::{LedgerState, MemoryStore};
use crate::store::{BoxFuture, LedgerStore};

/// A [`MemoryStore`] backed by a JSON snapshot file.
///
/// Every write builds the next state, writes it to a sibling temp path and
/// renames it into place. Only then does the next state become visible in
/// memory, so a failed write changes nothing.
pub struct SnapshotStore {
    inner: MemoryStore,
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl SnapshotStore {
    /// Open the snapshot at `path`, starting empty if it does not exist yet.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let state = match tokio::fs::read(&path).await {
            Ok(bytes) => serde_json::from_slice::<LedgerState>(&bytes)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => LedgerState::default(),
            Err(e) => return Err(e.into()),
        };

        tracing::info!(
            path = %path.display(),
            users = state.users.len(),
            transactions = state.transactions.len(),
            "ledger snapshot opened"
        );

        Ok(Self {
            inner: MemoryStore::from_state(state),
            path,
            write_lock: Mutex::new(()),
        })
    }

    /// Apply `change` to a copy of the state, persist it, then publish it.
    async fn apply<F>(&self, change: F) -> Result<(), StoreError>
    where
        F: FnOnce(&mut LedgerState) -> Result<(), StoreError> + Send,
    {
        let _guard = self.write_lock.lock().await;

        let mut next = self.inner.state().await;
        change(&mut next)?;

        if let Err(e) = self.write(&next).await {
            tracing::error!(path = %self.path.display(), error = %e, "ledger snapshot write failed");
            return Err(e);
        }

        self.inner.replace(next).await;
        Ok(())
    }

    async fn write(&self, state: &LedgerState) -> Result<(), StoreError> {
        let json = serde_json::to_vec_pretty(state)?;

        if let Some(dir) = self.path.parent()
            && !dir.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(dir).await?;
        }

        let mut tmp_name = self.path.as_os_str().to_owned();
        tmp_name.push(".tmp");
        let tmp_path = PathBuf::from(tmp_name);

        tokio::fs::write(&tmp_path, &json).await?;
        tokio::fs::rename(&tmp_path, &self.path).await?;
        Ok(())
    }
}

impl LedgerStore for SnapshotStore {
    fn find_user(&self, id: Uuid) -> BoxFuture<'_, Result<Option<User>, StoreError>> {
        self.inner.find_user(id)
    }

    fn insert_user<'a>(&'a self, user: &'a User) -> BoxFuture<'a, Result<(), StoreError>> {
        Box::pin(self.apply(move |state| state.insert_user(user)))
    }

    fn open_account<'a>(
        &'a self,
        user: &'a User,
        deposit: &'a Transaction,
    ) -> BoxFuture<'a, Result<(), StoreError>> {
        Box::pin(self.apply(move |state| state.open_account(user, deposit)))
    }

    fn commit<'a>(
        &'a self,
        user: &'a User,
        transaction: &'a Transaction,
    ) -> BoxFuture<'a, Result<(), StoreError>> {
        Box::pin(self.apply(move |state| state.commit(user, transaction)))
    }

    fn transactions_for(
        &self,
        user_id: Uuid,
        limit: usize,
    ) -> BoxFuture<'_, Result<Vec<Transaction>, StoreError>> {
        self.inner.transactions_for(user_id, limit)
    }

    fn save_companion<'a>(
        &'a self,
        companion: &'a Companion,
    ) -> BoxFuture<'a, Result<(), StoreError>> {
        Box::pin(self.apply(move |state| {
            state.save_companion(companion);
            Ok(())
        }))
    }

    fn companions_for(&self, user_id: Uuid) -> BoxFuture<'_, Result<Vec<Companion>, StoreError>> {
        self.inner.companions_for(user_id)
    }
}
