use std::future::Future;
use std::pin::Pin;

use uuid::Uuid;

use eva_core::models::companion::Companion;
use eva_core::models::transaction::Transaction;
use eva_core::models::user::User;

use crate::error::StoreError;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Persistence seam for users, their transactions and companions.
///
/// Implementations only need find/save semantics; the ledger provides the
/// per-user serialization that makes check-then-debit safe.
pub trait LedgerStore: Send + Sync {
    fn find_user(&self, id: Uuid) -> BoxFuture<'_, Result<Option<User>, StoreError>>;

    /// Insert a new user. Fails with `DuplicateUser` if the id is taken.
    fn insert_user<'a>(&'a self, user: &'a User) -> BoxFuture<'a, Result<(), StoreError>>;

    /// Insert a new user together with the deposit that funds its opening
    /// balance, as one unit.
    fn open_account<'a>(
        &'a self,
        user: &'a User,
        deposit: &'a Transaction,
    ) -> BoxFuture<'a, Result<(), StoreError>>;

    /// Persist the updated user and append its transaction as one unit.
    /// Either both become visible or neither does.
    fn commit<'a>(
        &'a self,
        user: &'a User,
        transaction: &'a Transaction,
    ) -> BoxFuture<'a, Result<(), StoreError>>;

    /// Transactions for a user, newest first, at most `limit`.
    fn transactions_for(
        &self,
        user_id: Uuid,
        limit: usize,
    ) -> BoxFuture<'_, Result<Vec<Transaction>, StoreError>>;

    fn save_companion<'a>(
        &'a self,
        companion: &'a Companion,
    ) -> BoxFuture<'a, Result<(), StoreError>>;

    fn companions_for(&self, user_id: Uuid) -> BoxFuture<'_, Result<Vec<Companion>, StoreError>>;
}
