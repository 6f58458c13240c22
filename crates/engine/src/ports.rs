//! Capability traits the coin ledger is composed from.
//!
//! Each collaborator gets its own narrow trait so the orchestrator can be
//! exercised with in-memory fakes. Mutating methods take the scope handle
//! produced by a [`TransactionManager`]; they cannot be called outside one.

use std::{future::Future, pin::Pin};

use async_trait::async_trait;

use crate::{
    Account, AccountId, CatalogItem, HistoryEntry, InventoryEntry, NewTransfer, ResultEngine,
};

/// Boxed future returned by an atomic unit, borrowing the scope for `'s`.
pub type UnitFuture<'s, T> = Pin<Box<dyn Future<Output = ResultEngine<T>> + Send + 's>>;

/// Begins, commits and rolls back transaction scopes.
#[async_trait]
pub trait TransactionManager: Send + Sync {
    type Scope: Send + Sync + 'static;

    async fn begin(&self) -> ResultEngine<Self::Scope>;

    async fn commit(&self, scope: Self::Scope) -> ResultEngine<()>;

    async fn rollback(&self, scope: Self::Scope) -> ResultEngine<()>;
}

/// Account lookups. `Ok(None)` means "no such account"; `Err` is reserved
/// for infrastructure failures.
#[async_trait]
pub trait AccountDirectory: Send + Sync {
    async fn find_by_id(&self, id: &AccountId) -> ResultEngine<Option<Account>>;

    async fn find_by_username(&self, username: &str) -> ResultEngine<Option<Account>>;
}

/// Balance reads and writes inside a scope.
#[async_trait]
pub trait LedgerStore<S: Send + Sync>: Send + Sync {
    /// Read the balance of `account` and hold it against concurrent writers
    /// until the scope ends. `Ok(None)` if the account does not exist.
    async fn lock_balance(&self, scope: &S, account: &AccountId) -> ResultEngine<Option<i64>>;

    /// Unconditionally overwrite the balance of `account`.
    async fn write_balance(&self, scope: &S, account: &AccountId, new_balance: i64)
    -> ResultEngine<()>;
}

/// The append-only audit trail.
#[async_trait]
pub trait TransferStore<S: Send + Sync>: Send + Sync {
    async fn append(&self, scope: &S, transfer: &NewTransfer) -> ResultEngine<()>;

    /// Records with `account` as source, in insertion order.
    async fn sent_by(&self, account: &AccountId) -> ResultEngine<Vec<HistoryEntry>>;

    /// Records with `account` as destination, in insertion order.
    async fn received_by(&self, account: &AccountId) -> ResultEngine<Vec<HistoryEntry>>;
}

#[async_trait]
pub trait CatalogLookup: Send + Sync {
    async fn find_by_name(&self, name: &str) -> ResultEngine<Option<CatalogItem>>;
}

#[async_trait]
pub trait InventoryStore<S: Send + Sync>: Send + Sync {
    async fn append_entry(&self, scope: &S, account: &AccountId, item: &CatalogItem)
    -> ResultEngine<()>;

    /// Entries owned by `account`, in insertion order.
    async fn entries_for(&self, account: &AccountId) -> ResultEngine<Vec<InventoryEntry>>;
}
