//! The coin ledger: transfers between accounts and purchases from the
//! catalog, composed from the storage ports under a [`TransactionManager`].
//!
//! Every mutating operation follows the same shape:
//!
//! 1. validate the request and read current state, failing fast with a
//!    client error before any transaction is opened;
//! 2. run all writes as one atomic unit, re-reading each touched balance
//!    through [`LedgerStore::lock_balance`] so concurrent units on the same
//!    account serialize instead of losing an update.
//!
//! Internal failures of the unit are wrapped in [`EngineError::CommitFailed`]
//! and logged; client and cancellation errors come back unchanged.

use std::sync::Arc;

use chrono::Utc;

use crate::{
    AccountId, CallContext, EngineError, ErrorKind, NewTransfer, ResultEngine, UserInfo,
    ports::{
        AccountDirectory, CatalogLookup, InventoryStore, LedgerStore, TransactionManager,
        TransferStore,
    },
    tx::run_atomic,
    util::normalize_name,
};


/// The storage collaborators of a [`CoinLedger`] whose transactions use
/// scopes of type `S`.
pub struct Collaborators<S: Send + Sync> {
    pub accounts: Arc<dyn AccountDirectory>,
    pub ledger: Arc<dyn LedgerStore<S>>,
    pub transfers: Arc<dyn TransferStore<S>>,
    pub catalog: Arc<dyn CatalogLookup>,
    pub inventory: Arc<dyn InventoryStore<S>>,
}

impl<S: Send + Sync> Clone for Collaborators<S> {
    fn clone(&self) -> Self {
        Self {
            accounts: self.accounts.clone(),
            ledger: self.ledger.clone(),
            transfers: self.transfers.clone(),
            catalog: self.catalog.clone(),
            inventory: self.inventory.clone(),
        }
    }
}

pub struct CoinLedger<M: TransactionManager> {
    manager: Arc<M>,
    accounts: Arc<dyn AccountDirectory>,
    ledger: Arc<dyn LedgerStore<M::Scope>>,
    transfers: Arc<dyn TransferStore<M::Scope>>,
    catalog: Arc<dyn CatalogLookup>,
    inventory: Arc<dyn InventoryStore<M::Scope>>,
}

impl<M: TransactionManager> std::fmt::Debug for CoinLedger<M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoinLedger").finish_non_exhaustive()
    }
}

impl<M: TransactionManager> CoinLedger<M> {
    pub fn new(manager: Arc<M>, collaborators: Collaborators<M::Scope>) -> Self {
        let Collaborators {
            accounts,
            ledger,
            transfers,
            catalog,
            inventory,
        } = collaborators;
        Self {
            manager,
            accounts,
            ledger,
            transfers,
            catalog,
            inventory,
        }
    }

    /// Balance, inventory and coin history of `caller`.
    ///
    /// Read-only; nothing is cached between calls.
    pub async fn get_user_info(
        &self,
        ctx: &CallContext,
        caller: &AccountId,
    ) -> ResultEngine<UserInfo> {
        let account = ctx
            .guard(self.accounts.find_by_id(caller))
            .await??
            .ok_or_else(|| EngineError::UserNotFound(caller.to_string()))?;

        let (inventory, sent, received) = ctx
            .guard(async {
                tokio::try_join!(
                    self.inventory.entries_for(caller),
                    self.transfers.sent_by(caller),
                    self.transfers.received_by(caller),
                )
            })
            .await??;

        Ok(UserInfo {
            account,
            inventory,
            sent,
            received,
        })
    }

    /// Move `amount` coins from `caller` to the account named `to_username`.
    pub async fn send_coin(
        &self,
        ctx: &CallContext,
        caller: &AccountId,
        to_username: &str,
        amount: i64,
    ) -> ResultEngine<()> {
        if amount <= 0 {
            return Err(EngineError::InvalidAmount(format!(
                "amount must be > 0, got {amount}"
            )));
        }
        let to_username = normalize_name(to_username).ok_or_else(|| {
            EngineError::InvalidRecipient("recipient username must not be empty".to_string())
        })?;

        let sender = ctx
            .guard(self.accounts.find_by_id(caller))
            .await??
            .ok_or_else(|| EngineError::SenderNotFound(caller.to_string()))?;
        if sender.balance < amount {
            tracing::warn!(
                "send_coin rejected: {} has {} coins, {amount} requested",
                sender.id,
                sender.balance
            );
            return Err(insufficient_funds(sender.balance, amount));
        }

        let receiver = ctx
            .guard(self.accounts.find_by_username(&to_username))
            .await??
            .ok_or_else(|| EngineError::ReceiverNotFound(to_username.clone()))?;
        let transfer = NewTransfer::transfer(sender.id, receiver.id, amount, Utc::now())?;

        let (from, to) = (sender.id, receiver.id);
        let ledger = self.ledger.clone();
        let transfers = self.transfers.clone();
        run_atomic(self.manager.as_ref(), ctx, move |scope| {
            Box::pin(async move {
                // Ascending id order, so two opposite transfers cannot deadlock.
                let (first, second) = if from < to { (from, to) } else { (to, from) };
                let first_balance = locked_balance(ledger.as_ref(), scope, &first).await?;
                let second_balance = locked_balance(ledger.as_ref(), scope, &second).await?;
                let (from_balance, to_balance) = if first == from {
                    (first_balance, second_balance)
                } else {
                    (second_balance, first_balance)
                };

                if from_balance < amount {
                    return Err(insufficient_funds(from_balance, amount));
                }
                let to_new = to_balance.checked_add(amount).ok_or_else(|| {
                    EngineError::InvalidAmount(format!("balance of {to} would overflow"))
                })?;

                ledger
                    .write_balance(scope, &from, from_balance - amount)
                    .await
                    .map_err(|source| update_coins_failed(from, source))?;
                ledger
                    .write_balance(scope, &to, to_new)
                    .await
                    .map_err(|source| update_coins_failed(to, source))?;
                transfers
                    .append(scope, &transfer)
                    .await
                    .map_err(|source| EngineError::RegisterTransferFailed {
                        source: Box::new(source),
                    })?;
                Ok(())
            })
        })
        .await
        .map_err(|err| unit_failed("send_coin", &[from, to], err))?;

        tracing::info!("{from} sent {amount} coins to {to}");
        Ok(())
    }

    /// Spend coins of `caller` on one unit of the catalog item `item_name`.
    pub async fn buy_merch(
        &self,
        ctx: &CallContext,
        caller: &AccountId,
        item_name: &str,
    ) -> ResultEngine<()> {
        let item_name = normalize_name(item_name)
            .ok_or_else(|| EngineError::MerchNotFound("item name must not be empty".to_string()))?;

        let buyer = ctx
            .guard(self.accounts.find_by_id(caller))
            .await??
            .ok_or_else(|| EngineError::BuyerNotFound(caller.to_string()))?;
        let item = ctx
            .guard(self.catalog.find_by_name(&item_name))
            .await??
            .ok_or_else(|| EngineError::MerchNotFound(item_name.clone()))?;
        if buyer.balance < item.price {
            tracing::warn!(
                "buy_merch rejected: {} has {} coins, '{}' costs {}",
                buyer.id,
                buyer.balance,
                item.name,
                item.price
            );
            return Err(insufficient_funds(buyer.balance, item.price));
        }
        let purchase = NewTransfer::purchase(buyer.id, item.price, Utc::now())?;

        let buyer_id = buyer.id;
        let ledger = self.ledger.clone();
        let transfers = self.transfers.clone();
        let inventory = self.inventory.clone();
        let bought = item.clone();
        run_atomic(self.manager.as_ref(), ctx, move |scope| {
            Box::pin(async move {
                let balance = locked_balance(ledger.as_ref(), scope, &buyer_id).await?;
                if balance < bought.price {
                    return Err(insufficient_funds(balance, bought.price));
                }

                ledger
                    .write_balance(scope, &buyer_id, balance - bought.price)
                    .await
                    .map_err(|source| update_coins_failed(buyer_id, source))?;
                inventory
                    .append_entry(scope, &buyer_id, &bought)
                    .await
                    .map_err(|source| EngineError::AddToInventoryFailed {
                        account: buyer_id,
                        source: Box::new(source),
                    })?;
                transfers
                    .append(scope, &purchase)
                    .await
                    .map_err(|source| EngineError::RegisterTransferFailed {
                        source: Box::new(source),
                    })?;
                Ok(())
            })
        })
        .await
        .map_err(|err| unit_failed("buy_merch", &[buyer_id], err))?;

        tracing::info!("{buyer_id} bought '{}' for {} coins", item.name, item.price);
        Ok(())
    }
}

async fn locked_balance<S: Send + Sync>(
    ledger: &dyn LedgerStore<S>,
    scope: &S,
    account: &AccountId,
) -> ResultEngine<i64> {
    ledger
        .lock_balance(scope, account)
        .await?
        .ok_or_else(|| EngineError::KeyNotFound(format!("account {account}")))
}

fn insufficient_funds(balance: i64, required: i64) -> EngineError {
    EngineError::InsufficientFunds(format!("balance {balance} < required {required}"))
}

fn update_coins_failed(account: AccountId, source: EngineError) -> EngineError {
    EngineError::UpdateCoinsFailed {
        account,
        source: Box::new(source),
    }
}

/// Client and cancellation errors pass through; anything else becomes a
/// logged [`EngineError::CommitFailed`].
fn unit_failed(operation: &'static str, accounts: &[AccountId], err: EngineError) -> EngineError {
    if err.kind() != ErrorKind::Internal {
        return err;
    }
    let accounts = accounts
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ");
    tracing::error!("{operation} failed for accounts [{accounts}]: {err}");
    EngineError::CommitFailed {
        operation,
        accounts,
        source: Box::new(err),
    }
}
