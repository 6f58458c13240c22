use async_trait::async_trait;
use sea_orm::{DatabaseTransaction, QueryFilter, prelude::*, sea_query::Expr};

use crate::{AccountId, EngineError, ResultEngine, accounts, ports::LedgerStore};

use super::DbStore;

#[async_trait]
impl LedgerStore<DatabaseTransaction> for DbStore {
    async fn lock_balance(
        &self,
        scope: &DatabaseTransaction,
        account: &AccountId,
    ) -> ResultEngine<Option<i64>> {
        // No-op write: takes the row lock (the database write lock on SQLite)
        // before the balance is read, so concurrent units on the same account
        // serialize here.
        let touched = accounts::Entity::update_many()
            .col_expr(accounts::Column::Balance, Expr::col(accounts::Column::Balance).into())
            .filter(accounts::Column::Id.eq(account.to_string()))
            .exec(scope)
            .await?;
        if touched.rows_affected == 0 {
            return Ok(None);
        }

        let model = accounts::Entity::find_by_id(account.to_string())
            .one(scope)
            .await?;
        Ok(model.map(|model| model.balance))
    }

    async fn write_balance(
        &self,
        scope: &DatabaseTransaction,
        account: &AccountId,
        new_balance: i64,
    ) -> ResultEngine<()> {
        if new_balance < 0 {
            return Err(EngineError::InvalidAmount(format!(
                "balance of {account} cannot become negative ({new_balance})"
            )));
        }

        let updated = accounts::Entity::update_many()
            .col_expr(accounts::Column::Balance, Expr::value(new_balance))
            .filter(accounts::Column::Id.eq(account.to_string()))
            .exec(scope)
            .await?;
        if updated.rows_affected == 0 {
            return Err(EngineError::KeyNotFound(format!("account {account}")));
        }
        Ok(())
    }
}
