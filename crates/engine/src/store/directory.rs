use sea_orm::{QueryFilter, QueryOrder, SqlErr, prelude::*};

use async_trait::async_trait;

use crate::{
    Account, AccountId, EngineError, ResultEngine, StoredCredentials, accounts,
    ports::AccountDirectory,
};

use super::DbStore;

#[async_trait]
impl AccountDirectory for DbStore {
    async fn find_by_id(&self, id: &AccountId) -> ResultEngine<Option<Account>> {
        accounts::Entity::find_by_id(id.to_string())
            .one(&self.database)
            .await?
            .map(Account::try_from)
            .transpose()
    }

    async fn find_by_username(&self, username: &str) -> ResultEngine<Option<Account>> {
        self.find_model_by_username(username)
            .await?
            .map(Account::try_from)
            .transpose()
    }
}

impl DbStore {
    async fn find_model_by_username(&self, username: &str) -> ResultEngine<Option<accounts::Model>> {
        Ok(accounts::Entity::find()
            .filter(accounts::Column::Username.eq(username))
            .one(&self.database)
            .await?)
    }

    /// Insert a new account holding `balance` coins.
    ///
    /// A username that is already taken fails with [`EngineError::ExistingKey`].
    pub async fn create_account(
        &self,
        username: String,
        password_hash: String,
        balance: i64,
    ) -> ResultEngine<Account> {
        let (_, model) = accounts::Model::new_active(username.clone(), password_hash, balance);
        match model.insert(&self.database).await {
            Ok(model) => Account::try_from(model),
            Err(err) if matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
                Err(EngineError::ExistingKey(username))
            }
            Err(err) => Err(err.into()),
        }
    }

    pub async fn credentials(&self, username: &str) -> ResultEngine<Option<StoredCredentials>> {
        self.find_model_by_username(username)
            .await?
            .map(StoredCredentials::try_from)
            .transpose()
    }

    pub async fn list_accounts(&self) -> ResultEngine<Vec<Account>> {
        accounts::Entity::find()
            .order_by_asc(accounts::Column::Username)
            .all(&self.database)
            .await?
            .into_iter()
            .map(Account::try_from)
            .collect()
    }
}
