//! Accounts (wallets of coins) and the `users` table behind them.

use std::fmt;

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, ResultEngine, util::parse_uuid};

/// Stable identifier of an account.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountId(Uuid);

impl AccountId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for AccountId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Uuid> for AccountId {
    fn from(value: Uuid) -> Self {
        Self(value)
    }
}

impl TryFrom<&str> for AccountId {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        parse_uuid(value, "account").map(Self)
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A user's wallet: identity plus current coin balance.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub id: AccountId,
    pub username: String,
    pub balance: i64,
    pub created_at: DateTime<Utc>,
}

/// Account plus the password hash stored next to it.
///
/// The engine never interprets the hash; it is produced and checked by the
/// identity layer.
#[derive(Clone, Debug)]
pub struct StoredCredentials {
    pub account: Account,
    pub password_hash: String,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    #[sea_orm(unique)]
    pub username: String,
    pub password_hash: String,
    pub balance: i64,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub(crate) fn new_active(
        username: String,
        password_hash: String,
        balance: i64,
    ) -> (AccountId, ActiveModel) {
        let id = AccountId::new();
        let model = ActiveModel {
            id: ActiveValue::Set(id.to_string()),
            username: ActiveValue::Set(username),
            password_hash: ActiveValue::Set(password_hash),
            balance: ActiveValue::Set(balance),
            created_at: ActiveValue::Set(Utc::now()),
        };
        (id, model)
    }
}

impl TryFrom<Model> for Account {
    type Error = EngineError;

    fn try_from(model: Model) -> ResultEngine<Self> {
        Ok(Self {
            id: AccountId::try_from(model.id.as_str())?,
            username: model.username,
            balance: model.balance,
            created_at: model.created_at,
        })
    }
}

impl TryFrom<Model> for StoredCredentials {
    type Error = EngineError;

    fn try_from(mut model: Model) -> ResultEngine<Self> {
        let password_hash = std::mem::take(&mut model.password_hash);
        Ok(Self {
            account: Account::try_from(model)?,
            password_hash,
        })
    }
}
