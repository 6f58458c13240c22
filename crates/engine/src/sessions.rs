//! Issued API sessions. Only a digest of each token is stored.

use sea_orm::{ActiveValue, entity::prelude::*};

use crate::AccountId;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "sessions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub token_hash: String,
    pub user_id: String,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub(crate) fn new_active(token_hash: String, account: AccountId) -> ActiveModel {
        ActiveModel {
            token_hash: ActiveValue::Set(token_hash),
            user_id: ActiveValue::Set(account.to_string()),
            created_at: ActiveValue::Set(chrono::Utc::now()),
        }
    }
}
