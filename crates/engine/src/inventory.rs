//! Inventory: one row per purchased unit.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::AccountId;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryEntry {
    pub account_id: AccountId,
    pub item_id: Uuid,
    pub item_name: String,
    pub acquired_at: DateTime<Utc>,
}

/// Entries of the same item folded together.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryItem {
    pub name: String,
    pub quantity: u32,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "inventory")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub user_id: String,
    pub merch_id: String,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub(crate) fn new_active(account: AccountId, item: Uuid) -> ActiveModel {
        ActiveModel {
            id: ActiveValue::NotSet,
            user_id: ActiveValue::Set(account.to_string()),
            merch_id: ActiveValue::Set(item.to_string()),
            created_at: ActiveValue::Set(Utc::now()),
        }
    }
}
