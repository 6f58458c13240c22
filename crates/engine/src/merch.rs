//! Catalog items that can be bought with coins.

use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, ResultEngine, util::parse_uuid};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogItem {
    pub id: Uuid,
    pub name: String,
    pub price: i64,
}

impl CatalogItem {
    pub fn new(name: String, price: i64) -> ResultEngine<Self> {
        if price <= 0 {
            return Err(EngineError::InvalidAmount(format!(
                "price of '{name}' must be > 0"
            )));
        }
        Ok(Self {
            id: Uuid::new_v4(),
            name,
            price,
        })
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "merch")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    #[sea_orm(unique)]
    pub name: String,
    pub price: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<&CatalogItem> for ActiveModel {
    fn from(item: &CatalogItem) -> Self {
        Self {
            id: ActiveValue::Set(item.id.to_string()),
            name: ActiveValue::Set(item.name.clone()),
            price: ActiveValue::Set(item.price),
        }
    }
}

impl TryFrom<Model> for CatalogItem {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: parse_uuid(&model.id, "merch")?,
            name: model.name,
            price: model.price,
        })
    }
}
