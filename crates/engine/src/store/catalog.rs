use async_trait::async_trait;
use sea_orm::{QueryFilter, QueryOrder, SqlErr, prelude::*};

use crate::{CatalogItem, EngineError, ResultEngine, merch, ports::CatalogLookup};

use super::DbStore;

#[async_trait]
impl CatalogLookup for DbStore {
    async fn find_by_name(&self, name: &str) -> ResultEngine<Option<CatalogItem>> {
        merch::Entity::find()
            .filter(merch::Column::Name.eq(name))
            .one(&self.database)
            .await?
            .map(CatalogItem::try_from)
            .transpose()
    }
}

impl DbStore {
    pub async fn insert_merch(&self, item: &CatalogItem) -> ResultEngine<()> {
        match merch::Entity::insert(merch::ActiveModel::from(item))
            .exec(&self.database)
            .await
        {
            Ok(_) => Ok(()),
            Err(err) if matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
                Err(EngineError::ExistingKey(item.name.clone()))
            }
            Err(err) => Err(err.into()),
        }
    }

    /// The whole catalog, cheapest first.
    pub async fn list_merch(&self) -> ResultEngine<Vec<CatalogItem>> {
        merch::Entity::find()
            .order_by_asc(merch::Column::Price)
            .order_by_asc(merch::Column::Name)
            .all(&self.database)
            .await?
            .into_iter()
            .map(CatalogItem::try_from)
            .collect()
    }
}
