use std::collections::HashMap;

use async_trait::async_trait;
use sea_orm::{DatabaseTransaction, QueryFilter, QueryOrder, prelude::*};
use uuid::Uuid;

use crate::{
    AccountId, CatalogItem, EngineError, InventoryEntry, ResultEngine, inventory, merch,
    ports::InventoryStore, util::parse_uuid,
};

use super::DbStore;

#[async_trait]
impl InventoryStore<DatabaseTransaction> for DbStore {
    async fn append_entry(
        &self,
        scope: &DatabaseTransaction,
        account: &AccountId,
        item: &CatalogItem,
    ) -> ResultEngine<()> {
        inventory::Entity::insert(inventory::Model::new_active(*account, item.id))
            .exec(scope)
            .await?;
        Ok(())
    }

    async fn entries_for(&self, account: &AccountId) -> ResultEngine<Vec<InventoryEntry>> {
        let models = inventory::Entity::find()
            .filter(inventory::Column::UserId.eq(account.to_string()))
            .order_by_asc(inventory::Column::Id)
            .all(&self.database)
            .await?;
        if models.is_empty() {
            return Ok(Vec::new());
        }

        let mut merch_ids: Vec<String> = models.iter().map(|m| m.merch_id.clone()).collect();
        merch_ids.sort();
        merch_ids.dedup();
        let names: HashMap<Uuid, String> = merch::Entity::find()
            .filter(merch::Column::Id.is_in(merch_ids))
            .all(&self.database)
            .await?
            .into_iter()
            .map(|m| Ok((parse_uuid(&m.id, "merch")?, m.name)))
            .collect::<ResultEngine<_>>()?;

        models
            .into_iter()
            .map(|model| {
                let item_id = parse_uuid(&model.merch_id, "merch")?;
                let item_name = names.get(&item_id).cloned().ok_or_else(|| {
                    EngineError::KeyNotFound(format!("merch {item_id} of inventory entry"))
                })?;
                Ok(InventoryEntry {
                    account_id: *account,
                    item_id,
                    item_name,
                    acquired_at: model.created_at,
                })
            })
            .collect()
    }
}
