use crate::{CatalogItem, ResultEngine, util::normalize_required_name};

use super::Engine;

impl Engine {
    /// Add an item to the catalog.
    pub async fn add_merch(&self, name: &str, price: i64) -> ResultEngine<CatalogItem> {
        let name = normalize_required_name(name, "merch")?;
        let item = CatalogItem::new(name, price)?;
        self.store.insert_merch(&item).await?;
        tracing::info!("added '{}' to the catalog at {} coins", item.name, item.price);
        Ok(item)
    }

    pub async fn list_merch(&self) -> ResultEngine<Vec<CatalogItem>> {
        self.store.list_merch().await
    }
}
