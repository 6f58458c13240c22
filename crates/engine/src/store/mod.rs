//! sea-orm implementations of the storage ports.
//!
//! Reads go through the pooled connection; every mutation that belongs to
//! an atomic unit runs on the [`DatabaseTransaction`] handed in by the
//! caller.
//!
//! [`DatabaseTransaction`]: sea_orm::DatabaseTransaction

use std::collections::HashMap;

use sea_orm::{DatabaseConnection, QueryFilter, prelude::*};

use crate::{AccountId, ResultEngine, accounts};

mod catalog;
mod directory;
mod inventory;
mod ledger;
mod sessions;
mod transfers;

#[derive(Clone, Debug)]
pub struct DbStore {
    database: DatabaseConnection,
}

impl DbStore {
    pub fn new(database: DatabaseConnection) -> Self {
        Self { database }
    }

    /// Usernames of the given accounts. Unknown ids are left out.
    async fn usernames(
        &self,
        ids: impl IntoIterator<Item = AccountId>,
    ) -> ResultEngine<HashMap<AccountId, String>> {
        let mut ids: Vec<String> = ids.into_iter().map(|id| id.to_string()).collect();
        ids.sort();
        ids.dedup();
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let models = accounts::Entity::find()
            .filter(accounts::Column::Id.is_in(ids))
            .all(&self.database)
            .await?;
        models
            .into_iter()
            .map(|model| Ok((AccountId::try_from(model.id.as_str())?, model.username)))
            .collect()
    }
}
