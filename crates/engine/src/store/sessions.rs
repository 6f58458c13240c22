use sea_orm::prelude::*;

use crate::{AccountId, ResultEngine, sessions};

use super::DbStore;

impl DbStore {
    pub async fn insert_session(&self, token_hash: String, account: AccountId) -> ResultEngine<()> {
        sessions::Entity::insert(sessions::Model::new_active(token_hash, account))
            .exec(&self.database)
            .await?;
        Ok(())
    }

    pub async fn session_account(&self, token_hash: &str) -> ResultEngine<Option<AccountId>> {
        sessions::Entity::find_by_id(token_hash.to_string())
            .one(&self.database)
            .await?
            .map(|model| AccountId::try_from(model.user_id.as_str()))
            .transpose()
    }
}
