use crate::{
    Account, AccountId, ResultEngine, StoredCredentials,
    util::{normalize_name, normalize_required_name},
};

use super::Engine;

impl Engine {
    /// Create an account holding the starting balance.
    ///
    /// `password_hash` is stored as given. Returns
    /// [`EngineError::ExistingKey`](crate::EngineError::ExistingKey) if the
    /// username is taken.
    pub async fn register_account(
        &self,
        username: &str,
        password_hash: &str,
    ) -> ResultEngine<Account> {
        let username = normalize_required_name(username, "user")?;
        let account = self
            .store
            .create_account(username, password_hash.to_string(), self.starting_balance)
            .await?;
        tracing::info!("registered account {} ({})", account.username, account.id);
        Ok(account)
    }

    /// Account and password hash registered under `username`, if any.
    pub async fn credentials(&self, username: &str) -> ResultEngine<Option<StoredCredentials>> {
        match normalize_name(username) {
            Some(username) => self.store.credentials(&username).await,
            None => Ok(None),
        }
    }

    pub async fn list_accounts(&self) -> ResultEngine<Vec<Account>> {
        self.store.list_accounts().await
    }

    /// Remember a session token of `account`, identified by its digest.
    pub async fn open_session(&self, account: &AccountId, token_hash: &str) -> ResultEngine<()> {
        self.store
            .insert_session(token_hash.to_string(), *account)
            .await
    }

    /// The account a session token digest was issued to.
    pub async fn session_account(&self, token_hash: &str) -> ResultEngine<Option<AccountId>> {
        self.store.session_account(token_hash).await
    }
}
