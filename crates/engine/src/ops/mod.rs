use std::sync::Arc;

use sea_orm::DatabaseConnection;

use crate::{
    ResultEngine,
    ledger::{Collaborators, CoinLedger},
    store::DbStore,
    tx::DbTransactionManager,
};

mod accounts;
mod catalog;
mod coins;

/// Coins every new account starts with.
pub const STARTING_BALANCE: i64 = 1000;

/// The database-backed ledger plus account and catalog management.
#[derive(Debug)]
pub struct Engine {
    ledger: CoinLedger<DbTransactionManager>,
    store: Arc<DbStore>,
    starting_balance: i64,
}

impl Engine {
    /// Return a builder for `Engine`. Help to build the struct.
    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }

    pub fn starting_balance(&self) -> i64 {
        self.starting_balance
    }
}

/// The builder for `Engine`
pub struct EngineBuilder {
    database: DatabaseConnection,
    starting_balance: i64,
}

impl Default for EngineBuilder {
    fn default() -> Self {
        Self {
            database: DatabaseConnection::default(),
            starting_balance: STARTING_BALANCE,
        }
    }
}

impl EngineBuilder {
    /// Pass the required database
    pub fn database(mut self, db: DatabaseConnection) -> EngineBuilder {
        self.database = db;
        self
    }

    /// Override the balance of newly registered accounts.
    pub fn starting_balance(mut self, coins: i64) -> EngineBuilder {
        self.starting_balance = coins;
        self
    }

    /// Construct `Engine`
    pub async fn build(self) -> ResultEngine<Engine> {
        if self.starting_balance < 0 {
            return Err(crate::EngineError::InvalidAmount(
                "starting balance must be >= 0".to_string(),
            ));
        }
        let store = Arc::new(DbStore::new(self.database.clone()));
        let manager = Arc::new(DbTransactionManager::new(self.database));
        let ledger = CoinLedger::new(
            manager,
            Collaborators {
                accounts: store.clone(),
                ledger: store.clone(),
                transfers: store.clone(),
                catalog: store.clone(),
                inventory: store.clone(),
            },
        );
        Ok(Engine {
            ledger,
            store,
            starting_balance: self.starting_balance,
        })
    }
}
