//! Transactional coin ledger of the merch store.
//!
//! Accounts hold a coin balance; coins move between accounts with
//! [`Engine::send_coin`] and are exchanged for catalog items with
//! [`Engine::buy_merch`]. Every movement is written together with an
//! immutable [`TransferRecord`] in one database transaction, so the books
//! never go out of balance, even under concurrent requests.
//!
//! The orchestration lives in [`CoinLedger`], which only talks to storage
//! through the traits in [`ports`]; [`Engine`] wires it to sea-orm.

pub use accounts::{Account, AccountId, StoredCredentials};
pub use context::{CallContext, CancelHandle};
pub use error::{EngineError, ErrorKind};
pub use inventory::{InventoryEntry, InventoryItem};
pub use ledger::{CoinLedger, Collaborators};
pub use merch::CatalogItem;
pub use ops::{Engine, EngineBuilder, STARTING_BALANCE};
pub use store::DbStore;
pub use transfers::{NewTransfer, TransferKind, TransferRecord};
pub use tx::{DbTransactionManager, run_atomic};
pub use user_info::{HistoryEntry, UserInfo};

mod accounts;
mod context;
mod error;
mod inventory;
mod ledger;
mod merch;
mod ops;
pub mod ports;
mod sessions;
mod store;
mod transfers;
mod tx;
mod user_info;
mod util;

pub type ResultEngine<T> = Result<T, EngineError>;
