use std::sync::Arc;

use async_trait::async_trait;
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, DatabaseTransaction, Statement};

use engine::{
    Account, AccountId, CallContext, CoinLedger, Collaborators, DbStore, DbTransactionManager,
    Engine, EngineError, HistoryEntry, InventoryItem, NewTransfer, ResultEngine, TransferKind,
    ports::{AccountDirectory, TransferStore},
};
use migration::MigratorTrait;
use uuid::Uuid;

async fn engine_with_db() -> (Engine, DatabaseConnection) {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let engine = Engine::builder()
        .database(db.clone())
        .build()
        .await
        .unwrap();
    (engine, db)
}

async fn engine_with_file_db() -> (Engine, DatabaseConnection, std::path::PathBuf) {
    let root = std::path::PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../target/test_dbs");
    std::fs::create_dir_all(&root).unwrap();

    let path = root.join(format!("engine_{}.db", Uuid::new_v4()));
    let url = format!("sqlite:{}?mode=rwc", path.display());

    let db = Database::connect(&url).await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let engine = Engine::builder()
        .database(db.clone())
        .build()
        .await
        .unwrap();

    (engine, db, path)
}

async fn account_with(engine: &Engine, db: &DatabaseConnection, name: &str, coins: i64) -> Account {
    let account = engine.register_account(name, "hash").await.unwrap();
    set_balance(db, &account.id, coins).await;
    Account {
        balance: coins,
        ..account
    }
}

async fn set_balance(db: &DatabaseConnection, id: &AccountId, coins: i64) {
    db.execute(Statement::from_sql_and_values(
        db.get_database_backend(),
        "UPDATE users SET balance = ? WHERE id = ?",
        vec![coins.into(), id.to_string().into()],
    ))
    .await
    .unwrap();
}

async fn balance(engine: &Engine, id: &AccountId) -> i64 {
    engine
        .user_info(&CallContext::new(), id)
        .await
        .unwrap()
        .balance()
}

async fn count_rows(db: &DatabaseConnection, table: &str) -> i64 {
    let row = db
        .query_one(Statement::from_string(
            db.get_database_backend(),
            format!("SELECT COUNT(*) AS n FROM {table}"),
        ))
        .await
        .unwrap()
        .unwrap();
    row.try_get("", "n").unwrap()
}

#[tokio::test]
async fn registered_accounts_start_with_the_configured_balance() {
    let (engine, _db) = engine_with_db().await;

    let account = engine.register_account("  alice ", "hash").await.unwrap();
    assert_eq!(account.username, "alice");
    assert_eq!(account.balance, engine::STARTING_BALANCE);

    let err = engine.register_account("alice", "other").await.unwrap_err();
    assert!(matches!(err, EngineError::ExistingKey(_)));

    let credentials = engine.credentials("alice").await.unwrap().unwrap();
    assert_eq!(credentials.account.id, account.id);
    assert_eq!(credentials.password_hash, "hash");
    assert!(engine.credentials("bob").await.unwrap().is_none());

    engine.register_account("aaron", "hash").await.unwrap();
    let names: Vec<String> = engine
        .list_accounts()
        .await
        .unwrap()
        .into_iter()
        .map(|account| account.username)
        .collect();
    assert_eq!(names, ["aaron", "alice"]);
}

#[tokio::test]
async fn send_coin_moves_coins_between_accounts() {
    let (engine, db) = engine_with_db().await;
    let sender = account_with(&engine, &db, "sender", 1000).await;
    let receiver = account_with(&engine, &db, "receiver", 0).await;

    engine
        .send_coin(&CallContext::new(), &sender.id, "receiver", 100)
        .await
        .unwrap();

    let sender_info = engine
        .user_info(&CallContext::new(), &sender.id)
        .await
        .unwrap();
    let receiver_info = engine
        .user_info(&CallContext::new(), &receiver.id)
        .await
        .unwrap();
    assert_eq!(sender_info.balance(), 900);
    assert_eq!(receiver_info.balance(), 100);
    assert_eq!(sender_info.sent.len(), 1);
    assert_eq!(sender_info.sent[0].record.amount, 100);
    assert_eq!(sender_info.sent[0].counterparty.as_deref(), Some("receiver"));
    assert_eq!(receiver_info.received.len(), 1);
    assert_eq!(receiver_info.received[0].record.amount, 100);
    assert_eq!(
        receiver_info.received[0].counterparty.as_deref(),
        Some("sender")
    );
}

#[tokio::test]
async fn buy_merch_from_seeded_catalog() {
    let (engine, db) = engine_with_db().await;
    let buyer = account_with(&engine, &db, "buyer", 400).await;

    engine
        .buy_merch(&CallContext::new(), &buyer.id, "hoody")
        .await
        .unwrap();

    let info = engine
        .user_info(&CallContext::new(), &buyer.id)
        .await
        .unwrap();
    assert_eq!(info.balance(), 100);
    assert_eq!(
        info.inventory_summary(),
        vec![InventoryItem {
            name: "hoody".to_string(),
            quantity: 1
        }]
    );
    assert_eq!(info.sent.len(), 1);
    assert_eq!(info.sent[0].record.kind, TransferKind::Purchase);
    assert_eq!(info.sent[0].record.amount, 300);
    assert_eq!(info.sent[0].counterparty, None);
}

#[tokio::test]
async fn buy_merch_without_funds_leaves_no_trace() {
    let (engine, db) = engine_with_db().await;
    let buyer = account_with(&engine, &db, "buyer", 200).await;

    let err = engine
        .buy_merch(&CallContext::new(), &buyer.id, "hoody")
        .await
        .unwrap_err();

    assert!(matches!(err, EngineError::InsufficientFunds(_)));
    assert_eq!(balance(&engine, &buyer.id).await, 200);
    assert_eq!(count_rows(&db, "inventory").await, 0);
    assert_eq!(count_rows(&db, "transfers").await, 0);
}

#[tokio::test]
async fn send_coin_rejects_bad_requests_without_side_effects() {
    let (engine, db) = engine_with_db().await;
    let sender = account_with(&engine, &db, "sender", 1000).await;
    account_with(&engine, &db, "receiver", 0).await;
    let ctx = CallContext::new();

    let err = engine
        .send_coin(&ctx, &sender.id, "ghost-user", 50)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::ReceiverNotFound(_)));

    for amount in [-5, 0] {
        let err = engine
            .send_coin(&ctx, &sender.id, "receiver", amount)
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::InvalidAmount(_)));
    }

    let err = engine
        .send_coin(&ctx, &sender.id, "sender", 10)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidRecipient(_)));

    assert_eq!(balance(&engine, &sender.id).await, 1000);
    assert_eq!(count_rows(&db, "transfers").await, 0);
}

#[tokio::test]
async fn user_info_is_repeatable_and_history_complete() {
    let (engine, db) = engine_with_db().await;
    let sender = account_with(&engine, &db, "sender", 1000).await;
    account_with(&engine, &db, "first", 0).await;
    account_with(&engine, &db, "second", 0).await;
    let ctx = CallContext::new();

    for (to, amount) in [("first", 10), ("second", 20), ("first", 30)] {
        engine.send_coin(&ctx, &sender.id, to, amount).await.unwrap();
    }

    let first = engine.user_info(&ctx, &sender.id).await.unwrap();
    let second = engine.user_info(&ctx, &sender.id).await.unwrap();
    assert_eq!(first, second);

    let sent: Vec<(Option<&str>, i64)> = first
        .sent
        .iter()
        .map(|e| (e.counterparty.as_deref(), e.record.amount))
        .collect();
    assert_eq!(
        sent,
        vec![(Some("first"), 10), (Some("second"), 20), (Some("first"), 30)]
    );
    assert!(first.sent.iter().all(|e| e.record.amount > 0));
    assert_eq!(first.balance(), 940);
}

/// Transfer store whose appends always fail, everything else delegated.
struct BrokenTransfers(Arc<DbStore>);

#[async_trait]
impl TransferStore<DatabaseTransaction> for BrokenTransfers {
    async fn append(&self, _scope: &DatabaseTransaction, _transfer: &NewTransfer) -> ResultEngine<()> {
        Err(EngineError::KeyNotFound("transfers table unavailable".to_string()))
    }

    async fn sent_by(&self, account: &AccountId) -> ResultEngine<Vec<HistoryEntry>> {
        self.0.sent_by(account).await
    }

    async fn received_by(&self, account: &AccountId) -> ResultEngine<Vec<HistoryEntry>> {
        self.0.received_by(account).await
    }
}

#[tokio::test]
async fn failed_record_append_rolls_back_balance_writes() {
    let (engine, db) = engine_with_db().await;
    let sender = account_with(&engine, &db, "sender", 1000).await;
    let receiver = account_with(&engine, &db, "receiver", 0).await;

    let store = Arc::new(DbStore::new(db.clone()));
    let ledger = CoinLedger::new(
        Arc::new(DbTransactionManager::new(db.clone())),
        Collaborators {
            accounts: store.clone(),
            ledger: store.clone(),
            transfers: Arc::new(BrokenTransfers(store.clone())),
            catalog: store.clone(),
            inventory: store.clone(),
        },
    );

    let err = ledger
        .send_coin(&CallContext::new(), &sender.id, "receiver", 100)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::CommitFailed { .. }));
    assert!(matches!(
        err.step(),
        EngineError::RegisterTransferFailed { .. }
    ));

    let err = ledger
        .buy_merch(&CallContext::new(), &sender.id, "cup")
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::CommitFailed { .. }));

    let sender_now = store.find_by_id(&sender.id).await.unwrap().unwrap();
    let receiver_now = store.find_by_id(&receiver.id).await.unwrap().unwrap();
    assert_eq!(sender_now.balance, 1000);
    assert_eq!(receiver_now.balance, 0);
    // The inventory row of the failed purchase was rolled back with it.
    assert_eq!(count_rows(&db, "inventory").await, 0);
    assert_eq!(count_rows(&db, "transfers").await, 0);
}

#[tokio::test]
async fn cancelled_context_leaves_balances_untouched() {
    let (engine, db) = engine_with_db().await;
    let sender = account_with(&engine, &db, "sender", 1000).await;
    account_with(&engine, &db, "receiver", 0).await;
    let (ctx, handle) = CallContext::cancellable();
    handle.cancel();

    let err = engine
        .send_coin(&ctx, &sender.id, "receiver", 100)
        .await
        .unwrap_err();

    assert!(matches!(err, EngineError::Cancelled(_)));
    assert_eq!(balance(&engine, &sender.id).await, 1000);
}

#[tokio::test]
async fn catalog_management() {
    let (engine, _db) = engine_with_db().await;

    let catalog = engine.list_merch().await.unwrap();
    assert_eq!(catalog.len(), 10);
    let hoody = catalog.iter().find(|item| item.name == "hoody").unwrap();
    assert_eq!(hoody.price, 300);

    let err = engine.add_merch("hoody", 10).await.unwrap_err();
    assert!(matches!(err, EngineError::ExistingKey(_)));
    let err = engine.add_merch("sticker", 0).await.unwrap_err();
    assert!(matches!(err, EngineError::InvalidAmount(_)));

    engine.add_merch("sticker", 5).await.unwrap();
    let catalog = engine.list_merch().await.unwrap();
    assert_eq!(catalog[0].name, "sticker");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_sends_never_overdraw_or_lose_updates() {
    let (engine, db, path) = engine_with_file_db().await;
    let engine = Arc::new(engine);
    let sender = account_with(&engine, &db, "sender", 1000).await;
    let mut receivers = Vec::new();
    for i in 0..4 {
        receivers.push(account_with(&engine, &db, &format!("receiver{i}"), 0).await);
    }

    let mut tasks = tokio::task::JoinSet::new();
    for i in 0..8 {
        let engine = engine.clone();
        let sender = sender.id;
        let to = format!("receiver{}", i % 4);
        tasks.spawn(async move {
            engine
                .send_coin(&CallContext::new(), &sender, &to, 200)
                .await
        });
    }

    let mut succeeded = 0;
    while let Some(result) = tasks.join_next().await {
        match result.unwrap() {
            Ok(()) => succeeded += 1,
            Err(err) => assert!(
                matches!(err, EngineError::InsufficientFunds(_)),
                "unexpected error: {err:?}"
            ),
        }
    }

    let sender_balance = balance(&engine, &sender.id).await;
    let mut received = 0;
    for receiver in &receivers {
        received += balance(&engine, &receiver.id).await;
    }

    // 1000 coins cover exactly five sends of 200.
    assert_eq!(succeeded, 5);
    assert_eq!(sender_balance, 0);
    assert_eq!(sender_balance + received, 1000);

    let info = engine
        .user_info(&CallContext::new(), &sender.id)
        .await
        .unwrap();
    assert_eq!(info.sent.len() as i64, succeeded);

    drop(engine);
    db.close().await.unwrap();
    let _ = std::fs::remove_file(path);
}
