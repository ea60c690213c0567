use std::sync::Arc;

use sea_orm::{
    ColumnTrait, ConnectionTrait, Database, DatabaseConnection, EntityTrait, PaginatorTrait,
    QueryFilter, Statement,
};
use uuid::Uuid;

use engine::{
    Engine, EngineError, EntryType, OperationKind, ProcessCmd, TransactionStatus, accounts,
    ledger_entries, transactions,
};
use migration::MigratorTrait;

async fn engine_with_db() -> (Engine, DatabaseConnection) {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let engine = Engine::builder().database(db.clone()).build();
    (engine, db)
}

async fn engine_with_file_db() -> (Engine, DatabaseConnection, std::path::PathBuf) {
    let root = std::path::PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../target/test_dbs");
    std::fs::create_dir_all(&root).unwrap();

    let path = root.join(format!("engine_{}.db", Uuid::new_v4()));
    let url = format!("sqlite:{}?mode=rwc", path.display());

    let db = Database::connect(&url).await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let engine = Engine::builder().database(db.clone()).build();

    (engine, db, path)
}

fn cmd(kind: OperationKind, owner: &str, asset: &str, amount: i64, key: &str) -> ProcessCmd {
    ProcessCmd {
        kind,
        owner_id: owner.to_string(),
        asset: asset.to_string(),
        amount_minor: amount,
        idempotency_key: key.to_string(),
        reference_id: None,
        metadata: None,
    }
}

async fn account_balance(db: &DatabaseConnection, owner: &str, symbol: &str) -> i64 {
    let backend = db.get_database_backend();
    let row = db
        .query_one(Statement::from_sql_and_values(
            backend,
            "SELECT a.balance_minor AS balance_minor FROM accounts a \
             JOIN asset_types t ON t.id = a.asset_type_id \
             WHERE a.owner_id = ? AND t.symbol = ?;",
            vec![owner.into(), symbol.into()],
        ))
        .await
        .unwrap()
        .unwrap();
    row.try_get("", "balance_minor").unwrap()
}

#[tokio::test]
async fn topup_creates_account_and_balanced_entries() {
    let (engine, db) = engine_with_db().await;
    let treasury_before = account_balance(&db, "treasury", "GOLD").await;

    let outcome = engine
        .process(cmd(OperationKind::Topup, "alice", "GOLD", 500, "k1"))
        .await
        .unwrap();

    assert!(!outcome.replayed);
    assert_eq!(outcome.result.kind, OperationKind::Topup);
    assert_eq!(outcome.result.status, TransactionStatus::Completed);
    assert_eq!(outcome.result.amount_minor, 500);
    assert_eq!(outcome.result.asset, "GOLD");
    assert_eq!(outcome.result.balance_after_minor, 500);

    assert_eq!(account_balance(&db, "alice", "GOLD").await, 500);
    assert_eq!(
        account_balance(&db, "treasury", "GOLD").await,
        treasury_before - 500
    );

    let entries = ledger_entries::Entity::find()
        .filter(ledger_entries::Column::TransactionId.eq(outcome.result.id.to_string()))
        .all(&db)
        .await
        .unwrap();
    assert_eq!(entries.len(), 2);
    assert!(entries.iter().all(|e| e.amount_minor == 500));

    let tx = transactions::Entity::find_by_id(outcome.result.id.to_string())
        .one(&db)
        .await
        .unwrap()
        .unwrap();
    let debit = entries
        .iter()
        .find(|e| e.entry_type == EntryType::Debit.as_str())
        .unwrap();
    let credit = entries
        .iter()
        .find(|e| e.entry_type == EntryType::Credit.as_str())
        .unwrap();
    // Topup flows treasury -> user.
    assert_eq!(debit.account_id, tx.source_account_id);
    assert_eq!(credit.account_id, tx.destination_account_id);
    assert_eq!(debit.balance_after_minor, treasury_before - 500);
    assert_eq!(credit.balance_after_minor, 500);

    let source = accounts::Entity::find_by_id(tx.source_account_id.clone())
        .one(&db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(source.kind, "system");
    let destination = accounts::Entity::find_by_id(tx.destination_account_id.clone())
        .one(&db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(destination.owner_id, "alice");
}

#[tokio::test]
async fn replay_is_read_only_and_returns_original_result() {
    let (engine, db) = engine_with_db().await;

    let first = engine
        .process(cmd(OperationKind::Topup, "alice", "GOLD", 500, "k1"))
        .await
        .unwrap();
    assert!(!first.replayed);

    // Same key, different amount: the original result comes back untouched.
    for _ in 0..3 {
        let replay = engine
            .process(cmd(OperationKind::Topup, "alice", "GOLD", 999, "k1"))
            .await
            .unwrap();
        assert!(replay.replayed);
        assert_eq!(replay.result, first.result);
    }

    assert_eq!(
        transactions::Entity::find().count(&db).await.unwrap(),
        1,
        "replays must not create transactions"
    );
    assert_eq!(ledger_entries::Entity::find().count(&db).await.unwrap(), 2);
    assert_eq!(account_balance(&db, "alice", "GOLD").await, 500);
}

#[tokio::test]
async fn replay_result_survives_later_operations() {
    let (engine, _db) = engine_with_db().await;

    let original = engine
        .process(cmd(OperationKind::Topup, "alice", "GOLD", 500, "k1"))
        .await
        .unwrap();

    engine
        .process(cmd(OperationKind::Spend, "alice", "GOLD", 200, "k2"))
        .await
        .unwrap();

    let replay = engine
        .process(cmd(OperationKind::Topup, "alice", "GOLD", 500, "k1"))
        .await
        .unwrap();
    assert!(replay.replayed);
    assert_eq!(replay.result, original.result);
    assert_eq!(replay.result.balance_after_minor, 500);
}

#[tokio::test]
async fn spend_with_insufficient_balance_persists_nothing() {
    let (engine, db) = engine_with_db().await;

    engine
        .process(cmd(OperationKind::Topup, "alice", "GOLD", 500, "k1"))
        .await
        .unwrap();

    let err = engine
        .process(cmd(OperationKind::Spend, "alice", "GOLD", 600, "k2"))
        .await
        .unwrap_err();
    assert_eq!(err, EngineError::InsufficientBalance("GOLD".to_string()));

    assert_eq!(account_balance(&db, "alice", "GOLD").await, 500);
    assert_eq!(transactions::Entity::find().count(&db).await.unwrap(), 1);
    assert_eq!(ledger_entries::Entity::find().count(&db).await.unwrap(), 2);
}

#[tokio::test]
async fn value_is_conserved_across_operations() {
    let (engine, db) = engine_with_db().await;
    let total_before = account_balance(&db, "treasury", "GOLD").await;

    engine
        .process(cmd(OperationKind::Topup, "alice", "GOLD", 1000, "k1"))
        .await
        .unwrap();
    engine
        .process(cmd(OperationKind::Bonus, "alice", "GOLD", 250, "k2"))
        .await
        .unwrap();
    engine
        .process(cmd(OperationKind::Spend, "alice", "GOLD", 400, "k3"))
        .await
        .unwrap();

    let user = account_balance(&db, "alice", "GOLD").await;
    let treasury = account_balance(&db, "treasury", "GOLD").await;
    assert_eq!(user, 850);
    // Every unit in a user account was issued by the treasury.
    assert_eq!(user + treasury, total_before);
}

#[tokio::test]
async fn bonus_flows_treasury_to_user() {
    let (engine, db) = engine_with_db().await;
    let treasury_before = account_balance(&db, "treasury", "GEM").await;

    let outcome = engine
        .process(cmd(OperationKind::Bonus, "bob", "GEM", 30, "k1"))
        .await
        .unwrap();

    assert_eq!(outcome.result.balance_after_minor, 30);
    assert_eq!(account_balance(&db, "bob", "GEM").await, 30);
    assert_eq!(
        account_balance(&db, "treasury", "GEM").await,
        treasury_before - 30
    );
}

#[tokio::test]
async fn full_scenario_topup_replay_overdraw_spend() {
    let (engine, db) = engine_with_db().await;
    let treasury_before = account_balance(&db, "treasury", "GOLD").await;

    let topup = engine
        .process(cmd(OperationKind::Topup, "alice", "GOLD", 500, "k1"))
        .await
        .unwrap();
    assert_eq!(topup.result.balance_after_minor, 500);

    let replay = engine
        .process(cmd(OperationKind::Topup, "alice", "GOLD", 100, "k1"))
        .await
        .unwrap();
    assert!(replay.replayed);
    assert_eq!(replay.result.amount_minor, 500);
    assert_eq!(replay.result.balance_after_minor, 500);

    let err = engine
        .process(cmd(OperationKind::Spend, "alice", "GOLD", 600, "k2"))
        .await
        .unwrap_err();
    assert_eq!(err, EngineError::InsufficientBalance("GOLD".to_string()));
    assert_eq!(account_balance(&db, "alice", "GOLD").await, 500);

    let spend = engine
        .process(cmd(OperationKind::Spend, "alice", "GOLD", 500, "k3"))
        .await
        .unwrap();
    assert_eq!(spend.result.balance_after_minor, 0);
    assert_eq!(account_balance(&db, "alice", "GOLD").await, 0);
    // Treasury issued 500 and took 500 back.
    assert_eq!(account_balance(&db, "treasury", "GOLD").await, treasury_before);
}

#[tokio::test]
async fn rejects_bad_requests_before_touching_storage() {
    let (engine, db) = engine_with_db().await;

    let err = engine
        .process(cmd(OperationKind::Topup, "alice", "GOLD", 0, "k1"))
        .await
        .unwrap_err();
    assert_eq!(
        err,
        EngineError::InvalidAmount("amount_minor must be > 0".to_string())
    );

    let err = engine
        .process(cmd(OperationKind::Topup, "alice", "GOLD", 100, "  "))
        .await
        .unwrap_err();
    assert_eq!(
        err,
        EngineError::InvalidAmount("idempotency_key must not be empty".to_string())
    );

    let err = engine
        .process(cmd(OperationKind::Topup, "alice", "WOOD", 100, "k1"))
        .await
        .unwrap_err();
    assert_eq!(err, EngineError::UnknownAsset("WOOD".to_string()));

    assert_eq!(transactions::Entity::find().count(&db).await.unwrap(), 0);
}

#[tokio::test]
async fn asset_symbol_is_case_insensitive() {
    let (engine, db) = engine_with_db().await;

    let outcome = engine
        .process(cmd(OperationKind::Topup, "alice", "gold", 100, "k1"))
        .await
        .unwrap();
    assert_eq!(outcome.result.asset, "GOLD");
    assert_eq!(account_balance(&db, "alice", "GOLD").await, 100);
}

#[tokio::test]
async fn metadata_round_trips_through_storage() {
    let (engine, db) = engine_with_db().await;

    let metadata = serde_json::json!({"campaign": "summer", "attempt": 2});
    let mut request = cmd(OperationKind::Topup, "alice", "GOLD", 100, "k1");
    request.metadata = Some(metadata.clone());
    request.reference_id = Some("order-7".to_string());

    let outcome = engine.process(request).await.unwrap();

    let tx = transactions::Entity::find_by_id(outcome.result.id.to_string())
        .one(&db)
        .await
        .unwrap()
        .unwrap();
    let stored: serde_json::Value =
        serde_json::from_str(tx.metadata.as_deref().unwrap()).unwrap();
    assert_eq!(stored, metadata);
    assert_eq!(tx.reference_id, Some("order-7".to_string()));
}

#[tokio::test]
async fn treasury_with_wrong_kind_is_a_configuration_fault() {
    let (engine, db) = engine_with_db().await;
    let backend = db.get_database_backend();

    // A mis-provisioned treasury row must not be usable as an issuing side.
    db.execute(Statement::from_sql_and_values(
        backend,
        "UPDATE accounts SET kind = 'user' WHERE owner_id = ?;",
        vec!["treasury".into()],
    ))
    .await
    .unwrap();

    let err = engine
        .process(cmd(OperationKind::Topup, "alice", "GOLD", 100, "k1"))
        .await
        .unwrap_err();
    assert_eq!(err, EngineError::TreasuryMissing("GOLD".to_string()));
}

#[tokio::test]
async fn missing_treasury_is_a_configuration_fault() {
    let (engine, db) = engine_with_db().await;
    let backend = db.get_database_backend();

    db.execute(Statement::from_sql_and_values(
        backend,
        "DELETE FROM accounts WHERE owner_id = ?;",
        vec!["treasury".into()],
    ))
    .await
    .unwrap();

    let err = engine
        .process(cmd(OperationKind::Topup, "alice", "GOLD", 100, "k1"))
        .await
        .unwrap_err();
    assert_eq!(err, EngineError::TreasuryMissing("GOLD".to_string()));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_spends_never_overdraw() {
    let (engine, db, path) = engine_with_file_db().await;

    engine
        .process(cmd(OperationKind::Topup, "alice", "GOLD", 500, "seed"))
        .await
        .unwrap();

    let engine = Arc::new(engine);
    let mut handles = Vec::new();
    for i in 0..10 {
        let engine = Arc::clone(&engine);
        handles.push(tokio::spawn(async move {
            let key = format!("spend-{i}");
            // Transient storage contention is retriable with the same key.
            for _ in 0..20 {
                match engine
                    .process(cmd(OperationKind::Spend, "alice", "GOLD", 100, &key))
                    .await
                {
                    Ok(_) => return true,
                    Err(EngineError::InsufficientBalance(_)) => return false,
                    Err(EngineError::Database(_)) => {
                        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
                    }
                    Err(err) => panic!("unexpected error: {err}"),
                }
            }
            panic!("spend did not settle after retries");
        }));
    }

    let mut succeeded = 0i64;
    for handle in handles {
        if handle.await.unwrap() {
            succeeded += 1;
        }
    }

    let balance = account_balance(&db, "alice", "GOLD").await;
    assert_eq!(succeeded, 5, "only 5 of 10 spends of 100 fit into 500");
    assert_eq!(balance, 500 - succeeded * 100);
    assert!(balance >= 0);

    drop(db);
    let _ = std::fs::remove_file(path);
}
