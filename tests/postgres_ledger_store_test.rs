use chrono::{Duration, Utc};
use futures::TryStreamExt;
use rusty_lending_ledger::adapters::postgres::{PostgresCatalog, PostgresLedgerStore};
use rusty_lending_ledger::application::{
    LendingPolicy, ServiceDependencies,
    lending::{
        LendingError, borrow_item, item_availability, list_open_loans_for_borrower,
        list_overdue, return_item,
    },
};
use rusty_lending_ledger::domain::catalog::{ItemPatch, ItemQuery};
use rusty_lending_ledger::domain::value_objects::BorrowerId;
use rusty_lending_ledger::ports::{Catalog, ItemDeletion, LedgerStore, LedgerTransaction};
use serial_test::serial;
use sqlx::PgPool;
use std::sync::Arc;

mod common;

use common::{
    borrow_cmd, borrow_cmd_at, cleanup_database, create_test_pool, return_cmd, seed_borrower,
    seed_item,
};

// ============================================================================
// PostgreSQLを使うテスト
//
// 実行には DATABASE_URL が必要:
//   cargo test -- --ignored
// ============================================================================

async fn setup(policy: LendingPolicy) -> (PgPool, ServiceDependencies) {
    let pool = create_test_pool().await;
    cleanup_database(&pool).await;

    let deps = ServiceDependencies {
        ledger_store: Arc::new(PostgresLedgerStore::new(pool.clone())),
        catalog: Arc::new(PostgresCatalog::new(pool.clone())),
        policy,
    };
    (pool, deps)
}

async fn count_open_entries(pool: &PgPool) -> i64 {
    sqlx::query_scalar("SELECT COUNT(*) FROM ledger_entries WHERE returned_at IS NULL")
        .fetch_one(pool)
        .await
        .unwrap()
}

#[tokio::test]
#[ignore]
#[serial]
async fn test_scenario_against_postgres() {
    let (_pool, deps) = setup(LendingPolicy::default()).await;
    let item = seed_item(deps.catalog.as_ref(), "Item A", 2).await;
    let b1 = seed_borrower(deps.catalog.as_ref(), "Borrower One").await;
    let b2 = seed_borrower(deps.catalog.as_ref(), "Borrower Two").await;
    let b3 = seed_borrower(deps.catalog.as_ref(), "Borrower Three").await;

    borrow_item(&deps, borrow_cmd(item.item_id, b1.borrower_id, 7))
        .await
        .unwrap();
    borrow_item(&deps, borrow_cmd(item.item_id, b2.borrower_id, 7))
        .await
        .unwrap();
    let err = borrow_item(&deps, borrow_cmd(item.item_id, b3.borrower_id, 7))
        .await
        .unwrap_err();
    assert!(matches!(err, LendingError::ItemUnavailable));
    assert_eq!(item_availability(&deps, item.item_id).await.unwrap(), 0);

    return_item(&deps, return_cmd(item.item_id, b1.borrower_id))
        .await
        .unwrap();
    assert_eq!(item_availability(&deps, item.item_id).await.unwrap(), 1);

    let err = return_item(&deps, return_cmd(item.item_id, b1.borrower_id))
        .await
        .unwrap_err();
    assert!(matches!(err, LendingError::LoanNotFound));
    assert_eq!(item_availability(&deps, item.item_id).await.unwrap(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[ignore]
#[serial]
async fn test_concurrent_borrows_against_postgres() {
    let (pool, deps) = setup(LendingPolicy {
        require_registered_borrower: false,
    })
    .await;
    let item = seed_item(deps.catalog.as_ref(), "Contended", 2).await;

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let deps = deps.clone();
            let item_id = item.item_id;
            tokio::spawn(async move {
                borrow_item(&deps, borrow_cmd(item_id, BorrowerId::new(), 7)).await
            })
        })
        .collect();

    let mut successes = 0;
    for handle in handles {
        if handle.await.unwrap().is_ok() {
            successes += 1;
        }
    }

    assert_eq!(successes, 2);
    assert_eq!(item_availability(&deps, item.item_id).await.unwrap(), 0);
    assert_eq!(count_open_entries(&pool).await, 2);
}

#[tokio::test]
#[ignore]
#[serial]
async fn test_return_oldest_and_listing_against_postgres() {
    let (_pool, deps) = setup(LendingPolicy::default()).await;
    let item = seed_item(deps.catalog.as_ref(), "Twice", 2).await;
    let borrower = seed_borrower(deps.catalog.as_ref(), "Reader").await;
    let now = Utc::now();

    let older = borrow_item(
        &deps,
        borrow_cmd_at(item.item_id, borrower.borrower_id, now - Duration::days(10), 7),
    )
    .await
    .unwrap();
    let newer = borrow_item(&deps, borrow_cmd(item.item_id, borrower.borrower_id, 7))
        .await
        .unwrap();

    let open: Vec<_> = list_open_loans_for_borrower(&deps, borrower.borrower_id)
        .try_collect()
        .await
        .unwrap();
    assert_eq!(open.len(), 2);
    assert_eq!(open[0].entry.loan_id, older.loan_id);

    let overdue: Vec<_> = list_overdue(&deps).try_collect().await.unwrap();
    assert_eq!(overdue.len(), 1);
    assert_eq!(overdue[0].borrower.name.as_deref(), Some("Reader"));

    let returned = return_item(&deps, return_cmd(item.item_id, borrower.borrower_id))
        .await
        .unwrap();
    assert_eq!(returned.loan_id, older.loan_id);

    let open: Vec<_> = list_open_loans_for_borrower(&deps, borrower.borrower_id)
        .try_collect()
        .await
        .unwrap();
    assert_eq!(open.len(), 1);
    assert_eq!(open[0].entry.loan_id, newer.loan_id);
}

#[tokio::test]
#[ignore]
#[serial]
async fn test_uncommitted_transaction_is_rolled_back() {
    let (pool, deps) = setup(LendingPolicy::default()).await;
    let item = seed_item(deps.catalog.as_ref(), "Item", 1).await;

    let mut tx = deps.ledger_store.begin().await.unwrap();
    assert!(tx.conditional_decrement(item.item_id).await.unwrap());
    assert!(!tx.conditional_decrement(item.item_id).await.unwrap());
    tx.rollback().await.unwrap();

    assert_eq!(item_availability(&deps, item.item_id).await.unwrap(), 1);
    assert_eq!(count_open_entries(&pool).await, 0);
}

#[tokio::test]
#[ignore]
#[serial]
async fn test_catalog_against_postgres() {
    let (pool, deps) = setup(LendingPolicy {
        require_registered_borrower: false,
    })
    .await;
    let catalog = PostgresCatalog::new(pool.clone());
    let item = seed_item(&catalog, "100% Rust_Guide", 1).await;
    seed_item(&catalog, "Other", 1).await;

    let patch = ItemPatch::new(None, Some("New Author"), None, Some("Z-9")).unwrap();
    let updated = catalog
        .update_item(item.item_id, patch)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(updated.author, "New Author");
    assert_eq!(updated.shelf_location, "Z-9");
    assert_eq!(updated.title, item.title);

    // ワイルドカードは文字として扱われる
    let found = catalog
        .search_items(ItemQuery::new(Some("100%"), None, None).unwrap())
        .await
        .unwrap();
    assert_eq!(found.len(), 1);
    let found = catalog
        .search_items(ItemQuery::new(Some("%"), None, None).unwrap())
        .await
        .unwrap();
    assert_eq!(found.len(), 1);

    borrow_item(&deps, borrow_cmd(item.item_id, BorrowerId::new(), 7))
        .await
        .unwrap();
    assert_eq!(
        catalog.delete_item(item.item_id).await.unwrap(),
        ItemDeletion::InUse
    );
}
