// ABOUTME: Tests for the TransactionGuard RAII wrapper on the recipe schema
// ABOUTME: Validates auto-rollback, explicit rollback, commit semantics, and foreign key enforcement
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence
#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

use recipe_book::database::transactions::SqliteTransactionGuard;
use recipe_book::database::Database;
use sqlx::{Row, SqlitePool};

async fn create_test_pool() -> SqlitePool {
    Database::new_in_memory()
        .await
        .expect("Failed to create in-memory database")
        .pool()
        .clone()
}

async fn count_recipes(pool: &SqlitePool) -> i64 {
    sqlx::query("SELECT COUNT(*) AS count FROM recipes")
        .fetch_one(pool)
        .await
        .expect("Failed to count recipes")
        .get("count")
}

const INSERT_RECIPE: &str = "INSERT INTO recipes (name, category, servings, created_at, updated_at) \
     VALUES ($1, 'Test', 2, '2025-01-01T00:00:00Z', '2025-01-01T00:00:00Z')";

#[tokio::test]
async fn test_transaction_guard_commit_persists_changes() {
    let pool = create_test_pool().await;

    let tx = pool.begin().await.expect("Failed to begin transaction");
    let mut guard = SqliteTransactionGuard::new(tx);
    assert!(!guard.is_committed());

    sqlx::query(INSERT_RECIPE)
        .bind("Bread")
        .execute(guard.executor().expect("Guard should have executor"))
        .await
        .expect("Failed to insert");

    guard.commit().await.expect("Commit should succeed");
    assert_eq!(count_recipes(&pool).await, 1);
}

#[tokio::test]
async fn test_transaction_guard_drop_without_commit_rolls_back() {
    let pool = create_test_pool().await;

    {
        let tx = pool.begin().await.expect("Failed to begin transaction");
        let mut guard = SqliteTransactionGuard::new(tx);

        sqlx::query(INSERT_RECIPE)
            .bind("Dropped")
            .execute(guard.executor().expect("Guard should have executor"))
            .await
            .expect("Failed to insert");
    }

    assert_eq!(count_recipes(&pool).await, 0);
}

#[tokio::test]
async fn test_transaction_guard_explicit_rollback() {
    let pool = create_test_pool().await;

    let tx = pool.begin().await.expect("Failed to begin transaction");
    let mut guard = SqliteTransactionGuard::new(tx);

    sqlx::query(INSERT_RECIPE)
        .bind("Rolled back")
        .execute(guard.executor().expect("Guard should have executor"))
        .await
        .expect("Failed to insert");

    guard.rollback().await.expect("Rollback should succeed");
    assert_eq!(count_recipes(&pool).await, 0);
}

#[tokio::test]
async fn test_error_mid_transaction_leaves_nothing_behind() {
    let pool = create_test_pool().await;

    {
        let tx = pool.begin().await.expect("Failed to begin transaction");
        let mut guard = SqliteTransactionGuard::new(tx);

        sqlx::query(INSERT_RECIPE)
            .bind("Parent")
            .execute(guard.executor().unwrap())
            .await
            .unwrap();

        // Chapter pointing at a recipe that does not exist
        let result = sqlx::query(
            "INSERT INTO chapters (recipe_id, name, order_number) VALUES (9999, 'Orphan', 1)",
        )
        .execute(guard.executor().unwrap())
        .await;
        assert!(result.is_err(), "foreign keys must be enforced");
    }

    assert_eq!(count_recipes(&pool).await, 0);
}

#[tokio::test]
async fn test_deleting_recipe_cascades_through_tree() {
    let pool = create_test_pool().await;

    let tx = pool.begin().await.unwrap();
    let mut guard = SqliteTransactionGuard::new(tx);
    let recipe_id = sqlx::query(INSERT_RECIPE)
        .bind("Stew")
        .execute(guard.executor().unwrap())
        .await
        .unwrap()
        .last_insert_rowid();
    let chapter_id = sqlx::query(
        "INSERT INTO chapters (recipe_id, name, order_number) VALUES ($1, 'Main', 1)",
    )
    .bind(recipe_id)
    .execute(guard.executor().unwrap())
    .await
    .unwrap()
    .last_insert_rowid();
    let step_id = sqlx::query(
        "INSERT INTO steps (chapter_id, description, order_number) VALUES ($1, 'Simmer', 1)",
    )
    .bind(chapter_id)
    .execute(guard.executor().unwrap())
    .await
    .unwrap()
    .last_insert_rowid();
    sqlx::query("INSERT INTO ingredients (step_id, name, order_number) VALUES ($1, 'beef', 1)")
        .bind(step_id)
        .execute(guard.executor().unwrap())
        .await
        .unwrap();
    guard.commit().await.unwrap();

    sqlx::query("DELETE FROM recipes WHERE id = $1")
        .bind(recipe_id)
        .execute(&pool)
        .await
        .unwrap();

    for table in ["chapters", "steps", "ingredients"] {
        let remaining: i64 = sqlx::query(&format!("SELECT COUNT(*) AS count FROM {table}"))
            .fetch_one(&pool)
            .await
            .unwrap()
            .get("count");
        assert_eq!(remaining, 0, "{table} rows survived the cascade");
    }
}
