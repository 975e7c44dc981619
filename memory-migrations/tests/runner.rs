//! Integration tests against a real Postgres instance. Skipped unless
//! `TEST_DATABASE_URL` is set, mirroring the rest of the workspace's
//! policy of not requiring a live database for `cargo test` by default.

use std::env;

use memory_migrations::core_runner;
use sqlx::postgres::PgPoolOptions;

async fn test_pool() -> Option<sqlx::PgPool> {
    let url = env::var("TEST_DATABASE_URL").ok()?;
    Some(PgPoolOptions::new().max_connections(5).connect(&url).await.expect("connect"))
}

#[tokio::test]
async fn full_run_is_idempotent() {
    // P5
    let Some(pool) = test_pool().await else { return };

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS memories ( \
            id UUID PRIMARY KEY, \
            content TEXT NOT NULL, \
            is_encrypted BOOLEAN NOT NULL DEFAULT false \
         )",
    )
    .execute(&pool)
    .await
    .unwrap();

    let mut runner = core_runner(pool.clone(), None);
    let first = runner.run().await.unwrap();
    assert_eq!(first, vec![1, 2]);

    let mut runner2 = core_runner(pool.clone(), None);
    let second = runner2.run().await.unwrap();
    assert!(second.is_empty());

    let records = runner2.applied_records().await.unwrap();
    assert_eq!(records.len(), 2);
}

#[tokio::test]
async fn v2_is_noop_without_encryption_configured() {
    let Some(pool) = test_pool().await else { return };

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS memories ( \
            id UUID PRIMARY KEY, \
            content TEXT NOT NULL, \
            is_encrypted BOOLEAN NOT NULL DEFAULT false \
         )",
    )
    .execute(&pool)
    .await
    .unwrap();

    let id = uuid::Uuid::new_v4();
    sqlx::query("INSERT INTO memories (id, content) VALUES ($1, 'plain text')")
        .bind(id)
        .execute(&pool)
        .await
        .unwrap();

    let mut runner = core_runner(pool.clone(), None);
    runner.run().await.unwrap();

    let row: (bool, String) =
        sqlx::query_as("SELECT is_encrypted, content FROM memories WHERE id = $1")
            .bind(id)
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!(row, (false, "plain text".to_string()));
}
