//! End-to-end registry tests against on-disk SQLite.
//!
//! These exercise the bundled sqlx connector: config JSON in, lazy pool
//! creation, instrumented statement execution through the handle.

use db_channels::{ChannelError, ChannelRegistry, Driver, RegistryConfig};
use serde_json::json;
use tempfile::TempDir;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("db_channels=debug")
        .with_test_writer()
        .try_init();
}

fn sqlite_config(dir: &TempDir) -> RegistryConfig {
    let db_path = dir.path().join("app.db");
    serde_json::from_value(json!({
        "default": {
            "prepare_stmt": true,
            "sqlite": { "dsn": format!("sqlite:{}", db_path.display()) },
        },
    }))
    .unwrap()
}

#[tokio::test]
async fn sqlite_channel_end_to_end() {
    init_tracing();
    let dir = TempDir::new().unwrap();
    let registry = ChannelRegistry::from_config(sqlite_config(&dir)).unwrap();

    let handle = registry.get("default").await.unwrap();
    assert_eq!(handle.driver(), Driver::Sqlite);
    assert!(handle.options().prepare_stmt);

    handle
        .execute("CREATE TABLE users (id INTEGER PRIMARY KEY, name TEXT)")
        .await
        .unwrap();
    let inserted = handle
        .execute("INSERT INTO users (name) VALUES ('ada'), ('grace')")
        .await
        .unwrap();
    assert_eq!(inserted, 2);

    let deleted = handle.execute("DELETE FROM users WHERE id = 1").await.unwrap();
    assert_eq!(deleted, 1);
}

#[tokio::test]
async fn repeated_get_returns_the_same_pool() {
    init_tracing();
    let dir = TempDir::new().unwrap();
    let registry = ChannelRegistry::from_config(sqlite_config(&dir)).unwrap();

    let first = registry.get("default").await.unwrap();
    first
        .execute("CREATE TABLE once (id INTEGER PRIMARY KEY)")
        .await
        .unwrap();

    // A second get must reuse the initialized handle: the table created
    // through the first one is visible without reconnecting.
    let second = registry.get("default").await.unwrap();
    let rows = second.execute("INSERT INTO once (id) VALUES (7)").await.unwrap();
    assert_eq!(rows, 1);
}

#[tokio::test]
async fn statement_failure_does_not_poison_the_channel() {
    init_tracing();
    let dir = TempDir::new().unwrap();
    let registry = ChannelRegistry::from_config(sqlite_config(&dir)).unwrap();

    let handle = registry.get("default").await.unwrap();
    let err = handle.execute("SELECT * FROM missing").await.unwrap_err();
    assert!(matches!(err, ChannelError::Query { .. }));

    // The channel outcome is still the successful connection.
    handle
        .execute("CREATE TABLE recovered (id INTEGER)")
        .await
        .unwrap();
}
