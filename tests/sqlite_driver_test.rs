//! End-to-end tests for the SQLite dialect driver.
//!
//! These run against real SQLite databases, in memory or in a temporary directory.

use dbal::db::{DEBUG_LOG_LIMIT, DatabaseDriver, SqliteClient, TransactionState};
use dbal::models::{ConnectionConfig, DriverKind};
use dbal::DbError;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;

const CREATE_ITEMS: &str = "CREATE TABLE #__items (\
    id INTEGER PRIMARY KEY AUTOINCREMENT, \
    name VARCHAR(100) NOT NULL DEFAULT '', \
    price NUMERIC(10,2), \
    published BOOLEAN, \
    created TIMESTAMP)";

#[derive(Debug, Serialize, Deserialize, PartialEq)]
struct Item {
    id: i64,
    name: String,
    price: Option<f64>,
    published: Option<i64>,
    created: String,
}

fn memory_config() -> ConnectionConfig {
    ConnectionConfig::new(DriverKind::Sqlite)
        .with_database(":memory:")
        .with_prefix("jos_")
}

async fn memory_driver() -> DatabaseDriver {
    let mut driver = DatabaseDriver::new(memory_config());
    driver.set_query(CREATE_ITEMS);
    driver.execute().await.unwrap();
    driver
}

async fn count_items(driver: &mut DatabaseDriver) -> i64 {
    driver.set_query("SELECT COUNT(*) FROM #__items");
    driver.load_result().await.unwrap().and_then(|v| v.as_i64()).unwrap()
}

#[derive(Serialize, Deserialize)]
struct NewItem {
    id: i64,
    name: String,
    price: Option<f64>,
    published: String,
    created: String,
    _dirty: bool,
}

fn new_item(name: &str) -> NewItem {
    NewItem {
        id: 0,
        name: name.to_string(),
        price: Some(9.5),
        published: "t".to_string(),
        created: String::new(),
        _dirty: true,
    }
}

// =========================================================================
// Connection
// =========================================================================

#[tokio::test]
async fn test_connect_and_disconnect() {
    let mut driver = DatabaseDriver::new(memory_config());
    assert!(driver.is_supported());
    assert!(driver.connected().await);

    driver.disconnect().await;
    driver.disconnect().await;
}

#[tokio::test]
async fn test_missing_file_is_connect_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("missing.db");
    let mut driver = DatabaseDriver::new(
        ConnectionConfig::new(DriverKind::Sqlite).with_database(path.to_string_lossy()),
    );

    let err = driver.connect().await.unwrap_err();
    assert!(matches!(err, DbError::Connect { .. }));
    assert!(err.to_string().contains("Error connecting to sqlite database"));
    assert!(!path.exists(), "the default client must not create files");
}

#[tokio::test]
async fn test_creating_client_persists_across_reconnect() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("site.db");
    let config = ConnectionConfig::new(DriverKind::Sqlite)
        .with_database(path.to_string_lossy())
        .with_prefix("jos_");

    let mut driver = DatabaseDriver::with_client(config.clone(), Arc::new(SqliteClient::creating()));
    driver.set_query(CREATE_ITEMS);
    driver.execute().await.unwrap();
    let mut item = new_item("kept");
    assert!(driver.insert_object("#__items", &mut item, Some("id")).await.unwrap());
    driver.disconnect().await;
    assert!(path.exists());

    let mut driver = DatabaseDriver::new(config);
    assert_eq!(count_items(&mut driver).await, 1);
    assert_eq!(driver.table_list().await.unwrap(), vec!["jos_items"]);
}

// =========================================================================
// Statements
// =========================================================================

#[tokio::test]
async fn test_execute_and_fetch() {
    let mut driver = memory_driver().await;
    driver.set_query("INSERT INTO #__items (name, price) VALUES ('a', 1.5), ('b', 2), ('#__c', NULL)");
    driver.execute().await.unwrap();
    assert_eq!(driver.get_affected_rows().unwrap(), 3);

    driver.set_query("SELECT name, price FROM #__items ORDER BY id");
    let cursor = driver.execute().await.unwrap();
    assert_eq!(driver.get_num_rows(Some(cursor)).unwrap(), 3);
    assert_eq!(driver.fetch_array(None).unwrap(), Some(vec![json!("a"), json!(1.5)]));
    assert_eq!(driver.fetch_array(None).unwrap(), Some(vec![json!("b"), json!(2)]));

    let row = driver.fetch_assoc(None).unwrap().unwrap();
    assert_eq!(row.get("name"), Some(&json!("#__c")), "literals keep the token");
    assert_eq!(row.get("price"), Some(&json!(null)));
    assert_eq!(driver.fetch_assoc(None).unwrap(), None);

    driver.free_result(Some(cursor)).unwrap();
    assert!(matches!(
        driver.free_result(Some(cursor)),
        Err(DbError::InvalidCursor { .. })
    ));
}

#[tokio::test]
async fn test_execution_error_is_redacted() {
    let mut driver = memory_driver().await;
    driver.set_query("SELECT * FROM #__nothing");
    let err = driver.execute().await.unwrap_err();
    match err {
        DbError::Execution { sql, message } => {
            assert_eq!(sql, "SELECT * FROM #__nothing");
            assert!(message.contains("#__nothing"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_load_helpers() {
    let mut driver = memory_driver().await;
    driver.set_query("INSERT INTO #__items (name, price, published, created) VALUES \
                      ('a', 1.5, 1, '2024-01-01 10:00:00'), ('b', NULL, 0, '')");
    driver.execute().await.unwrap();

    driver.set_query("SELECT id, name FROM #__items ORDER BY id");
    assert_eq!(driver.load_row().await.unwrap(), Some(vec![json!(1), json!("a")]));

    driver.set_query("SELECT id, name FROM #__items ORDER BY id");
    assert_eq!(driver.load_column(1).await.unwrap(), vec![json!("a"), json!("b")]);

    driver.set_query("SELECT id, name FROM #__items WHERE id = 2");
    let row = driver.load_assoc().await.unwrap().unwrap();
    assert_eq!(row.get("name"), Some(&json!("b")));

    driver.set_query("SELECT * FROM #__items ORDER BY id");
    let items: Vec<Item> = driver.load_object_list().await.unwrap();
    assert_eq!(
        items,
        vec![
            Item {
                id: 1,
                name: "a".into(),
                price: Some(1.5),
                published: Some(1),
                created: "2024-01-01 10:00:00".into(),
            },
            Item {
                id: 2,
                name: "b".into(),
                price: None,
                published: Some(0),
                created: String::new(),
            },
        ]
    );

    driver.set_query("SELECT * FROM #__items WHERE id = 99");
    assert_eq!(driver.load_object::<Item>().await.unwrap(), None);
    driver.set_query("SELECT name FROM #__items WHERE id = 99");
    assert_eq!(driver.load_result().await.unwrap(), None);
}

#[tokio::test]
async fn test_debug_mode_logs_physical_statements() {
    let mut driver = DatabaseDriver::new(memory_config().with_debug(true));
    driver.set_query("CREATE TABLE #__log_test (id INTEGER)");
    driver.execute().await.unwrap();
    assert_eq!(driver.count(), 1);
    assert_eq!(driver.log(), ["CREATE TABLE jos_log_test (id INTEGER)"]);
}

#[tokio::test]
async fn test_debug_log_keeps_only_recent_statements() {
    let mut driver = DatabaseDriver::new(memory_config().with_debug(true));
    let total = DEBUG_LOG_LIMIT + 5;
    for n in 0..total {
        driver.set_query(format!("SELECT {} FROM (SELECT 1) AS #__t", n));
        driver.execute().await.unwrap();
    }

    assert_eq!(driver.count(), total);
    let log = driver.log();
    assert_eq!(log.len(), DEBUG_LOG_LIMIT);
    assert_eq!(log[0], "SELECT 5 FROM (SELECT 1) AS jos_t");
    assert_eq!(log[DEBUG_LOG_LIMIT - 1], format!("SELECT {} FROM (SELECT 1) AS jos_t", total - 1));

    assert_eq!(driver.take_log().len(), DEBUG_LOG_LIMIT);
    assert!(driver.log().is_empty());
}

// =========================================================================
// Single-row helpers
// =========================================================================

#[tokio::test]
async fn test_version_and_functions() {
    let mut driver = DatabaseDriver::new(memory_config());

    let version = driver.version().await.unwrap();
    assert!(version.starts_with("3."), "unexpected version {version}");
    assert!(driver.is_min_version().await.unwrap());

    assert_eq!(driver.string_position("b", "abc").await.unwrap(), 2);
    assert_eq!(driver.string_position("z", "abc").await.unwrap(), 0);

    let value = driver.random().await.unwrap();
    assert!((0.0..1.0).contains(&value));
}

// =========================================================================
// Schema introspection
// =========================================================================

#[tokio::test]
async fn test_table_list_excludes_internal_tables() {
    let mut driver = memory_driver().await;
    // AUTOINCREMENT creates sqlite_sequence.
    assert_eq!(driver.table_list().await.unwrap(), vec!["jos_items"]);
}

#[tokio::test]
async fn test_table_columns() {
    let mut driver = memory_driver().await;
    let columns = driver.table_columns("#__items").await.unwrap();

    let names: Vec<&str> = columns.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["id", "name", "price", "published", "created"]);
    assert_eq!(columns[1].type_name, "VARCHAR(100)");
    assert!(!columns[1].nullable);
    assert_eq!(columns[1].default.as_deref(), Some("''"));
    assert_eq!(columns[2].type_name, "NUMERIC(10,2)");
    assert!(columns[2].nullable);

    let types = driver.table_column_types("#__items").await.unwrap();
    assert_eq!(types.get("price"), Some("numeric"));
    assert_eq!(types.get("created"), Some("timestamp"));

    assert!(driver.table_columns("#__missing").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_table_keys() {
    let mut driver = memory_driver().await;
    driver.set_query("CREATE TABLE #__map (a INTEGER, b INTEGER, note TEXT, PRIMARY KEY (b, a))");
    driver.execute().await.unwrap();

    assert_eq!(driver.table_keys("#__items").await.unwrap(), vec!["id"]);
    assert_eq!(driver.table_keys("#__map").await.unwrap(), vec!["b", "a"]);
    assert!(driver.table_keys("#__missing").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_rename_and_create_statement() {
    let mut driver = memory_driver().await;
    driver.rename_table("#__items", "#__things").await.unwrap();
    assert_eq!(driver.table_list().await.unwrap(), vec!["jos_things"]);

    let statements = driver.table_create(&["#__things", "#__missing"]).await.unwrap();
    assert_eq!(statements.len(), 1);
    assert!(statements[0].starts_with("CREATE TABLE"));
    assert!(statements[0].contains("jos_things"));

    assert!(matches!(
        driver.table_sequences("#__things").await,
        Err(DbError::UnsupportedOperation { .. })
    ));
}

#[tokio::test]
async fn test_drop_table() {
    let mut driver = memory_driver().await;
    driver.drop_table("#__items", false).await.unwrap();
    driver.drop_table("#__items", true).await.unwrap();
    assert!(matches!(
        driver.drop_table("#__items", false).await,
        Err(DbError::Execution { .. })
    ));
    assert!(driver.table_list().await.unwrap().is_empty());

    assert!(matches!(
        driver.create_database("other").await,
        Err(DbError::UnsupportedOperation { .. })
    ));
    driver.alter_db_character_set("main").await.unwrap();
}

// =========================================================================
// Transactions
// =========================================================================

#[tokio::test]
async fn test_savepoint_rollback_keeps_outer_work() {
    let mut driver = memory_driver().await;

    driver.transaction_start(false).await.unwrap();
    driver.set_query("INSERT INTO #__items (name) VALUES ('outer')");
    driver.execute().await.unwrap();

    driver.transaction_start(true).await.unwrap();
    assert_eq!(driver.savepoints(), ["SP_1"]);
    driver.set_query("INSERT INTO #__items (name) VALUES ('inner')");
    driver.execute().await.unwrap();
    driver.transaction_rollback(true).await.unwrap();
    assert_eq!(driver.transaction_state(), TransactionState::Active);

    driver.transaction_commit(false).await.unwrap();
    assert_eq!(driver.transaction_state(), TransactionState::Committed);

    driver.set_query("SELECT name FROM #__items");
    assert_eq!(driver.load_column(0).await.unwrap(), vec![json!("outer")]);
}

#[tokio::test]
async fn test_rollback_discards_work() {
    let mut driver = memory_driver().await;

    driver.transaction_start(false).await.unwrap();
    driver.set_query("INSERT INTO #__items (name) VALUES ('gone')");
    driver.execute().await.unwrap();
    driver.transaction_savepoint("named").await.unwrap();
    driver.release_transaction_savepoint("named").await.unwrap();
    driver.transaction_rollback(false).await.unwrap();

    assert_eq!(driver.transaction_state(), TransactionState::RolledBack);
    assert_eq!(count_items(&mut driver).await, 0);
}

// =========================================================================
// Object persistence
// =========================================================================

#[tokio::test]
async fn test_insert_object_returns_generated_key() {
    let mut driver = memory_driver().await;

    let mut first = new_item("O'Neil");
    let mut second = new_item("second");
    assert!(driver.insert_object("#__items", &mut first, Some("id")).await.unwrap());
    assert!(driver.insert_object("#__items", &mut second, Some("id")).await.unwrap());
    assert_eq!(first.id, 1);
    assert_eq!(second.id, 2);

    driver.set_query("SELECT * FROM #__items WHERE id = 1");
    let stored: Item = driver.load_object().await.unwrap().unwrap();
    assert_eq!(
        stored,
        Item {
            id: 1,
            name: "O'Neil".into(),
            price: Some(9.5),
            published: Some(1),
            created: "0000-00-00 00:00:00".into(),
        }
    );
}

#[tokio::test]
async fn test_insert_object_without_key() {
    let mut driver = memory_driver().await;
    let mut item = new_item("plain");
    item.price = None;
    assert!(driver.insert_object("#__items", &mut item, None).await.unwrap());
    assert_eq!(item.id, 0);

    driver.set_query("SELECT price FROM #__items");
    assert_eq!(driver.load_result().await.unwrap(), Some(json!(null)));
}

#[tokio::test]
async fn test_update_object() {
    let mut driver = memory_driver().await;
    let mut item = new_item("before");
    driver.insert_object("#__items", &mut item, Some("id")).await.unwrap();

    item.name = "after".to_string();
    item.price = None;
    assert!(driver.update_object("#__items", &item, &["id"], false).await.unwrap());
    driver.set_query("SELECT name, price FROM #__items WHERE id = 1");
    assert_eq!(driver.load_row().await.unwrap(), Some(vec![json!("after"), json!(9.5)]));

    assert!(driver.update_object("#__items", &item, &["id"], true).await.unwrap());
    driver.set_query("SELECT price FROM #__items WHERE id = 1");
    assert_eq!(driver.load_result().await.unwrap(), Some(json!(null)));
}

#[tokio::test]
async fn test_update_object_requires_keys() {
    let mut driver = memory_driver().await;
    let item = new_item("x");
    assert!(matches!(
        driver.update_object("#__items", &item, &[], false).await,
        Err(DbError::InvalidInput { .. })
    ));
    assert!(matches!(
        driver.update_object("#__items", &item, &["uid"], false).await,
        Err(DbError::InvalidInput { .. })
    ));
}
