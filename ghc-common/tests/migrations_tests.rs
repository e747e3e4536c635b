//! Tests for the directory-based migration runner
//!
//! Covers:
//! - Lexicographic application order
//! - Idempotent re-runs with `IF NOT EXISTS` scripts
//! - Fail-fast on the first broken file, earlier files stay applied
//! - Missing directory handling

use ghc_common::db::{apply_migrations_dir, connect_options, list_migration_files, open_connection};
use ghc_common::Error;
use std::fs;
use std::path::Path;
use std::time::Duration;
use tempfile::TempDir;

fn write_file(dir: &Path, name: &str, content: &str) {
    fs::write(dir.join(name), content).expect("Should write migration file");
}

async fn table_exists(conn: &mut sqlx::SqliteConnection, name: &str) -> bool {
    sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?)",
    )
    .bind(name)
    .fetch_one(conn)
    .await
    .unwrap()
}

#[test]
fn test_files_listed_in_lexicographic_order() {
    let temp_dir = TempDir::new().unwrap();
    write_file(temp_dir.path(), "010_late.sql", "SELECT 1;");
    write_file(temp_dir.path(), "002_middle.sql", "SELECT 1;");
    write_file(temp_dir.path(), "001_first.sql", "SELECT 1;");
    write_file(temp_dir.path(), "README.md", "not a migration");

    let files = list_migration_files(temp_dir.path()).unwrap();
    let names: Vec<_> = files
        .iter()
        .map(|f| f.file_name().unwrap().to_string_lossy().to_string())
        .collect();

    assert_eq!(names, vec!["001_first.sql", "002_middle.sql", "010_late.sql"]);
}

#[tokio::test]
async fn test_migrate_twice_is_idempotent() {
    let temp_dir = TempDir::new().unwrap();
    let migrations = temp_dir.path().join("migrations");
    fs::create_dir(&migrations).unwrap();
    write_file(
        &migrations,
        "001_items.sql",
        "CREATE TABLE IF NOT EXISTS items (id INTEGER PRIMARY KEY, name TEXT NOT NULL);\n\
         CREATE INDEX IF NOT EXISTS idx_items_name ON items(name);",
    );
    write_file(
        &migrations,
        "002_seed.sql",
        "INSERT OR IGNORE INTO items (id, name) VALUES (1, 'first');",
    );

    let options = connect_options(&temp_dir.path().join("test.db"), Duration::from_secs(5));
    let mut conn = open_connection(&options).await.unwrap();

    let first = apply_migrations_dir(&mut conn, &migrations).await;
    assert!(first.is_ok(), "First run failed: {:?}", first.err());

    let second = apply_migrations_dir(&mut conn, &migrations).await;
    assert!(second.is_ok(), "Second run failed: {:?}", second.err());
    assert_eq!(second.unwrap().len(), 2);

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM items")
        .fetch_one(&mut conn)
        .await
        .unwrap();
    assert_eq!(count, 1);
}

#[tokio::test]
async fn test_migrate_fails_fast_without_rollback() {
    let temp_dir = TempDir::new().unwrap();
    write_file(temp_dir.path(), "001_ok.sql", "CREATE TABLE IF NOT EXISTS ok_table (id INTEGER);");
    write_file(temp_dir.path(), "002_broken.sql", "CREATE TABLEE broken (id INTEGER);");
    write_file(temp_dir.path(), "003_never.sql", "CREATE TABLE IF NOT EXISTS never_table (id INTEGER);");

    let options = connect_options(&temp_dir.path().join("test.db"), Duration::from_secs(5));
    let mut conn = open_connection(&options).await.unwrap();

    let result = apply_migrations_dir(&mut conn, temp_dir.path()).await;
    match result {
        Err(Error::Migration { file, .. }) => {
            assert!(file.ends_with("002_broken.sql"), "Wrong failing file: {:?}", file);
        }
        other => panic!("Expected migration error, got {:?}", other),
    }

    assert!(table_exists(&mut conn, "ok_table").await, "Earlier file should stay applied");
    assert!(!table_exists(&mut conn, "never_table").await, "Later files must not run");
}

#[tokio::test]
async fn test_missing_directory_is_not_found() {
    let temp_dir = TempDir::new().unwrap();
    let options = connect_options(&temp_dir.path().join("test.db"), Duration::from_secs(5));
    let mut conn = open_connection(&options).await.unwrap();

    let result = apply_migrations_dir(&mut conn, &temp_dir.path().join("missing")).await;
    assert!(matches!(result, Err(Error::NotFound(_))));
}
