use super::*;

#[tokio::test]
async fn health_check_succeeds_for_live_pool() {
    let storage = Storage::in_memory().await.expect("db");
    storage.health_check().await.expect("health check");
}

#[tokio::test]
async fn set_get_overwrite_and_remove() {
    let storage = Storage::in_memory().await.expect("db");
    assert!(storage.get_item("missing").await.expect("get").is_none());

    storage.set_item("k", "one").await.expect("set");
    storage.set_item("k", "two").await.expect("overwrite");
    assert_eq!(
        storage.get_item("k").await.expect("get").as_deref(),
        Some("two")
    );

    storage.remove_item("k").await.expect("remove");
    storage.remove_item("k").await.expect("remove twice");
    assert!(storage.get_item("k").await.expect("get").is_none());
}

#[tokio::test]
async fn keys_are_listed_in_order_and_cleared() {
    let storage = Storage::in_memory().await.expect("db");
    storage.set_item("b", "2").await.expect("set");
    storage.set_item("a", "1").await.expect("set");
    assert_eq!(storage.keys().await.expect("keys"), vec!["a", "b"]);

    storage.clear().await.expect("clear");
    assert!(storage.keys().await.expect("keys").is_empty());
}

#[tokio::test]
async fn creates_database_file_when_missing() {
    let temp_root = tempfile::tempdir().expect("tempdir");
    let db_path = temp_root.path().join("nested").join("local.db");
    let database_url = format!("sqlite://{}", db_path.to_string_lossy().replace('\\', "/"));

    let storage = Storage::new(&database_url).await.expect("db");
    storage.set_item("k", "v").await.expect("set");
    drop(storage);

    assert!(
        db_path.exists(),
        "database file should exist: {}",
        db_path.display()
    );
}

#[test]
fn in_memory_and_non_sqlite_urls_have_no_path() {
    assert!(sqlite_path(IN_MEMORY_URL).is_none());
    assert!(sqlite_path("postgres://localhost/db").is_none());
    assert_eq!(
        sqlite_path("sqlite://./data/local.db?mode=rwc"),
        Some(PathBuf::from("./data/local.db"))
    );
}
