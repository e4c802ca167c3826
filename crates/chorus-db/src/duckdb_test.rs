use super::*;

#[tokio::test]
async fn test_in_memory() {
    let db = DuckDbBackend::in_memory().unwrap();
    assert_eq!(db.db_type(), "duckdb");
}

#[tokio::test]
async fn test_new_memory_path() {
    let db = DuckDbBackend::new(":memory:").unwrap();
    db.execute("CREATE TABLE t (id INT)").await.unwrap();
    assert!(db.relation_exists("t").await.unwrap());
}

#[tokio::test]
async fn test_file_backed_database_persists() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("warehouse.duckdb");
    {
        let db = DuckDbBackend::from_path(&path).unwrap();
        db.execute_batch("CREATE TABLE t (id INT); INSERT INTO t VALUES (1), (2);")
            .await
            .unwrap();
    }
    let db = DuckDbBackend::from_path(&path).unwrap();
    assert_eq!(db.query_count("SELECT * FROM t").await.unwrap(), 2);
}

#[tokio::test]
async fn test_execute_returns_affected_rows() {
    let db = DuckDbBackend::in_memory().unwrap();
    db.execute("CREATE TABLE t (id INT)").await.unwrap();
    let affected = db
        .execute("INSERT INTO t VALUES (1), (2), (3)")
        .await
        .unwrap();
    assert_eq!(affected, 3);
}

#[tokio::test]
async fn test_query_count() {
    let db = DuckDbBackend::in_memory().unwrap();
    db.execute_batch("CREATE TABLE nums AS SELECT * FROM range(10) t(n)")
        .await
        .unwrap();

    let count = db.query_count("SELECT * FROM nums").await.unwrap();
    assert_eq!(count, 10);
}

#[tokio::test]
async fn test_query_one() {
    let db = DuckDbBackend::in_memory().unwrap();
    db.execute_batch(
        "CREATE TABLE users (id INT, level VARCHAR);
         INSERT INTO users VALUES (7, 'paid'), (8, NULL);",
    )
    .await
    .unwrap();

    assert_eq!(
        db.query_one("SELECT level FROM users WHERE id = 7")
            .await
            .unwrap(),
        Some("paid".to_string())
    );
    assert_eq!(
        db.query_one("SELECT id FROM users WHERE id = 7").await.unwrap(),
        Some("7".to_string())
    );
    assert_eq!(
        db.query_one("SELECT level FROM users WHERE id = 8")
            .await
            .unwrap(),
        None
    );
    assert_eq!(
        db.query_one("SELECT level FROM users WHERE id = 99")
            .await
            .unwrap(),
        None
    );
}

#[tokio::test]
async fn test_query_sample_rows() {
    let db = DuckDbBackend::in_memory().unwrap();
    db.execute_batch("CREATE TABLE t AS SELECT * FROM range(10) r(n)")
        .await
        .unwrap();

    let rows = db.query_sample_rows("SELECT n FROM t", 3).await.unwrap();
    assert_eq!(rows.len(), 3);
}

#[tokio::test]
async fn test_relation_exists_with_schema() {
    let db = DuckDbBackend::in_memory().unwrap();
    db.create_schema_if_not_exists("analytics").await.unwrap();
    db.execute("CREATE TABLE analytics.songs (id INT)")
        .await
        .unwrap();

    assert!(db.relation_exists("analytics.songs").await.unwrap());
    assert!(!db.relation_exists("songs").await.unwrap());

    // Creating the same schema again should not fail
    db.create_schema_if_not_exists("analytics").await.unwrap();
}

#[tokio::test]
async fn test_drop_if_exists() {
    let db = DuckDbBackend::in_memory().unwrap();
    db.execute("CREATE TABLE to_drop (id INT)").await.unwrap();
    db.execute("CREATE VIEW view_to_drop AS SELECT 1 AS id")
        .await
        .unwrap();

    db.drop_if_exists("to_drop").await.unwrap();
    db.drop_if_exists("view_to_drop").await.unwrap();
    db.drop_if_exists("never_existed").await.unwrap();

    assert!(!db.relation_exists("to_drop").await.unwrap());
    assert!(!db.relation_exists("view_to_drop").await.unwrap());
}

#[tokio::test]
async fn test_missing_table_is_classified() {
    let db = DuckDbBackend::in_memory().unwrap();
    let err = db.execute("INSERT INTO missing VALUES (1)").await.unwrap_err();
    assert!(matches!(err, DbError::TableNotFound(_)), "{err}");
}

#[tokio::test]
async fn test_primary_key_violation_is_classified() {
    let db = DuckDbBackend::in_memory().unwrap();
    db.execute_batch("CREATE TABLE t (id INT PRIMARY KEY); INSERT INTO t VALUES (1);")
        .await
        .unwrap();
    let err = db.execute("INSERT INTO t VALUES (1)").await.unwrap_err();
    assert!(matches!(err, DbError::ConstraintViolation(_)), "{err}");
}

#[tokio::test]
async fn test_load_json_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("events.json");
    std::fs::write(
        &path,
        "{\"page\":\"NextSong\",\"ts\":1}\n{\"page\":\"Home\",\"ts\":2}\n",
    )
    .unwrap();

    let db = DuckDbBackend::in_memory().unwrap();
    db.load_file("staging_events", &path.display().to_string(), SourceFormat::Json)
        .await
        .unwrap();

    assert_eq!(
        db.query_count("SELECT * FROM staging_events").await.unwrap(),
        2
    );
}

#[tokio::test]
async fn test_load_missing_file_is_load_error() {
    let db = DuckDbBackend::in_memory().unwrap();
    let err = db
        .load_file("staging", "/nonexistent/chorus/*.csv", SourceFormat::Csv)
        .await
        .unwrap_err();
    assert!(matches!(err, DbError::LoadError { .. }));
}

#[test]
fn test_truncate_for_log() {
    let long = "x".repeat(1000);
    assert_eq!(truncate_for_log(&long).len(), 240);
    assert_eq!(truncate_for_log("SELECT 1"), "SELECT 1");
}
