use super::*;
use chorus_db::DuckDbBackend;

#[tokio::test]
async fn test_unique_pass() {
    let db = DuckDbBackend::in_memory().unwrap();
    db.execute_batch("CREATE TABLE users (user_id INT); INSERT INTO users VALUES (1), (2), (3);")
        .await
        .unwrap();

    let runner = CheckRunner::new(&db);
    let result = runner.run_check(&Check::unique("users", "user_id")).await;

    assert!(result.passed);
    assert_eq!(result.failure_count, 0);
}

#[tokio::test]
async fn test_unique_fail() {
    let db = DuckDbBackend::in_memory().unwrap();
    db.execute_batch("CREATE TABLE users (user_id INT); INSERT INTO users VALUES (1), (1), (2);")
        .await
        .unwrap();

    let runner = CheckRunner::new(&db);
    let result = runner.run_check(&Check::unique("users", "user_id")).await;

    assert!(!result.passed);
    assert_eq!(result.failure_count, 1); // One duplicated value
    assert!(!result.sample_failures.is_empty());
}

#[tokio::test]
async fn test_not_null_fail() {
    let db = DuckDbBackend::in_memory().unwrap();
    db.execute_batch(
        "CREATE TABLE songplays (start_time TIMESTAMP); INSERT INTO songplays VALUES (NULL), (TIMESTAMP '2018-11-01 00:00:00');",
    )
    .await
    .unwrap();

    let runner = CheckRunner::new(&db);
    let result = runner
        .run_check(&Check::not_null("songplays", "start_time"))
        .await;

    assert!(!result.passed);
    assert_eq!(result.failure_count, 1);
}

#[tokio::test]
async fn test_not_empty() {
    let db = DuckDbBackend::in_memory().unwrap();
    db.execute("CREATE TABLE songs (song_id VARCHAR)")
        .await
        .unwrap();
    let runner = CheckRunner::new(&db);

    let result = runner.run_check(&Check::not_empty("songs")).await;
    assert!(!result.passed);
    assert_eq!(result.failure_count, 1);

    db.execute("INSERT INTO songs VALUES ('S1')").await.unwrap();
    let result = runner.run_check(&Check::not_empty("songs")).await;
    assert!(result.passed);
}

#[tokio::test]
async fn test_missing_table_is_error_not_panic() {
    let db = DuckDbBackend::in_memory().unwrap();
    let runner = CheckRunner::new(&db);
    let result = runner.run_check(&Check::not_empty("nonexistent")).await;

    assert!(!result.passed);
    assert!(result.error.is_some());
}

#[tokio::test]
async fn test_run_all_summary() {
    let db = DuckDbBackend::in_memory().unwrap();
    db.execute_batch("CREATE TABLE users (user_id INT); INSERT INTO users VALUES (1), (1);")
        .await
        .unwrap();
    let checks = vec![
        Check::not_empty("users"),
        Check::unique("users", "user_id"),
        Check::not_empty("missing"),
    ];

    let (results, summary) = CheckRunner::new(&db).run_all(&checks).await;

    assert_eq!(results.len(), 3);
    assert_eq!(summary.total, 3);
    assert_eq!(summary.passed, 1);
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.errors, 1);
    assert!(!summary.all_passed());
}

#[tokio::test]
async fn test_fail_fast_stops_at_first_failure() {
    let db = DuckDbBackend::in_memory().unwrap();
    db.execute("CREATE TABLE songs (song_id VARCHAR)")
        .await
        .unwrap();
    let checks = vec![
        Check::not_empty("songs"),
        Check::unique("songs", "song_id"),
    ];

    let (results, summary) = CheckRunner::new(&db)
        .fail_fast(true)
        .run_all(&checks)
        .await;

    assert_eq!(results.len(), 1);
    assert_eq!(summary.failed, 1);
}
