use super::*;
use chorus_db::DuckDbBackend;

#[test]
fn test_documented_policies() {
    let tables = StarTables::default();
    assert_eq!(tables.get(Stage::Songs).policy, ConflictPolicy::UpsertKeepFirst);
    assert_eq!(tables.get(Stage::Artists).policy, ConflictPolicy::UpsertKeepFirst);
    assert_eq!(tables.get(Stage::Time).policy, ConflictPolicy::UpsertKeepFirst);
    assert_eq!(tables.get(Stage::Dates).policy, ConflictPolicy::UpsertKeepFirst);
    assert_eq!(tables.get(Stage::Users).policy, ConflictPolicy::UpsertOverwrite);
    assert_eq!(tables.get(Stage::Songplays).policy, ConflictPolicy::AppendOnly);
}

#[test]
fn test_get_returns_table_of_stage() {
    let tables = StarTables::default();
    for stage in Stage::ALL {
        let table = tables.get(stage);
        assert_eq!(table.stage, stage);
        assert_eq!(table.name, stage.as_str());
    }
}

#[test]
fn test_schema_qualification() {
    let tables = StarTables::new(Some("analytics"));
    assert_eq!(tables.schema(), Some("analytics"));
    assert_eq!(tables.get(Stage::Time).name, "analytics.time");
    assert_eq!(tables.sequence_name(), "analytics.songplay_id_seq");

    let sql = tables.get(Stage::Songplays).create_sql();
    assert!(sql.contains(r#"CREATE TABLE IF NOT EXISTS "analytics"."songplays""#));
    assert!(sql.contains("DEFAULT nextval('analytics.songplay_id_seq')"));
}

#[test]
fn test_empty_schema_is_unqualified() {
    let tables = StarTables::new(Some(""));
    assert_eq!(tables.schema(), None);
    assert_eq!(tables.get(Stage::Users).name, "users");
}

#[test]
fn test_surrogate_key_not_inserted() {
    let tables = StarTables::default();
    let facts = tables.get(Stage::Songplays);
    let names: Vec<&str> = facts.insert_columns().iter().map(|c| c.name).collect();
    assert!(!names.contains(&"songplay_id"));
    assert_eq!(names.len(), 11);
    assert_eq!(names.last(), Some(&"date_key"));
}

#[test]
fn test_update_columns_exclude_key() {
    let tables = StarTables::default();
    let names: Vec<&str> = tables
        .get(Stage::Users)
        .update_columns()
        .iter()
        .map(|c| c.name)
        .collect();
    assert_eq!(
        names,
        vec!["first_name", "last_name", "gender", "level", "last_seen"]
    );
}

#[test]
fn test_only_users_carry_recency_guard() {
    let tables = StarTables::default();
    for table in tables.iter() {
        let expected = (table.stage == Stage::Users).then_some("last_seen");
        assert_eq!(table.recency, expected, "{}", table.name);
    }
}

#[tokio::test]
async fn test_create_schema_is_idempotent() {
    let db = DuckDbBackend::in_memory().unwrap();
    let tables = StarTables::new(Some("analytics"));

    create_schema(&db, &tables).await.unwrap();
    create_schema(&db, &tables).await.unwrap();

    for table in tables.iter() {
        assert!(db.relation_exists(&table.name).await.unwrap(), "{}", table.name);
    }
}

#[tokio::test]
async fn test_drop_schema_removes_tables_and_sequence() {
    let db = DuckDbBackend::in_memory().unwrap();
    let tables = StarTables::default();

    create_schema(&db, &tables).await.unwrap();
    drop_schema(&db, &tables).await.unwrap();

    for table in tables.iter() {
        assert!(!db.relation_exists(&table.name).await.unwrap());
    }
    // Dropping again is a no-op
    drop_schema(&db, &tables).await.unwrap();
    // And the sequence can be recreated
    create_schema(&db, &tables).await.unwrap();
}

#[tokio::test]
async fn test_truncate_facts_only_touches_songplays() {
    let db = DuckDbBackend::in_memory().unwrap();
    let tables = StarTables::default();
    create_schema(&db, &tables).await.unwrap();

    db.execute_batch(
        "INSERT INTO users (user_id, level, last_seen)
             VALUES (7, 'paid', TIMESTAMP '2018-11-01 21:01:46.796');
         INSERT INTO songplays (start_time, user_id) VALUES
             (TIMESTAMP '2018-11-01 21:01:46.796', 7),
             (TIMESTAMP '2018-11-01 21:05:52.796', 7);",
    )
    .await
    .unwrap();

    let deleted = truncate_facts(&db, &tables).await.unwrap();
    assert_eq!(deleted, 2);
    assert_eq!(db.query_count("SELECT * FROM songplays").await.unwrap(), 0);
    assert_eq!(db.query_count("SELECT * FROM users").await.unwrap(), 1);
}

#[tokio::test]
async fn test_songplay_ids_come_from_sequence() {
    let db = DuckDbBackend::in_memory().unwrap();
    let tables = StarTables::default();
    create_schema(&db, &tables).await.unwrap();

    db.execute(
        "INSERT INTO songplays (start_time) VALUES
             (TIMESTAMP '2018-11-01 00:00:00'), (TIMESTAMP '2018-11-01 00:00:00')",
    )
    .await
    .unwrap();

    assert_eq!(
        db.query_one("SELECT MAX(songplay_id) FROM songplays")
            .await
            .unwrap(),
        Some("2".to_string())
    );
}
