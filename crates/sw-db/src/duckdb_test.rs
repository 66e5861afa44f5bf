use super::*;

#[tokio::test]
async fn test_in_memory() {
    let db = DuckDbBackend::in_memory().unwrap();
    assert!(!db.relation_exists("anything").unwrap());
}

#[tokio::test]
async fn test_execute_returns_affected_rows() {
    let db = DuckDbBackend::in_memory().unwrap();
    db.execute("CREATE TABLE foo (value INT)").await.unwrap();

    let inserted = db
        .execute("INSERT INTO foo SELECT * FROM range(1, 11);")
        .await
        .unwrap();
    assert_eq!(inserted, 10);

    let updated = db
        .execute("UPDATE foo SET value = value * 10 WHERE value <= 3")
        .await
        .unwrap();
    assert_eq!(updated, 3);

    let deleted = db.execute("DELETE FROM foo WHERE value > 5").await.unwrap();
    assert_eq!(deleted, 8);
}

#[tokio::test]
async fn test_execute_with_comments() {
    let db = DuckDbBackend::in_memory().unwrap();
    db.execute("\n-- create a table\nCREATE TABLE t (id INT);")
        .await
        .unwrap();
    assert!(db.relation_exists("t").unwrap());
}

#[tokio::test]
async fn test_execute_error_carries_message() {
    let db = DuckDbBackend::in_memory().unwrap();
    let err = db.execute("SELECT * FROM missing_table").await.unwrap_err();
    match err {
        DbError::ExecutionError(msg) => assert!(msg.contains("missing_table")),
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn test_execute_batch() {
    let db = DuckDbBackend::in_memory().unwrap();
    db.execute_batch(
        "CREATE TABLE t1 (id INT); CREATE TABLE t2 (id INT); INSERT INTO t1 VALUES (1);",
    )
    .unwrap();

    assert!(db.relation_exists("t1").unwrap());
    assert!(db.relation_exists("t2").unwrap());
    assert_eq!(db.query_count("SELECT * FROM t1").unwrap(), 1);
}

#[tokio::test]
async fn test_relation_exists_schema_qualified() {
    let db = DuckDbBackend::in_memory().unwrap();
    db.execute_batch("CREATE SCHEMA app; CREATE TABLE app.things (id INT);")
        .unwrap();

    assert!(db.relation_exists("app.things").unwrap());
    assert!(!db.relation_exists("things").unwrap());
    assert!(!db.relation_exists("nonexistent").unwrap());
}

#[tokio::test]
async fn test_commit() {
    let db = DuckDbBackend::in_memory().unwrap();
    db.execute("CREATE TABLE t (id INT)").await.unwrap();

    db.begin().await.unwrap();
    db.execute("INSERT INTO t VALUES (1)").await.unwrap();
    db.commit().await.unwrap();

    assert_eq!(db.query_count("SELECT * FROM t").unwrap(), 1);
}

#[tokio::test]
async fn test_rollback() {
    let db = DuckDbBackend::in_memory().unwrap();
    db.execute("CREATE TABLE t (id INT)").await.unwrap();

    db.begin().await.unwrap();
    db.execute("INSERT INTO t VALUES (1)").await.unwrap();
    db.execute("CREATE TABLE other (id INT)").await.unwrap();
    db.rollback().await.unwrap();

    assert_eq!(db.query_count("SELECT * FROM t").unwrap(), 0);
    assert!(!db.relation_exists("other").unwrap());
}

#[tokio::test]
async fn test_commit_without_transaction_fails() {
    let db = DuckDbBackend::in_memory().unwrap();
    assert!(matches!(
        db.commit().await,
        Err(DbError::TransactionError(_))
    ));
}

#[tokio::test]
async fn test_from_path_persists() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("test.duckdb");

    {
        let db = DuckDbBackend::from_path(&path).unwrap();
        db.execute("CREATE TABLE kept (id INT)").await.unwrap();
    }

    let db = DuckDbBackend::new(path.to_str().unwrap()).unwrap();
    assert!(db.relation_exists("kept").unwrap());
}
