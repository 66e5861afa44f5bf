use super::*;
use std::fs;
use std::path::PathBuf;
use sw_db::Ledger;
use tempfile::TempDir;

fn write(root: &std::path::Path, rel: &str, content: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

fn migrations_tree() -> TempDir {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    write(
        root,
        "schemas/schema_1.0.sql",
        "CREATE TABLE items (id INTEGER, label VARCHAR);\n",
    );
    write(
        root,
        "1.0/0001.ddl.sql",
        "CREATE TABLE items (id INTEGER, label VARCHAR);\n",
    );
    write(
        root,
        "1.1/0001.dml.sql",
        "INSERT INTO items VALUES (1, 'a'), (2, 'b');\n",
    );
    dir
}

#[test]
fn test_load_settings_layers() {
    let dir = TempDir::new().unwrap();
    let config = dir.path().join("stepwise.yml");
    fs::write(
        &config,
        "database: from_file.duckdb\ntable: file_ledger\nmigrations_root: ./migrations\n",
    )
    .unwrap();

    let args = GlobalArgs {
        config_file: Some(config),
        table: Some("flag_ledger".to_string()),
        ..Default::default()
    };
    let settings = load_settings(&args).unwrap();

    assert_eq!(settings.database, "from_file.duckdb");
    assert_eq!(settings.table, "flag_ledger");
    assert_eq!(settings.migrations_root, PathBuf::from("./migrations"));
}

#[test]
fn test_load_settings_missing_config_file() {
    let dir = TempDir::new().unwrap();
    let args = GlobalArgs {
        config_file: Some(dir.path().join("missing.yml")),
        ..Default::default()
    };
    assert!(load_settings(&args).is_err());
}

#[test]
fn test_load_settings_rejects_invalid_flag() {
    let dir = TempDir::new().unwrap();
    let config = dir.path().join("stepwise.yml");
    fs::write(&config, "").unwrap();

    let args = GlobalArgs {
        config_file: Some(config),
        block_marker: Some("--bad:marker".to_string()),
        ..Default::default()
    };
    let err = load_settings(&args).unwrap_err();
    assert!(format!("{:#}", err).contains("Invalid configuration"));
}

#[tokio::test]
async fn test_runtime_context_migrates() {
    let tree = migrations_tree();
    let settings = Settings {
        database: ":memory:".to_string(),
        migrations_root: tree.path().to_path_buf(),
        ..Default::default()
    };

    let ctx = RuntimeContext::from_settings(settings, true).unwrap();
    let summary = ctx.migrator().migrate().await.unwrap();

    assert_eq!(summary.schema_version.unwrap().as_str(), "1.0");
    assert_eq!(summary.applied, 1);
    assert_eq!(summary.affected_rows, 2);
    assert_eq!(ctx.ledger.current_version().await.unwrap().unwrap().as_str(), "1.1");
}

#[tokio::test]
async fn test_runtime_context_postgres_splitter() {
    let tree = migrations_tree();
    let settings = Settings {
        database: ":memory:".to_string(),
        migrations_root: tree.path().to_path_buf(),
        dialect: Dialect::Postgres,
        ..Default::default()
    };

    let ctx = RuntimeContext::from_settings(settings, true).unwrap();
    assert_eq!(ctx.splitter.dialect_name(), "postgres");
}
