use super::*;

fn v(s: &str) -> Version {
    Version::from_string(s).unwrap()
}

#[test]
fn test_defaults() {
    let settings = Settings::default();
    assert_eq!(settings.table, "stepwise_migrations");
    assert_eq!(settings.schema_template, "schema_{}.sql");
    assert_eq!(settings.fixtures_template, "fixtures_{}.sql");
    assert_eq!(
        settings.non_transactional_keywords,
        vec!["CONCURRENTLY", "ALTER TYPE", "VACUUM"]
    );
    assert!(settings.create_table);
    assert!(!settings.ignore_symlinks);
    assert!(settings.target_version.is_none());
    settings.validate().unwrap();
}

#[test]
fn test_parse_yaml_layer() {
    let yaml = r#"
database: ./app.duckdb
table: app_migrations
migrations_root: ./migrations
target_version: "1.2"
schema_version: latest
non_transactional_keywords:
  - CONCURRENTLY
before_schema_files:
  - extensions.sql
dialect: postgres
"#;
    let layer = PartialSettings::parse(yaml, Path::new("stepwise.yml")).unwrap();
    let settings = Settings::from_layers([layer]).unwrap();

    assert_eq!(settings.database, "./app.duckdb");
    assert_eq!(settings.table, "app_migrations");
    assert_eq!(settings.migrations_root, PathBuf::from("./migrations"));
    assert_eq!(settings.target_version, Some(v("1.2")));
    assert_eq!(settings.schema_version, None);
    assert_eq!(settings.non_transactional_keywords, vec!["CONCURRENTLY"]);
    assert_eq!(settings.before_schema_files, vec!["extensions.sql"]);
    assert_eq!(settings.dialect, Dialect::Postgres);
}

#[test]
fn test_unknown_yaml_field_rejected() {
    let result = PartialSettings::parse("tabel: typo\n", Path::new("stepwise.yml"));
    assert!(matches!(result, Err(CoreError::ConfigParseError { .. })));
}

#[test]
fn test_empty_yaml_is_empty_layer() {
    let layer = PartialSettings::parse("\n  \n", Path::new("stepwise.yml")).unwrap();
    assert_eq!(layer, PartialSettings::default());
}

#[test]
fn test_later_layers_win() {
    let file = PartialSettings {
        table: Some("from_file".to_string()),
        database: Some("file.duckdb".to_string()),
        ..Default::default()
    };
    let cli = PartialSettings {
        table: Some("from_cli".to_string()),
        ..Default::default()
    };
    let settings = Settings::from_layers([file, cli]).unwrap();
    assert_eq!(settings.table, "from_cli");
    assert_eq!(settings.database, "file.duckdb");
}

#[test]
fn test_invalid_version_setting() {
    let layer = PartialSettings {
        target_version: Some("one.two".to_string()),
        ..Default::default()
    };
    let result = Settings::from_layers([layer]);
    assert!(matches!(
        result,
        Err(CoreError::InvalidSetting {
            field: "target_version",
            ..
        })
    ));
}

#[test]
fn test_schema_version_more_recent_than_target() {
    let layer = PartialSettings {
        target_version: Some("1.1".to_string()),
        schema_version: Some("1.2".to_string()),
        ..Default::default()
    };
    let result = Settings::from_layers([layer]);
    assert!(matches!(
        result,
        Err(CoreError::InvalidSetting {
            field: "schema_version",
            ..
        })
    ));
}

#[test]
fn test_validator_table_covers_identifiers() {
    let mut settings = Settings::default();
    settings.table = "public.migrations".to_string();
    settings.validate().unwrap();

    settings.table = "bad-name".to_string();
    assert!(matches!(
        settings.validate(),
        Err(CoreError::InvalidSetting { field: "table", .. })
    ));

    let mut settings = Settings::default();
    settings.name_column = "1name".to_string();
    assert!(matches!(
        settings.validate(),
        Err(CoreError::InvalidSetting {
            field: "name_column",
            ..
        })
    ));
}

#[test]
fn test_template_requires_placeholder() {
    let mut settings = Settings::default();
    settings.schema_template = "schema.sql".to_string();
    assert!(matches!(
        settings.validate(),
        Err(CoreError::InvalidSetting {
            field: "schema_template",
            ..
        })
    ));
}

#[test]
fn test_block_marker_rejects_colon() {
    let mut settings = Settings::default();
    settings.block_marker = "--meta:".to_string();
    assert!(settings.validate().is_err());
}

#[test]
fn test_render_template() {
    assert_eq!(render_template("schema_{}.sql", &v("1.02")), "schema_1.02.sql");
    assert_eq!(
        render_template("fixtures_{version}.sql", &v("16.12")),
        "fixtures_16.12.sql"
    );

    let settings = Settings::default();
    assert_eq!(settings.schema_file_name(&v("2.0")), "schema_2.0.sql");
    assert_eq!(settings.fixtures_file_name(&v("2.0")), "fixtures_2.0.sql");
}

#[test]
fn test_discover_explicit_missing() {
    let result = PartialSettings::discover(Some(Path::new("/nonexistent/stepwise.yml")));
    assert!(matches!(result, Err(CoreError::ConfigNotFound { .. })));
}

#[test]
fn test_load_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("stepwise.yml");
    std::fs::write(&path, "table: from_disk\ncreate_table: false\n").unwrap();

    let found = PartialSettings::discover(Some(&path)).unwrap();
    assert_eq!(found, Some(path.clone()));

    let layer = PartialSettings::load(&path).unwrap();
    assert_eq!(layer.table.as_deref(), Some("from_disk"));
    assert_eq!(layer.create_table, Some(false));
}

#[test]
fn test_log_level() {
    assert_eq!(log_level(0), log::LevelFilter::Error);
    assert_eq!(log_level(1), log::LevelFilter::Warn);
    assert_eq!(log_level(2), log::LevelFilter::Info);
    assert_eq!(log_level(3), log::LevelFilter::Debug);
    assert_eq!(log_level(9), log::LevelFilter::Debug);
}
