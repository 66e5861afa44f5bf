use super::*;

fn texts(statements: &[SqlStatement]) -> Vec<&str> {
    statements.iter().map(|s| s.text.as_str()).collect()
}

fn split(sql: &str) -> Vec<SqlStatement> {
    let statements = TokenSplitter::duckdb().split(sql).unwrap();
    verify_round_trip(sql, &statements).unwrap();
    statements
}

#[test]
fn test_split_two_statements() {
    let statements = split("select 1; select 2;");
    assert_eq!(texts(&statements), vec!["select 1;", " select 2;"]);
    assert!(statements.iter().all(|s| !s.blank));
}

#[test]
fn test_trailing_whitespace_is_blank_statement() {
    let statements = split("select 1;\n");
    assert_eq!(texts(&statements), vec!["select 1;", "\n"]);
    assert!(!statements[0].blank);
    assert!(statements[1].blank);
}

#[test]
fn test_statement_without_terminator() {
    let statements = split("select 1;\nselect 2");
    assert_eq!(texts(&statements), vec!["select 1;", "\nselect 2"]);
}

#[test]
fn test_semicolon_in_string_literal() {
    let statements = split("insert into t values ('a;b'); select 1;");
    assert_eq!(
        texts(&statements),
        vec!["insert into t values ('a;b');", " select 1;"]
    );
}

#[test]
fn test_semicolon_in_comments() {
    let sql = "select 1; -- first; second\n/* a; b */ select 2;";
    let statements = split(sql);
    assert_eq!(
        texts(&statements),
        vec!["select 1;", " -- first; second\n/* a; b */ select 2;"]
    );
}

#[test]
fn test_semicolon_in_quoted_identifier() {
    let statements = split("select \"odd;name\" from t; select 2;");
    assert_eq!(statements.len(), 2);
    assert_eq!(statements[0].text, "select \"odd;name\" from t;");
}

#[test]
fn test_dollar_quoted_body() {
    let sql = "create function f() returns int as $$ select 1; $$ language sql;\nselect 2;";
    let statements = TokenSplitter::postgres().split(sql).unwrap();
    verify_round_trip(sql, &statements).unwrap();
    assert_eq!(
        texts(&statements),
        vec![
            "create function f() returns int as $$ select 1; $$ language sql;",
            "\nselect 2;"
        ]
    );
}

#[test]
fn test_multibyte_characters_before_terminator() {
    let statements = split("select 'é;ü', 'ß';\nselect 2;");
    assert_eq!(texts(&statements), vec!["select 'é;ü', 'ß';", "\nselect 2;"]);
}

#[test]
fn test_comment_only_statement_is_blank() {
    let statements = split("select 1;\n-- nothing left to do\n");
    assert_eq!(statements.len(), 2);
    assert!(statements[1].blank);
}

#[test]
fn test_empty_statements_are_blank() {
    let statements = split(";;");
    assert_eq!(texts(&statements), vec![";", ";"]);
    assert!(statements.iter().all(|s| s.blank));
}

#[test]
fn test_empty_input() {
    let statements = TokenSplitter::duckdb().split("").unwrap();
    assert!(statements.is_empty());
    verify_round_trip("", &statements).unwrap();
}

#[test]
fn test_round_trip_property() {
    let samples = [
        "\nselect 1\n",
        "-- this is a simple query\n\nselect author_data.*\nfrom author_data;\n\n",
        "CREATE TABLE foo(value int);\nINSERT INTO foo SELECT * FROM range(1, 11);\n    ",
        "update t set s = 'it''s; fine' where id = 1;\r\nselect 1;",
        "  /* leading */ select 1 ; ; select 2",
    ];
    for sql in samples {
        let statements = TokenSplitter::duckdb().split(sql).unwrap();
        verify_round_trip(sql, &statements).unwrap();
    }
}

#[test]
fn test_dropped_statement_fails_round_trip() {
    let sql = "select 1; select 2;";
    let mut statements = TokenSplitter::duckdb().split(sql).unwrap();
    statements.pop();
    let result = verify_round_trip(sql, &statements);
    assert!(matches!(
        result,
        Err(SqlError::RoundTrip {
            expected: 19,
            actual: 9
        })
    ));
}

#[test]
fn test_classification() {
    let cases = [
        ("INSERT INTO t VALUES (1)", StatementKind::Insert),
        ("update t set a = 1", StatementKind::Update),
        ("delete from t where a = 1", StatementKind::Delete),
        ("-- comment\nDELETE FROM t", StatementKind::Delete),
        (
            "WITH to_update AS (SELECT value FROM foo LIMIT 3) UPDATE foo SET value = 1",
            StatementKind::Update,
        ),
        (
            "with x as (delete from t returning id) select * from x",
            StatementKind::Other,
        ),
        ("select * from t", StatementKind::Other),
        ("create table t (id int)", StatementKind::Other),
        ("select 1 -- update", StatementKind::Other),
    ];
    for (sql, expected) in cases {
        let statements = TokenSplitter::postgres().split(sql).unwrap();
        assert_eq!(statements.len(), 1, "{}", sql);
        assert_eq!(statements[0].kind, expected, "{}", sql);
    }
    assert!(StatementKind::Update.is_write());
    assert!(!StatementKind::Other.is_write());
}

#[test]
fn test_clean_sql() {
    let sql = "\nSELECT author_data.*\n  -- a comment\n    \\timing\nFROM author_data; -- trailing\n";
    assert_eq!(
        TokenSplitter::duckdb().clean_sql(sql).unwrap(),
        "\nSELECT author_data.*\nFROM author_data; -- trailing\n"
    );
    assert_eq!(
        TokenSplitter::duckdb().clean_sql("select 1;").unwrap(),
        "select 1;"
    );
}

#[test]
fn test_clean_sql_keeps_string_literals() {
    let sql = "INSERT INTO notes VALUES ('line one\n-- kept text\n\\backslash line\nline three');\n";
    let statements = split(sql);
    assert_eq!(statements[0].sql, statements[0].text);
    assert!(statements[0].sql.contains("-- kept text\n\\backslash line\n"));
}

#[test]
fn test_clean_sql_keeps_block_comments() {
    let sql = "/* header\n-- inside\n*/\nSELECT 1;";
    assert_eq!(TokenSplitter::duckdb().clean_sql(sql).unwrap(), sql);
}

#[test]
fn test_clean_sql_keeps_dollar_quoted_bodies() {
    let sql = "CREATE FUNCTION f() RETURNS int AS $$\n-- body comment\nSELECT 1;\n$$ LANGUAGE sql;";
    let statements = TokenSplitter::postgres().split(sql).unwrap();
    assert_eq!(statements.len(), 1);
    assert_eq!(statements[0].sql, sql);
}

#[test]
fn test_statement_sql_is_cleaned() {
    let statements = split("-- header\nselect 1;\n\\timing\nselect 2;");
    assert_eq!(statements[0].sql, "select 1;");
    assert_eq!(statements[0].text, "-- header\nselect 1;");
    assert_eq!(statements[1].sql, "\nselect 2;");
}

#[test]
fn test_from_dialect_name() {
    assert_eq!(
        TokenSplitter::from_dialect_name("postgres")
            .unwrap()
            .dialect_name(),
        "postgres"
    );
    assert!(TokenSplitter::from_dialect_name("unknown").is_err());
}
