use litemeta::error::MetaError;
use litemeta::metadata::Nullability;
use litemeta::{Connection, MetadataCursor, Value};

fn fixture() -> Connection {
    let conn = Connection::open_in_memory().unwrap();
    conn.execute_batch(
        "create table test (id integer primary key, fn, sn);
         create view testView as select * from test;
         create table strict_cols (code varchar(8) not null default 'x', amount float, note text);",
    )
    .unwrap();
    conn
}

fn column_names(cursor: &mut MetadataCursor) -> Vec<String> {
    let mut names = Vec::new();
    while cursor.next().unwrap() {
        names.push(cursor.get_string("COLUMN_NAME").unwrap().unwrap());
    }
    names
}

#[test]
fn test_columns_in_declaration_order() {
    let conn = fixture();
    let mut cursor = conn.metadata().unwrap().get_columns(Some("test"), None).unwrap();

    let mut seen = Vec::new();
    while cursor.next().unwrap() {
        seen.push((
            cursor.get_string("TABLE_NAME").unwrap().unwrap(),
            cursor.get_string("COLUMN_NAME").unwrap().unwrap(),
            cursor.get_int("ORDINAL_POSITION").unwrap(),
            cursor.get_int("DATA_TYPE").unwrap(),
            cursor.get_string("TYPE_NAME").unwrap().unwrap(),
        ));
    }

    assert_eq!(
        seen,
        vec![
            ("test".to_string(), "id".to_string(), 0, 4, "INTEGER".to_string()),
            ("test".to_string(), "fn".to_string(), 1, 12, "TEXT".to_string()),
            ("test".to_string(), "sn".to_string(), 2, 12, "TEXT".to_string()),
        ]
    );
}

#[test]
fn test_table_pattern_resolves_to_first_match() {
    let conn = fixture();
    let mut cursor = conn.metadata().unwrap().get_columns(Some("tes_"), None).unwrap();
    assert!(cursor.next().unwrap());
    assert_eq!(cursor.get_string("TABLE_NAME").unwrap().as_deref(), Some("test"));
}

#[test]
fn test_missing_pattern_uses_first_table() {
    let conn = fixture();
    let mut cursor = conn.metadata().unwrap().get_columns(None, None).unwrap();
    assert_eq!(column_names(&mut cursor), ["id", "fn", "sn"]);
}

#[test]
fn test_column_pattern_is_case_insensitive() {
    let conn = fixture();
    let metadata = conn.metadata().unwrap();
    assert_eq!(
        column_names(&mut metadata.get_columns(Some("test"), Some("%N")).unwrap()),
        ["fn", "sn"]
    );
    assert_eq!(
        column_names(&mut metadata.get_columns(Some("test"), Some("ID")).unwrap()),
        ["id"]
    );
    assert!(column_names(&mut metadata.get_columns(Some("test"), Some("x%")).unwrap()).is_empty());
}

#[test]
fn test_missing_table_keeps_shape() {
    let conn = fixture();
    let mut cursor = conn.metadata().unwrap().get_columns(Some("nope"), None).unwrap();
    assert_eq!(cursor.column_count().unwrap(), 22);
    assert_eq!(cursor.column_name(18).unwrap(), "SCOPE_CATLOG");
    assert!(!cursor.next().unwrap());
}

#[test]
fn test_nullability_and_defaults() {
    let conn = fixture();
    let mut cursor = conn
        .metadata()
        .unwrap()
        .get_columns(Some("strict_cols"), None)
        .unwrap();

    assert!(cursor.next().unwrap());
    assert_eq!(cursor.get_string("COLUMN_NAME").unwrap().as_deref(), Some("code"));
    assert_eq!(cursor.get_string("TYPE_NAME").unwrap().as_deref(), Some("VARCHAR(8)"));
    assert_eq!(cursor.get_int("DATA_TYPE").unwrap(), 12);
    assert_eq!(cursor.get_int("NULLABLE").unwrap(), 0);
    assert_eq!(cursor.get_string("IS_NULLABLE").unwrap().as_deref(), Some("N"));
    assert_eq!(cursor.get_string("COLUMN_DEF").unwrap().as_deref(), Some("'x'"));

    assert!(cursor.next().unwrap());
    assert_eq!(cursor.get_string("TYPE_NAME").unwrap().as_deref(), Some("FLOAT"));
    assert_eq!(cursor.get_int("DATA_TYPE").unwrap(), 6);
    assert_eq!(cursor.get_int("NULLABLE").unwrap(), 1);
    assert_eq!(cursor.get_string("IS_NULLABLE").unwrap().as_deref(), Some("Y"));
    assert_eq!(cursor.get_value("COLUMN_DEF").unwrap(), Value::Null);
    assert!(cursor.was_null().unwrap());
}

#[test]
fn test_fixed_size_columns() {
    let conn = fixture();
    let mut cursor = conn.metadata().unwrap().get_columns(Some("test"), None).unwrap();
    assert!(cursor.next().unwrap());
    assert_eq!(cursor.get_long("COLUMN_SIZE").unwrap(), 2_000_000_000);
    assert_eq!(cursor.get_long("CHAR_OCTET_LENGTH").unwrap(), 2_000_000_000);
    assert_eq!(cursor.get_int("NUM_PREC_RADIX").unwrap(), 10);
    assert_eq!(cursor.get_value("SOURCE_DATA_TYPE").unwrap(), Value::Null);
}

#[test]
fn test_view_columns() {
    let conn = fixture();
    let mut cursor = conn
        .metadata()
        .unwrap()
        .get_columns(Some("testView"), None)
        .unwrap();
    assert_eq!(column_names(&mut cursor), ["id", "fn", "sn"]);
}

#[test]
fn test_column_nullability_classification() {
    let conn = fixture();
    let cursor = conn.metadata().unwrap().get_columns(Some("test"), None).unwrap();
    assert_eq!(cursor.column_nullability(0).unwrap(), Nullability::Nullable);
    assert_eq!(cursor.column_nullability(2).unwrap(), Nullability::NoNulls);
    assert_eq!(cursor.column_nullability(3).unwrap(), Nullability::Unknown);
}

#[test]
fn test_explain_inlines_catalog_facts() {
    let conn = fixture();
    let sql = conn
        .metadata()
        .unwrap()
        .explain(
            &litemeta::MetadataRequest::Columns {
                table_pattern: Some("test".into()),
                column_pattern: None,
            },
            litemeta::sql::Dialect::Sqlite,
        )
        .unwrap();
    assert!(sql.contains("UNION ALL"));
    assert!(sql.contains("'sn' AS \"cn\""));
}

fn wide_table(conn: &Connection, name: &str, width: usize) {
    let columns: Vec<String> = (0..width).map(|i| format!("c{i}")).collect();
    conn.execute_batch(&format!("create table {name} ({})", columns.join(", ")))
        .unwrap();
}

#[test]
fn test_table_wider_than_one_compound_select() {
    let conn = fixture();
    wide_table(&conn, "wide", 501);

    let mut cursor = conn.metadata().unwrap().get_columns(Some("wide"), None).unwrap();
    let mut positions = Vec::new();
    while cursor.next().unwrap() {
        positions.push((
            cursor.get_int("ORDINAL_POSITION").unwrap(),
            cursor.get_string("COLUMN_NAME").unwrap().unwrap(),
        ));
    }
    assert_eq!(positions.len(), 501);
    assert_eq!(positions[0], (0, "c0".to_string()));
    assert_eq!(positions[500], (500, "c500".to_string()));
    assert!(positions.windows(2).all(|w| w[0].0 + 1 == w[1].0));
}

#[test]
fn test_very_wide_table_with_column_pattern() {
    let conn = fixture();
    wide_table(&conn, "wider", 1500);

    let metadata = conn.metadata().unwrap();
    let all = metadata.get_columns(Some("wider"), None).unwrap().collect_rows().unwrap();
    assert_eq!(all.len(), 1500);

    let mut cursor = metadata.get_columns(Some("wider"), Some("C149_")).unwrap();
    let names = column_names(&mut cursor);
    assert_eq!(names.len(), 10);
    assert_eq!(names[0], "c1490");
    assert_eq!(names[9], "c1499");
}

#[test]
fn test_repeated_calls_are_identical() {
    let conn = fixture();
    let metadata = conn.metadata().unwrap();
    let request = litemeta::MetadataRequest::Columns {
        table_pattern: Some("strict_cols".into()),
        column_pattern: None,
    };
    assert_eq!(
        metadata.explain(&request, litemeta::sql::Dialect::Sqlite).unwrap(),
        metadata.explain(&request, litemeta::sql::Dialect::Sqlite).unwrap()
    );

    let first = metadata.get_columns(Some("strict_cols"), None).unwrap().collect_rows().unwrap();
    let second = metadata.get_columns(Some("strict_cols"), None).unwrap().collect_rows().unwrap();
    assert_eq!(first.len(), 3);
    assert_eq!(first, second);
}

#[test]
fn test_closed_connection() {
    let conn = fixture();
    let metadata = conn.metadata().unwrap();
    conn.close().unwrap();
    let err = metadata.get_columns(Some("test"), None).unwrap_err();
    assert!(matches!(err, MetaError::Closed(_)));
}
