use litemeta::cursor::CursorState;
use litemeta::error::{MetaError, Resource};
use litemeta::{Connection, MetadataCursor, Value};

fn fixture() -> Connection {
    let conn = Connection::open_in_memory().unwrap();
    conn.execute_batch(
        "create table test (id integer primary key, fn, sn);
         create view testView as select * from test;",
    )
    .unwrap();
    conn
}

fn tables(conn: &Connection) -> MetadataCursor {
    conn.metadata().unwrap().get_tables(None, None).unwrap()
}

#[test]
fn test_state_transitions() {
    let conn = fixture();
    let mut cursor = tables(&conn);
    assert_eq!(cursor.state(), CursorState::Unopened);

    assert!(cursor.next().unwrap());
    assert_eq!(cursor.state(), CursorState::Iterating);
    assert!(cursor.next().unwrap());
    assert!(!cursor.next().unwrap());
    assert_eq!(cursor.state(), CursorState::Exhausted);

    // Stays exhausted
    assert!(!cursor.next().unwrap());
    assert_eq!(cursor.state(), CursorState::Exhausted);

    cursor.close();
    assert_eq!(cursor.state(), CursorState::Closed);
}

#[test]
fn test_read_before_next() {
    let conn = fixture();
    let mut cursor = tables(&conn);
    assert!(matches!(cursor.get_string(2), Err(MetaError::NoCurrentRow)));
}

#[test]
fn test_read_after_exhaustion() {
    let conn = fixture();
    let mut cursor = tables(&conn);
    while cursor.next().unwrap() {}
    assert!(matches!(cursor.get_string(2), Err(MetaError::NoCurrentRow)));
    // Column metadata outlives the rows
    assert_eq!(cursor.column_count().unwrap(), 10);
    assert_eq!(cursor.column_name(2).unwrap(), "TABLE_NAME");
}

#[test]
fn test_label_lookup_is_case_insensitive() {
    let conn = fixture();
    let mut cursor = tables(&conn);
    assert_eq!(cursor.find_column("table_name").unwrap(), 2);
    assert_eq!(cursor.find_column("Table_Type").unwrap(), 3);
    assert_eq!(cursor.find_column("TABLE_NAME").unwrap(), 2);

    assert!(cursor.next().unwrap());
    assert_eq!(
        cursor.get_string("table_name").unwrap(),
        cursor.get_string(2).unwrap()
    );
}

#[test]
fn test_unknown_label() {
    let conn = fixture();
    let mut cursor = tables(&conn);
    match cursor.find_column("nope") {
        Err(MetaError::NoSuchColumn(label)) => assert_eq!(label, "nope"),
        other => panic!("unexpected: {other:?}"),
    }
}

#[test]
fn test_index_out_of_bounds() {
    let conn = fixture();
    let mut cursor = tables(&conn);
    assert!(cursor.next().unwrap());

    assert!(matches!(
        cursor.get_value(10),
        Err(MetaError::ColumnOutOfBounds { index: 10, count: 10 })
    ));
    assert!(matches!(
        cursor.get_value(-1),
        Err(MetaError::ColumnOutOfBounds { index: -1, count: 10 })
    ));
    assert!(cursor.column_name(42).is_err());
}

#[test]
fn test_was_null_tracks_last_read() {
    let conn = fixture();
    let mut cursor = tables(&conn);
    assert!(cursor.next().unwrap());

    assert_eq!(cursor.get_string("TABLE_CAT").unwrap(), None);
    assert!(cursor.was_null().unwrap());

    assert_eq!(cursor.get_string("TABLE_NAME").unwrap().as_deref(), Some("test"));
    assert!(!cursor.was_null().unwrap());

    // Numeric accessors report zero for NULL
    assert_eq!(cursor.get_long("REMARKS").unwrap(), 0);
    assert!(cursor.was_null().unwrap());
}

#[test]
fn test_typed_accessors() {
    let conn = fixture();
    let mut cursor = conn.metadata().unwrap().get_columns(Some("test"), None).unwrap();
    assert!(cursor.next().unwrap());

    assert_eq!(cursor.get_int("DATA_TYPE").unwrap(), 4);
    assert_eq!(cursor.get_long("DATA_TYPE").unwrap(), 4);
    assert_eq!(cursor.get_double("DATA_TYPE").unwrap(), 4.0);
    assert!(cursor.get_bool("NULLABLE").unwrap());
    assert_eq!(cursor.get_bytes("COLUMN_NAME").unwrap(), Some(b"id".to_vec()));
    assert_eq!(cursor.get_value("COLUMN_NAME").unwrap(), Value::Text("id".into()));
}

#[test]
fn test_column_types_follow_values() {
    let conn = fixture();
    let mut cursor = conn.metadata().unwrap().get_columns(Some("test"), None).unwrap();
    assert_eq!(cursor.column_type_name(3).unwrap(), "null");

    assert!(cursor.next().unwrap());
    assert_eq!(cursor.column_type_name(0).unwrap(), "null");
    assert_eq!(cursor.column_type_name(3).unwrap(), "text");
    assert_eq!(cursor.column_type(3).unwrap(), 12);
    assert_eq!(cursor.column_type_name(4).unwrap(), "integer");
    assert_eq!(cursor.column_type(4).unwrap(), 4);

    while cursor.next().unwrap() {}
    // Falls back to the first row once exhausted
    assert_eq!(cursor.column_type_name(3).unwrap(), "text");
}

#[test]
fn test_is_last_is_not_implemented() {
    let conn = fixture();
    let cursor = tables(&conn);
    assert!(matches!(cursor.is_last(), Err(MetaError::NotImplemented(_))));
}

#[test]
fn test_closed_cursor() {
    let conn = fixture();
    let mut cursor = tables(&conn);
    assert!(cursor.next().unwrap());
    cursor.close();
    cursor.close();

    assert!(cursor.is_closed());
    assert!(matches!(cursor.next(), Err(MetaError::Closed(Resource::Cursor))));
    assert!(matches!(cursor.get_string(2), Err(MetaError::Closed(Resource::Cursor))));
    assert!(matches!(cursor.column_count(), Err(MetaError::Closed(Resource::Cursor))));
    assert!(matches!(cursor.was_null(), Err(MetaError::Closed(Resource::Cursor))));

    // Other cursors are unaffected
    let mut other = tables(&conn);
    assert!(other.next().unwrap());
}

#[test]
fn test_collect_rows_drains() {
    let conn = fixture();
    let mut cursor = tables(&conn);
    let rows = cursor.collect_rows().unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[1][2], Value::Text("testView".into()));
    assert_eq!(cursor.state(), CursorState::Exhausted);
    assert!(cursor.collect_rows().unwrap().is_empty());
}
