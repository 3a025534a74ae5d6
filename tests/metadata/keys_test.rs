use litemeta::error::MetaError;
use litemeta::sql::Dialect;
use litemeta::{BestRowScope, Connection, MetadataCursor, MetadataRequest};

fn fixture() -> Connection {
    let conn = Connection::open_in_memory().unwrap();
    conn.execute_batch(
        "create table test (id integer primary key, fn, sn);
         create table parent (a integer, b text not null, c, primary key (a, b));
         create table child (id integer primary key, pa, pb, foreign key (pa, pb) references parent (a, b));
         create table loose (id, p references test);
         create table nullable_key (k text primary key, v);
         create table rev (c1, c2, c3, primary key (c3, c2));
         create table rev_ref (x, y, foreign key (x, y) references rev);",
    )
    .unwrap();
    conn
}

/// `(PKTABLE_NAME, PKCOLUMN_NAME, FKTABLE_NAME, FKCOLUMN_NAME, KEY_SEQ)` per row.
fn edges(cursor: &mut MetadataCursor) -> Vec<(String, Option<String>, String, String, i32)> {
    let mut out = Vec::new();
    while cursor.next().unwrap() {
        out.push((
            cursor.get_string("PKTABLE_NAME").unwrap().unwrap(),
            cursor.get_string("PKCOLUMN_NAME").unwrap(),
            cursor.get_string("FKTABLE_NAME").unwrap().unwrap(),
            cursor.get_string("FKCOLUMN_NAME").unwrap().unwrap(),
            cursor.get_int("KEY_SEQ").unwrap(),
        ));
    }
    out
}

fn edge(pt: &str, pc: &str, ft: &str, fc: &str, seq: i32) -> (String, Option<String>, String, String, i32) {
    (pt.into(), Some(pc.into()), ft.into(), fc.into(), seq)
}

// =============================================================================
// Primary keys
// =============================================================================

#[test]
fn test_single_column_primary_key() {
    let conn = fixture();
    let mut cursor = conn.metadata().unwrap().get_primary_keys(Some("test")).unwrap();
    assert!(cursor.next().unwrap());
    assert_eq!(cursor.get_string("TABLE_NAME").unwrap().as_deref(), Some("test"));
    assert_eq!(cursor.get_string("COLUMN_NAME").unwrap().as_deref(), Some("id"));
    assert_eq!(cursor.get_int("KEY_SEQ").unwrap(), 0);
    assert!(!cursor.next().unwrap());
}

#[test]
fn test_composite_primary_key() {
    let conn = fixture();
    let mut cursor = conn.metadata().unwrap().get_primary_keys(Some("parent")).unwrap();

    let mut keys = Vec::new();
    while cursor.next().unwrap() {
        keys.push((
            cursor.get_string("COLUMN_NAME").unwrap().unwrap(),
            cursor.get_int("KEY_SEQ").unwrap(),
        ));
    }
    assert_eq!(keys, vec![("a".to_string(), 0), ("b".to_string(), 1)]);
}

#[test]
fn test_composite_key_declared_out_of_column_order() {
    let conn = fixture();
    let mut cursor = conn.metadata().unwrap().get_primary_keys(Some("rev")).unwrap();

    let mut keys = Vec::new();
    while cursor.next().unwrap() {
        keys.push((
            cursor.get_string("COLUMN_NAME").unwrap().unwrap(),
            cursor.get_int("KEY_SEQ").unwrap(),
        ));
    }
    assert_eq!(keys, vec![("c2".to_string(), 1), ("c3".to_string(), 0)]);
}

#[test]
fn test_table_without_primary_key() {
    let conn = fixture();
    let mut cursor = conn.metadata().unwrap().get_primary_keys(Some("loose")).unwrap();
    assert_eq!(cursor.column_count().unwrap(), 6);
    assert!(!cursor.next().unwrap());
}

#[test]
fn test_absent_table_argument() {
    let conn = fixture();
    let mut cursor = conn.metadata().unwrap().get_primary_keys(None).unwrap();
    assert_eq!(cursor.column_count().unwrap(), 6);
    assert!(!cursor.next().unwrap());
}

#[test]
fn test_empty_table_name_is_rejected() {
    let conn = fixture();
    let metadata = conn.metadata().unwrap();
    assert!(matches!(
        metadata.get_primary_keys(Some("")),
        Err(MetaError::MalformedArgument(_))
    ));
    assert!(matches!(
        metadata.get_imported_keys(Some("")),
        Err(MetaError::MalformedArgument(_))
    ));
    assert!(matches!(
        metadata.get_cross_reference(Some("parent"), Some("")),
        Err(MetaError::MalformedArgument(_))
    ));
}

// =============================================================================
// Best row identifier
// =============================================================================

#[test]
fn test_best_row_single_key_column() {
    let conn = fixture();
    let mut cursor = conn
        .metadata()
        .unwrap()
        .get_best_row_identifier(Some("test"), BestRowScope::Session, true)
        .unwrap();
    assert!(cursor.next().unwrap());
    assert_eq!(cursor.get_int("SCOPE").unwrap(), 2);
    assert_eq!(cursor.get_string("COLUMN_NAME").unwrap().as_deref(), Some("id"));
    assert_eq!(cursor.get_int("DATA_TYPE").unwrap(), 4);
    assert_eq!(cursor.get_string("TYPE_NAME").unwrap().as_deref(), Some("INTEGER"));
    assert_eq!(cursor.get_int("PSEUDO_COLUMN").unwrap(), 1);
    assert!(!cursor.next().unwrap());
}

#[test]
fn test_best_row_falls_back_to_rowid() {
    let conn = fixture();
    let metadata = conn.metadata().unwrap();

    for table in ["loose", "parent", "nope"] {
        let mut cursor = metadata
            .get_best_row_identifier(Some(table), BestRowScope::Transaction, true)
            .unwrap();
        assert!(cursor.next().unwrap(), "{table}");
        assert_eq!(cursor.get_string("COLUMN_NAME").unwrap().as_deref(), Some("ROWID"));
        assert_eq!(cursor.get_int("DATA_TYPE").unwrap(), 4);
        assert_eq!(cursor.get_string("TYPE_NAME").unwrap().as_deref(), Some("INTEGER"));
        assert_eq!(cursor.get_int("PSEUDO_COLUMN").unwrap(), 2);
        assert!(!cursor.next().unwrap(), "{table}");
    }
}

#[test]
fn test_best_row_excludes_nullable_key_unless_requested() {
    let conn = fixture();
    let metadata = conn.metadata().unwrap();

    let mut strict = metadata
        .get_best_row_identifier(Some("nullable_key"), BestRowScope::Temporary, false)
        .unwrap();
    assert!(strict.next().unwrap());
    assert_eq!(strict.get_string("COLUMN_NAME").unwrap().as_deref(), Some("ROWID"));

    let mut lenient = metadata
        .get_best_row_identifier(Some("nullable_key"), BestRowScope::Temporary, true)
        .unwrap();
    assert!(lenient.next().unwrap());
    assert_eq!(lenient.get_string("COLUMN_NAME").unwrap().as_deref(), Some("k"));
    assert_eq!(lenient.get_int("SCOPE").unwrap(), 0);
}

#[test]
fn test_best_row_absent_table_is_empty() {
    let conn = fixture();
    let mut cursor = conn
        .metadata()
        .unwrap()
        .get_best_row_identifier(None, BestRowScope::Session, true)
        .unwrap();
    assert_eq!(cursor.column_count().unwrap(), 8);
    assert!(!cursor.next().unwrap());
}

// =============================================================================
// Foreign keys
// =============================================================================

#[test]
fn test_imported_keys() {
    let conn = fixture();
    let mut cursor = conn.metadata().unwrap().get_imported_keys(Some("child")).unwrap();
    assert_eq!(
        edges(&mut cursor),
        vec![
            edge("parent", "a", "child", "pa", 0),
            edge("parent", "b", "child", "pb", 1),
        ]
    );
}

#[test]
fn test_fixed_rules_and_deferrability() {
    let conn = fixture();
    let mut cursor = conn.metadata().unwrap().get_imported_keys(Some("child")).unwrap();
    assert!(cursor.next().unwrap());
    assert_eq!(cursor.get_int("UPDATE_RULE").unwrap(), 3);
    assert_eq!(cursor.get_int("DELETE_RULE").unwrap(), 3);
    assert_eq!(cursor.get_int("DEFERRABILITY").unwrap(), 7);
    assert_eq!(cursor.get_string("FK_NAME").unwrap(), None);
}

#[test]
fn test_implicit_reference_resolves_to_primary_key() {
    let conn = fixture();
    let mut cursor = conn.metadata().unwrap().get_imported_keys(Some("loose")).unwrap();
    assert_eq!(edges(&mut cursor), vec![edge("test", "id", "loose", "p", 0)]);
}

#[test]
fn test_implicit_composite_reference_follows_key_order() {
    let conn = fixture();
    let mut cursor = conn.metadata().unwrap().get_imported_keys(Some("rev_ref")).unwrap();
    assert_eq!(
        edges(&mut cursor),
        vec![
            edge("rev", "c3", "rev_ref", "x", 0),
            edge("rev", "c2", "rev_ref", "y", 1),
        ]
    );
}

#[test]
fn test_exported_keys() {
    let conn = fixture();
    let metadata = conn.metadata().unwrap();

    let mut cursor = metadata.get_exported_keys(Some("parent")).unwrap();
    assert_eq!(
        edges(&mut cursor),
        vec![
            edge("parent", "a", "child", "pa", 0),
            edge("parent", "b", "child", "pb", 1),
        ]
    );

    let mut cursor = metadata.get_exported_keys(Some("TEST")).unwrap();
    assert_eq!(edges(&mut cursor), vec![edge("test", "id", "loose", "p", 0)]);

    let mut cursor = metadata.get_exported_keys(Some("child")).unwrap();
    assert!(edges(&mut cursor).is_empty());
}

#[test]
fn test_cross_reference() {
    let conn = fixture();
    let metadata = conn.metadata().unwrap();

    let mut hit = metadata.get_cross_reference(Some("PARENT"), Some("child")).unwrap();
    assert_eq!(edges(&mut hit).len(), 2);

    let mut miss = metadata.get_cross_reference(Some("test"), Some("child")).unwrap();
    assert!(edges(&mut miss).is_empty());

    let mut any = metadata.get_cross_reference(None, Some("child")).unwrap();
    assert_eq!(edges(&mut any).len(), 2);

    let mut none = metadata.get_cross_reference(Some("parent"), None).unwrap();
    assert_eq!(none.column_count().unwrap(), 14);
    assert!(edges(&mut none).is_empty());
}

#[test]
fn test_repeated_cross_reference_is_identical() {
    let conn = fixture();
    let metadata = conn.metadata().unwrap();
    let request = MetadataRequest::CrossReference {
        primary: Some("parent".into()),
        foreign: Some("child".into()),
    };
    assert_eq!(
        metadata.explain(&request, Dialect::Sqlite).unwrap(),
        metadata.explain(&request, Dialect::Sqlite).unwrap()
    );

    let first = metadata
        .get_cross_reference(Some("parent"), Some("child"))
        .unwrap()
        .collect_rows()
        .unwrap();
    let second = metadata
        .get_cross_reference(Some("parent"), Some("child"))
        .unwrap()
        .collect_rows()
        .unwrap();
    assert_eq!(first.len(), 2);
    assert_eq!(first, second);
}
