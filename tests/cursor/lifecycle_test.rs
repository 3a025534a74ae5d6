use std::thread;

use litemeta::error::{MetaError, Resource};
use litemeta::{BestRowScope, Connection};

fn fixture() -> Connection {
    let conn = Connection::open_in_memory().unwrap();
    conn.execute_batch(
        "create table test (id integer primary key, fn, sn);
         create view testView as select * from test;",
    )
    .unwrap();
    conn
}

fn is_closed_connection<T: std::fmt::Debug>(result: Result<T, MetaError>) -> bool {
    matches!(result, Err(MetaError::Closed(Resource::Connection)))
}

#[test]
fn test_close_invalidates_every_handle() {
    let conn = fixture();
    let metadata = conn.metadata().unwrap();

    // Cached and synthesized statements both in flight
    let mut table_types = metadata.get_table_types().unwrap();
    let mut type_info = metadata.get_type_info().unwrap();
    let mut columns = metadata.get_columns(Some("test"), None).unwrap();
    let mut tables = metadata.get_tables(None, None).unwrap();
    assert!(tables.next().unwrap());

    conn.close().unwrap();

    for cursor in [&mut table_types, &mut type_info, &mut columns, &mut tables] {
        assert!(cursor.is_closed());
        assert!(is_closed_connection(cursor.next()));
        assert!(is_closed_connection(cursor.column_count()));
        assert!(is_closed_connection(cursor.get_value(0)));
        cursor.close();
    }

    assert!(is_closed_connection(metadata.get_table_types()));
    assert!(is_closed_connection(metadata.get_type_info()));
    assert!(is_closed_connection(metadata.get_tables(None, None)));
    assert!(is_closed_connection(metadata.get_schemas()));
    assert!(is_closed_connection(metadata.get_functions()));
    assert!(is_closed_connection(conn.metadata()));
    assert!(is_closed_connection(conn.generated_keys()));
}

#[test]
fn test_close_twice() {
    let conn = fixture();
    conn.close().unwrap();
    conn.close().unwrap();
    assert!(conn.is_closed());
}

#[test]
fn test_close_from_another_thread() {
    let conn = fixture();
    let metadata = conn.metadata().unwrap();
    let mut cursor = metadata.get_tables(None, None).unwrap();

    let closer = conn.clone();
    thread::spawn(move || closer.close().unwrap())
        .join()
        .unwrap();

    assert!(conn.is_closed());
    assert!(is_closed_connection(cursor.next()));
    assert!(is_closed_connection(metadata.get_primary_keys(Some("test"))));
}

#[test]
fn test_concurrent_requests_share_the_cache() {
    let conn = fixture();

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let conn = conn.clone();
            thread::spawn(move || {
                let metadata = conn.metadata().unwrap();
                let types = metadata.get_table_types().unwrap().collect_rows().unwrap();
                let columns = metadata
                    .get_best_row_identifier(Some("test"), BestRowScope::Session, i % 2 == 0)
                    .unwrap()
                    .collect_rows()
                    .unwrap();
                (types.len(), columns.len())
            })
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.join().unwrap(), (2, 1));
    }
}

#[test]
fn test_cursor_survives_exhaustion_until_connection_closes() {
    let conn = fixture();
    let mut cursor = conn.metadata().unwrap().get_table_types().unwrap();
    while cursor.next().unwrap() {}
    assert_eq!(cursor.column_name(0).unwrap(), "TABLE_TYPE");

    conn.close().unwrap();
    assert!(is_closed_connection(cursor.column_name(0)));
}

#[test]
fn test_always_empty_operations() {
    let conn = fixture();
    let metadata = conn.metadata().unwrap();
    let cursors = [
        metadata.get_version_columns(),
        metadata.get_procedures(),
        metadata.get_procedure_columns(),
        metadata.get_attributes(),
        metadata.get_schemas(),
        metadata.get_catalogs(),
        metadata.get_table_privileges(),
        metadata.get_column_privileges(),
        metadata.get_super_tables(),
        metadata.get_super_types(),
        metadata.get_udts(),
    ];
    for cursor in cursors {
        let mut cursor = cursor.unwrap();
        assert!(cursor.column_count().unwrap() > 0);
        assert!(!cursor.next().unwrap());
    }
}

#[test]
fn test_not_implemented_operations() {
    let conn = fixture();
    let metadata = conn.metadata().unwrap();
    assert!(matches!(metadata.get_functions(), Err(MetaError::NotImplemented(_))));
    assert!(matches!(metadata.get_function_columns(), Err(MetaError::NotImplemented(_))));
    assert!(matches!(metadata.get_pseudo_columns(), Err(MetaError::NotImplemented(_))));
    assert!(matches!(
        metadata.get_client_info_properties(),
        Err(MetaError::NotImplemented(_))
    ));
}

#[test]
fn test_scalar_facts() {
    let conn = fixture();
    let metadata = conn.metadata().unwrap();
    assert_eq!(metadata.database_product_name(), "SQLite");
    assert!(metadata.database_product_version().starts_with('3'));
    assert_eq!(metadata.driver_name(), "litemeta");
    assert_eq!(metadata.driver_version(), env!("CARGO_PKG_VERSION"));
}

#[test]
fn test_generated_keys_follow_inserts() {
    let conn = fixture();
    conn.execute_batch("insert into test (fn) values ('a'); insert into test (fn) values ('b');")
        .unwrap();

    let mut keys = conn.generated_keys().unwrap();
    assert!(keys.next().unwrap());
    assert_eq!(keys.get_long("last_insert_rowid()").unwrap(), 2);

    conn.execute_batch("insert into test (id, fn) values (10, 'c')").unwrap();
    let mut keys = conn.generated_keys().unwrap();
    assert!(keys.next().unwrap());
    assert_eq!(keys.get_long(0).unwrap(), 10);
}
