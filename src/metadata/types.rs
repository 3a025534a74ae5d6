//! Declared-type mapping and the static type catalog.

/// Portable type codes and the standard metadata flag values.
pub mod codes {
    pub const NULL: i32 = 0;
    pub const INTEGER: i32 = 4;
    pub const FLOAT: i32 = 6;
    pub const REAL: i32 = 7;
    pub const VARCHAR: i32 = 12;
    pub const BLOB: i32 = 2004;

    pub const BEST_ROW_NOT_PSEUDO: i32 = 1;
    pub const BEST_ROW_PSEUDO: i32 = 2;

    pub const IMPORTED_KEY_NO_ACTION: i32 = 3;
    pub const IMPORTED_KEY_NOT_DEFERRABLE: i32 = 7;

    pub const TABLE_INDEX_OTHER: i32 = 3;

    pub const TYPE_NULLABLE: i32 = 1;
    pub const TYPE_SEARCHABLE: i32 = 3;

    pub const COLUMN_NO_NULLS: i32 = 0;
    pub const COLUMN_NULLABLE: i32 = 1;
    pub const COLUMN_NULLABLE_UNKNOWN: i32 = 2;
}

/// Canonical type name for a declared column type.
///
/// Untyped columns (no declaration, or an empty one) are `TEXT`.
pub fn to_canonical_type(declared: Option<&str>) -> String {
    match declared {
        Some(t) if !t.is_empty() => t.to_uppercase(),
        _ => "TEXT".to_string(),
    }
}

/// Portable type code for a canonical type name.
pub fn to_portable_code(canonical: &str) -> i32 {
    match canonical {
        "INT" | "INTEGER" => codes::INTEGER,
        "TEXT" => codes::VARCHAR,
        "FLOAT" => codes::FLOAT,
        _ => codes::VARCHAR,
    }
}

/// One row of the type catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypeEntry {
    pub sql_type_name: &'static str,
    pub portable_type_code: i32,
    pub nullable_flag: i32,
    pub searchable_flag: i32,
}

impl TypeEntry {
    const fn new(sql_type_name: &'static str, portable_type_code: i32) -> Self {
        Self {
            sql_type_name,
            portable_type_code,
            nullable_flag: codes::TYPE_NULLABLE,
            searchable_flag: codes::TYPE_SEARCHABLE,
        }
    }
}

/// The engine's storage classes, as reported by `getTypeInfo`.
pub const TYPE_ENTRIES: [TypeEntry; 5] = [
    TypeEntry::new("BLOB", codes::BLOB),
    TypeEntry::new("NULL", codes::NULL),
    TypeEntry::new("REAL", codes::REAL),
    TypeEntry::new("TEXT", codes::VARCHAR),
    TypeEntry::new("INTEGER", codes::INTEGER),
];
