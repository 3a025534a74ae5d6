//! Column contracts of every metadata relation.
//!
//! Names and order are part of the public contract, including the historical
//! `SCOPE_CATLOG` spelling in the column listing.

pub const TABLES: [&str; 10] = [
    "TABLE_CAT",
    "TABLE_SCHEM",
    "TABLE_NAME",
    "TABLE_TYPE",
    "REMARKS",
    "TYPE_CAT",
    "TYPE_SCHEM",
    "TYPE_NAME",
    "SELF_REFERENCING_COL_NAME",
    "REF_GENERATION",
];

pub const TABLE_TYPES: [&str; 1] = ["TABLE_TYPE"];

pub const COLUMNS: [&str; 22] = [
    "TABLE_CAT",
    "TABLE_SCHEM",
    "TABLE_NAME",
    "COLUMN_NAME",
    "DATA_TYPE",
    "TYPE_NAME",
    "COLUMN_SIZE",
    "BUFFER_LENGTH",
    "DECIMAL_DIGITS",
    "NUM_PREC_RADIX",
    "NULLABLE",
    "REMARKS",
    "COLUMN_DEF",
    "SQL_DATA_TYPE",
    "SQL_DATETIME_SUB",
    "CHAR_OCTET_LENGTH",
    "ORDINAL_POSITION",
    "IS_NULLABLE",
    "SCOPE_CATLOG",
    "SCOPE_SCHEMA",
    "SCOPE_TABLE",
    "SOURCE_DATA_TYPE",
];

pub const PRIMARY_KEYS: [&str; 6] = [
    "TABLE_CAT",
    "TABLE_SCHEM",
    "TABLE_NAME",
    "COLUMN_NAME",
    "KEY_SEQ",
    "PK_NAME",
];

/// Shared by imported keys, exported keys and cross reference.
pub const CROSS_REFERENCE: [&str; 14] = [
    "PKTABLE_CAT",
    "PKTABLE_SCHEM",
    "PKTABLE_NAME",
    "PKCOLUMN_NAME",
    "FKTABLE_CAT",
    "FKTABLE_SCHEM",
    "FKTABLE_NAME",
    "FKCOLUMN_NAME",
    "KEY_SEQ",
    "UPDATE_RULE",
    "DELETE_RULE",
    "FK_NAME",
    "PK_NAME",
    "DEFERRABILITY",
];

pub const INDEX_INFO: [&str; 13] = [
    "TABLE_CAT",
    "TABLE_SCHEM",
    "TABLE_NAME",
    "NON_UNIQUE",
    "INDEX_QUALIFIER",
    "INDEX_NAME",
    "TYPE",
    "ORDINAL_POSITION",
    "COLUMN_NAME",
    "ASC_OR_DESC",
    "CARDINALITY",
    "PAGES",
    "FILTER_CONDITION",
];

/// Shared by best row identifier and version columns.
pub const BEST_ROW: [&str; 8] = [
    "SCOPE",
    "COLUMN_NAME",
    "DATA_TYPE",
    "TYPE_NAME",
    "COLUMN_SIZE",
    "BUFFER_LENGTH",
    "DECIMAL_DIGITS",
    "PSEUDO_COLUMN",
];

pub const TYPE_INFO: [&str; 18] = [
    "TYPE_NAME",
    "DATA_TYPE",
    "PRECISION",
    "LITERAL_PREFIX",
    "LITERAL_SUFFIX",
    "CREATE_PARAMS",
    "NULLABLE",
    "CASE_SENSITIVE",
    "SEARCHABLE",
    "UNSIGNED_ATTRIBUTE",
    "FIXED_PREC_SCALE",
    "AUTO_INCREMENT",
    "LOCAL_TYPE_NAME",
    "MINIMUM_SCALE",
    "MAXIMUM_SCALE",
    "SQL_DATA_TYPE",
    "SQL_DATETIME_SUB",
    "NUM_PREC_RADIX",
];

pub const PROCEDURES: [&str; 8] = [
    "PROCEDURE_CAT",
    "PROCEDURE_SCHEM",
    "PROCEDURE_NAME",
    "UNDEF1",
    "UNDEF2",
    "UNDEF3",
    "REMARKS",
    "PROCEDURE_TYPE",
];

pub const PROCEDURE_COLUMNS: [&str; 13] = [
    "PROCEDURE_CAT",
    "PROCEDURE_SCHEM",
    "PROCEDURE_NAME",
    "COLUMN_NAME",
    "COLUMN_TYPE",
    "DATA_TYPE",
    "TYPE_NAME",
    "PRECISION",
    "LENGTH",
    "SCALE",
    "RADIX",
    "NULLABLE",
    "REMARKS",
];

pub const ATTRIBUTES: [&str; 21] = [
    "TYPE_CAT",
    "TYPE_SCHEM",
    "TYPE_NAME",
    "ATTR_NAME",
    "DATA_TYPE",
    "ATTR_TYPE_NAME",
    "ATTR_SIZE",
    "DECIMAL_DIGITS",
    "NUM_PREC_RADIX",
    "NULLABLE",
    "REMARKS",
    "ATTR_DEF",
    "SQL_DATA_TYPE",
    "SQL_DATETIME_SUB",
    "CHAR_OCTET_LENGTH",
    "ORDINAL_POSITION",
    "IS_NULLABLE",
    "SCOPE_CATALOG",
    "SCOPE_SCHEMA",
    "SCOPE_TABLE",
    "SOURCE_DATA_TYPE",
];

pub const SCHEMAS: [&str; 2] = ["TABLE_SCHEM", "TABLE_CATALOG"];

pub const CATALOGS: [&str; 1] = ["TABLE_CAT"];

pub const TABLE_PRIVILEGES: [&str; 7] = [
    "TABLE_CAT",
    "TABLE_SCHEM",
    "TABLE_NAME",
    "GRANTOR",
    "GRANTEE",
    "PRIVILEGE",
    "IS_GRANTABLE",
];

pub const COLUMN_PRIVILEGES: [&str; 8] = [
    "TABLE_CAT",
    "TABLE_SCHEM",
    "TABLE_NAME",
    "COLUMN_NAME",
    "GRANTOR",
    "GRANTEE",
    "PRIVILEGE",
    "IS_GRANTABLE",
];

pub const SUPER_TABLES: [&str; 4] = ["TABLE_CAT", "TABLE_SCHEM", "TABLE_NAME", "SUPERTABLE_NAME"];

pub const SUPER_TYPES: [&str; 6] = [
    "TYPE_CAT",
    "TYPE_SCHEM",
    "TYPE_NAME",
    "SUPERTYPE_CAT",
    "SUPERTYPE_SCHEM",
    "SUPERTYPE_NAME",
];

pub const UDTS: [&str; 7] = [
    "TYPE_CAT",
    "TYPE_SCHEM",
    "TYPE_NAME",
    "CLASS_NAME",
    "DATA_TYPE",
    "REMARKS",
    "BASE_TYPE",
];
