//! Synthesized relations and the operations that produce them.

use strum::{EnumCount, EnumIter, IntoStaticStr};

use super::shapes;
use crate::sql::{Dialect, Expr, Query};

/// Every metadata operation that is answered with a synthesized relation.
///
/// The discriminant doubles as the statement cache slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumCount, EnumIter, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum MetadataOp {
    Tables,
    TableTypes,
    Columns,
    /// Exact-name lookup that precedes column listing.
    ColumnsTableName,
    PrimaryKeys,
    ImportedKeys,
    ExportedKeys,
    CrossReference,
    IndexInfo,
    BestRowIdentifier,
    VersionColumns,
    TypeInfo,
    Procedures,
    ProcedureColumns,
    Attributes,
    Schemas,
    Catalogs,
    TablePrivileges,
    ColumnPrivileges,
    SuperTables,
    SuperTypes,
    Udts,
    GeneratedKeys,
}

/// Shape of the table-name lookup used by column listing.
pub const COLUMNS_TABLE_NAME: [&str; 1] = ["tbl_name"];

/// Shape of the generated-keys query.
pub const GENERATED_KEYS: [&str; 1] = ["last_insert_rowid()"];

impl MetadataOp {
    pub fn name(self) -> &'static str {
        self.into()
    }

    /// Slot in a table sized by `MetadataOp::COUNT`.
    pub fn slot(self) -> usize {
        self as usize
    }

    /// Whether the query text is independent of probe results and arguments.
    ///
    /// Only these operations may be compiled once and reused.
    pub fn is_cacheable(self) -> bool {
        use MetadataOp::*;
        match self {
            TableTypes | TypeInfo | ColumnsTableName | GeneratedKeys => true,
            op => op.is_always_empty(),
        }
    }

    /// Operations with no engine support, answered with zero rows.
    pub fn is_always_empty(self) -> bool {
        use MetadataOp::*;
        matches!(
            self,
            VersionColumns
                | Procedures
                | ProcedureColumns
                | Attributes
                | Schemas
                | Catalogs
                | TablePrivileges
                | ColumnPrivileges
                | SuperTables
                | SuperTypes
                | Udts
        )
    }

    /// The documented column list of the operation's result.
    pub fn shape(self) -> &'static [&'static str] {
        use MetadataOp::*;
        match self {
            Tables => &shapes::TABLES,
            TableTypes => &shapes::TABLE_TYPES,
            Columns => &shapes::COLUMNS,
            ColumnsTableName => &COLUMNS_TABLE_NAME,
            PrimaryKeys => &shapes::PRIMARY_KEYS,
            ImportedKeys | ExportedKeys | CrossReference => &shapes::CROSS_REFERENCE,
            IndexInfo => &shapes::INDEX_INFO,
            BestRowIdentifier | VersionColumns => &shapes::BEST_ROW,
            TypeInfo => &shapes::TYPE_INFO,
            Procedures => &shapes::PROCEDURES,
            ProcedureColumns => &shapes::PROCEDURE_COLUMNS,
            Attributes => &shapes::ATTRIBUTES,
            Schemas => &shapes::SCHEMAS,
            Catalogs => &shapes::CATALOGS,
            TablePrivileges => &shapes::TABLE_PRIVILEGES,
            ColumnPrivileges => &shapes::COLUMN_PRIVILEGES,
            SuperTables => &shapes::SUPER_TABLES,
            SuperTypes => &shapes::SUPER_TYPES,
            Udts => &shapes::UDTS,
            GeneratedKeys => &GENERATED_KEYS,
        }
    }
}

impl std::fmt::Display for MetadataOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Static nullability classification of a result column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum Nullability {
    NoNulls = 0,
    Nullable = 1,
    Unknown = 2,
}

impl Nullability {
    /// Classify a projected expression.
    ///
    /// `NULL` literals are nullable, other literals never are, and anything
    /// read from a source relation is unknown.
    pub fn of(expr: &Expr) -> Self {
        if expr.is_null_literal() {
            Nullability::Nullable
        } else if expr.is_value_literal() {
            Nullability::NoNulls
        } else {
            Nullability::Unknown
        }
    }

    pub fn code(self) -> i32 {
        self as i32
    }
}

/// A virtual relation: the query that produces it, tagged with its operation.
#[derive(Debug, Clone, PartialEq)]
pub struct SyntheticRelation {
    pub op: MetadataOp,
    pub query: Query,
}

impl SyntheticRelation {
    pub fn new(op: MetadataOp, query: Query) -> Self {
        let relation = Self { op, query };
        debug_assert_eq!(
            relation.columns(),
            op.shape(),
            "projection of {op} drifted from its shape"
        );
        relation
    }

    /// Result column names, in projection order.
    pub fn columns(&self) -> Vec<&str> {
        self.query
            .output_names()
            .into_iter()
            .map(|name| name.unwrap_or(""))
            .collect()
    }

    /// Per-column nullability, read off the outermost projection.
    pub fn nullability(&self) -> Vec<Nullability> {
        let mut query = &self.query;
        while let Some(op) = &query.set_op {
            query = op.left.as_ref();
        }
        query.select.iter().map(|item| Nullability::of(&item.expr)).collect()
    }

    pub fn to_sql(&self) -> String {
        self.query.to_sql(Dialect::Sqlite)
    }

    pub fn to_sql_for(&self, dialect: Dialect) -> String {
        self.query.to_sql(dialect)
    }
}
