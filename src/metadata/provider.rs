//! DatabaseMetadata: the entry point for metadata requests.
//!
//! Every request is validated, synthesized into a [`SyntheticRelation`] under
//! the session lock, executed, and handed back as a [`MetadataCursor`].
//! Shape-stable operations go through the statement cache instead of being
//! rebuilt.

use std::sync::Arc;

use rusqlite::ToSql;

use super::builder;
use super::relation::{MetadataOp, SyntheticRelation};
use crate::cache::CompiledStatement;
use crate::cursor::MetadataCursor;
use crate::engine::{self, Session};
use crate::error::{MetaError, MetaResult};
use crate::sql::Dialect;

/// Scope argument of the best row identifier request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(i32)]
pub enum BestRowScope {
    Temporary = 0,
    #[default]
    Transaction = 1,
    Session = 2,
}

impl BestRowScope {
    pub fn code(self) -> i32 {
        self as i32
    }
}

/// A metadata request with its arguments.
///
/// Table-name fields marked as exact reject `Some("")`; pattern fields treat
/// it like `None`.
#[derive(Debug, Clone, PartialEq)]
pub enum MetadataRequest {
    Tables {
        pattern: Option<String>,
        types: Option<Vec<String>>,
    },
    TableTypes,
    Columns {
        table_pattern: Option<String>,
        column_pattern: Option<String>,
    },
    /// Exact table name.
    PrimaryKeys { table: Option<String> },
    /// Exact table name.
    ImportedKeys { table: Option<String> },
    /// Exact table name.
    ExportedKeys { table: Option<String> },
    /// Exact table names.
    CrossReference {
        primary: Option<String>,
        foreign: Option<String>,
    },
    /// Exact table name.
    IndexInfo {
        table: Option<String>,
        unique_only: bool,
    },
    /// Exact table name.
    BestRowIdentifier {
        table: Option<String>,
        scope: BestRowScope,
        nullable: bool,
    },
    TypeInfo,
    /// An operation with no engine support; always zero rows.
    Empty(MetadataOp),
    GeneratedKeys,
}

fn exact(value: &Option<String>, argument: &str) -> MetaResult<()> {
    match value.as_deref() {
        Some("") => Err(MetaError::MalformedArgument(format!(
            "{argument} must not be empty"
        ))),
        _ => Ok(()),
    }
}

fn like_pattern(pattern: &Option<String>) -> &str {
    match pattern.as_deref() {
        None | Some("") => "%",
        Some(p) => p,
    }
}

impl MetadataRequest {
    pub fn op(&self) -> MetadataOp {
        match self {
            MetadataRequest::Tables { .. } => MetadataOp::Tables,
            MetadataRequest::TableTypes => MetadataOp::TableTypes,
            MetadataRequest::Columns { .. } => MetadataOp::Columns,
            MetadataRequest::PrimaryKeys { .. } => MetadataOp::PrimaryKeys,
            MetadataRequest::ImportedKeys { .. } => MetadataOp::ImportedKeys,
            MetadataRequest::ExportedKeys { .. } => MetadataOp::ExportedKeys,
            MetadataRequest::CrossReference { .. } => MetadataOp::CrossReference,
            MetadataRequest::IndexInfo { .. } => MetadataOp::IndexInfo,
            MetadataRequest::BestRowIdentifier { .. } => MetadataOp::BestRowIdentifier,
            MetadataRequest::TypeInfo => MetadataOp::TypeInfo,
            MetadataRequest::Empty(op) => *op,
            MetadataRequest::GeneratedKeys => MetadataOp::GeneratedKeys,
        }
    }

    /// Reject structurally invalid arguments before any engine call.
    pub fn validate(&self) -> MetaResult<()> {
        match self {
            MetadataRequest::PrimaryKeys { table }
            | MetadataRequest::ImportedKeys { table }
            | MetadataRequest::ExportedKeys { table }
            | MetadataRequest::IndexInfo { table, .. }
            | MetadataRequest::BestRowIdentifier { table, .. } => exact(table, "table"),
            MetadataRequest::CrossReference { primary, foreign } => {
                exact(primary, "primary table")?;
                exact(foreign, "foreign table")
            }
            MetadataRequest::Empty(op) if !op.is_always_empty() => Err(
                MetaError::MalformedArgument(format!("{op} is not an always-empty operation")),
            ),
            _ => Ok(()),
        }
    }
}

/// Render and prepare a shape-stable relation for the statement cache.
fn compile(conn: &rusqlite::Connection, op: MetadataOp) -> MetaResult<CompiledStatement> {
    let relation = builder::fixed(op).ok_or(MetaError::NotImplemented("uncached operation"))?;
    let compiled = CompiledStatement::new(&relation);
    conn.prepare_cached(&compiled.sql)?;
    Ok(compiled)
}

/// Metadata requests against one connection.
#[derive(Clone)]
pub struct DatabaseMetadata {
    session: Arc<Session>,
}

impl std::fmt::Debug for DatabaseMetadata {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatabaseMetadata")
            .field("closed", &self.session.is_closed())
            .finish()
    }
}

impl DatabaseMetadata {
    pub(crate) fn new(session: Arc<Session>) -> Self {
        Self { session }
    }

    // =========================================================================
    // Request execution
    // =========================================================================

    /// Execute `request` and return a cursor over its rows.
    pub fn query(&self, request: &MetadataRequest) -> MetaResult<MetadataCursor> {
        request.validate()?;
        let op = request.op();

        let (engine, nullability) = self.session.with_conn(|conn| {
            if op.is_cacheable() {
                let compiled = self.compiled(conn, op)?;
                let engine = engine::run(conn, &compiled.sql, &[], true)?;
                Ok((engine, compiled.nullability))
            } else {
                let relation = self.build(conn, request)?;
                let engine = engine::run(conn, &relation.to_sql(), &[], false)?;
                Ok((engine, relation.nullability().into()))
            }
        })?;

        Ok(MetadataCursor::new(
            Arc::clone(&self.session),
            engine,
            nullability,
        ))
    }

    /// The SQL that `request` would execute, rendered for `dialect`.
    ///
    /// Probe-dependent requests still read the catalog to build their text.
    pub fn explain(&self, request: &MetadataRequest, dialect: Dialect) -> MetaResult<String> {
        request.validate()?;
        self.session
            .with_conn(|conn| Ok(self.build(conn, request)?.to_sql_for(dialect)))
    }

    fn compiled(&self, conn: &rusqlite::Connection, op: MetadataOp) -> MetaResult<CompiledStatement> {
        self.session.cache().get_or_compile(op, || compile(conn, op))
    }

    fn build(&self, conn: &rusqlite::Connection, request: &MetadataRequest) -> MetaResult<SyntheticRelation> {
        match request {
            MetadataRequest::Tables { pattern, types } => {
                let types = match types {
                    Some(types) if !types.is_empty() => types.clone(),
                    _ => self.session.settings().default_table_types.clone(),
                };
                Ok(builder::tables(like_pattern(pattern), &types))
            }
            MetadataRequest::Columns {
                table_pattern,
                column_pattern,
            } => {
                let table = self.resolve_table(conn, like_pattern(table_pattern))?;
                builder::columns(conn, table.as_deref(), column_pattern.as_deref())
            }
            MetadataRequest::PrimaryKeys { table } => builder::primary_keys(conn, table.as_deref()),
            MetadataRequest::ImportedKeys { table } => builder::imported_keys(conn, table.as_deref()),
            MetadataRequest::ExportedKeys { table } => builder::exported_keys(conn, table.as_deref()),
            MetadataRequest::CrossReference { primary, foreign } => {
                builder::cross_reference(conn, primary.as_deref(), foreign.as_deref())
            }
            MetadataRequest::IndexInfo { table, unique_only } => {
                builder::index_info(conn, table.as_deref(), *unique_only)
            }
            MetadataRequest::BestRowIdentifier {
                table,
                scope,
                nullable,
            } => builder::best_row_identifier(conn, table.as_deref(), scope.code(), *nullable),
            MetadataRequest::TableTypes
            | MetadataRequest::TypeInfo
            | MetadataRequest::Empty(_)
            | MetadataRequest::GeneratedKeys => builder::fixed(request.op())
                .ok_or(MetaError::NotImplemented("uncached operation")),
        }
    }

    /// First catalog table whose name matches `pattern`.
    fn resolve_table(&self, conn: &rusqlite::Connection, pattern: &str) -> MetaResult<Option<String>> {
        let compiled = self.compiled(conn, MetadataOp::ColumnsTableName)?;
        let params: [&dyn ToSql; 1] = [&pattern];
        let mut rows = engine::run(conn, &compiled.sql, &params, true)?;
        Ok(rows
            .next_row()
            .and_then(|row| row.into_iter().next())
            .and_then(|value| value.as_string()))
    }

    // =========================================================================
    // Catalog relations
    // =========================================================================

    /// Tables and views matching `pattern`, restricted to `types`.
    ///
    /// A missing or empty pattern matches every name; missing or empty types
    /// fall back to the configured defaults.
    pub fn get_tables(&self, pattern: Option<&str>, types: Option<&[&str]>) -> MetaResult<MetadataCursor> {
        self.query(&MetadataRequest::Tables {
            pattern: pattern.map(str::to_string),
            types: types.map(|types| types.iter().map(|t| t.to_string()).collect()),
        })
    }

    pub fn get_table_types(&self) -> MetaResult<MetadataCursor> {
        self.query(&MetadataRequest::TableTypes)
    }

    /// Columns of the first table matching `table_pattern`.
    pub fn get_columns(
        &self,
        table_pattern: Option<&str>,
        column_pattern: Option<&str>,
    ) -> MetaResult<MetadataCursor> {
        self.query(&MetadataRequest::Columns {
            table_pattern: table_pattern.map(str::to_string),
            column_pattern: column_pattern.map(str::to_string),
        })
    }

    pub fn get_primary_keys(&self, table: Option<&str>) -> MetaResult<MetadataCursor> {
        self.query(&MetadataRequest::PrimaryKeys {
            table: table.map(str::to_string),
        })
    }

    pub fn get_imported_keys(&self, table: Option<&str>) -> MetaResult<MetadataCursor> {
        self.query(&MetadataRequest::ImportedKeys {
            table: table.map(str::to_string),
        })
    }

    pub fn get_exported_keys(&self, table: Option<&str>) -> MetaResult<MetadataCursor> {
        self.query(&MetadataRequest::ExportedKeys {
            table: table.map(str::to_string),
        })
    }

    pub fn get_cross_reference(
        &self,
        primary: Option<&str>,
        foreign: Option<&str>,
    ) -> MetaResult<MetadataCursor> {
        self.query(&MetadataRequest::CrossReference {
            primary: primary.map(str::to_string),
            foreign: foreign.map(str::to_string),
        })
    }

    pub fn get_index_info(&self, table: Option<&str>, unique_only: bool) -> MetaResult<MetadataCursor> {
        self.query(&MetadataRequest::IndexInfo {
            table: table.map(str::to_string),
            unique_only,
        })
    }

    pub fn get_best_row_identifier(
        &self,
        table: Option<&str>,
        scope: BestRowScope,
        nullable: bool,
    ) -> MetaResult<MetadataCursor> {
        self.query(&MetadataRequest::BestRowIdentifier {
            table: table.map(str::to_string),
            scope,
            nullable,
        })
    }

    pub fn get_type_info(&self) -> MetaResult<MetadataCursor> {
        self.query(&MetadataRequest::TypeInfo)
    }

    // =========================================================================
    // Always-empty relations
    // =========================================================================

    fn empty(&self, op: MetadataOp) -> MetaResult<MetadataCursor> {
        self.query(&MetadataRequest::Empty(op))
    }

    pub fn get_version_columns(&self) -> MetaResult<MetadataCursor> {
        self.empty(MetadataOp::VersionColumns)
    }

    pub fn get_procedures(&self) -> MetaResult<MetadataCursor> {
        self.empty(MetadataOp::Procedures)
    }

    pub fn get_procedure_columns(&self) -> MetaResult<MetadataCursor> {
        self.empty(MetadataOp::ProcedureColumns)
    }

    pub fn get_attributes(&self) -> MetaResult<MetadataCursor> {
        self.empty(MetadataOp::Attributes)
    }

    pub fn get_schemas(&self) -> MetaResult<MetadataCursor> {
        self.empty(MetadataOp::Schemas)
    }

    pub fn get_catalogs(&self) -> MetaResult<MetadataCursor> {
        self.empty(MetadataOp::Catalogs)
    }

    pub fn get_table_privileges(&self) -> MetaResult<MetadataCursor> {
        self.empty(MetadataOp::TablePrivileges)
    }

    pub fn get_column_privileges(&self) -> MetaResult<MetadataCursor> {
        self.empty(MetadataOp::ColumnPrivileges)
    }

    pub fn get_super_tables(&self) -> MetaResult<MetadataCursor> {
        self.empty(MetadataOp::SuperTables)
    }

    pub fn get_super_types(&self) -> MetaResult<MetadataCursor> {
        self.empty(MetadataOp::SuperTypes)
    }

    pub fn get_udts(&self) -> MetaResult<MetadataCursor> {
        self.empty(MetadataOp::Udts)
    }

    // =========================================================================
    // Not implemented
    // =========================================================================

    fn not_implemented(&self, what: &'static str) -> MetaResult<MetadataCursor> {
        self.session.ensure_open()?;
        Err(MetaError::NotImplemented(what))
    }

    pub fn get_functions(&self) -> MetaResult<MetadataCursor> {
        self.not_implemented("functions")
    }

    pub fn get_function_columns(&self) -> MetaResult<MetadataCursor> {
        self.not_implemented("function columns")
    }

    pub fn get_pseudo_columns(&self) -> MetaResult<MetadataCursor> {
        self.not_implemented("pseudo columns")
    }

    pub fn get_client_info_properties(&self) -> MetaResult<MetadataCursor> {
        self.not_implemented("client info properties")
    }

    // =========================================================================
    // Scalar facts
    // =========================================================================

    pub fn database_product_name(&self) -> &'static str {
        "SQLite"
    }

    /// Version of the linked engine library.
    pub fn database_product_version(&self) -> &'static str {
        rusqlite::version()
    }

    pub fn driver_name(&self) -> &'static str {
        "litemeta"
    }

    pub fn driver_version(&self) -> &'static str {
        env!("CARGO_PKG_VERSION")
    }
}
