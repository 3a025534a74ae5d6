//! Catalog probe: the engine's introspection commands as typed descriptors.
//!
//! The probe is read-only. A table or index that does not exist yields an
//! empty vector, never an error; only genuine engine failures propagate.

use rusqlite::{Connection, Row};
use tracing::trace;

use crate::error::MetaResult;
use crate::sql::{col, escape, lit_str, ExprExt, OrderByExpr, Query, TableRef};

/// One column of a table, as declared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDescriptor {
    pub ordinal_position: i64,
    pub name: String,
    /// Declared type text; `None` for untyped columns.
    pub declared_type: Option<String>,
    /// `None` when the engine reports no flag at all.
    pub not_null: Option<bool>,
    pub is_primary_key_part: bool,
    /// Default expression text as written in the declaration.
    pub default_value: Option<String>,
}

/// How an index came to exist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IndexOrigin {
    /// `CREATE INDEX`
    Created,
    /// `UNIQUE` constraint
    Unique,
    /// `PRIMARY KEY` constraint
    PrimaryKey,
    Other(String),
}

impl IndexOrigin {
    fn parse(origin: Option<&str>) -> Self {
        match origin {
            Some("c") | None => IndexOrigin::Created,
            Some("u") => IndexOrigin::Unique,
            Some("pk") => IndexOrigin::PrimaryKey,
            Some(other) => IndexOrigin::Other(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexDescriptor {
    pub name: String,
    pub is_unique: bool,
    pub origin: IndexOrigin,
}

impl IndexDescriptor {
    /// Indexes the engine creates for `PRIMARY KEY`/`UNIQUE` constraints.
    pub fn is_auto_index(&self) -> bool {
        self.name.starts_with("sqlite_autoindex_")
    }
}

/// One key column of an index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexColumn {
    pub ordinal: i64,
    /// `None` for expression columns.
    pub column_name: Option<String>,
}

/// One column pair of a foreign key constraint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForeignKeyEdge {
    pub source_table: String,
    pub target_table: String,
    pub source_column: String,
    /// `None` when the constraint references the target's primary key implicitly.
    pub target_column: Option<String>,
    pub sequence: i64,
}

/// Read access to the engine catalog.
pub trait CatalogProbe {
    /// Columns of `table` in declaration order.
    fn columns_of(&self, table: &str) -> MetaResult<Vec<ColumnDescriptor>>;

    /// Indexes defined on `table`.
    fn index_list(&self, table: &str) -> MetaResult<Vec<IndexDescriptor>>;

    /// Key columns of `index`, in index order.
    fn index_columns(&self, index: &str) -> MetaResult<Vec<IndexColumn>>;

    /// Foreign key edges declared by `table`.
    fn foreign_keys_of(&self, table: &str) -> MetaResult<Vec<ForeignKeyEdge>>;

    /// Names of every base table, persistent and temporary.
    fn table_names(&self) -> MetaResult<Vec<String>>;

    /// Index list followed by one index-column probe per index.
    fn indexes_of(&self, table: &str) -> MetaResult<Vec<(IndexDescriptor, Vec<IndexColumn>)>> {
        self.index_list(table)?
            .into_iter()
            .map(|index| {
                let columns = self.index_columns(&index.name)?;
                Ok((index, columns))
            })
            .collect()
    }
}

impl CatalogProbe for Connection {
    fn columns_of(&self, table: &str) -> MetaResult<Vec<ColumnDescriptor>> {
        pragma(self, "table_info", table, |row| {
            let declared: Option<String> = row.get("type")?;
            let not_null: Option<i64> = row.get("notnull")?;
            let pk: Option<i64> = row.get("pk")?;
            Ok(ColumnDescriptor {
                ordinal_position: row.get("cid")?,
                name: row.get("name")?,
                declared_type: declared.filter(|t| !t.is_empty()),
                not_null: not_null.map(|flag| flag != 0),
                is_primary_key_part: pk.unwrap_or(0) > 0,
                default_value: row.get("dflt_value")?,
            })
        })
    }

    fn index_list(&self, table: &str) -> MetaResult<Vec<IndexDescriptor>> {
        pragma(self, "index_list", table, |row| {
            let origin: Option<String> = row.get("origin")?;
            let unique: Option<i64> = row.get("unique")?;
            Ok(IndexDescriptor {
                name: row.get("name")?,
                is_unique: unique.unwrap_or(0) != 0,
                origin: IndexOrigin::parse(origin.as_deref()),
            })
        })
    }

    fn index_columns(&self, index: &str) -> MetaResult<Vec<IndexColumn>> {
        pragma(self, "index_info", index, |row| {
            Ok(IndexColumn {
                ordinal: row.get("seqno")?,
                column_name: row.get("name")?,
            })
        })
    }

    fn foreign_keys_of(&self, table: &str) -> MetaResult<Vec<ForeignKeyEdge>> {
        pragma(self, "foreign_key_list", table, |row| {
            Ok(ForeignKeyEdge {
                source_table: table.to_string(),
                target_table: row.get("table")?,
                source_column: row.get("from")?,
                target_column: row.get("to")?,
                sequence: row.get("seq")?,
            })
        })
    }

    fn table_names(&self) -> MetaResult<Vec<String>> {
        let arm = |catalog: &str| {
            Query::new()
                .select(vec![col("name")])
                .from(TableRef::new(catalog))
                .filter(col("type").eq(lit_str("table")))
        };
        let query = arm("sqlite_master")
            .union_all(arm("sqlite_temp_master"))
            .into_query();
        let query = Query::new()
            .select(vec![col("name")])
            .from_derived(query)
            .order_by(vec![OrderByExpr::new(col("name"))]);

        let sql = query.to_string();
        trace!(%sql, "probing table names");
        let mut stmt = self.prepare(&sql)?;
        let names = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(names)
    }
}

/// Run `PRAGMA name('arg')` and map each row.
fn pragma<T>(
    conn: &Connection,
    name: &str,
    arg: &str,
    map: impl FnMut(&Row<'_>) -> rusqlite::Result<T>,
) -> MetaResult<Vec<T>> {
    let sql = format!("PRAGMA {}({})", name, escape(arg));
    trace!(%sql, "catalog probe");
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map([], map)?.collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}
