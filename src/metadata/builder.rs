//! Virtual relation builder.
//!
//! Each operation projects a fixed outer column list over a derived table.
//! The derived table is a `UNION ALL` of one literal arm per probed fact; when
//! there are no facts it is a single all-`NULL` arm and the outer query is
//! capped with `LIMIT 0`, so the result shape never depends on the data.
//!
//! A compound SELECT may hold at most [`MAX_COMPOUND_TERMS`] arms. Larger
//! fact sets are unioned in groups, each group wrapped in its own derived
//! table.

use super::probe::{CatalogProbe, ColumnDescriptor, ForeignKeyEdge, IndexOrigin};
use super::relation::{MetadataOp, SyntheticRelation};
use super::types::{codes, to_canonical_type, to_portable_code, TYPE_ENTRIES};
use crate::error::MetaResult;
use crate::sql::{
    case_of, col, func, lit_int, lit_null, lit_opt_str, lit_str, param, upper, Expr, ExprExt,
    OrderByExpr, Query, SelectExpr, TableRef,
};

/// Nominal size reported for every column; the engine imposes none.
const COLUMN_SIZE: i64 = 2_000_000_000;

const CATALOG_TABLES: [&str; 2] = ["sqlite_master", "sqlite_temp_master"];

/// Engine default for `SQLITE_MAX_COMPOUND_SELECT`.
pub const MAX_COMPOUND_TERMS: usize = 500;

// =============================================================================
// Assembly helpers
// =============================================================================

fn null_as(name: &str) -> SelectExpr {
    lit_null().alias(name)
}

fn nulls(names: &[&str]) -> Vec<SelectExpr> {
    names.iter().map(|name| null_as(name)).collect()
}

fn order_by(names: &[&str]) -> Vec<OrderByExpr> {
    names.iter().map(|name| OrderByExpr::new(col(name))).collect()
}

/// Union `arms` without any single compound exceeding [`MAX_COMPOUND_TERMS`].
fn fact_source(arms: Vec<Query>, arm_columns: &[&str]) -> Option<Query> {
    if arms.len() <= MAX_COMPOUND_TERMS {
        return Query::union_all_of(arms);
    }

    let mut arms = arms.into_iter().peekable();
    let mut groups = Vec::new();
    while arms.peek().is_some() {
        let group: Vec<Query> = arms.by_ref().take(MAX_COMPOUND_TERMS).collect();
        if let Some(union) = Query::union_all_of(group) {
            let projection: Vec<Expr> = arm_columns.iter().map(|c| col(c)).collect();
            groups.push(Query::new().select(projection).from_derived(union));
        }
    }
    fact_source(groups, arm_columns)
}

/// Project `outer` over the union of `arms`, or over an empty source when
/// there are none.
fn derive(outer: Vec<SelectExpr>, arms: Vec<Query>, arm_columns: &[&str], order: &[&str]) -> Query {
    let query = Query::new().select(outer);
    match fact_source(arms, arm_columns) {
        Some(source) => query.from_derived(source).order_by(order_by(order)),
        None => query
            .from_derived(Query::new().select(nulls(arm_columns)))
            .limit(0),
    }
}

/// Both object catalogs as one source with the given columns.
fn catalog_source(columns: &[&str]) -> Query {
    let arms = CATALOG_TABLES
        .iter()
        .map(|table| {
            let projection: Vec<Expr> = columns.iter().map(|c| col(c)).collect();
            Query::new().select(projection).from(TableRef::new(table))
        })
        .collect();
    // Two fixed arms; the fold always yields a query.
    Query::union_all_of(arms).unwrap_or_default()
}

/// A relation with the operation's shape and no rows.
pub fn empty(op: MetadataOp) -> SyntheticRelation {
    SyntheticRelation::new(op, Query::new().select(nulls(op.shape())).limit(0))
}

// =============================================================================
// Tables
// =============================================================================

/// Tables and views whose name matches `pattern` and whose type is in `types`.
///
/// The pattern is used as given; callers normalize an absent pattern to `%`.
pub fn tables(pattern: &str, types: &[String]) -> SyntheticRelation {
    let type_list = types
        .iter()
        .map(|t| lit_str(&t.to_uppercase()))
        .collect();

    let query = Query::new()
        .select(vec![
            null_as("TABLE_CAT"),
            null_as("TABLE_SCHEM"),
            col("name").alias("TABLE_NAME"),
            upper(col("type")).alias("TABLE_TYPE"),
            null_as("REMARKS"),
            null_as("TYPE_CAT"),
            null_as("TYPE_SCHEM"),
            null_as("TYPE_NAME"),
            null_as("SELF_REFERENCING_COL_NAME"),
            null_as("REF_GENERATION"),
        ])
        .from_derived(catalog_source(&["name", "type"]))
        .filter(col("name").like(lit_str(pattern)))
        .filter(upper(col("type")).in_list(type_list))
        .order_by(order_by(&["TABLE_TYPE", "TABLE_SCHEM", "TABLE_NAME"]));

    SyntheticRelation::new(MetadataOp::Tables, query)
}

pub fn table_types() -> SyntheticRelation {
    let arms = ["TABLE", "VIEW"]
        .iter()
        .map(|t| Query::new().select(vec![lit_str(t).alias("tt")]))
        .collect();
    let query = derive(vec![col("tt").alias("TABLE_TYPE")], arms, &["tt"], &["TABLE_TYPE"]);
    SyntheticRelation::new(MetadataOp::TableTypes, query)
}

// =============================================================================
// Columns
// =============================================================================

/// Parameterized lookup of the first catalog entry whose table name matches `?1`.
pub fn columns_table_name() -> SyntheticRelation {
    let query = Query::new()
        .select(vec![col("tbl_name")])
        .from_derived(catalog_source(&["tbl_name"]))
        .filter(col("tbl_name").like(param(1)))
        .limit(1);
    SyntheticRelation::new(MetadataOp::ColumnsTableName, query)
}

fn column_nullability(column: &ColumnDescriptor) -> i64 {
    match column.not_null {
        Some(true) => codes::COLUMN_NO_NULLS as i64,
        Some(false) => codes::COLUMN_NULLABLE as i64,
        None => codes::COLUMN_NULLABLE_UNKNOWN as i64,
    }
}

fn column_arm(column: &ColumnDescriptor) -> Query {
    let type_name = to_canonical_type(column.declared_type.as_deref());
    Query::new().select(vec![
        lit_int(column.ordinal_position).alias("ordpos"),
        lit_int(column_nullability(column)).alias("colnullable"),
        lit_int(to_portable_code(&type_name) as i64).alias("ct"),
        lit_str(&column.name).alias("cn"),
        lit_str(&type_name).alias("tn"),
        lit_opt_str(column.default_value.as_deref()).alias("cdflt"),
    ])
}

/// Columns of the already-resolved `table`, optionally filtered by a
/// case-insensitive `LIKE` on the column name.
pub fn columns<P: CatalogProbe + ?Sized>(
    probe: &P,
    table: Option<&str>,
    column_pattern: Option<&str>,
) -> MetaResult<SyntheticRelation> {
    let arms = match table {
        Some(table) => probe.columns_of(table)?.iter().map(column_arm).collect(),
        None => Vec::new(),
    };

    let outer = vec![
        null_as("TABLE_CAT"),
        null_as("TABLE_SCHEM"),
        lit_opt_str(table).alias("TABLE_NAME"),
        col("cn").alias("COLUMN_NAME"),
        col("ct").alias("DATA_TYPE"),
        col("tn").alias("TYPE_NAME"),
        lit_int(COLUMN_SIZE).alias("COLUMN_SIZE"),
        lit_int(COLUMN_SIZE).alias("BUFFER_LENGTH"),
        lit_int(10).alias("DECIMAL_DIGITS"),
        lit_int(10).alias("NUM_PREC_RADIX"),
        col("colnullable").alias("NULLABLE"),
        null_as("REMARKS"),
        col("cdflt").alias("COLUMN_DEF"),
        lit_int(0).alias("SQL_DATA_TYPE"),
        lit_int(0).alias("SQL_DATETIME_SUB"),
        lit_int(COLUMN_SIZE).alias("CHAR_OCTET_LENGTH"),
        col("ordpos").alias("ORDINAL_POSITION"),
        case_of(
            col("colnullable"),
            vec![(lit_int(0), lit_str("N")), (lit_int(1), lit_str("Y"))],
            lit_str(""),
        )
        .alias("IS_NULLABLE"),
        null_as("SCOPE_CATLOG"),
        null_as("SCOPE_SCHEMA"),
        null_as("SCOPE_TABLE"),
        null_as("SOURCE_DATA_TYPE"),
    ];

    let mut query = derive(
        outer,
        arms,
        &["ordpos", "colnullable", "ct", "cn", "tn", "cdflt"],
        &["TABLE_SCHEM", "TABLE_NAME", "ORDINAL_POSITION"],
    );
    if let Some(pattern) = column_pattern {
        query = query.filter(upper(col("cn")).like(upper(lit_str(pattern))));
    }

    Ok(SyntheticRelation::new(MetadataOp::Columns, query))
}

// =============================================================================
// Primary keys
// =============================================================================

fn key_arm(column: Option<&str>, seqno: i64) -> Query {
    Query::new().select(vec![
        lit_opt_str(column).alias("cn"),
        lit_int(seqno).alias("seqno"),
    ])
}

/// Primary key columns of `table` with their key sequence.
///
/// A single key column has sequence 0. A composite key is read from the
/// unique index backing the constraint, so the sequence is the declared key
/// order rather than the column order. Tables without a declared key have
/// no key columns.
fn key_columns<P: CatalogProbe + ?Sized>(
    probe: &P,
    table: &str,
) -> MetaResult<Vec<(Option<String>, i64)>> {
    let declared: Vec<ColumnDescriptor> = probe
        .columns_of(table)?
        .into_iter()
        .filter(|c| c.is_primary_key_part)
        .collect();

    match declared.as_slice() {
        [] => Ok(Vec::new()),
        [only] => Ok(vec![(Some(only.name.clone()), 0)]),
        _ => {
            let indexes = probe.index_list(table)?;
            let backing = indexes
                .iter()
                .find(|i| i.is_unique && i.origin == IndexOrigin::PrimaryKey)
                .or_else(|| indexes.iter().find(|i| i.is_unique && i.is_auto_index()));
            match backing {
                Some(index) => Ok(probe
                    .index_columns(&index.name)?
                    .into_iter()
                    .map(|column| (column.column_name, column.ordinal))
                    .collect()),
                None => Ok(Vec::new()),
            }
        }
    }
}

/// Declared primary key of `table`, one row per key column.
pub fn primary_keys<P: CatalogProbe + ?Sized>(
    probe: &P,
    table: Option<&str>,
) -> MetaResult<SyntheticRelation> {
    let arms = match table {
        Some(table) => key_columns(probe, table)?
            .iter()
            .map(|(name, seqno)| key_arm(name.as_deref(), *seqno))
            .collect(),
        None => Vec::new(),
    };

    let outer = vec![
        null_as("TABLE_CAT"),
        null_as("TABLE_SCHEM"),
        lit_opt_str(table).alias("TABLE_NAME"),
        col("cn").alias("COLUMN_NAME"),
        col("seqno").alias("KEY_SEQ"),
        null_as("PK_NAME"),
    ];
    let query = derive(outer, arms, &["cn", "seqno"], &["COLUMN_NAME"]);
    Ok(SyntheticRelation::new(MetadataOp::PrimaryKeys, query))
}

// =============================================================================
// Foreign keys
// =============================================================================

/// Column the edge points at. An implicit reference resolves to the target's
/// primary key column at the edge's position in the key.
fn target_column<P: CatalogProbe + ?Sized>(
    probe: &P,
    edge: &ForeignKeyEdge,
) -> MetaResult<Option<String>> {
    if edge.target_column.is_some() {
        return Ok(edge.target_column.clone());
    }
    Ok(key_columns(probe, &edge.target_table)?
        .into_iter()
        .find(|(_, seqno)| *seqno == edge.sequence)
        .and_then(|(name, _)| name))
}

fn edge_arms<P: CatalogProbe + ?Sized>(probe: &P, edges: &[ForeignKeyEdge]) -> MetaResult<Vec<Query>> {
    edges
        .iter()
        .map(|edge| {
            let target = target_column(probe, edge)?;
            Ok(Query::new().select(vec![
                lit_str(&edge.target_table).alias("pt"),
                lit_opt_str(target.as_deref()).alias("pc"),
                lit_str(&edge.source_table).alias("ft"),
                lit_str(&edge.source_column).alias("fc"),
                lit_int(edge.sequence).alias("seq"),
            ]))
        })
        .collect()
}

fn key_relation(op: MetadataOp, arms: Vec<Query>, order: &[&str]) -> SyntheticRelation {
    let outer = vec![
        null_as("PKTABLE_CAT"),
        null_as("PKTABLE_SCHEM"),
        col("pt").alias("PKTABLE_NAME"),
        col("pc").alias("PKCOLUMN_NAME"),
        null_as("FKTABLE_CAT"),
        null_as("FKTABLE_SCHEM"),
        col("ft").alias("FKTABLE_NAME"),
        col("fc").alias("FKCOLUMN_NAME"),
        col("seq").alias("KEY_SEQ"),
        lit_int(codes::IMPORTED_KEY_NO_ACTION as i64).alias("UPDATE_RULE"),
        lit_int(codes::IMPORTED_KEY_NO_ACTION as i64).alias("DELETE_RULE"),
        null_as("FK_NAME"),
        null_as("PK_NAME"),
        lit_int(codes::IMPORTED_KEY_NOT_DEFERRABLE as i64).alias("DEFERRABILITY"),
    ];
    let query = derive(outer, arms, &["pt", "pc", "ft", "fc", "seq"], order);
    SyntheticRelation::new(op, query)
}

const PRIMARY_ORDER: [&str; 4] = ["PKTABLE_CAT", "PKTABLE_SCHEM", "PKTABLE_NAME", "KEY_SEQ"];
const FOREIGN_ORDER: [&str; 4] = ["FKTABLE_CAT", "FKTABLE_SCHEM", "FKTABLE_NAME", "KEY_SEQ"];

/// Keys `table` imports: every foreign key edge it declares.
pub fn imported_keys<P: CatalogProbe + ?Sized>(
    probe: &P,
    table: Option<&str>,
) -> MetaResult<SyntheticRelation> {
    let edges = match table {
        Some(table) => probe.foreign_keys_of(table)?,
        None => Vec::new(),
    };
    let arms = edge_arms(probe, &edges)?;
    Ok(key_relation(MetadataOp::ImportedKeys, arms, &PRIMARY_ORDER))
}

/// Keys other tables import from `table`, found by scanning every base table.
pub fn exported_keys<P: CatalogProbe + ?Sized>(
    probe: &P,
    table: Option<&str>,
) -> MetaResult<SyntheticRelation> {
    let mut edges = Vec::new();
    if let Some(table) = table {
        for name in probe.table_names()? {
            edges.extend(
                probe
                    .foreign_keys_of(&name)?
                    .into_iter()
                    .filter(|edge| edge.target_table.eq_ignore_ascii_case(table)),
            );
        }
    }
    let arms = edge_arms(probe, &edges)?;
    Ok(key_relation(MetadataOp::ExportedKeys, arms, &FOREIGN_ORDER))
}

/// Edges of `foreign` that reference `primary`; any target when `primary` is absent.
pub fn cross_reference<P: CatalogProbe + ?Sized>(
    probe: &P,
    primary: Option<&str>,
    foreign: Option<&str>,
) -> MetaResult<SyntheticRelation> {
    let edges: Vec<ForeignKeyEdge> = match foreign {
        Some(foreign) => probe
            .foreign_keys_of(foreign)?
            .into_iter()
            .filter(|edge| primary.map_or(true, |p| edge.target_table.eq_ignore_ascii_case(p)))
            .collect(),
        None => Vec::new(),
    };
    let arms = edge_arms(probe, &edges)?;
    Ok(key_relation(MetadataOp::CrossReference, arms, &FOREIGN_ORDER))
}

// =============================================================================
// Indexes
// =============================================================================

/// One row per (index, key column) of `table`.
pub fn index_info<P: CatalogProbe + ?Sized>(
    probe: &P,
    table: Option<&str>,
    unique_only: bool,
) -> MetaResult<SyntheticRelation> {
    let mut arms = Vec::new();
    if let Some(table) = table {
        for (index, columns) in probe.indexes_of(table)? {
            if unique_only && !index.is_unique {
                continue;
            }
            let non_unique = if index.is_unique { 0 } else { 1 };
            for column in columns {
                arms.push(Query::new().select(vec![
                    lit_int(non_unique).alias("nu"),
                    lit_str(&index.name).alias("idx"),
                    lit_int(column.ordinal).alias("seqno"),
                    lit_opt_str(column.column_name.as_deref()).alias("cn"),
                ]));
            }
        }
    }

    let outer = vec![
        null_as("TABLE_CAT"),
        null_as("TABLE_SCHEM"),
        lit_opt_str(table).alias("TABLE_NAME"),
        col("nu").alias("NON_UNIQUE"),
        null_as("INDEX_QUALIFIER"),
        col("idx").alias("INDEX_NAME"),
        lit_int(codes::TABLE_INDEX_OTHER as i64).alias("TYPE"),
        col("seqno").alias("ORDINAL_POSITION"),
        col("cn").alias("COLUMN_NAME"),
        lit_str("A").alias("ASC_OR_DESC"),
        lit_int(0).alias("CARDINALITY"),
        lit_int(0).alias("PAGES"),
        null_as("FILTER_CONDITION"),
    ];
    let query = derive(
        outer,
        arms,
        &["nu", "idx", "seqno", "cn"],
        &["NON_UNIQUE", "TYPE", "INDEX_NAME", "ORDINAL_POSITION"],
    );
    Ok(SyntheticRelation::new(MetadataOp::IndexInfo, query))
}

// =============================================================================
// Row identification
// =============================================================================

fn best_row_arm(name: &str, type_name: &str, pseudo: i32) -> Query {
    Query::new().select(vec![
        lit_str(name).alias("cn"),
        lit_int(to_portable_code(type_name) as i64).alias("ct"),
        lit_str(type_name).alias("tn"),
        lit_int(pseudo as i64).alias("pc"),
    ])
}

/// The column set that best identifies a row of `table`.
///
/// A single eligible primary key column is reported as a real column. In
/// every other case, including a table that does not exist, the engine's
/// `ROWID` pseudo-column is reported. With `nullable` false, primary key
/// columns that admit NULL are not eligible.
pub fn best_row_identifier<P: CatalogProbe + ?Sized>(
    probe: &P,
    table: Option<&str>,
    scope: i32,
    nullable: bool,
) -> MetaResult<SyntheticRelation> {
    let mut arms = Vec::new();
    if let Some(table) = table {
        let eligible: Vec<ColumnDescriptor> = probe
            .columns_of(table)?
            .into_iter()
            .filter(|c| c.is_primary_key_part && (nullable || c.not_null != Some(false)))
            .collect();
        arms.push(match eligible.as_slice() {
            [only] => best_row_arm(
                &only.name,
                &to_canonical_type(only.declared_type.as_deref()),
                codes::BEST_ROW_NOT_PSEUDO,
            ),
            _ => best_row_arm("ROWID", "INTEGER", codes::BEST_ROW_PSEUDO),
        });
    }

    let outer = vec![
        lit_int(scope as i64).alias("SCOPE"),
        col("cn").alias("COLUMN_NAME"),
        col("ct").alias("DATA_TYPE"),
        col("tn").alias("TYPE_NAME"),
        lit_int(10).alias("COLUMN_SIZE"),
        lit_int(0).alias("BUFFER_LENGTH"),
        lit_int(0).alias("DECIMAL_DIGITS"),
        col("pc").alias("PSEUDO_COLUMN"),
    ];
    let query = derive(outer, arms, &["cn", "ct", "tn", "pc"], &["SCOPE"]);
    Ok(SyntheticRelation::new(MetadataOp::BestRowIdentifier, query))
}

// =============================================================================
// Static relations
// =============================================================================

pub fn type_info() -> SyntheticRelation {
    let arms = TYPE_ENTRIES
        .iter()
        .map(|entry| {
            Query::new().select(vec![
                lit_str(entry.sql_type_name).alias("tn"),
                lit_int(entry.portable_type_code as i64).alias("dt"),
                lit_int(entry.nullable_flag as i64).alias("nl"),
                lit_int(entry.searchable_flag as i64).alias("sr"),
            ])
        })
        .collect();

    let outer = vec![
        col("tn").alias("TYPE_NAME"),
        col("dt").alias("DATA_TYPE"),
        lit_int(0).alias("PRECISION"),
        null_as("LITERAL_PREFIX"),
        null_as("LITERAL_SUFFIX"),
        null_as("CREATE_PARAMS"),
        col("nl").alias("NULLABLE"),
        lit_int(1).alias("CASE_SENSITIVE"),
        col("sr").alias("SEARCHABLE"),
        lit_int(0).alias("UNSIGNED_ATTRIBUTE"),
        lit_int(0).alias("FIXED_PREC_SCALE"),
        lit_int(0).alias("AUTO_INCREMENT"),
        null_as("LOCAL_TYPE_NAME"),
        lit_int(0).alias("MINIMUM_SCALE"),
        lit_int(0).alias("MAXIMUM_SCALE"),
        lit_int(0).alias("SQL_DATA_TYPE"),
        lit_int(0).alias("SQL_DATETIME_SUB"),
        lit_int(10).alias("NUM_PREC_RADIX"),
    ];
    let query = derive(outer, arms, &["tn", "dt", "nl", "sr"], &["DATA_TYPE", "TYPE_NAME"]);
    SyntheticRelation::new(MetadataOp::TypeInfo, query)
}

/// Row id assigned by the most recent insert on the connection.
pub fn generated_keys() -> SyntheticRelation {
    let query = Query::new().select(vec![func("last_insert_rowid", vec![]).alias("last_insert_rowid()")]);
    SyntheticRelation::new(MetadataOp::GeneratedKeys, query)
}

/// The relation for an operation that takes no arguments.
///
/// Returns `None` for operations whose text depends on arguments or probes.
pub fn fixed(op: MetadataOp) -> Option<SyntheticRelation> {
    match op {
        MetadataOp::TableTypes => Some(table_types()),
        MetadataOp::TypeInfo => Some(type_info()),
        MetadataOp::ColumnsTableName => Some(columns_table_name()),
        MetadataOp::GeneratedKeys => Some(generated_keys()),
        op if op.is_always_empty() => Some(empty(op)),
        _ => None,
    }
}
