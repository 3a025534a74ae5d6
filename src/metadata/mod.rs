//! Metadata synthesis.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                      DatabaseMetadata                           │
//! │  validate request -> build relation -> run -> MetadataCursor    │
//! └─────────────────────────────────────────────────────────────────┘
//!            │                                  │
//!            ▼                                  ▼
//! ┌─────────────────────────┐      ┌─────────────────────────────┐
//! │  builder                │      │  StatementCache             │
//! │  (probe-dependent ops)  │      │  (shape-stable ops)         │
//! └─────────────────────────┘      └─────────────────────────────┘
//!            │
//!            ▼
//! ┌─────────────────────────────────────────────────────────────────┐
//! │  CatalogProbe (PRAGMA table_info / index_list / index_info /    │
//! │  foreign_key_list, sqlite_master)                               │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Each answer is a SQL statement whose projection has the fixed column
//! shape of its operation (see [`shapes`]). Catalog facts are inlined into
//! that statement as escaped literals, one `SELECT` arm per fact.

pub mod builder;
pub mod probe;
mod provider;
mod relation;
pub mod shapes;
pub mod types;

pub use probe::{CatalogProbe, ColumnDescriptor, ForeignKeyEdge, IndexColumn, IndexDescriptor, IndexOrigin};
pub use provider::{BestRowScope, DatabaseMetadata, MetadataRequest};
pub use relation::{MetadataOp, Nullability, SyntheticRelation};
