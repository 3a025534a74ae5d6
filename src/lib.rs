//! # litemeta
//!
//! Catalog metadata for SQLite, answered as ordinary SQL.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │            Connection / DatabaseMetadata                 │
//! │   (tables, columns, keys, indexes, type info, ...)       │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [probe]
//! ┌─────────────────────────────────────────────────────────┐
//! │          Catalog facts (PRAGMA, sqlite_master)           │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [builder]
//! ┌─────────────────────────────────────────────────────────┐
//! │   SyntheticRelation (SELECT ... UNION ALL ... ORDER BY)  │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [engine]
//! ┌─────────────────────────────────────────────────────────┐
//! │                  MetadataCursor                          │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```
//! use litemeta::Connection;
//!
//! let conn = Connection::open_in_memory()?;
//! conn.execute_batch("create table test (id integer primary key, fn, sn)")?;
//!
//! let mut columns = conn.metadata()?.get_columns(Some("test"), None)?;
//! while columns.next()? {
//!     println!("{:?}", columns.get_string("COLUMN_NAME")?);
//! }
//! # Ok::<(), litemeta::MetaError>(())
//! ```

pub mod cache;
pub mod config;
pub mod connection;
pub mod cursor;
pub mod engine;
pub mod error;
pub mod metadata;
pub mod sql;
pub mod value;

/// Re-exports for convenient usage.
pub mod prelude {
    pub use crate::config::{MetadataSettings, Settings};
    pub use crate::connection::Connection;
    pub use crate::cursor::{ColumnIndex, CursorState, MetadataCursor};
    pub use crate::error::{MetaError, MetaResult, Resource};
    pub use crate::metadata::{
        BestRowScope, DatabaseMetadata, MetadataOp, MetadataRequest, Nullability,
    };
    pub use crate::sql::Dialect;
    pub use crate::value::{Value, ValueKind};
}

// Also export at crate root for convenience
pub use connection::Connection;
pub use cursor::MetadataCursor;
pub use error::{MetaError, MetaResult};
pub use metadata::{BestRowScope, DatabaseMetadata, MetadataRequest};
pub use value::Value;
