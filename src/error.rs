//! Error types for metadata synthesis and cursor access.

use std::fmt;

/// The resource a `Closed` error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    Connection,
    Cursor,
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Resource::Connection => "connection",
            Resource::Cursor => "cursor",
        })
    }
}

/// Errors raised by the metadata layer.
#[derive(Debug, thiserror::Error)]
pub enum MetaError {
    /// The connection or cursor was already closed.
    #[error("{0} closed")]
    Closed(Resource),

    /// The operation exists in the client API but is not provided by this driver.
    #[error("not implemented by SQLite metadata driver: {0}")]
    NotImplemented(&'static str),

    /// An argument was structurally invalid (e.g. an empty table name).
    #[error("malformed argument: {0}")]
    MalformedArgument(String),

    /// Column index outside `[0, count)`.
    #[error("column {index} out of bounds [0,{count})")]
    ColumnOutOfBounds { index: i64, count: usize },

    /// Column label lookup found no match.
    #[error("no such column: '{0}'")]
    NoSuchColumn(String),

    /// A value accessor was called before `next()` returned true.
    #[error("cursor is not positioned on a row")]
    NoCurrentRow,

    /// Failure reported by the embedded engine.
    #[error("engine error: {0}")]
    Engine(#[from] rusqlite::Error),

    /// Invalid or incomplete configuration.
    #[error("configuration error: {0}")]
    Config(#[from] crate::config::SettingsError),
}

impl MetaError {
    pub fn closed_connection() -> Self {
        Self::Closed(Resource::Connection)
    }

    pub fn closed_cursor() -> Self {
        Self::Closed(Resource::Cursor)
    }

    /// True when the error means the owning resource is gone.
    pub fn is_closed(&self) -> bool {
        matches!(self, MetaError::Closed(_))
    }
}

pub type MetaResult<T> = Result<T, MetaError>;
