//! Client connection handle.
//!
//! A [`Connection`] is a cheap, cloneable handle to one engine session.
//! Clones share the session, so closing through any clone (from any thread)
//! closes it for all of them and for every metadata handle and cursor that
//! was derived from it.

use std::path::Path;
use std::sync::Arc;

use rusqlite::{OpenFlags, ToSql};
use tracing::info;

use crate::config::{MetadataSettings, Settings, SettingsError};
use crate::cursor::MetadataCursor;
use crate::engine::Session;
use crate::error::MetaResult;
use crate::metadata::{DatabaseMetadata, MetadataRequest};

#[derive(Clone)]
pub struct Connection {
    session: Arc<Session>,
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("closed", &self.session.is_closed())
            .finish()
    }
}

impl Connection {
    /// Open (or create) the database file at `path` with default settings.
    pub fn open(path: impl AsRef<Path>) -> MetaResult<Self> {
        let conn = rusqlite::Connection::open(path.as_ref())?;
        info!(path = %path.as_ref().display(), "opened database");
        Ok(Self::from_engine(conn, MetadataSettings::default()))
    }

    pub fn open_in_memory() -> MetaResult<Self> {
        let conn = rusqlite::Connection::open_in_memory()?;
        Ok(Self::from_engine(conn, MetadataSettings::default()))
    }

    /// Open the database named by `path`, or by `settings` when `path` is
    /// `None`.
    pub fn open_with(settings: &Settings, path: Option<&Path>) -> MetaResult<Self> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => settings
                .database
                .resolved_path()?
                .ok_or(SettingsError::NoDatabase)?,
        };

        let conn = if settings.database.read_only {
            rusqlite::Connection::open_with_flags(
                &path,
                OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_URI,
            )?
        } else {
            rusqlite::Connection::open(&path)?
        };
        info!(
            path = %path.display(),
            read_only = settings.database.read_only,
            "opened database"
        );
        Ok(Self::from_engine(conn, settings.metadata.clone()))
    }

    /// Wrap an already-open engine connection.
    pub fn from_engine(conn: rusqlite::Connection, settings: MetadataSettings) -> Self {
        Self {
            session: Arc::new(Session::new(conn, settings)),
        }
    }

    pub fn execute_batch(&self, sql: &str) -> MetaResult<()> {
        self.session.with_conn(|conn| Ok(conn.execute_batch(sql)?))
    }

    /// Execute one statement, returning the number of changed rows.
    pub fn execute(&self, sql: &str, params: &[&dyn ToSql]) -> MetaResult<usize> {
        self.session.with_conn(|conn| Ok(conn.execute(sql, params)?))
    }

    /// Metadata handle bound to this connection.
    pub fn metadata(&self) -> MetaResult<DatabaseMetadata> {
        self.session.ensure_open()?;
        Ok(DatabaseMetadata::new(Arc::clone(&self.session)))
    }

    /// Single-row cursor holding the row id of the most recent insert.
    pub fn generated_keys(&self) -> MetaResult<MetadataCursor> {
        self.metadata()?.query(&MetadataRequest::GeneratedKeys)
    }

    pub fn last_insert_rowid(&self) -> MetaResult<i64> {
        self.session.with_conn(|conn| Ok(conn.last_insert_rowid()))
    }

    /// Rows changed by the most recent statement.
    pub fn changes(&self) -> MetaResult<u64> {
        self.session.with_conn(|conn| Ok(conn.changes()))
    }

    /// Close the connection. Safe to call from any thread, and more than once.
    pub fn close(&self) -> MetaResult<()> {
        self.session.close()
    }

    pub fn is_closed(&self) -> bool {
        self.session.is_closed()
    }
}
