//! Engine session: the connection context shared by every handle.
//!
//! All engine work happens under one lock. Closing is allowed from any
//! thread: the closed flag is raised first and the engine interrupted, so a
//! statement running on another thread aborts and its caller sees
//! `Closed(Connection)` rather than the raw interrupt error.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;
use rusqlite::{InterruptHandle, Statement, ToSql};
use tracing::{debug, info};

use crate::cache::StatementCache;
use crate::config::MetadataSettings;
use crate::error::{MetaError, MetaResult};
use crate::value::Value;

pub struct Session {
    conn: Mutex<Option<rusqlite::Connection>>,
    interrupt: InterruptHandle,
    closed: AtomicBool,
    cache: StatementCache,
    settings: MetadataSettings,
}

impl Session {
    pub fn new(conn: rusqlite::Connection, settings: MetadataSettings) -> Self {
        conn.set_prepared_statement_cache_capacity(settings.statement_cache_capacity);
        Self {
            interrupt: conn.get_interrupt_handle(),
            conn: Mutex::new(Some(conn)),
            closed: AtomicBool::new(false),
            cache: StatementCache::new(),
            settings,
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Fail with `Closed(Connection)` once the session is closed.
    pub fn ensure_open(&self) -> MetaResult<()> {
        if self.is_closed() {
            return Err(MetaError::closed_connection());
        }
        Ok(())
    }

    pub fn cache(&self) -> &StatementCache {
        &self.cache
    }

    pub fn settings(&self) -> &MetadataSettings {
        &self.settings
    }

    /// Run `f` against the engine connection under the session lock.
    pub fn with_conn<T>(
        &self,
        f: impl FnOnce(&rusqlite::Connection) -> MetaResult<T>,
    ) -> MetaResult<T> {
        self.ensure_open()?;
        let guard = self.conn.lock();
        let conn = guard.as_ref().ok_or_else(MetaError::closed_connection)?;
        f(conn).map_err(|err| {
            if self.is_closed() {
                MetaError::closed_connection()
            } else {
                err
            }
        })
    }

    /// Close the engine connection and release cached statements.
    ///
    /// Closing twice is a no-op.
    pub fn close(&self) -> MetaResult<()> {
        if self.closed.swap(true, Ordering::AcqRel) {
            return Ok(());
        }
        self.interrupt.interrupt();

        let mut guard = self.conn.lock();
        self.cache.release();
        if let Some(conn) = guard.take() {
            conn.close().map_err(|(_, err)| MetaError::Engine(err))?;
        }
        info!("connection closed");
        Ok(())
    }
}

/// Rows of an executed statement, with the engine's column names.
///
/// Rows are read out under the session lock when the statement runs, so no
/// engine statement outlives the call that produced it.
#[derive(Debug, Default)]
pub struct EngineCursor {
    columns: Vec<String>,
    rows: VecDeque<Vec<Value>>,
}

impl EngineCursor {
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn next_row(&mut self) -> Option<Vec<Value>> {
        self.rows.pop_front()
    }

    pub fn remaining(&self) -> usize {
        self.rows.len()
    }
}

/// Execute `sql` and read out its rows.
///
/// `cached` statements go through the engine's prepared statement cache.
pub fn run(
    conn: &rusqlite::Connection,
    sql: &str,
    params: &[&dyn ToSql],
    cached: bool,
) -> MetaResult<EngineCursor> {
    debug!(%sql, cached, "executing metadata query");
    if cached {
        let mut stmt = conn.prepare_cached(sql)?;
        drain(&mut stmt, params)
    } else {
        let mut stmt = conn.prepare(sql)?;
        drain(&mut stmt, params)
    }
}

fn drain(stmt: &mut Statement<'_>, params: &[&dyn ToSql]) -> MetaResult<EngineCursor> {
    let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
    let count = columns.len();

    let mut rows = stmt.query(params)?;
    let mut out = VecDeque::new();
    while let Some(row) = rows.next()? {
        let values = (0..count)
            .map(|i| row.get_ref(i).map(Value::from))
            .collect::<Result<Vec<_>, _>>()?;
        out.push_back(values);
    }

    Ok(EngineCursor { columns, rows: out })
}
