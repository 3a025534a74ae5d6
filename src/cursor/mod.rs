//! Forward-only cursor over a synthesized metadata relation.
//!
//! # State machine
//!
//! ```text
//! Unopened --next()--> Iterating --next() == false--> Exhausted
//!     \                    \                              \
//!      +---- close() ------+----------- close() ----------+--> Closed
//! ```
//!
//! The engine rows are dropped as soon as the cursor is exhausted. Column
//! metadata stays readable until the cursor is closed. Closing the owning
//! connection fails every method except [`MetadataCursor::close`] and
//! [`MetadataCursor::is_closed`].

use std::collections::HashMap;
use std::sync::Arc;

use crate::engine::{EngineCursor, Session};
use crate::error::{MetaError, MetaResult};
use crate::metadata::Nullability;
use crate::value::{Value, ValueKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorState {
    Unopened,
    Iterating,
    Exhausted,
    Closed,
}

/// A column reference: zero-based index or case-insensitive name.
pub trait ColumnIndex {
    fn resolve(&self, cursor: &mut MetadataCursor) -> MetaResult<usize>;
}

impl ColumnIndex for usize {
    fn resolve(&self, cursor: &mut MetadataCursor) -> MetaResult<usize> {
        cursor.check_index(*self)
    }
}

impl ColumnIndex for i32 {
    fn resolve(&self, cursor: &mut MetadataCursor) -> MetaResult<usize> {
        match usize::try_from(*self) {
            Ok(index) => cursor.check_index(index),
            Err(_) => Err(MetaError::ColumnOutOfBounds {
                index: i64::from(*self),
                count: cursor.columns.len(),
            }),
        }
    }
}

impl ColumnIndex for &str {
    fn resolve(&self, cursor: &mut MetadataCursor) -> MetaResult<usize> {
        cursor.find_column(self)
    }
}

impl ColumnIndex for String {
    fn resolve(&self, cursor: &mut MetadataCursor) -> MetaResult<usize> {
        cursor.find_column(self)
    }
}

pub struct MetadataCursor {
    session: Arc<Session>,
    state: CursorState,
    columns: Arc<[String]>,
    nullability: Arc<[Nullability]>,
    engine: Option<EngineCursor>,
    row: Option<Vec<Value>>,
    /// Upper-cased label to index, filled on first lookup of each label.
    names: HashMap<String, usize>,
    /// Types of the first row, kept after exhaustion for column metadata.
    kinds: Option<Vec<ValueKind>>,
    was_null: bool,
}

impl std::fmt::Debug for MetadataCursor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetadataCursor")
            .field("state", &self.state)
            .field("columns", &self.columns)
            .finish()
    }
}

impl MetadataCursor {
    pub(crate) fn new(
        session: Arc<Session>,
        engine: EngineCursor,
        nullability: Arc<[Nullability]>,
    ) -> Self {
        Self {
            session,
            state: CursorState::Unopened,
            columns: engine.columns().into(),
            nullability,
            engine: Some(engine),
            row: None,
            names: HashMap::new(),
            kinds: None,
            was_null: false,
        }
    }

    pub fn state(&self) -> CursorState {
        self.state
    }

    /// True after an explicit close or once the owning connection is closed.
    pub fn is_closed(&self) -> bool {
        self.state == CursorState::Closed || self.session.is_closed()
    }

    fn check_open(&self) -> MetaResult<()> {
        if self.state == CursorState::Closed {
            return Err(MetaError::closed_cursor());
        }
        self.session.ensure_open()
    }

    /// Advance to the next row. Returns `false` once no rows remain.
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> MetaResult<bool> {
        self.check_open()?;
        match self.engine.as_mut().and_then(EngineCursor::next_row) {
            Some(row) => {
                if self.kinds.is_none() {
                    self.kinds = Some(row.iter().map(Value::kind).collect());
                }
                self.row = Some(row);
                self.state = CursorState::Iterating;
                Ok(true)
            }
            None => {
                self.engine = None;
                self.row = None;
                self.state = CursorState::Exhausted;
                Ok(false)
            }
        }
    }

    /// Not supported by forward-only cursors.
    pub fn is_last(&self) -> MetaResult<bool> {
        self.check_open()?;
        Err(MetaError::NotImplemented("is_last"))
    }

    /// Close the cursor. Closing twice is a no-op.
    pub fn close(&mut self) {
        self.engine = None;
        self.row = None;
        self.state = CursorState::Closed;
    }

    // =========================================================================
    // Column metadata
    // =========================================================================

    pub fn column_count(&self) -> MetaResult<usize> {
        self.check_open()?;
        Ok(self.columns.len())
    }

    fn check_index(&self, index: usize) -> MetaResult<usize> {
        if index < self.columns.len() {
            Ok(index)
        } else {
            Err(MetaError::ColumnOutOfBounds {
                index: index as i64,
                count: self.columns.len(),
            })
        }
    }

    pub fn column_name(&self, index: usize) -> MetaResult<&str> {
        self.check_open()?;
        let index = self.check_index(index)?;
        Ok(&self.columns[index])
    }

    pub fn column_names(&self) -> MetaResult<&[String]> {
        self.check_open()?;
        Ok(&self.columns)
    }

    /// Case-insensitive label lookup, cached per cursor.
    pub fn find_column(&mut self, label: &str) -> MetaResult<usize> {
        self.check_open()?;
        let key = label.to_uppercase();
        if let Some(&index) = self.names.get(&key) {
            return Ok(index);
        }
        let index = self
            .columns
            .iter()
            .position(|name| name.to_uppercase() == key)
            .ok_or_else(|| MetaError::NoSuchColumn(label.to_string()))?;
        self.names.insert(key, index);
        Ok(index)
    }

    pub fn column_nullability(&self, index: usize) -> MetaResult<Nullability> {
        self.check_open()?;
        let index = self.check_index(index)?;
        Ok(self
            .nullability
            .get(index)
            .copied()
            .unwrap_or(Nullability::Unknown))
    }

    fn column_kind(&self, index: usize) -> MetaResult<ValueKind> {
        self.check_open()?;
        let index = self.check_index(index)?;
        let current = self.row.as_ref().map(|row| row[index].kind());
        let first = self.kinds.as_ref().map(|kinds| kinds[index]);
        Ok(current.or(first).unwrap_or(ValueKind::Null))
    }

    /// Portable type code of the column's value in the current row.
    pub fn column_type(&self, index: usize) -> MetaResult<i32> {
        Ok(self.column_kind(index)?.portable_code())
    }

    /// Storage class name of the column's value in the current row.
    pub fn column_type_name(&self, index: usize) -> MetaResult<&'static str> {
        Ok(self.column_kind(index)?.type_name())
    }

    // =========================================================================
    // Value access
    // =========================================================================

    pub fn get_value(&mut self, column: impl ColumnIndex) -> MetaResult<Value> {
        self.check_open()?;
        let index = column.resolve(self)?;
        let row = self.row.as_ref().ok_or(MetaError::NoCurrentRow)?;
        let value = row[index].clone();
        self.was_null = value.is_null();
        Ok(value)
    }

    /// Whether the last value read was SQL `NULL`.
    pub fn was_null(&self) -> MetaResult<bool> {
        self.check_open()?;
        Ok(self.was_null)
    }

    pub fn get_string(&mut self, column: impl ColumnIndex) -> MetaResult<Option<String>> {
        Ok(self.get_value(column)?.as_string())
    }

    pub fn get_long(&mut self, column: impl ColumnIndex) -> MetaResult<i64> {
        Ok(self.get_value(column)?.as_i64())
    }

    pub fn get_int(&mut self, column: impl ColumnIndex) -> MetaResult<i32> {
        Ok(self.get_long(column)? as i32)
    }

    pub fn get_double(&mut self, column: impl ColumnIndex) -> MetaResult<f64> {
        Ok(self.get_value(column)?.as_f64())
    }

    pub fn get_bool(&mut self, column: impl ColumnIndex) -> MetaResult<bool> {
        Ok(self.get_long(column)? != 0)
    }

    pub fn get_bytes(&mut self, column: impl ColumnIndex) -> MetaResult<Option<Vec<u8>>> {
        Ok(self.get_value(column)?.as_bytes())
    }

    /// Read every remaining row.
    pub fn collect_rows(&mut self) -> MetaResult<Vec<Vec<Value>>> {
        let mut rows = Vec::new();
        while self.next()? {
            if let Some(row) = &self.row {
                rows.push(row.clone());
            }
        }
        Ok(rows)
    }
}
