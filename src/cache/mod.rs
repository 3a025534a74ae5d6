//! Per-connection statement cache for shape-stable metadata operations.
//!
//! # Design
//!
//! - One slot per [`MetadataOp`], sized by `MetadataOp::COUNT`
//! - Populated on first use; at most one compilation per operation
//! - A single mutex guards the whole table
//! - Released when the owning connection closes; later use panics
//!
//! Only operations whose text does not depend on arguments or catalog probes
//! are cached (see [`MetadataOp::is_cacheable`]). Compiling an entry renders
//! the query and has the engine prepare it, so the engine keeps the prepared
//! statement in its own statement cache keyed by the same text.

use std::sync::Arc;

use parking_lot::Mutex;
use strum::EnumCount;
use tracing::debug;

use crate::error::MetaResult;
use crate::metadata::{MetadataOp, Nullability, SyntheticRelation};

/// Rendered text and static column facts of a cached relation.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledStatement {
    pub op: MetadataOp,
    pub sql: Arc<str>,
    pub nullability: Arc<[Nullability]>,
}

impl CompiledStatement {
    pub fn new(relation: &SyntheticRelation) -> Self {
        Self {
            op: relation.op,
            sql: relation.to_sql().into(),
            nullability: relation.nullability().into(),
        }
    }
}

struct Slots {
    entries: [Option<CompiledStatement>; MetadataOp::COUNT],
    released: bool,
    compilations: usize,
}

/// Fixed-size table of compiled statements keyed by operation.
pub struct StatementCache {
    slots: Mutex<Slots>,
}

impl Default for StatementCache {
    fn default() -> Self {
        Self::new()
    }
}

impl StatementCache {
    pub fn new() -> Self {
        Self {
            slots: Mutex::new(Slots {
                entries: std::array::from_fn(|_| None),
                released: false,
                compilations: 0,
            }),
        }
    }

    /// Return the entry for `op`, compiling it on first use.
    ///
    /// A failed compilation leaves the slot empty so the next call retries.
    ///
    /// # Panics
    ///
    /// Panics if the cache was released. Callers check the connection state
    /// first, so reaching a released cache is a bug.
    pub fn get_or_compile<F>(&self, op: MetadataOp, compile: F) -> MetaResult<CompiledStatement>
    where
        F: FnOnce() -> MetaResult<CompiledStatement>,
    {
        debug_assert!(op.is_cacheable(), "{op} is rebuilt on every call");

        let mut slots = self.slots.lock();
        assert!(!slots.released, "statement cache used after release");

        if let Some(entry) = &slots.entries[op.slot()] {
            return Ok(entry.clone());
        }

        let entry = compile()?;
        debug!(op = %op, sql = %entry.sql, "compiled metadata statement");
        slots.entries[op.slot()] = Some(entry.clone());
        slots.compilations += 1;
        Ok(entry)
    }

    /// Drop every entry and refuse further use.
    pub fn release(&self) {
        let mut slots = self.slots.lock();
        slots.entries.iter_mut().for_each(|entry| *entry = None);
        slots.released = true;
    }

    /// Number of populated slots.
    pub fn len(&self) -> usize {
        self.slots.lock().entries.iter().flatten().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Total compilations since the cache was created.
    pub fn compilations(&self) -> usize {
        self.slots.lock().compilations
    }

    pub fn is_released(&self) -> bool {
        self.slots.lock().released
    }
}
