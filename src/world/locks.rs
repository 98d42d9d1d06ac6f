//! world::locks
//!
//! Per-name materialization locks.
//!
//! # Invariants
//!
//! - At most one lock object exists per name for the lifetime of the table
//! - Entries are never removed, so two threads asking for the same name
//!   always contend on the same mutex

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::core::types::SymbolName;

/// Lazily populated table of one mutex per name.
#[derive(Debug, Default)]
pub(crate) struct NameLocks {
    table: Mutex<HashMap<SymbolName, Arc<Mutex<()>>>>,
}

impl NameLocks {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// The lock guarding materialization of `name`.
    ///
    /// The table lock is held only long enough to find or insert the entry.
    pub(crate) fn lock_for(&self, name: &SymbolName) -> Arc<Mutex<()>> {
        let mut table = self.table.lock();
        Arc::clone(table.entry(name.clone()).or_default())
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.table.lock().len()
    }
}
