//! Per-contract instance cache for singletons and scoped instances.
//!
//! Each contract gets its own `OnceCell`. The map lock is held only long
//! enough to fetch or insert the cell, so constructing one contract never
//! blocks resolution of an unrelated one, while concurrent first requests
//! for the same contract run the constructor exactly once.

use std::sync::Arc;

use once_cell::sync::OnceCell;
use parking_lot::Mutex;

use crate::error::DiResult;
use crate::key::Key;
use crate::registration::{AnyArc, Map};

#[derive(Default)]
pub(crate) struct InstanceCache {
    cells: Mutex<Map<Key, Arc<OnceCell<AnyArc>>>>,
}

impl InstanceCache {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Returns the cached instance, constructing it with `init` on first use.
    ///
    /// A failed `init` leaves the cell empty so a later request retries.
    pub(crate) fn get_or_try_init<F>(&self, key: &Key, init: F) -> DiResult<AnyArc>
    where
        F: FnOnce() -> DiResult<AnyArc>,
    {
        let cell = {
            let mut cells = self.cells.lock();
            Arc::clone(cells.entry(*key).or_insert_with(|| Arc::new(OnceCell::new())))
        };

        if let Some(value) = cell.get() {
            return Ok(Arc::clone(value));
        }
        cell.get_or_try_init(init).map(Arc::clone)
    }

    /// Forgets the cached instance for one contract.
    pub(crate) fn evict(&mut self, key: &Key) {
        self.cells.get_mut().remove(key);
    }

    /// Drops every cached instance.
    pub(crate) fn clear(&self) {
        self.cells.lock().clear();
    }

    /// Number of constructed instances.
    pub(crate) fn len(&self) -> usize {
        self.cells.lock().values().filter(|cell| cell.get().is_some()).count()
    }
}
