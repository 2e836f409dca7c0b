//! Per-call resolution path: runaway recursion and cycle detection for
//! containers that skipped `validate()`.

use std::cell::RefCell;

use crate::error::{ContainerError, DiError, DiResult};
use crate::key::Key;

/// Default maximum resolution depth.
pub(crate) const MAX_DEPTH: usize = 1024;

/// Stack of contracts currently under construction for one top-level
/// resolution call.
pub(crate) struct ResolutionPath {
    stack: RefCell<Vec<Key>>,
    max_depth: usize,
}

impl ResolutionPath {
    pub(crate) fn new(max_depth: usize) -> Self {
        Self {
            stack: RefCell::new(Vec::new()),
            max_depth,
        }
    }

    /// Pushes `key`, failing if it is already being constructed or the
    /// stack is full. The returned guard pops it again.
    pub(crate) fn enter(&self, key: Key) -> DiResult<PathGuard<'_>> {
        let mut stack = self.stack.borrow_mut();

        if let Some(pos) = stack.iter().position(|k| *k == key) {
            let cycle = stack[pos..].iter().map(Key::display_name).collect();
            return Err(DiError::CircularDependency(cycle));
        }

        if stack.len() >= self.max_depth {
            return Err(ContainerError::DepthExceeded(self.max_depth).into());
        }

        stack.push(key);
        Ok(PathGuard { path: self })
    }

    /// The contract currently under construction.
    pub(crate) fn current(&self) -> Option<Key> {
        self.stack.borrow().last().copied()
    }

    /// Contracts from `from` (inclusive) to the top of the stack.
    pub(crate) fn tail_from(&self, from: &Key) -> Vec<&'static str> {
        let stack = self.stack.borrow();
        let start = stack.iter().position(|k| k == from).unwrap_or(0);
        stack[start..].iter().map(Key::display_name).collect()
    }
}

/// Pops its contract from the path when dropped.
pub(crate) struct PathGuard<'p> {
    path: &'p ResolutionPath,
}

impl Drop for PathGuard<'_> {
    fn drop(&mut self) {
        self.path.stack.borrow_mut().pop();
    }
}
