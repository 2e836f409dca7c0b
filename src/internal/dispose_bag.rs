//! Internal disposal bag for release hooks.

/// A release hook for one cached instance.
pub(crate) type Disposer = Box<dyn FnOnce() + Send>;

/// Container for release hooks with LIFO execution order.
///
/// Hooks are pushed in creation order, so running them in reverse releases
/// consumers before the instances they depend on.
#[derive(Default)]
pub(crate) struct DisposeBag {
    hooks: Vec<Disposer>,
}

impl DisposeBag {
    /// Adds every hook, keeping their order.
    pub(crate) fn extend(&mut self, hooks: impl IntoIterator<Item = Disposer>) {
        self.hooks.extend(hooks);
    }

    /// Executes all hooks in reverse order, leaving the bag empty.
    ///
    /// Returns the number of hooks run.
    pub(crate) fn run_all_reverse(&mut self) -> usize {
        let count = self.hooks.len();
        while let Some(hook) = self.hooks.pop() {
            hook();
        }
        count
    }

    /// Moves the hooks out, leaving the bag empty.
    pub(crate) fn take(&mut self) -> DisposeBag {
        std::mem::take(self)
    }
}
