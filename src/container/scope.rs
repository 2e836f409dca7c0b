//! Scoped resolution and release of scoped instances.

use parking_lot::{Mutex, RwLock};
use tracing::debug;

use crate::cache::InstanceCache;
use crate::container::{Container, ResolverContext};
use crate::error::{ContainerError, DiResult};
use crate::internal::{DisposeBag, ResolutionPath};
use crate::key::Key;
use crate::registration::AnyArc;
use crate::traits::ResolverCore;

pub(crate) struct ScopeState {
    closed: bool,
    pub(crate) cache: InstanceCache,
    pub(crate) disposers: Mutex<DisposeBag>,
}

/// A bounded resolution context owning scoped instances.
///
/// Singletons come from the container, scoped instances are cached here
/// and shared by every resolution through this scope, and transients are
/// built fresh each time. Closing the scope (explicitly or on drop) runs
/// the release hooks of its instances in reverse creation order; any later
/// resolution fails with [`ContainerError::ScopeClosed`].
///
/// A `Scope` is `Send + Sync`; one scope may be shared between threads.
///
/// # Examples
///
/// ```
/// use ferrous_ioc::{Container, Injectable, Resolver};
/// use std::sync::Arc;
///
/// struct RequestId;
/// impl Injectable for RequestId {
///     type Deps = ();
///     fn inject(_: ()) -> Self {
///         RequestId
///     }
/// }
///
/// let mut container = Container::new();
/// container.scoped_self::<RequestId>();
///
/// let first = container.scope();
/// let a = first.resolve::<RequestId>().unwrap();
/// let b = first.resolve::<RequestId>().unwrap();
/// assert!(Arc::ptr_eq(&a, &b));
///
/// let second = container.scope();
/// let c = second.resolve::<RequestId>().unwrap();
/// assert!(!Arc::ptr_eq(&a, &c));
///
/// first.close();
/// assert!(first.resolve::<RequestId>().is_err());
/// ```
pub struct Scope<'c> {
    container: &'c Container,
    id: u64,
    state: RwLock<ScopeState>,
}

impl<'c> Scope<'c> {
    pub(crate) fn new(container: &'c Container, id: u64) -> Self {
        debug!(scope = id, "scope opened");
        Self {
            container,
            id,
            state: RwLock::new(ScopeState {
                closed: false,
                cache: InstanceCache::new(),
                disposers: Mutex::new(DisposeBag::default()),
            }),
        }
    }

    /// Identifier of this scope, unique per container.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Returns `true` once the scope has been closed.
    pub fn is_closed(&self) -> bool {
        self.state.read().closed
    }

    /// The container this scope resolves against.
    pub fn container(&self) -> &'c Container {
        self.container
    }

    /// Closes the scope and releases its instances.
    ///
    /// Waits for resolutions already running on this scope. Release hooks
    /// run in reverse creation order, outside the scope lock. Closing twice
    /// is a no-op.
    pub fn close(&self) {
        let (mut hooks, cache) = {
            let mut state = self.state.write();
            if state.closed {
                return;
            }
            state.closed = true;
            let hooks = state.disposers.get_mut().take();
            (hooks, std::mem::take(&mut state.cache))
        };

        let released = hooks.run_all_reverse();
        let instances = cache.len();
        drop(cache);
        debug!(scope = self.id, instances, released, "scope closed");
    }
}

impl ResolverCore for Scope<'_> {
    fn resolve_any(&self, key: &Key) -> DiResult<AnyArc> {
        // Recursive read so a resolution on this thread never queues behind
        // a pending close.
        let state = self.state.read_recursive();
        if state.closed {
            return Err(ContainerError::ScopeClosed(self.id).into());
        }

        let path = ResolutionPath::new(self.container.options.max_depth);
        ResolverContext::new(self.container, Some(&*state), &path).resolve_key(key)
    }

    fn is_registered(&self, key: &Key) -> bool {
        self.container.registry.contains(key)
    }
}

impl Drop for Scope<'_> {
    fn drop(&mut self) {
        self.close();
    }
}

impl std::fmt::Debug for Scope<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scope")
            .field("id", &self.id)
            .field("closed", &self.is_closed())
            .finish()
    }
}
