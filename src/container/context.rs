//! Resolver context handed to constructors, factories and decorators.

use std::time::Instant;

use smallvec::SmallVec;
use tracing::trace;

use crate::container::scope::ScopeState;
use crate::container::Container;
use crate::error::{ContainerError, DiError, DiResult, ROOT_REQUESTER};
use crate::internal::{Disposer, ResolutionPath};
use crate::key::Key;
use crate::lifetime::Lifetime;
use crate::registration::{AnyArc, Binding, Built};
use crate::traits::ResolverCore;

type Hooks = SmallVec<[Disposer; 2]>;

/// Resolution state for one top-level `resolve` call.
///
/// Carries the container, the scope in effect (none at the root and while
/// building a singleton), the path of contracts under construction, and the
/// nearest singleton being built. Dependencies declared by
/// [`Injectable`](crate::Injectable) types resolve through this context;
/// factories never see it directly.
pub struct ResolverContext<'a> {
    container: &'a Container,
    scope: Option<&'a ScopeState>,
    path: &'a ResolutionPath,
    captor: Option<Key>,
}

impl<'a> ResolverContext<'a> {
    pub(crate) fn new(container: &'a Container, scope: Option<&'a ScopeState>, path: &'a ResolutionPath) -> Self {
        Self {
            container,
            scope,
            path,
            captor: None,
        }
    }

    /// Looks up, constructs or fetches the instance for `key`.
    pub(crate) fn resolve_key(&self, key: &Key) -> DiResult<AnyArc> {
        let Some(binding) = self.container.registry.get(key) else {
            return Err(DiError::MissingDependency {
                contract: key.display_name(),
                requester: self.path.current().map_or(ROOT_REQUESTER, |k| k.display_name()),
            });
        };

        let observers = &self.container.observers;
        observers.resolving(key);
        let started = Instant::now();

        let result = self.resolve_binding(key, binding);

        match &result {
            Ok(_) => {
                let elapsed = started.elapsed();
                trace!(contract = key.display_name(), lifetime = %binding.lifetime, ?elapsed, "resolved");
                observers.resolved(key, binding.lifetime, elapsed);
            }
            Err(err) => observers.failed(key, err),
        }
        result
    }

    fn resolve_binding(&self, key: &Key, binding: &Binding) -> DiResult<AnyArc> {
        let _guard = self.path.enter(*key)?;

        match binding.lifetime {
            Lifetime::Singleton => {
                let container = self.container;
                // Singletons never see the caller's scope.
                let capturing = ResolverContext {
                    container,
                    scope: None,
                    path: self.path,
                    captor: Some(*key),
                };
                container.singletons.get_or_try_init(key, || {
                    let (instance, hooks) = capturing.build(binding)?;
                    container.disposers.lock().extend(hooks);
                    Ok(instance)
                })
            }
            Lifetime::Scoped => {
                if let Some(captor) = self.captor {
                    return Err(ContainerError::LifetimeMismatch {
                        consumer: captor.display_name(),
                        consumer_lifetime: Lifetime::Singleton,
                        dependency: key.display_name(),
                        dependency_lifetime: Lifetime::Scoped,
                        path: self.path.tail_from(&captor),
                    }
                    .into());
                }
                let scope = self
                    .scope
                    .ok_or(ContainerError::ScopedOutsideScope(key.display_name()))?;
                scope.cache.get_or_try_init(key, || {
                    let (instance, hooks) = self.build(binding)?;
                    scope.disposers.lock().extend(hooks);
                    Ok(instance)
                })
            }
            // Transient release hooks are dropped: the caller owns the instance.
            Lifetime::Transient => self.build(binding).map(|(instance, _)| instance),
        }
    }

    /// Constructs the base layer, then wraps each decorator innermost first.
    fn build(&self, binding: &Binding) -> DiResult<(AnyArc, Hooks)> {
        let mut hooks = Hooks::new();

        let Built { mut instance, release } = (binding.construct)(self)?;
        hooks.extend(release);

        for decorator in &binding.decorators {
            let built = (decorator.wrap)(instance, self)?;
            instance = built.instance;
            hooks.extend(built.release);
        }

        Ok((instance, hooks))
    }
}

impl ResolverCore for ResolverContext<'_> {
    fn resolve_any(&self, key: &Key) -> DiResult<AnyArc> {
        self.resolve_key(key)
    }

    fn is_registered(&self, key: &Key) -> bool {
        self.container.registry.contains(key)
    }
}
