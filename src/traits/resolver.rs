//! Resolver traits for service resolution.

use std::any::Any;
use std::sync::Arc;

use crate::error::{ContainerError, DiResult};
use crate::key::{key_of, Key};

/// Object-safe resolution core.
///
/// Implemented by [`Container`](crate::Container), [`Scope`](crate::Scope)
/// and [`ResolverContext`](crate::ResolverContext). Most callers use the
/// generic methods of [`Resolver`] instead.
pub trait ResolverCore {
    /// Resolves the contract identified by `key`.
    ///
    /// The returned value wraps an `Arc<C>` for the contract `C`.
    fn resolve_any(&self, key: &Key) -> DiResult<Arc<dyn Any + Send + Sync>>;

    /// Returns `true` if the contract has a binding.
    fn is_registered(&self, key: &Key) -> bool;
}

/// Typed resolution API built on [`ResolverCore`].
///
/// # Examples
///
/// ```
/// use ferrous_ioc::{Container, Injectable, Resolver};
///
/// struct Clock;
/// impl Injectable for Clock {
///     type Deps = ();
///     fn inject(_: ()) -> Self {
///         Clock
///     }
/// }
///
/// let mut container = Container::new();
/// container.singleton_self::<Clock>();
///
/// assert!(container.resolve::<Clock>().is_ok());
/// assert!(container.try_resolve::<String>().unwrap().is_none());
/// ```
pub trait Resolver: ResolverCore {
    /// Resolves contract `C`.
    fn resolve<C>(&self) -> DiResult<Arc<C>>
    where
        C: ?Sized + Send + Sync + 'static,
    {
        let key = key_of::<C>();
        let any = self.resolve_any(&key)?;
        downcast::<C>(&any, &key)
    }

    /// Resolves contract `C`, or `None` when it has no binding.
    ///
    /// Errors other than a missing binding for `C` itself still propagate.
    fn try_resolve<C>(&self) -> DiResult<Option<Arc<C>>>
    where
        C: ?Sized + Send + Sync + 'static,
    {
        if self.is_registered(&key_of::<C>()) {
            self.resolve::<C>().map(Some)
        } else {
            Ok(None)
        }
    }
}

impl<R: ResolverCore + ?Sized> Resolver for R {}

/// Recovers `Arc<C>` from a type-erased instance.
pub(crate) fn downcast<C>(any: &Arc<dyn Any + Send + Sync>, key: &Key) -> DiResult<Arc<C>>
where
    C: ?Sized + Send + Sync + 'static,
{
    any.downcast_ref::<Arc<C>>()
        .cloned()
        .ok_or_else(|| ContainerError::TypeMismatch(key.display_name()).into())
}

/// Erases `Arc<C>` for storage.
pub(crate) fn erase<C>(instance: Arc<C>) -> Arc<dyn Any + Send + Sync>
where
    C: ?Sized + Send + Sync + 'static,
{
    Arc::new(instance)
}
