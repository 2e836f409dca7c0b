//! Binding descriptors for introspection and diagnostics.

use crate::key::Key;
use crate::lifetime::Lifetime;
use crate::traits::DependencySpec;

/// How one layer of a binding produces its instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LayerKind {
    /// An [`Injectable`](crate::Injectable) implementation type.
    Implementation,
    /// A factory closure.
    Factory,
    /// A prebuilt instance.
    Instance,
    /// A decorator wrapping the next-inner layer.
    Decorator,
}

/// Read-only view of one binding.
///
/// # Examples
///
/// ```rust
/// use ferrous_ioc::{Container, Injectable, LayerKind, Lifetime};
/// use std::sync::Arc;
///
/// struct Database;
/// impl Injectable for Database {
///     type Deps = ();
///     fn inject(_: ()) -> Self {
///         Database
///     }
/// }
///
/// struct Repository;
/// impl Injectable for Repository {
///     type Deps = (Arc<Database>,);
///     fn inject(_: Self::Deps) -> Self {
///         Repository
///     }
/// }
///
/// let mut container = Container::new();
/// container.singleton_self::<Database>().scoped_self::<Repository>();
///
/// let descriptors = container.descriptors();
/// assert_eq!(descriptors.len(), 2);
/// assert_eq!(descriptors[1].lifetime, Lifetime::Scoped);
/// assert_eq!(descriptors[1].kind, LayerKind::Implementation);
/// assert_eq!(descriptors[1].dependencies[0].key.short_name(), "Database");
/// ```
#[derive(Debug, Clone)]
pub struct BindingDescriptor {
    /// The contract key.
    pub contract: Key,
    /// Effective lifetime, after configuration overrides.
    pub lifetime: Lifetime,
    /// Implementation type name, or the contract name for factories and
    /// instances.
    pub implementation: &'static str,
    /// How the base layer is produced.
    pub kind: LayerKind,
    /// Declared dependencies of the base layer.
    pub dependencies: Vec<DependencySpec>,
    /// Decorator names, innermost first.
    pub decorators: Vec<&'static str>,
}

impl BindingDescriptor {
    /// Returns `true` if the binding has at least one decorator.
    pub fn is_decorated(&self) -> bool {
        !self.decorators.is_empty()
    }

    /// Returns `true` if the base layer is a factory closure.
    pub fn is_factory(&self) -> bool {
        self.kind == LayerKind::Factory
    }
}
