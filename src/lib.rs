//! # ferrous-ioc
//!
//! Inversion-of-control container for Rust: contracts bound to
//! implementations with singleton, scoped or transient lifetimes, decorator
//! chains, and a validator that rejects missing dependencies, cycles and
//! singleton-to-scoped capture before anything is constructed.
//!
//! ## Features
//!
//! - **Explicit dependencies**: each implementation declares its constructor
//!   inputs as a tuple type, so the graph is known without building anything
//! - **Trait contracts**: bind `dyn Trait` to a concrete type with
//!   [`implements!`]
//! - **Lifetimes**: singleton (per container), scoped (per [`Scope`]),
//!   transient (per resolution)
//! - **Decorators**: ordered wrapper chains per contract, as types or closures
//! - **Validation**: [`Container::validate`] and
//!   [`Container::validation_report`]
//! - **Thread-safe**: singletons are built at most once under concurrent
//!   first access; scopes can be shared between threads
//!
//! ## Quick Start
//!
//! ```rust
//! use ferrous_ioc::{implements, Container, Injectable, Resolver};
//! use std::sync::Arc;
//!
//! trait Repository: Send + Sync {
//!     fn find(&self, id: u32) -> String;
//! }
//!
//! struct Database {
//!     url: String,
//! }
//! impl Injectable for Database {
//!     type Deps = ();
//!     fn inject(_: ()) -> Self {
//!         Database { url: "postgres://localhost".into() }
//!     }
//! }
//!
//! struct SqlRepository {
//!     db: Arc<Database>,
//! }
//! impl Injectable for SqlRepository {
//!     type Deps = (Arc<Database>,);
//!     fn inject((db,): Self::Deps) -> Self {
//!         SqlRepository { db }
//!     }
//! }
//! impl Repository for SqlRepository {
//!     fn find(&self, id: u32) -> String {
//!         format!("{}#{id}", self.db.url)
//!     }
//! }
//! implements!(SqlRepository => dyn Repository);
//!
//! let mut container = Container::new();
//! container
//!     .singleton_self::<Database>()
//!     .scoped::<dyn Repository, SqlRepository>();
//! container.validate().unwrap();
//!
//! let scope = container.scope();
//! let repo = scope.resolve::<dyn Repository>().unwrap();
//! assert_eq!(repo.find(7), "postgres://localhost#7");
//! ```
//!
//! ## Lifetimes
//!
//! - **Singleton**: created once per container and shared everywhere
//! - **Scoped**: created once per scope, released when the scope closes
//! - **Transient**: created on every resolution, owned by the caller
//!
//! A singleton must not depend on a scoped contract, directly or through
//! transients; validation and resolution both report it as
//! [`ContainerError::LifetimeMismatch`].

pub mod config;
pub mod descriptors;
pub mod error;
pub mod graph;
pub mod key;
pub mod lifetime;
pub mod observer;
pub mod traits;
pub mod validation;

mod cache;
mod container;
mod internal;
mod registration;

pub use config::ContainerOptions;
pub use container::{Container, ResolverContext, Scope};
pub use descriptors::{BindingDescriptor, LayerKind};
pub use error::{ContainerError, DiError, DiResult, ROOT_REQUESTER};
pub use graph::{DependencyGraph, GraphEdge, GraphNode, NodeKind};
pub use key::{key_of, Key};
pub use lifetime::Lifetime;
pub use observer::{DiObserver, MetricsObserver, TracingObserver};
pub use traits::{
    Decorator, Dependencies, Dependency, DependencyList, DependencySpec, Implements, Injectable, Resolver,
    ResolverCore,
};
pub use validation::{ValidationReport, ValidationWarning};

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    static BUILT: AtomicUsize = AtomicUsize::new(0);

    struct Counted;
    impl Injectable for Counted {
        type Deps = ();
        fn inject(_: ()) -> Self {
            BUILT.fetch_add(1, Ordering::SeqCst);
            Counted
        }
    }

    struct NeedsCounted(Arc<Counted>);
    impl Injectable for NeedsCounted {
        type Deps = (Arc<Counted>,);
        fn inject((counted,): Self::Deps) -> Self {
            NeedsCounted(counted)
        }
    }

    #[test]
    fn lifetimes_cache_as_declared() {
        let mut container = Container::new();
        container.singleton_self::<Counted>().transient_self::<NeedsCounted>();

        let before = BUILT.load(Ordering::SeqCst);
        let a = container.resolve::<NeedsCounted>().unwrap();
        let b = container.resolve::<NeedsCounted>().unwrap();

        assert!(!Arc::ptr_eq(&a, &b));
        assert!(Arc::ptr_eq(&a.0, &b.0));
        assert_eq!(BUILT.load(Ordering::SeqCst) - before, 1);
    }

    #[test]
    fn root_requester_for_direct_resolution() {
        let container = Container::new();
        assert_eq!(
            container.resolve::<Counted>().err(),
            Some(DiError::MissingDependency {
                contract: key_of::<Counted>().display_name(),
                requester: ROOT_REQUESTER,
            })
        );
    }

    struct Warm;
    impl Injectable for Warm {
        type Deps = ();
        fn inject(_: ()) -> Self {
            Warm
        }
    }

    #[test]
    fn warm_up_builds_singletons_only() {
        let mut container = Container::new();
        container
            .singleton_self::<Warm>()
            .instance(Arc::new(3u8))
            .transient_self::<NeedsCounted>();
        assert_eq!(container.warm_up().unwrap(), 2);
        assert!(container.contains::<Warm>());
        assert!(!container.contains::<Counted>());
        assert_eq!(container.len(), 3);
    }
}
