//! Core traits for the container.

mod dependencies;
mod inject;
mod resolver;

pub use dependencies::{Dependencies, Dependency, DependencyList, DependencySpec};
pub use inject::{Decorator, Implements, Injectable};
pub use resolver::{Resolver, ResolverCore};
pub(crate) use resolver::{downcast, erase};
