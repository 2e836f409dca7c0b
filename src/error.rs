//! Error types for the inversion-of-control container.
//!
//! Three kinds make up the taxonomy: a contract with no binding
//! ([`DiError::MissingDependency`]), a dependency cycle
//! ([`DiError::CircularDependency`]) and every configuration-shape problem
//! ([`DiError::Container`] wrapping a [`ContainerError`]).

use thiserror::Error;

use crate::lifetime::Lifetime;

/// Requester reported when a contract is resolved directly by the caller.
pub const ROOT_REQUESTER: &str = "<resolve>";

/// Dependency injection errors.
///
/// # Examples
///
/// ```rust
/// use ferrous_ioc::{Container, DiError, Resolver};
///
/// struct Unregistered;
///
/// let container = Container::new();
/// match container.resolve::<Unregistered>() {
///     Err(DiError::MissingDependency { contract, .. }) => {
///         assert!(contract.ends_with("Unregistered"));
///     }
///     other => panic!("unexpected: {:?}", other.map(|_| ())),
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DiError {
    /// A required contract has no binding.
    #[error("missing dependency: {contract} (required by {requester})")]
    MissingDependency {
        /// The unresolved contract.
        contract: &'static str,
        /// The consumer that required it, or [`ROOT_REQUESTER`].
        requester: &'static str,
    },
    /// A dependency cycle exists among registered contracts.
    ///
    /// The cycle is reported once, without repeating the first element.
    #[error("circular dependency: {}", render_cycle(.0))]
    CircularDependency(Vec<&'static str>),
    /// Configuration-shape error.
    #[error(transparent)]
    Container(#[from] ContainerError),
}

/// Configuration-shape errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContainerError {
    /// A lifetime name did not match any known lifetime.
    #[error("invalid lifetime kind '{0}' (expected singleton, scoped or transient)")]
    InvalidLifetime(String),
    /// A container option could not be parsed.
    #[error("invalid container option {name}: {reason}")]
    InvalidOption {
        /// Option or variable name.
        name: String,
        /// Why the value was rejected.
        reason: String,
    },
    /// A longer-lived binding captures a shorter-lived one.
    #[error(
        "lifetime mismatch: {consumer_lifetime} {consumer} cannot depend on {dependency_lifetime} {dependency} (path: {})",
        .path.join(" -> ")
    )]
    LifetimeMismatch {
        /// The capturing binding.
        consumer: &'static str,
        /// Lifetime of the capturing binding.
        consumer_lifetime: Lifetime,
        /// The shorter-lived binding that would be captured.
        dependency: &'static str,
        /// Lifetime of the captured binding.
        dependency_lifetime: Lifetime,
        /// Contracts from consumer to dependency, both included.
        path: Vec<&'static str>,
    },
    /// `decorate` was called before the contract had a base binding.
    #[error("cannot decorate {0}: no base binding is registered")]
    DecorateUnregistered(&'static str),
    /// The scope was closed before this resolution.
    #[error("scope {0} is closed")]
    ScopeClosed(u64),
    /// A scoped contract was requested without an open scope.
    #[error("cannot resolve scoped service {0} outside of a scope")]
    ScopedOutsideScope(&'static str),
    /// The resolution chain grew beyond the configured maximum depth.
    #[error("maximum resolution depth {0} exceeded")]
    DepthExceeded(usize),
    /// A cached instance had an unexpected type.
    #[error("type mismatch for {0}")]
    TypeMismatch(&'static str),
}

fn render_cycle(cycle: &[&'static str]) -> String {
    match cycle.first() {
        Some(first) => {
            let mut out = cycle.join(" -> ");
            out.push_str(" -> ");
            out.push_str(first);
            out
        }
        None => String::new(),
    }
}

impl DiError {
    /// Returns `true` for the kinds the validator reports about graph shape.
    pub fn is_graph_error(&self) -> bool {
        matches!(
            self,
            DiError::MissingDependency { .. }
                | DiError::CircularDependency(_)
                | DiError::Container(ContainerError::LifetimeMismatch { .. })
        )
    }

    /// Returns the inner [`ContainerError`], if any.
    pub fn as_container_error(&self) -> Option<&ContainerError> {
        match self {
            DiError::Container(err) => Some(err),
            _ => None,
        }
    }
}

/// Result type for DI operations.
pub type DiResult<T> = Result<T, DiError>;
