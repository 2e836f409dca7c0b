//! Declared dependency lists.
//!
//! Rust has no constructor reflection, so each implementation spells its
//! inputs out as a tuple type. The same type drives both static inspection
//! ([`Dependencies::declared`], used by the validator and graph builder
//! without constructing anything) and resolution ([`Dependencies::resolve`]).

use std::sync::Arc;

use smallvec::SmallVec;

use crate::container::ResolverContext;
use crate::error::DiResult;
use crate::key::{key_of, Key};
use crate::traits::Resolver;

/// One declared input of a constructor, factory or decorator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DependencySpec {
    /// The required contract.
    pub key: Key,
    /// Optional inputs resolve to `None` when the contract is unregistered
    /// and never produce a graph edge in that case.
    pub optional: bool,
}

/// Inline list of declared dependencies; most constructors take a handful.
pub type DependencyList = SmallVec<[DependencySpec; 4]>;

/// A single injectable parameter.
///
/// Implemented for `Arc<C>` (required) and `Option<Arc<C>>` (optional).
pub trait Dependency: Sized + 'static {
    /// Static description of this parameter.
    fn spec() -> DependencySpec;

    /// Resolves the parameter in the given context.
    fn resolve(ctx: &ResolverContext<'_>) -> DiResult<Self>;
}

impl<C> Dependency for Arc<C>
where
    C: ?Sized + Send + Sync + 'static,
{
    fn spec() -> DependencySpec {
        DependencySpec { key: key_of::<C>(), optional: false }
    }

    fn resolve(ctx: &ResolverContext<'_>) -> DiResult<Self> {
        ctx.resolve::<C>()
    }
}

impl<C> Dependency for Option<Arc<C>>
where
    C: ?Sized + Send + Sync + 'static,
{
    fn spec() -> DependencySpec {
        DependencySpec { key: key_of::<C>(), optional: true }
    }

    fn resolve(ctx: &ResolverContext<'_>) -> DiResult<Self> {
        ctx.try_resolve::<C>()
    }
}

/// An ordered parameter list.
///
/// Implemented for `()` and for tuples of up to eight [`Dependency`]
/// items. Parameters are resolved left to right.
///
/// # Examples
///
/// ```rust
/// use ferrous_ioc::{key_of, Dependencies};
/// use std::sync::Arc;
///
/// struct Config;
/// struct Cache;
///
/// let declared = <(Arc<Config>, Option<Arc<Cache>>)>::declared();
/// assert_eq!(declared.len(), 2);
/// assert_eq!(declared[0].key, key_of::<Config>());
/// assert!(declared[1].optional);
/// ```
pub trait Dependencies: Sized + 'static {
    /// Static description of every parameter, in declaration order.
    fn declared() -> DependencyList;

    /// Resolves every parameter, left to right.
    fn resolve(ctx: &ResolverContext<'_>) -> DiResult<Self>;
}

impl Dependencies for () {
    fn declared() -> DependencyList {
        DependencyList::new()
    }

    fn resolve(_ctx: &ResolverContext<'_>) -> DiResult<Self> {
        Ok(())
    }
}

macro_rules! impl_dependencies {
    ($($param:ident),+) => {
        impl<$($param: Dependency),+> Dependencies for ($($param,)+) {
            fn declared() -> DependencyList {
                let mut list = DependencyList::new();
                $(list.push($param::spec());)+
                list
            }

            fn resolve(ctx: &ResolverContext<'_>) -> DiResult<Self> {
                Ok(($($param::resolve(ctx)?,)+))
            }
        }
    };
}

impl_dependencies!(A);
impl_dependencies!(A, B);
impl_dependencies!(A, B, C);
impl_dependencies!(A, B, C, D);
impl_dependencies!(A, B, C, D, E);
impl_dependencies!(A, B, C, D, E, F);
impl_dependencies!(A, B, C, D, E, F, G);
impl_dependencies!(A, B, C, D, E, F, G, H);
