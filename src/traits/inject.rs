//! Construction traits: how implementations and decorators declare their
//! inputs and how they are viewed through a contract.

use std::sync::Arc;

use crate::traits::Dependencies;

/// A type the container can construct.
///
/// `Deps` is the constructor's parameter list; the container resolves it
/// and hands it to [`inject`](Injectable::inject).
///
/// # Examples
///
/// ```rust
/// use ferrous_ioc::{implements, Container, Injectable, Resolver};
/// use std::sync::Arc;
///
/// trait Config: Send + Sync {
///     fn get(&self, key: &str) -> String;
/// }
///
/// struct EnvConfig;
/// impl Injectable for EnvConfig {
///     type Deps = ();
///     fn inject(_: ()) -> Self {
///         EnvConfig
///     }
/// }
/// impl Config for EnvConfig {
///     fn get(&self, key: &str) -> String {
///         format!("value-of-{key}")
///     }
/// }
/// implements!(EnvConfig => dyn Config);
///
/// struct Repository {
///     config: Arc<dyn Config>,
/// }
/// impl Injectable for Repository {
///     type Deps = (Arc<dyn Config>,);
///     fn inject((config,): Self::Deps) -> Self {
///         Repository { config }
///     }
/// }
///
/// let mut container = Container::new();
/// container
///     .singleton::<dyn Config, EnvConfig>()
///     .transient_self::<Repository>();
/// container.validate().unwrap();
///
/// let repo = container.resolve::<Repository>().unwrap();
/// assert_eq!(repo.config.get("db_url"), "value-of-db_url");
/// ```
pub trait Injectable: Send + Sync + Sized + 'static {
    /// Constructor parameters.
    type Deps: Dependencies;

    /// Builds the instance from its resolved parameters.
    fn inject(deps: Self::Deps) -> Self;

    /// Release hook, run when the owning scope closes (scoped instances) or
    /// the container is disposed (singletons). Never run for transients.
    fn dispose(&self) {}
}

/// View of an implementation through contract `C`.
///
/// Every sized type implements `Implements<Self>`. For trait-object
/// contracts use the [`implements!`](crate::implements) macro.
pub trait Implements<C: ?Sized>: Send + Sync + 'static {
    /// Upcasts a shared instance to the contract.
    fn upcast(self: Arc<Self>) -> Arc<C>;
}

impl<T: Send + Sync + 'static> Implements<T> for T {
    #[inline]
    fn upcast(self: Arc<Self>) -> Arc<T> {
        self
    }
}

/// Declares that an implementation can be viewed as one or more
/// trait-object contracts.
///
/// ```rust
/// use ferrous_ioc::implements;
///
/// trait Reader: Send + Sync {}
/// trait Writer: Send + Sync {}
///
/// struct File;
/// impl Reader for File {}
/// impl Writer for File {}
///
/// implements!(File => dyn Reader, dyn Writer);
/// ```
#[macro_export]
macro_rules! implements {
    ($implementation:ty => $($contract:ty),+ $(,)?) => {
        $(
            impl $crate::Implements<$contract> for $implementation {
                #[inline]
                fn upcast(self: ::std::sync::Arc<Self>) -> ::std::sync::Arc<$contract> {
                    self
                }
            }
        )+
    };
}

/// A wrapper around an inner instance of contract `C`.
///
/// The inner instance is always the next-inner layer of the chain (the
/// base implementation for the first decorator). `Deps` lists any further
/// contracts the decorator needs.
///
/// # Examples
///
/// ```rust
/// use ferrous_ioc::{implements, Container, Decorator, Injectable, Resolver};
/// use std::sync::Arc;
///
/// trait Greeter: Send + Sync {
///     fn greet(&self) -> String;
/// }
///
/// struct Plain;
/// impl Injectable for Plain {
///     type Deps = ();
///     fn inject(_: ()) -> Self {
///         Plain
///     }
/// }
/// impl Greeter for Plain {
///     fn greet(&self) -> String {
///         "hello".into()
///     }
/// }
/// implements!(Plain => dyn Greeter);
///
/// struct Loud {
///     inner: Arc<dyn Greeter>,
/// }
/// impl Decorator<dyn Greeter> for Loud {
///     type Deps = ();
///     fn decorate(inner: Arc<dyn Greeter>, _: ()) -> Self {
///         Loud { inner }
///     }
/// }
/// impl Greeter for Loud {
///     fn greet(&self) -> String {
///         self.inner.greet().to_uppercase()
///     }
/// }
/// implements!(Loud => dyn Greeter);
///
/// let mut container = Container::new();
/// container
///     .singleton::<dyn Greeter, Plain>()
///     .decorate::<dyn Greeter, Loud>()
///     .unwrap();
///
/// assert_eq!(container.resolve::<dyn Greeter>().unwrap().greet(), "HELLO");
/// ```
pub trait Decorator<C>: Implements<C> + Sized
where
    C: ?Sized + Send + Sync + 'static,
{
    /// Additional parameters besides the inner instance.
    type Deps: Dependencies;

    /// Wraps `inner`.
    fn decorate(inner: Arc<C>, deps: Self::Deps) -> Self;

    /// Release hook, same contract as [`Injectable::dispose`].
    fn dispose(&self) {}
}
