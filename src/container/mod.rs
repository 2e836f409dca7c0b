//! The container: registration, validation, and root resolution.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::cache::InstanceCache;
use crate::config::ContainerOptions;
use crate::descriptors::{BindingDescriptor, LayerKind};
use crate::error::{ContainerError, DiResult};
use crate::graph::DependencyGraph;
use crate::internal::{DisposeBag, ResolutionPath};
use crate::key::{key_of, Key};
use crate::lifetime::Lifetime;
use crate::observer::{DiObserver, Observers};
use crate::registration::{AnyArc, Binding, Registry};
use crate::traits::{Decorator, Dependencies, Implements, Injectable, ResolverCore};
use crate::validation::{ValidationReport, Validator};

mod context;
mod scope;

pub use context::ResolverContext;
pub use scope::Scope;

/// Inversion-of-control container.
///
/// Holds the registry, the singleton cache and the singleton release hooks.
/// Registration takes `&mut self` and chains; resolution takes `&self`, so a
/// built container can be shared across threads (it is `Send + Sync`).
///
/// Resolving directly on the container serves singletons and transients.
/// Scoped contracts need a [`Scope`] from [`scope`](Container::scope) or
/// [`with_scope`](Container::with_scope).
///
/// # Examples
///
/// ```
/// use ferrous_ioc::{implements, Container, Injectable, Resolver};
/// use std::sync::Arc;
///
/// trait Mailer: Send + Sync {
///     fn send(&self, to: &str) -> String;
/// }
///
/// struct SmtpMailer;
/// impl Injectable for SmtpMailer {
///     type Deps = ();
///     fn inject(_: ()) -> Self {
///         SmtpMailer
///     }
/// }
/// impl Mailer for SmtpMailer {
///     fn send(&self, to: &str) -> String {
///         format!("smtp:{to}")
///     }
/// }
/// implements!(SmtpMailer => dyn Mailer);
///
/// struct Signup {
///     mailer: Arc<dyn Mailer>,
/// }
/// impl Injectable for Signup {
///     type Deps = (Arc<dyn Mailer>,);
///     fn inject((mailer,): Self::Deps) -> Self {
///         Signup { mailer }
///     }
/// }
///
/// let mut container = Container::new();
/// container
///     .singleton::<dyn Mailer, SmtpMailer>()
///     .scoped_self::<Signup>();
/// container.validate().unwrap();
///
/// container.with_scope(|scope| {
///     let signup = scope.resolve::<Signup>().unwrap();
///     assert_eq!(signup.mailer.send("ada"), "smtp:ada");
/// });
/// ```
pub struct Container {
    pub(crate) registry: Registry,
    pub(crate) singletons: InstanceCache,
    pub(crate) disposers: Mutex<DisposeBag>,
    pub(crate) observers: Observers,
    pub(crate) options: ContainerOptions,
    next_scope_id: AtomicU64,
}

impl Default for Container {
    fn default() -> Self {
        Self::with_options(ContainerOptions::default())
    }
}

impl Container {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a container with explicit options.
    pub fn with_options(options: ContainerOptions) -> Self {
        Self {
            registry: Registry::new(),
            singletons: InstanceCache::new(),
            disposers: Mutex::new(DisposeBag::default()),
            observers: Observers::default(),
            options,
            next_scope_id: AtomicU64::new(1),
        }
    }

    /// Creates a container configured from `IOC_*` environment variables.
    pub fn from_env() -> DiResult<Self> {
        Ok(Self::with_options(ContainerOptions::from_env()?))
    }

    pub fn options(&self) -> &ContainerOptions {
        &self.options
    }

    // ----- Registration -----

    /// Binds contract `C` to implementation `I` with an explicit lifetime.
    ///
    /// Registering a contract again replaces its binding (and drops any
    /// decorators and cached singleton). A configured lifetime override for
    /// `C` takes precedence over `lifetime`.
    pub fn register<C, I>(&mut self, lifetime: Lifetime) -> &mut Self
    where
        C: ?Sized + Send + Sync + 'static,
        I: Injectable + Implements<C>,
    {
        self.insert(Binding::implementation::<C, I>(lifetime))
    }

    /// Like [`register`](Container::register), with the lifetime given by
    /// name (`"singleton"`, `"scoped"` or `"transient"`, any case).
    ///
    /// # Errors
    ///
    /// [`ContainerError::InvalidLifetime`] for an unknown name.
    pub fn register_named<C, I>(&mut self, lifetime: &str) -> DiResult<&mut Self>
    where
        C: ?Sized + Send + Sync + 'static,
        I: Injectable + Implements<C>,
    {
        let lifetime = lifetime.parse::<Lifetime>()?;
        Ok(self.register::<C, I>(lifetime))
    }

    pub fn singleton<C, I>(&mut self) -> &mut Self
    where
        C: ?Sized + Send + Sync + 'static,
        I: Injectable + Implements<C>,
    {
        self.register::<C, I>(Lifetime::Singleton)
    }

    pub fn scoped<C, I>(&mut self) -> &mut Self
    where
        C: ?Sized + Send + Sync + 'static,
        I: Injectable + Implements<C>,
    {
        self.register::<C, I>(Lifetime::Scoped)
    }

    pub fn transient<C, I>(&mut self) -> &mut Self
    where
        C: ?Sized + Send + Sync + 'static,
        I: Injectable + Implements<C>,
    {
        self.register::<C, I>(Lifetime::Transient)
    }

    /// Registers `T` as its own contract.
    pub fn singleton_self<T: Injectable>(&mut self) -> &mut Self {
        self.register::<T, T>(Lifetime::Singleton)
    }

    pub fn scoped_self<T: Injectable>(&mut self) -> &mut Self {
        self.register::<T, T>(Lifetime::Scoped)
    }

    pub fn transient_self<T: Injectable>(&mut self) -> &mut Self {
        self.register::<T, T>(Lifetime::Transient)
    }

    /// Registers a prebuilt value as the singleton for `C`.
    ///
    /// Instances have no release hook and ignore lifetime overrides.
    pub fn instance<C>(&mut self, value: Arc<C>) -> &mut Self
    where
        C: ?Sized + Send + Sync + 'static,
    {
        self.insert(Binding::instance(value))
    }

    /// Binds `C` to a factory closure. `D` lists the contracts the factory
    /// needs, resolved before each call.
    ///
    /// ```
    /// use ferrous_ioc::{Container, Lifetime, Resolver};
    /// use std::sync::Arc;
    ///
    /// let mut container = Container::new();
    /// container
    ///     .instance(Arc::new(8080u16))
    ///     .factory::<String, _, _>(Lifetime::Transient, |(port,): (Arc<u16>,)| {
    ///         Arc::new(format!("http://localhost:{port}"))
    ///     });
    ///
    /// assert_eq!(*container.resolve::<String>().unwrap(), "http://localhost:8080");
    /// ```
    pub fn factory<C, D, F>(&mut self, lifetime: Lifetime, factory: F) -> &mut Self
    where
        C: ?Sized + Send + Sync + 'static,
        D: Dependencies,
        F: Fn(D) -> Arc<C> + Send + Sync + 'static,
    {
        self.insert(Binding::factory(factory, lifetime))
    }

    /// Wraps the current binding of `C` with decorator `D`.
    ///
    /// Decorators apply innermost-first in the order they were added; the
    /// resolved instance is the last one added.
    ///
    /// # Errors
    ///
    /// [`ContainerError::DecorateUnregistered`] if `C` has no binding yet.
    pub fn decorate<C, D>(&mut self) -> DiResult<&mut Self>
    where
        C: ?Sized + Send + Sync + 'static,
        D: Decorator<C>,
    {
        let key = key_of::<C>();
        self.binding_mut(&key)?.push_decorator::<C, D>();
        Ok(self.after_decorate(&key))
    }

    /// Wraps the current binding of `C` with a closure. `D` lists extra
    /// contracts the closure needs besides the inner instance.
    ///
    /// # Errors
    ///
    /// [`ContainerError::DecorateUnregistered`] if `C` has no binding yet.
    pub fn decorate_with<C, D, F>(&mut self, decorate: F) -> DiResult<&mut Self>
    where
        C: ?Sized + Send + Sync + 'static,
        D: Dependencies,
        F: Fn(Arc<C>, D) -> Arc<C> + Send + Sync + 'static,
    {
        let key = key_of::<C>();
        self.binding_mut(&key)?.push_decorator_fn::<C, D, F>(decorate);
        Ok(self.after_decorate(&key))
    }

    /// Adds an observer notified on every resolution.
    pub fn add_observer(&mut self, observer: Arc<dyn DiObserver>) -> &mut Self {
        self.observers.add(observer);
        self
    }

    fn insert(&mut self, mut binding: Binding) -> &mut Self {
        if binding.base.kind != LayerKind::Instance {
            if let Some(lifetime) = self.options.lifetime_override(&binding.contract) {
                binding.lifetime = lifetime;
            }
        }

        let contract = binding.contract;
        debug!(
            contract = contract.display_name(),
            implementation = binding.base.name,
            lifetime = %binding.lifetime,
            "registered binding"
        );

        self.singletons.evict(&contract);
        if self.registry.insert(binding).is_some() {
            debug!(contract = contract.display_name(), "replaced previous binding");
        }
        self
    }

    fn binding_mut(&mut self, key: &Key) -> DiResult<&mut Binding> {
        self.registry
            .get_mut(key)
            .ok_or_else(|| ContainerError::DecorateUnregistered(key.display_name()).into())
    }

    fn after_decorate(&mut self, key: &Key) -> &mut Self {
        self.singletons.evict(key);
        let layers = self.registry.get(key).map_or(0, |b| b.decorators.len());
        debug!(contract = key.display_name(), decorators = layers, "added decorator");
        self
    }

    // ----- Introspection -----

    /// Returns `true` if contract `C` has a binding.
    pub fn contains<C: ?Sized + 'static>(&self) -> bool {
        self.registry.contains(&key_of::<C>())
    }

    /// Number of registered contracts.
    pub fn len(&self) -> usize {
        self.registry.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registry.len() == 0
    }

    /// Descriptors of every binding, in registration order.
    pub fn descriptors(&self) -> Vec<BindingDescriptor> {
        self.registry.iter().map(Binding::descriptor).collect()
    }

    /// Builds the resolution graph of the current registrations.
    pub fn dependency_graph(&self) -> DependencyGraph {
        DependencyGraph::build(&self.registry)
    }

    // ----- Validation -----

    /// Checks the whole registry without constructing anything.
    ///
    /// # Errors
    ///
    /// The first violation, in this order: missing dependencies, then a
    /// cycle, then a singleton reaching a scoped binding.
    pub fn validate(&self) -> DiResult<()> {
        let report = Validator::new(&self.registry).run();
        match report.first_error() {
            Some(err) => debug!(errors = report.errors.len(), first = %err, "validation failed"),
            None => debug!(bindings = self.registry.len(), "validation passed"),
        }
        report.into_result()
    }

    /// Every validation error and warning. Warnings are also logged.
    pub fn validation_report(&self) -> ValidationReport {
        let report = Validator::new(&self.registry).run();
        for warning in &report.warnings {
            warn!(%warning, "container validation warning");
        }
        debug!(
            errors = report.errors.len(),
            warnings = report.warnings.len(),
            "validation report built"
        );
        report
    }

    // ----- Resolution -----

    /// Opens a new scope.
    pub fn scope(&self) -> Scope<'_> {
        Scope::new(self, self.next_scope_id.fetch_add(1, Ordering::Relaxed))
    }

    /// Runs `f` in a fresh scope, closing it afterwards.
    pub fn with_scope<R>(&self, f: impl FnOnce(&Scope<'_>) -> R) -> R {
        let scope = self.scope();
        let out = f(&scope);
        scope.close();
        out
    }

    /// Constructs every singleton now, in registration order.
    ///
    /// Returns how many singletons are cached afterwards.
    pub fn warm_up(&self) -> DiResult<usize> {
        for binding in self.registry.iter().filter(|b| b.lifetime == Lifetime::Singleton) {
            self.resolve_any(&binding.contract)?;
        }
        let cached = self.singletons.len();
        debug!(singletons = cached, "singletons warmed up");
        Ok(cached)
    }

    /// Runs singleton release hooks (most recently created first) and clears
    /// the singleton cache. Later resolutions build fresh singletons.
    pub fn dispose(&mut self) {
        let released = self.disposers.get_mut().run_all_reverse();
        self.singletons.clear();
        if released > 0 {
            debug!(released, "container disposed");
        }
    }
}

impl ResolverCore for Container {
    fn resolve_any(&self, key: &Key) -> DiResult<AnyArc> {
        let path = ResolutionPath::new(self.options.max_depth);
        ResolverContext::new(self, None, &path).resolve_key(key)
    }

    fn is_registered(&self, key: &Key) -> bool {
        self.registry.contains(key)
    }
}

impl Drop for Container {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl std::fmt::Debug for Container {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Container")
            .field("bindings", &self.registry.len())
            .field("singletons", &self.singletons.len())
            .field("observers", &self.observers.len())
            .field("options", &self.options)
            .finish()
    }
}
