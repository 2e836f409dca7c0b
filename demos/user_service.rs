//! User service wiring: singleton configuration and cache, a scoped
//! repository behind a caching decorator, a transient mailer and a
//! factory-built connection string. Finishes with three configurations
//! that `validate()` rejects.
//!
//! Run with `RUST_LOG=ferrous_ioc=debug cargo run --example user_service`
//! to see the container's own events.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use ferrous_ioc::{
    implements, Container, Decorator, DiError, DiResult, Injectable, Lifetime, Resolver, TracingObserver,
};
use tracing_subscriber::EnvFilter;

// ===== Abstractions =====

trait Config: Send + Sync {
    fn get(&self, key: &str) -> String;
}

trait UserRepository: Send + Sync {
    fn get(&self, user_id: u32) -> User;
}

trait EmailSender: Send + Sync {
    fn send(&self, to: &str, body: &str);
}

trait Cache: Send + Sync {
    fn get(&self, key: &str) -> Option<User>;
    fn set(&self, key: &str, value: User);
}

#[derive(Debug, Clone)]
struct User {
    id: u32,
    email: String,
}

// ===== Implementations =====

struct EnvConfig {
    values: HashMap<&'static str, &'static str>,
}

impl Injectable for EnvConfig {
    type Deps = ();
    fn inject(_: ()) -> Self {
        EnvConfig {
            values: HashMap::from([("db_url", "postgresql://localhost/app")]),
        }
    }
}

impl Config for EnvConfig {
    fn get(&self, key: &str) -> String {
        self.values.get(key).copied().unwrap_or_default().to_string()
    }
}
implements!(EnvConfig => dyn Config);

struct PostgresUserRepository;

impl Injectable for PostgresUserRepository {
    type Deps = (Arc<dyn Config>,);
    fn inject((config,): Self::Deps) -> Self {
        println!("  [PostgresUserRepository] connected to {}", config.get("db_url"));
        PostgresUserRepository
    }

    fn dispose(&self) {
        println!("  [PostgresUserRepository] connection closed");
    }
}

impl UserRepository for PostgresUserRepository {
    fn get(&self, user_id: u32) -> User {
        println!("  [PostgresUserRepository] fetching user {user_id} from DB");
        User {
            id: user_id,
            email: format!("user{user_id}@example.com"),
        }
    }
}
implements!(PostgresUserRepository => dyn UserRepository);

#[derive(Default)]
struct InMemoryCache {
    store: Mutex<HashMap<String, User>>,
}

impl Injectable for InMemoryCache {
    type Deps = ();
    fn inject(_: ()) -> Self {
        InMemoryCache::default()
    }
}

impl Cache for InMemoryCache {
    fn get(&self, key: &str) -> Option<User> {
        let result = self.store.lock().ok()?.get(key).cloned();
        println!("  [Cache] GET {key} -> {}", if result.is_some() { "HIT" } else { "MISS" });
        result
    }

    fn set(&self, key: &str, value: User) {
        println!("  [Cache] SET {key}");
        if let Ok(mut store) = self.store.lock() {
            store.insert(key.to_string(), value);
        }
    }
}
implements!(InMemoryCache => dyn Cache);

/// Adds caching to whatever `UserRepository` it wraps.
struct CachedUserRepository {
    inner: Arc<dyn UserRepository>,
    cache: Arc<dyn Cache>,
}

impl Decorator<dyn UserRepository> for CachedUserRepository {
    type Deps = (Arc<dyn Cache>,);
    fn decorate(inner: Arc<dyn UserRepository>, (cache,): Self::Deps) -> Self {
        CachedUserRepository { inner, cache }
    }
}

impl UserRepository for CachedUserRepository {
    fn get(&self, user_id: u32) -> User {
        let key = format!("user:{user_id}");
        if let Some(user) = self.cache.get(&key) {
            return user;
        }
        let user = self.inner.get(user_id);
        self.cache.set(&key, user.clone());
        user
    }
}
implements!(CachedUserRepository => dyn UserRepository);

struct SmtpEmailSender {
    _users: Arc<dyn UserRepository>,
}

impl Injectable for SmtpEmailSender {
    type Deps = (Arc<dyn UserRepository>,);
    fn inject((users,): Self::Deps) -> Self {
        SmtpEmailSender { _users: users }
    }
}

impl EmailSender for SmtpEmailSender {
    fn send(&self, to: &str, body: &str) {
        println!("  [SmtpEmailSender] sending to {to}: {body}");
    }
}
implements!(SmtpEmailSender => dyn EmailSender);

// ===== Composition =====

fn build_container() -> DiResult<Container> {
    let mut container = Container::from_env()?;
    container
        .singleton::<dyn Config, EnvConfig>()
        .singleton::<dyn Cache, InMemoryCache>()
        .scoped::<dyn UserRepository, PostgresUserRepository>()
        .decorate::<dyn UserRepository, CachedUserRepository>()?
        .transient::<dyn EmailSender, SmtpEmailSender>()
        .factory::<String, _, _>(Lifetime::Singleton, |(config,): (Arc<dyn Config>,)| {
            Arc::new(format!("Connection to {}", config.get("db_url")))
        })
        .add_observer(Arc::new(TracingObserver::new()));
    Ok(container)
}

fn banner(title: &str) {
    println!("\n{}\n{title}\n{}", "=".repeat(60), "=".repeat(60));
}

fn run() -> DiResult<()> {
    banner("Setting up container...");
    let container = build_container()?;

    println!("\nValidating container configuration...");
    container.validate()?;
    println!("container configuration is valid");
    println!("factory value: {}", container.resolve::<String>()?);

    banner("Scope 1: first request");
    container.with_scope(|scope| -> DiResult<()> {
        println!("\nResolving EmailSender...");
        let sender = scope.resolve::<dyn EmailSender>()?;

        println!("\nFetching user 1 (should hit DB)...");
        let users = scope.resolve::<dyn UserRepository>()?;
        let user = users.get(1);
        println!("got user: {user:?}");

        println!("\nFetching user 1 again (should hit cache)...");
        let user = users.get(1);
        sender.send(&user.email, "welcome back");
        Ok(())
    })?;

    banner("Scope 2: second request (new scope, same singletons)");
    container.with_scope(|scope| -> DiResult<()> {
        println!("\nResolving UserRepository (new scoped instance)...");
        let users = scope.resolve::<dyn UserRepository>()?;

        println!("\nFetching user 1 (cache is a singleton, should still hit)...");
        println!("got user: {:?}", users.get(1));

        println!("\nFetching user 2 (should hit DB)...");
        let user = users.get(2);
        println!("got user {} <{}>", user.id, user.email);
        Ok(())
    })?;

    banner("Validation examples");
    validation_examples();
    Ok(())
}

// ===== Rejected configurations =====

struct UnregisteredService;

struct NeedsUnregistered;
impl Injectable for NeedsUnregistered {
    type Deps = (Arc<UnregisteredService>,);
    fn inject(_: Self::Deps) -> Self {
        NeedsUnregistered
    }
}

struct ServiceA;
impl Injectable for ServiceA {
    type Deps = (Arc<ServiceB>,);
    fn inject(_: Self::Deps) -> Self {
        ServiceA
    }
}

struct ServiceB;
impl Injectable for ServiceB {
    type Deps = (Arc<ServiceA>,);
    fn inject(_: Self::Deps) -> Self {
        ServiceB
    }
}

struct ScopedService;
impl Injectable for ScopedService {
    type Deps = ();
    fn inject(_: ()) -> Self {
        ScopedService
    }
}

struct SingletonService;
impl Injectable for SingletonService {
    type Deps = (Arc<ScopedService>,);
    fn inject(_: Self::Deps) -> Self {
        SingletonService
    }
}

fn report(label: &str, result: DiResult<()>) {
    match result {
        Err(err) => println!("\n{label}:\n   caught ({}): {err}", kind(&err)),
        Ok(()) => println!("\n{label}:\n   unexpectedly valid"),
    }
}

fn kind(err: &DiError) -> &'static str {
    match err {
        DiError::MissingDependency { .. } => "missing",
        DiError::CircularDependency(_) => "cycle",
        DiError::Container(_) => "container",
    }
}

fn validation_examples() {
    let mut missing = Container::new();
    missing.transient_self::<NeedsUnregistered>();
    report("1. Missing dependency", missing.validate());

    let mut circular = Container::new();
    circular.transient_self::<ServiceA>().transient_self::<ServiceB>();
    report("2. Circular dependency", circular.validate());

    let mut mismatch = Container::new();
    mismatch
        .scoped_self::<ScopedService>()
        .singleton_self::<SingletonService>();
    report("3. Lifetime mismatch (singleton -> scoped)", mismatch.validate());
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    if let Err(err) = run() {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}
