/// Release hook tests
///
/// Scoped instances are released when their scope closes and singletons
/// when the container is disposed, most recently created first.
/// Transients are owned by the caller and never released by the container.

use ferrous_ioc::{implements, Container, Decorator, Injectable, Resolver};
use std::sync::{Arc, Mutex, Weak};

#[derive(Default)]
struct ReleaseLog(Mutex<Vec<&'static str>>);

impl ReleaseLog {
    fn record(&self, name: &'static str) {
        self.0.lock().unwrap().push(name);
    }

    fn entries(&self) -> Vec<&'static str> {
        self.0.lock().unwrap().clone()
    }
}

struct Connection {
    log: Arc<ReleaseLog>,
}
impl Injectable for Connection {
    type Deps = (Arc<ReleaseLog>,);
    fn inject((log,): Self::Deps) -> Self {
        Connection { log }
    }
    fn dispose(&self) {
        self.log.record("connection");
    }
}

struct UnitOfWork {
    log: Arc<ReleaseLog>,
    _connection: Arc<Connection>,
}
impl Injectable for UnitOfWork {
    type Deps = (Arc<ReleaseLog>, Arc<Connection>);
    fn inject((log, connection): Self::Deps) -> Self {
        UnitOfWork {
            log,
            _connection: connection,
        }
    }
    fn dispose(&self) {
        self.log.record("unit_of_work");
    }
}

struct Command {
    log: Arc<ReleaseLog>,
    _work: Arc<UnitOfWork>,
}
impl Injectable for Command {
    type Deps = (Arc<ReleaseLog>, Arc<UnitOfWork>);
    fn inject((log, work): Self::Deps) -> Self {
        Command { log, _work: work }
    }
    fn dispose(&self) {
        self.log.record("command");
    }
}

fn container(log: &Arc<ReleaseLog>) -> Container {
    let mut container = Container::new();
    container
        .instance(log.clone())
        .scoped_self::<Connection>()
        .scoped_self::<UnitOfWork>()
        .transient_self::<Command>();
    container
}

#[test]
fn test_scope_close_releases_in_reverse_creation_order() {
    let log = Arc::new(ReleaseLog::default());
    let container = container(&log);

    let scope = container.scope();
    scope.resolve::<UnitOfWork>().unwrap();
    assert!(log.entries().is_empty());

    scope.close();
    // Connection was created first as a dependency, so it goes last.
    assert_eq!(log.entries(), vec!["unit_of_work", "connection"]);

    // A second close does not run hooks again.
    scope.close();
    assert_eq!(log.entries().len(), 2);
}

#[test]
fn test_scope_drop_closes_it() {
    let log = Arc::new(ReleaseLog::default());
    let container = container(&log);

    {
        let scope = container.scope();
        scope.resolve::<Connection>().unwrap();
    }
    assert_eq!(log.entries(), vec!["connection"]);
}

#[test]
fn test_transients_are_never_released() {
    let log = Arc::new(ReleaseLog::default());
    let container = container(&log);

    container.with_scope(|scope| {
        scope.resolve::<Command>().unwrap();
        scope.resolve::<Command>().unwrap();
    });
    assert!(!log.entries().contains(&"command"));
    assert_eq!(log.entries(), vec!["unit_of_work", "connection"]);
}

#[test]
fn test_scope_releases_its_instances() {
    let log = Arc::new(ReleaseLog::default());
    let container = container(&log);

    let weak: Weak<Connection> = {
        let scope = container.scope();
        let connection = scope.resolve::<Connection>().unwrap();
        let weak = Arc::downgrade(&connection);
        drop(connection);
        // The scope still holds it.
        assert!(weak.upgrade().is_some());
        scope.close();
        weak
    };
    assert!(weak.upgrade().is_none());
}

#[test]
fn test_each_scope_releases_only_its_own() {
    let log = Arc::new(ReleaseLog::default());
    let container = container(&log);

    let outer = container.scope();
    outer.resolve::<Connection>().unwrap();

    container.with_scope(|inner| {
        inner.resolve::<UnitOfWork>().unwrap();
    });
    assert_eq!(log.entries(), vec!["unit_of_work", "connection"]);

    outer.close();
    assert_eq!(log.entries(), vec!["unit_of_work", "connection", "connection"]);
}

#[test]
fn test_container_dispose_releases_singletons() {
    let log = Arc::new(ReleaseLog::default());
    let mut container = Container::new();
    container
        .instance(log.clone())
        .singleton_self::<Connection>()
        .singleton_self::<UnitOfWork>();

    let first = container.resolve::<UnitOfWork>().unwrap();
    container.dispose();
    assert_eq!(log.entries(), vec!["unit_of_work", "connection"]);

    // Disposal clears the cache; the next resolution builds afresh.
    let second = container.resolve::<UnitOfWork>().unwrap();
    assert!(!Arc::ptr_eq(&first, &second));
}

#[test]
fn test_container_drop_releases_singletons() {
    let log = Arc::new(ReleaseLog::default());
    {
        let mut container = Container::new();
        container.instance(log.clone()).singleton_self::<Connection>();
        container.resolve::<Connection>().unwrap();
        assert!(log.entries().is_empty());
    }
    assert_eq!(log.entries(), vec!["connection"]);
}

#[test]
fn test_unconstructed_singletons_are_not_released() {
    let log = Arc::new(ReleaseLog::default());
    let mut container = Container::new();
    container.instance(log.clone()).singleton_self::<Connection>();
    container.dispose();
    assert!(log.entries().is_empty());
}

#[test]
fn test_decorator_released_before_inner() {
    trait Sink: Send + Sync {}

    struct FileSink {
        log: Arc<ReleaseLog>,
    }
    impl Injectable for FileSink {
        type Deps = (Arc<ReleaseLog>,);
        fn inject((log,): Self::Deps) -> Self {
            FileSink { log }
        }
        fn dispose(&self) {
            self.log.record("file");
        }
    }
    impl Sink for FileSink {}
    implements!(FileSink => dyn Sink);

    struct Buffered {
        log: Arc<ReleaseLog>,
        _inner: Arc<dyn Sink>,
    }
    impl Decorator<dyn Sink> for Buffered {
        type Deps = (Arc<ReleaseLog>,);
        fn decorate(inner: Arc<dyn Sink>, (log,): Self::Deps) -> Self {
            Buffered { log, _inner: inner }
        }
        fn dispose(&self) {
            self.log.record("buffer");
        }
    }
    impl Sink for Buffered {}
    implements!(Buffered => dyn Sink);

    let log = Arc::new(ReleaseLog::default());
    let mut container = Container::new();
    container
        .instance(log.clone())
        .scoped::<dyn Sink, FileSink>()
        .decorate::<dyn Sink, Buffered>()
        .unwrap();

    container.with_scope(|scope| {
        scope.resolve::<dyn Sink>().unwrap();
    });
    assert_eq!(log.entries(), vec!["buffer", "file"]);
}
