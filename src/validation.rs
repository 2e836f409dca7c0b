//! Static validation of a container's registrations.
//!
//! Validation reads declared dependencies only; nothing is constructed.
//!
//! # Rules
//!
//! - **Missing**: every required dependency of every layer must be
//!   registered.
//! - **Cycles**: the resolution graph must be acyclic.
//! - **Singleton → Scoped**: error, directly or through transients.
//! - **Singleton → Transient**: warning; the singleton keeps one transient
//!   instance forever.
//! - **Optional dependency not registered**: warning; it resolves to `None`.
//!
//! Errors are ordered: missing dependencies (registration order, base layer
//! before decorators, declared parameter order), then the first cycle, then
//! lifetime mismatches per singleton in registration order.

use std::collections::HashSet;
use std::fmt;

use crate::error::{ContainerError, DiError, DiResult};
use crate::graph::DependencyGraph;
use crate::key::Key;
use crate::lifetime::Lifetime;
use crate::registration::{Binding, Registry};

/// Everything validation found.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    /// Errors in deterministic order.
    pub errors: Vec<DiError>,
    /// Findings that do not prevent resolution.
    pub warnings: Vec<ValidationWarning>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// The first error, if any.
    pub fn first_error(&self) -> Option<&DiError> {
        self.errors.first()
    }

    /// `Ok(())` when valid, otherwise the first error.
    pub fn into_result(self) -> DiResult<()> {
        match self.errors.into_iter().next() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

/// Non-fatal validation finding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationWarning {
    /// A singleton directly depends on a transient, keeping one instance of
    /// it for the container's lifetime.
    SingletonCapturesTransient {
        singleton: &'static str,
        transient: &'static str,
    },
    /// An optional dependency has no binding and will resolve to `None`.
    OptionalDependencyMissing {
        consumer: &'static str,
        dependency: &'static str,
    },
}

impl fmt::Display for ValidationWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationWarning::SingletonCapturesTransient { singleton, transient } => {
                write!(f, "singleton {singleton} captures transient {transient}")
            }
            ValidationWarning::OptionalDependencyMissing { consumer, dependency } => {
                write!(f, "optional dependency {dependency} of {consumer} is not registered")
            }
        }
    }
}

pub(crate) struct Validator<'r> {
    registry: &'r Registry,
}

impl<'r> Validator<'r> {
    pub(crate) fn new(registry: &'r Registry) -> Self {
        Self { registry }
    }

    pub(crate) fn run(&self) -> ValidationReport {
        let mut report = ValidationReport::default();

        self.check_missing(&mut report);

        if let Some(cycle) = DependencyGraph::build(self.registry).find_cycle() {
            report.errors.push(DiError::CircularDependency(cycle));
        }

        for binding in self.registry.iter().filter(|b| b.lifetime == Lifetime::Singleton) {
            if let Some(err) = self.check_scoped_capture(binding) {
                report.errors.push(err.into());
            }
        }

        self.collect_warnings(&mut report);
        report
    }

    fn check_missing(&self, report: &mut ValidationReport) {
        for binding in self.registry.iter() {
            for layer in binding.layers() {
                for dep in layer.dependencies.iter().filter(|d| !d.optional) {
                    if !self.registry.contains(&dep.key) {
                        report.errors.push(DiError::MissingDependency {
                            contract: dep.key.display_name(),
                            requester: binding.contract.display_name(),
                        });
                    }
                }
            }
        }
    }

    /// Finds the first scoped binding `singleton` reaches, walking through
    /// transients only.
    fn check_scoped_capture(&self, singleton: &Binding) -> Option<ContainerError> {
        let mut path = vec![singleton.contract];
        let mut visited = HashSet::from([singleton.contract]);

        self.walk_transients(singleton, &mut path, &mut visited)?;

        let dependency = path.last().copied().unwrap_or(singleton.contract);
        Some(ContainerError::LifetimeMismatch {
            consumer: singleton.contract.display_name(),
            consumer_lifetime: Lifetime::Singleton,
            dependency: dependency.display_name(),
            dependency_lifetime: Lifetime::Scoped,
            path: path.iter().map(Key::display_name).collect(),
        })
    }

    // Leaves `path` ending at the scoped contract when one is found.
    fn walk_transients(&self, binding: &Binding, path: &mut Vec<Key>, visited: &mut HashSet<Key>) -> Option<()> {
        for dep in binding.layers().flat_map(|layer| layer.dependencies.iter()) {
            let Some(target) = self.registry.get(&dep.key) else {
                continue;
            };
            match target.lifetime {
                Lifetime::Scoped => {
                    path.push(dep.key);
                    return Some(());
                }
                Lifetime::Transient if visited.insert(dep.key) => {
                    path.push(dep.key);
                    if self.walk_transients(target, path, visited).is_some() {
                        return Some(());
                    }
                    path.pop();
                }
                _ => {}
            }
        }
        None
    }

    fn collect_warnings(&self, report: &mut ValidationReport) {
        for binding in self.registry.iter() {
            for dep in binding.layers().flat_map(|layer| layer.dependencies.iter()) {
                let warning = match self.registry.get(&dep.key) {
                    None if dep.optional => ValidationWarning::OptionalDependencyMissing {
                        consumer: binding.contract.display_name(),
                        dependency: dep.key.display_name(),
                    },
                    Some(target)
                        if binding.lifetime == Lifetime::Singleton && target.lifetime == Lifetime::Transient =>
                    {
                        ValidationWarning::SingletonCapturesTransient {
                            singleton: binding.contract.display_name(),
                            transient: dep.key.display_name(),
                        }
                    }
                    _ => continue,
                };
                if !report.warnings.contains(&warning) {
                    report.warnings.push(warning);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::key_of;
    use crate::traits::Injectable;
    use std::sync::Arc;

    struct Session;
    impl Injectable for Session {
        type Deps = ();
        fn inject(_: ()) -> Self {
            Session
        }
    }

    struct Handler;
    impl Injectable for Handler {
        type Deps = (Arc<Session>,);
        fn inject(_: Self::Deps) -> Self {
            Handler
        }
    }

    struct Cache;
    impl Injectable for Cache {
        type Deps = (Arc<Handler>, Option<Arc<String>>);
        fn inject(_: Self::Deps) -> Self {
            Cache
        }
    }

    fn registry(cache: Lifetime, handler: Lifetime) -> Registry {
        let mut registry = Registry::new();
        registry.insert(Binding::implementation::<Cache, Cache>(cache));
        registry.insert(Binding::implementation::<Handler, Handler>(handler));
        registry.insert(Binding::implementation::<Session, Session>(Lifetime::Scoped));
        registry
    }

    #[test]
    fn singleton_reaching_scoped_through_transient() {
        let registry = registry(Lifetime::Singleton, Lifetime::Transient);

        let report = Validator::new(&registry).run();
        assert_eq!(report.errors.len(), 1);
        match &report.errors[0] {
            DiError::Container(ContainerError::LifetimeMismatch { consumer, dependency, path, .. }) => {
                assert_eq!(*consumer, key_of::<Cache>().display_name());
                assert_eq!(*dependency, key_of::<Session>().display_name());
                assert_eq!(path.len(), 3);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(report.warnings.contains(&ValidationWarning::SingletonCapturesTransient {
            singleton: key_of::<Cache>().display_name(),
            transient: key_of::<Handler>().display_name(),
        }));
        assert!(report.warnings.contains(&ValidationWarning::OptionalDependencyMissing {
            consumer: key_of::<Cache>().display_name(),
            dependency: key_of::<String>().display_name(),
        }));
    }

    #[test]
    fn singleton_boundary_stops_the_walk() {
        let registry = registry(Lifetime::Singleton, Lifetime::Singleton);

        // Reported once, at the singleton that owns the scoped edge.
        let report = Validator::new(&registry).run();
        assert_eq!(report.errors.len(), 1);
        assert!(matches!(
            &report.errors[0],
            DiError::Container(ContainerError::LifetimeMismatch { consumer, .. })
                if *consumer == key_of::<Handler>().display_name()
        ));
    }

    #[test]
    fn missing_is_reported_before_lifetimes() {
        let mut registry = Registry::new();
        registry.insert(Binding::implementation::<Handler, Handler>(Lifetime::Singleton));
        let report = Validator::new(&registry).run();
        assert_eq!(
            report.into_result(),
            Err(DiError::MissingDependency {
                contract: key_of::<Session>().display_name(),
                requester: key_of::<Handler>().display_name(),
            })
        );
    }
}
