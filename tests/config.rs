/// Container option tests
///
/// Options come from code, from `IOC_*` environment variables or, with the
/// `config` feature, from JSON.

use ferrous_ioc::{Container, ContainerError, ContainerOptions, DiError, Injectable, Lifetime, Resolver};
use serial_test::serial;
use std::sync::Arc;

struct Session;
impl Injectable for Session {
    type Deps = ();
    fn inject(_: ()) -> Self {
        Session
    }
}

#[test]
fn test_defaults() {
    let options = ContainerOptions::default();
    assert_eq!(options.max_depth, 1024);
    assert!(options.lifetime_overrides.is_empty());
}

#[test]
fn test_override_by_short_name_ignores_case() {
    let options = ContainerOptions::default().override_lifetime("session", Lifetime::Transient);
    let mut container = Container::with_options(options);
    container.singleton_self::<Session>();

    assert_eq!(container.descriptors()[0].lifetime, Lifetime::Transient);
    let a = container.resolve::<Session>().unwrap();
    let b = container.resolve::<Session>().unwrap();
    assert!(!Arc::ptr_eq(&a, &b));
}

trait Mailer: Send + Sync {}
trait Cache: Send + Sync {}

struct Smtp;
impl Injectable for Smtp {
    type Deps = ();
    fn inject(_: ()) -> Self {
        Smtp
    }
}
impl Mailer for Smtp {}
ferrous_ioc::implements!(Smtp => dyn Mailer + Send + Sync);

struct Memory;
impl Injectable for Memory {
    type Deps = ();
    fn inject(_: ()) -> Self {
        Memory
    }
}
impl Cache for Memory {}
ferrous_ioc::implements!(Memory => dyn Cache + Send + Sync);

#[test]
fn test_override_trait_object_contract_with_auto_traits() {
    let options = ContainerOptions::from_vars(
        "IOC",
        [("IOC_LIFETIME_MAILER", "scoped"), ("IOC_LIFETIME_SYNC", "transient")],
    )
    .unwrap();
    let mut container = Container::with_options(options);
    container
        .singleton::<dyn Mailer + Send + Sync, Smtp>()
        .singleton::<dyn Cache + Send + Sync, Memory>();

    let descriptors = container.descriptors();
    assert_eq!(descriptors[0].lifetime, Lifetime::Scoped);
    assert_eq!(descriptors[1].lifetime, Lifetime::Singleton);
    assert_eq!(descriptors[0].contract.short_name(), "Mailer");
}

#[test]
fn test_instances_ignore_overrides() {
    let options = ContainerOptions::default().override_lifetime("String", Lifetime::Transient);
    let mut container = Container::with_options(options);
    container.instance(Arc::new("fixed".to_string()));
    assert_eq!(container.descriptors()[0].lifetime, Lifetime::Singleton);
}

#[test]
fn test_from_vars() {
    let options = ContainerOptions::from_vars(
        "IOC",
        [
            ("IOC_MAX_DEPTH", "32"),
            ("IOC_LIFETIME_Session", "scoped"),
            ("PATH", "/usr/bin"),
        ],
    )
    .unwrap();

    assert_eq!(options.max_depth, 32);
    assert_eq!(options.lifetime_overrides.get("Session"), Some(&Lifetime::Scoped));
}

#[test]
fn test_from_vars_rejects_bad_values() {
    let zero = ContainerOptions::from_vars("IOC", [("IOC_MAX_DEPTH", "0")]);
    assert!(matches!(zero, Err(DiError::Container(ContainerError::InvalidOption { .. }))));

    let nan = ContainerOptions::from_vars("IOC", [("IOC_MAX_DEPTH", "deep")]);
    assert!(matches!(nan, Err(DiError::Container(ContainerError::InvalidOption { .. }))));

    let unnamed = ContainerOptions::from_vars("IOC", [("IOC_LIFETIME_", "scoped")]);
    assert!(matches!(unnamed, Err(DiError::Container(ContainerError::InvalidOption { .. }))));

    let lifetime = ContainerOptions::from_vars("IOC", [("IOC_LIFETIME_Session", "request")]);
    assert_eq!(
        lifetime,
        Err(DiError::Container(ContainerError::InvalidLifetime("request".to_string())))
    );
}

#[test]
#[serial]
fn test_from_env() {
    std::env::set_var("FERROUS_TEST_MAX_DEPTH", "7");
    std::env::set_var("FERROUS_TEST_LIFETIME_Session", "Transient");

    let options = ContainerOptions::from_env_prefixed("ferrous_test").unwrap();

    std::env::remove_var("FERROUS_TEST_MAX_DEPTH");
    std::env::remove_var("FERROUS_TEST_LIFETIME_Session");

    assert_eq!(options.max_depth, 7);
    assert_eq!(options.lifetime_overrides.get("Session"), Some(&Lifetime::Transient));
}

#[test]
#[serial]
fn test_container_from_env_without_variables() {
    let container = Container::from_env().unwrap();
    assert_eq!(container.options().max_depth, ContainerOptions::default().max_depth);
}

#[cfg(feature = "config")]
mod json {
    use super::*;

    #[test]
    fn test_from_json() {
        let options =
            ContainerOptions::from_json(r#"{ "max_depth": 64, "lifetimes": { "Session": "scoped" } }"#).unwrap();
        assert_eq!(options.max_depth, 64);
        assert_eq!(options.lifetime_overrides.get("Session"), Some(&Lifetime::Scoped));

        assert_eq!(ContainerOptions::from_json("{}").unwrap(), ContainerOptions::default());
    }

    #[test]
    fn test_from_json_rejects_unknown_fields() {
        let err = ContainerOptions::from_json(r#"{ "depth": 3 }"#);
        assert!(matches!(err, Err(DiError::Container(ContainerError::InvalidOption { .. }))));
    }

    #[test]
    fn test_from_json_file() {
        let path = std::env::temp_dir().join(format!("ferrous-ioc-{}.json", std::process::id()));
        std::fs::write(&path, r#"{ "lifetimes": { "Session": "transient" } }"#).unwrap();
        let options = ContainerOptions::from_json_file(&path);
        std::fs::remove_file(&path).unwrap();

        assert_eq!(
            options.unwrap().lifetime_overrides.get("Session"),
            Some(&Lifetime::Transient)
        );
        assert!(ContainerOptions::from_json_file("/nonexistent/ioc.json").is_err());
    }
}
