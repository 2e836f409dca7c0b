/// Property-based tests for service resolution
///
/// These tests verify that caching and decoration follow the declared
/// lifetime and registration order regardless of the values involved.

use ferrous_ioc::{Container, ContainerError, DiError, Lifetime, Resolver};
use proptest::prelude::*;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

fn any_lifetime() -> impl Strategy<Value = Lifetime> {
    prop_oneof![
        Just(Lifetime::Singleton),
        Just(Lifetime::Scoped),
        Just(Lifetime::Transient),
    ]
}

#[derive(Debug)]
struct Payload {
    value: String,
}

// Property: an instance binding always hands back the registered value
proptest! {
    #[test]
    fn instance_resolution_consistency(value in "\\PC{0,50}") {
        let mut container = Container::new();
        container.instance(Arc::new(Payload { value: value.clone() }));

        let a = container.resolve::<Payload>().unwrap();
        let b = container.with_scope(|scope| scope.resolve::<Payload>().unwrap());

        prop_assert!(Arc::ptr_eq(&a, &b));
        prop_assert_eq!(&a.value, &value);
    }
}

// Property: sharing within and across scopes follows the lifetime
proptest! {
    #[test]
    fn caching_follows_lifetime(lifetime in any_lifetime(), resolutions in 2usize..8) {
        let builds = Arc::new(AtomicUsize::new(0));
        let counter = builds.clone();
        let mut container = Container::new();
        container.factory::<Payload, _, _>(lifetime, move |_: ()| {
            let n = counter.fetch_add(1, Ordering::SeqCst);
            Arc::new(Payload { value: n.to_string() })
        });

        let first_scope = container.scope();
        let second_scope = container.scope();

        let within: Vec<_> = (0..resolutions)
            .map(|_| first_scope.resolve::<Payload>().unwrap())
            .collect();
        let across = second_scope.resolve::<Payload>().unwrap();

        let shared_within = within.windows(2).all(|w| Arc::ptr_eq(&w[0], &w[1]));
        prop_assert_eq!(shared_within, lifetime.is_cached());
        prop_assert_eq!(Arc::ptr_eq(&within[0], &across), lifetime == Lifetime::Singleton);

        let expected_builds = match lifetime {
            Lifetime::Singleton => 1,
            Lifetime::Scoped => 2,
            Lifetime::Transient => resolutions + 1,
        };
        prop_assert_eq!(builds.load(Ordering::SeqCst), expected_builds);
    }
}

// Property: a scoped binding is only reachable from a scope
proptest! {
    #[test]
    fn root_resolution_depends_on_lifetime(lifetime in any_lifetime()) {
        let mut container = Container::new();
        container.factory::<Payload, _, _>(lifetime, |_: ()| {
            Arc::new(Payload { value: String::new() })
        });

        let result = container.resolve::<Payload>();
        if lifetime == Lifetime::Scoped {
            let is_outside_scope = matches!(
                result,
                Err(DiError::Container(ContainerError::ScopedOutsideScope(_)))
            );
            prop_assert!(is_outside_scope);
        } else {
            prop_assert!(result.is_ok());
        }
    }
}

// Property: optional resolution matches registration state
proptest! {
    #[test]
    fn optional_resolution_behavior(register_service in any::<bool>()) {
        let mut container = Container::new();
        if register_service {
            container.instance(Arc::new(42u64));
        }

        let resolved = container.try_resolve::<u64>().unwrap();
        prop_assert_eq!(resolved.is_some(), register_service);
        prop_assert_eq!(container.contains::<u64>(), register_service);
    }
}

// Property: decorators apply innermost-first in registration order
proptest! {
    #[test]
    fn decorators_apply_in_order(tags in prop::collection::vec("[a-z]{1,4}", 0..6), lifetime in any_lifetime()) {
        let mut container = Container::new();
        container.factory::<String, _, _>(lifetime, |_: ()| Arc::new("base".to_string()));
        for tag in &tags {
            let tag = tag.clone();
            container
                .decorate_with::<String, (), _>(move |inner, _| Arc::new(format!("{tag}({inner})")))
                .unwrap();
        }

        let resolved = container.with_scope(|scope| scope.resolve::<String>().unwrap());
        let expected = tags
            .iter()
            .fold("base".to_string(), |inner, tag| format!("{tag}({inner})"));
        prop_assert_eq!(&*resolved, &expected);
        prop_assert_eq!(container.descriptors()[0].decorators.len(), tags.len());
    }
}
