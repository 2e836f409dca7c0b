/// Unit tests for Key type methods

use ferrous_ioc::{key_of, Key};
use std::any::TypeId;
use std::collections::HashSet;

trait Repository: Send + Sync {}
trait Mailer: Send + Sync {}

#[test]
fn test_key_display_name() {
    let key = key_of::<String>();
    assert_eq!(key.display_name(), "alloc::string::String");
    assert_eq!(key.to_string(), "alloc::string::String");
    assert_eq!(format!("{key:?}"), "Key(alloc::string::String)");
}

#[test]
fn test_key_type_id() {
    assert_eq!(key_of::<u32>().type_id(), TypeId::of::<u32>());
    assert_eq!(key_of::<dyn Repository>().type_id(), TypeId::of::<dyn Repository>());
}

#[test]
fn test_key_short_name() {
    assert_eq!(key_of::<String>().short_name(), "String");
    assert_eq!(key_of::<dyn Repository>().short_name(), "Repository");
    assert_eq!(key_of::<Vec<u8>>().short_name(), "Vec<u8>");
    assert_eq!(key_of::<u64>().short_name(), "u64");
}

#[test]
fn test_key_short_name_drops_auto_traits() {
    let key = key_of::<dyn Mailer + Send + Sync>();
    assert!(key.display_name().contains(" + "));
    assert_eq!(key.short_name(), "Mailer");
    assert!(key.matches_name("MAILER"));
    assert!(!key.matches_name("Sync"));
}

#[test]
fn test_key_matches_name() {
    let key = key_of::<dyn Repository>();
    assert!(key.matches_name("Repository"));
    assert!(key.matches_name(key.display_name()));
    assert!(key.matches_name("repository"));
    assert!(!key.matches_name("Repo"));
}

#[test]
fn test_key_equality_ignores_name() {
    let a = Key::new(TypeId::of::<u8>(), "first");
    let b = Key::new(TypeId::of::<u8>(), "second");
    let c = Key::new(TypeId::of::<u16>(), "first");

    assert_eq!(a, b);
    assert_ne!(a, c);

    let set: HashSet<Key> = [a, b, c].into_iter().collect();
    assert_eq!(set.len(), 2);
}

#[test]
fn test_trait_and_concrete_keys_differ() {
    struct Sql;
    impl Repository for Sql {}

    assert_ne!(key_of::<dyn Repository>(), key_of::<Sql>());
    assert_ne!(key_of::<dyn Repository>(), key_of::<Box<dyn Repository>>());
    assert!(key_of::<dyn Repository>().display_name().starts_with("dyn "));
}
