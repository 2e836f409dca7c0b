//! Contract keys for the registration store.

use std::any::TypeId;
use std::fmt;
use std::hash::{Hash, Hasher};

/// Key identifying a contract in the container.
///
/// A contract is any `'static` type, sized or not, so both concrete types
/// and trait-object types (`dyn Logger`) can be used as registry keys.
/// Equality and hashing use the `TypeId` only; the name is carried for
/// diagnostics.
///
/// # Examples
///
/// ```rust
/// use ferrous_ioc::{key_of, Key};
///
/// trait Logger: Send + Sync {}
///
/// let key: Key = key_of::<dyn Logger>();
/// assert_eq!(key.short_name(), "Logger");
/// assert_eq!(key, key_of::<dyn Logger>());
/// assert_ne!(key, key_of::<String>());
/// ```
#[derive(Clone, Copy)]
pub struct Key {
    id: TypeId,
    name: &'static str,
}

impl Key {
    /// Creates a key from its parts.
    pub fn new(id: TypeId, name: &'static str) -> Self {
        Self { id, name }
    }

    /// The `TypeId` of the contract.
    pub fn type_id(&self) -> TypeId {
        self.id
    }

    /// Full type name, as produced by `std::any::type_name`.
    pub fn display_name(&self) -> &'static str {
        self.name
    }

    /// Type name without the `dyn ` prefix, auto-trait bounds and module
    /// path.
    ///
    /// `dyn app::Mailer + core::marker::Send + core::marker::Sync` becomes
    /// `Mailer`. Generic arguments are kept verbatim: `alloc::vec::Vec<u8>`
    /// becomes `Vec<u8>`.
    pub fn short_name(&self) -> &'static str {
        let name = self.name.strip_prefix("dyn ").unwrap_or(self.name);
        let generics = name.find('<');
        let name = match name.find(" + ") {
            Some(plus) if generics.map_or(true, |lt| plus < lt) => &name[..plus],
            _ => name,
        };
        let head_end = generics.unwrap_or(name.len()).min(name.len());
        match name[..head_end].rfind("::") {
            Some(pos) => &name[pos + 2..],
            None => name,
        }
    }

    /// Returns `true` when `name` equals the full name, or the short name
    /// ignoring ASCII case.
    pub fn matches_name(&self, name: &str) -> bool {
        self.name == name || self.short_name().eq_ignore_ascii_case(name)
    }
}

impl PartialEq for Key {
    #[inline(always)]
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Key {}

impl Hash for Key {
    #[inline(always)]
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Key({})", self.name)
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// Key for contract `C`.
#[inline(always)]
pub fn key_of<C: ?Sized + 'static>() -> Key {
    Key::new(TypeId::of::<C>(), std::any::type_name::<C>())
}
