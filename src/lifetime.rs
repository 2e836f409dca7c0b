//! Service lifetime definitions.

use std::fmt;
use std::str::FromStr;

use crate::error::ContainerError;

/// Service lifetimes controlling instance caching behavior.
///
/// # Examples
///
/// ```rust
/// use ferrous_ioc::Lifetime;
///
/// assert_eq!("scoped".parse::<Lifetime>().unwrap(), Lifetime::Scoped);
/// assert!("request".parse::<Lifetime>().is_err());
/// assert!(Lifetime::Singleton.is_cached());
/// assert!(!Lifetime::Transient.is_cached());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Lifetime {
    /// Single instance per container, created on first resolution and
    /// shared across all scopes and threads.
    Singleton,
    /// Single instance per scope, created on first resolution within that
    /// scope and released when the scope closes.
    Scoped,
    /// New instance per resolution, never cached.
    Transient,
}

impl Lifetime {
    /// Every lifetime, in declaration order.
    pub const ALL: [Lifetime; 3] = [Lifetime::Singleton, Lifetime::Scoped, Lifetime::Transient];

    /// Returns `true` if instances of this lifetime are cached.
    #[inline]
    pub fn is_cached(self) -> bool {
        !matches!(self, Lifetime::Transient)
    }

    /// Lower-case name used in configuration and diagnostics.
    pub fn as_str(self) -> &'static str {
        match self {
            Lifetime::Singleton => "singleton",
            Lifetime::Scoped => "scoped",
            Lifetime::Transient => "transient",
        }
    }
}

impl fmt::Display for Lifetime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Lifetime {
    type Err = ContainerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Lifetime::ALL
            .into_iter()
            .find(|lifetime| lifetime.as_str().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| ContainerError::InvalidLifetime(s.to_string()))
    }
}
