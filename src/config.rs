//! Container options loaded from code, the environment or JSON.
//!
//! Two knobs exist: the resolution depth guard and per-contract lifetime
//! overrides. Overrides are applied when a binding is registered, so a
//! deployment can demote a singleton to scoped (or similar) without
//! touching the registration code.
//!
//! Environment variables (default prefix `IOC`):
//!
//! | Variable              | Meaning                                   |
//! |-----------------------|-------------------------------------------|
//! | `IOC_MAX_DEPTH`       | maximum resolution depth (positive)       |
//! | `IOC_LIFETIME_<NAME>` | lifetime for the contract named `<NAME>`  |

use std::collections::BTreeMap;
use std::env;

use crate::error::{ContainerError, DiResult};
use crate::internal::MAX_DEPTH;
use crate::key::Key;
use crate::lifetime::Lifetime;

/// Default environment variable prefix.
pub const ENV_PREFIX: &str = "IOC";

/// Runtime options for a [`Container`](crate::Container).
///
/// # Examples
///
/// ```
/// use ferrous_ioc::{Container, ContainerOptions, Injectable, Lifetime};
///
/// struct Session;
/// impl Injectable for Session {
///     type Deps = ();
///     fn inject(_: ()) -> Self {
///         Session
///     }
/// }
///
/// let options = ContainerOptions::default()
///     .with_max_depth(64)
///     .override_lifetime("Session", Lifetime::Scoped);
///
/// let mut container = Container::with_options(options);
/// container.singleton_self::<Session>();
/// assert_eq!(container.descriptors()[0].lifetime, Lifetime::Scoped);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerOptions {
    /// Maximum number of nested resolutions in one `resolve` call.
    pub max_depth: usize,
    /// Lifetime overrides keyed by full or short contract name.
    pub lifetime_overrides: BTreeMap<String, Lifetime>,
}

impl Default for ContainerOptions {
    fn default() -> Self {
        Self {
            max_depth: MAX_DEPTH,
            lifetime_overrides: BTreeMap::new(),
        }
    }
}

impl ContainerOptions {
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Forces `lifetime` for the contract named `contract`.
    pub fn override_lifetime(mut self, contract: impl Into<String>, lifetime: Lifetime) -> Self {
        self.lifetime_overrides.insert(contract.into(), lifetime);
        self
    }

    /// Reads options from `IOC_*` environment variables.
    pub fn from_env() -> DiResult<Self> {
        Self::from_env_prefixed(ENV_PREFIX)
    }

    /// Reads options from `<prefix>_*` environment variables.
    pub fn from_env_prefixed(prefix: &str) -> DiResult<Self> {
        Self::from_vars(prefix, env::vars())
    }

    /// Builds options from `(name, value)` pairs shaped like environment
    /// variables. Pairs without the prefix are ignored.
    pub fn from_vars<I, K, V>(prefix: &str, vars: I) -> DiResult<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let prefix = format!("{}_", prefix.to_uppercase());
        let depth_var = format!("{prefix}MAX_DEPTH");
        let lifetime_prefix = format!("{prefix}LIFETIME_");

        let mut options = Self::default();
        for (name, value) in vars {
            let (name, value) = (name.as_ref(), value.as_ref());
            if name == depth_var {
                options.max_depth = parse_depth(name, value)?;
            } else if let Some(contract) = name.strip_prefix(lifetime_prefix.as_str()) {
                if contract.is_empty() {
                    return Err(ContainerError::InvalidOption {
                        name: name.to_string(),
                        reason: "missing contract name".to_string(),
                    }
                    .into());
                }
                options.lifetime_overrides.insert(contract.to_string(), value.parse()?);
            }
        }
        Ok(options)
    }

    /// Parses options from JSON:
    ///
    /// ```json
    /// { "max_depth": 64, "lifetimes": { "UserRepository": "singleton" } }
    /// ```
    ///
    /// Both fields are optional.
    #[cfg(feature = "config")]
    pub fn from_json(json: &str) -> DiResult<Self> {
        let raw: RawOptions = serde_json::from_str(json).map_err(|err| ContainerError::InvalidOption {
            name: "json".to_string(),
            reason: err.to_string(),
        })?;

        let mut options = Self::default();
        if let Some(max_depth) = raw.max_depth {
            if max_depth == 0 {
                return Err(zero_depth("max_depth").into());
            }
            options.max_depth = max_depth;
        }
        for (contract, lifetime) in raw.lifetimes {
            options.lifetime_overrides.insert(contract, lifetime.parse()?);
        }
        Ok(options)
    }

    /// Reads and parses a JSON options file.
    #[cfg(feature = "config")]
    pub fn from_json_file(path: impl AsRef<std::path::Path>) -> DiResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|err| ContainerError::InvalidOption {
            name: path.display().to_string(),
            reason: err.to_string(),
        })?;
        Self::from_json(&content)
    }

    /// Override for `key`: exact full name first, then the short name
    /// compared case-insensitively.
    pub fn lifetime_override(&self, key: &Key) -> Option<Lifetime> {
        if self.lifetime_overrides.is_empty() {
            return None;
        }
        if let Some(lifetime) = self.lifetime_overrides.get(key.display_name()) {
            return Some(*lifetime);
        }
        self.lifetime_overrides
            .iter()
            .find(|(name, _)| key.matches_name(name))
            .map(|(_, lifetime)| *lifetime)
    }
}

fn parse_depth(name: &str, value: &str) -> Result<usize, ContainerError> {
    match value.trim().parse::<usize>() {
        Ok(0) => Err(zero_depth(name)),
        Ok(depth) => Ok(depth),
        Err(err) => Err(ContainerError::InvalidOption {
            name: name.to_string(),
            reason: err.to_string(),
        }),
    }
}

fn zero_depth(name: &str) -> ContainerError {
    ContainerError::InvalidOption {
        name: name.to_string(),
        reason: "must be at least 1".to_string(),
    }
}

#[cfg(feature = "config")]
#[derive(serde::Deserialize)]
#[serde(deny_unknown_fields)]
struct RawOptions {
    #[serde(default)]
    max_depth: Option<usize>,
    // Lifetimes stay strings here so bad names surface as InvalidLifetime.
    #[serde(default)]
    lifetimes: BTreeMap<String, String>,
}
