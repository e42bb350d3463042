// Copyright (c) The confgraph authors.
// Licensed under the MIT License.

use core::fmt;
use std::collections::{BTreeMap, BTreeSet};

use thiserror::Error;

/// Crate-wide result type.
pub type Result<T, E = ConfigError> = core::result::Result<T, E>;

/// Everything that can go wrong while registering plugins or resolving a
/// configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A plugin name was registered twice. Registration is append-only so a
    /// misconfigured experiment cannot silently shadow an earlier type.
    #[error("`{name}` is already registered; please select another name")]
    DuplicateRegistration { name: String },

    /// Empty or whitespace-only plugin names are rejected at registration.
    #[error("plugin name `{name}` is invalid (empty or whitespace-only)")]
    InvalidName { name: String },

    /// A configuration entry does not have the shape of a scalar, a scalar
    /// list or a descriptor. Raised during classification, before any
    /// resolution attempt.
    #[error("config[{key}]: {reason}")]
    MalformedEntry { key: String, reason: String },

    /// A descriptor names a plugin that is not in the registry.
    #[error("config[{key}] is named `{name}` but no plugin with that name is registered")]
    UnknownType { key: String, name: String },

    /// The run exhausted every tier and these entries are still pending.
    #[error("{0}")]
    Unconfigured(UnconfiguredItems),

    /// Lookup of a key that is neither registered nor resolved.
    #[error("`{key}` not found")]
    NotFound { key: String },

    /// The graph was consulted before a resolution run completed. Plugins
    /// holding a self-reference must wait until the run has finished.
    #[error("the experiment graph is not resolved yet")]
    NotReady,

    /// The resolved graph is read-only.
    #[error("cannot update a resolved experiment graph")]
    ReadOnly,

    /// A constructor asked for a parameter the resolver did not supply.
    #[error("plugin `{plugin}` was not given parameter `{name}`")]
    MissingParam { plugin: String, name: String },

    /// A constructor asked for a parameter with a different kind than the
    /// resolver supplied.
    #[error("plugin `{plugin}` parameter `{name}`: expected {expected}")]
    BadParam {
        plugin: String,
        name: String,
        expected: &'static str,
    },

    /// A constructor failed. The run aborts immediately; constructor
    /// failures are not retried by the tier machinery.
    #[error("constructing `{key}` failed")]
    Constructor {
        key: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("failed to read {path}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[cfg(feature = "yaml")]
    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),
}

/// The aggregate failure report of a resolution run: every key still pending
/// after the last tier, together with the parameter names that could not be
/// filled. One combined report, so a configuration can be fixed in a single
/// pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UnconfiguredItems {
    pub items: BTreeMap<String, BTreeSet<String>>,
}

impl UnconfiguredItems {
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl fmt::Display for UnconfiguredItems {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "there are unconfigured items:")?;
        for (key, missing) in &self.items {
            write!(f, " `{key}` missing")?;
            for (i, name) in missing.iter().enumerate() {
                let sep = if i == 0 { ' ' } else { ',' };
                write!(f, "{sep}`{name}`")?;
            }
            write!(f, ";")?;
        }
        Ok(())
    }
}
