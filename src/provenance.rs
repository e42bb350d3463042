// Copyright (c) The confgraph authors.
// Licensed under the MIT License.

use crate::errors::{ConfigError, Result};
use crate::plugin::{Constructor, Item, Params};
use crate::value::Value;

use core::fmt;
use std::collections::BTreeMap;
use std::rc::Rc;

/// Where the value of one resolved constructor parameter came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamSource {
    /// A trailing-underscore literal override, used verbatim.
    Literal,
    /// The reserved self-reference parameter, bound to the graph itself.
    Resolver,
    /// A single-key alias: the value of another configuration entry.
    Alias(Rc<str>),
    /// A list-of-keys alias, resolved once every named key was available.
    AliasList(Vec<Rc<str>>),
    /// The parameter name itself matched an already-resolved key.
    Key,
    /// The constructor-declared default value.
    Default,
}

/// How a resolved entry was produced. Records enough to introspect a run
/// and to re-create any entry from its recorded constructor arguments.
#[derive(Clone)]
pub struct Factory {
    kind: FactoryKind,
}

#[derive(Clone)]
enum FactoryKind {
    /// A plain scalar taken directly from the configuration.
    Param(Value),
    /// A plugin construction (including the built-in `list` plugin).
    Plugin {
        plugin: Rc<str>,
        params: Params,
        sources: BTreeMap<Rc<str>, ParamSource>,
        construct: Constructor,
    },
}

impl Factory {
    pub(crate) fn param(value: Value) -> Self {
        Self {
            kind: FactoryKind::Param(value),
        }
    }

    pub(crate) fn plugin(
        plugin: Rc<str>,
        params: Params,
        sources: BTreeMap<Rc<str>, ParamSource>,
        construct: Constructor,
    ) -> Self {
        Self {
            kind: FactoryKind::Plugin {
                plugin,
                params,
                sources,
                construct,
            },
        }
    }

    /// The plugin name behind this entry, if it was constructed.
    pub fn plugin_name(&self) -> Option<&str> {
        match &self.kind {
            FactoryKind::Param(_) => None,
            FactoryKind::Plugin { plugin, .. } => Some(plugin),
        }
    }

    /// The literal value behind this entry, if it was a plain scalar.
    pub fn param_value(&self) -> Option<&Value> {
        match &self.kind {
            FactoryKind::Param(v) => Some(v),
            FactoryKind::Plugin { .. } => None,
        }
    }

    /// Per-parameter provenance of a constructed entry.
    pub fn sources(&self) -> Option<&BTreeMap<Rc<str>, ParamSource>> {
        match &self.kind {
            FactoryKind::Param(_) => None,
            FactoryKind::Plugin { sources, .. } => Some(sources),
        }
    }

    /// The parameters the constructor was invoked with.
    pub fn params(&self) -> Option<&Params> {
        match &self.kind {
            FactoryKind::Param(_) => None,
            FactoryKind::Plugin { params, .. } => Some(params),
        }
    }

    /// Re-create the entry from its recorded constructor and arguments.
    pub(crate) fn create(&self, key: &str) -> Result<Item> {
        match &self.kind {
            FactoryKind::Param(v) => Ok(Item::Value(v.clone())),
            FactoryKind::Plugin {
                params, construct, ..
            } => construct(params).map_err(|e| ConfigError::Constructor {
                key: key.to_string(),
                source: e,
            }),
        }
    }
}

impl fmt::Debug for Factory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            FactoryKind::Param(v) => f.debug_tuple("Param").field(v).finish(),
            FactoryKind::Plugin {
                plugin, sources, ..
            } => f
                .debug_struct("Plugin")
                .field("plugin", plugin)
                .field("sources", sources)
                .finish(),
        }
    }
}
