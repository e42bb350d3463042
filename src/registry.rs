// Copyright (c) The confgraph authors.
// Licensed under the MIT License.

use crate::errors::{ConfigError, Result};
use crate::plugin::{Constructor, Item, Params};
use crate::value::Value;

use core::fmt;
use std::collections::BTreeMap;
use std::rc::Rc;

/// Name of the built-in plugin that carries literal scalar lists.
pub const LIST: &str = "list";

/// One constructor parameter: its name and, optionally, a default value.
///
/// Parameter names and defaults are declared explicitly at registration time;
/// there is no runtime reflection over constructors.
#[derive(Debug, Clone)]
pub struct ParamSpec {
    name: Rc<str>,
    default: Option<Value>,
}

impl ParamSpec {
    pub fn required(name: impl AsRef<str>) -> Self {
        Self {
            name: name.as_ref().into(),
            default: None,
        }
    }

    pub fn with_default(name: impl AsRef<str>, default: impl Into<Value>) -> Self {
        Self {
            name: name.as_ref().into(),
            default: Some(default.into()),
        }
    }

    pub fn name(&self) -> &Rc<str> {
        &self.name
    }

    pub fn default(&self) -> Option<&Value> {
        self.default.as_ref()
    }
}

/// A registrable plugin type: its name, its declared constructor parameters
/// and the constructor itself.
#[derive(Clone)]
pub struct PluginSpec {
    name: Rc<str>,
    params: Vec<ParamSpec>,
    construct: Constructor,
}

impl PluginSpec {
    pub fn new(
        name: impl AsRef<str>,
        params: impl IntoIterator<Item = ParamSpec>,
        construct: impl Fn(&Params) -> anyhow::Result<Item> + 'static,
    ) -> Self {
        Self {
            name: name.as_ref().into(),
            params: params.into_iter().collect(),
            construct: Rc::new(construct),
        }
    }

    pub fn name(&self) -> &Rc<str> {
        &self.name
    }

    pub fn params(&self) -> &[ParamSpec] {
        &self.params
    }

    pub(crate) fn constructor(&self) -> &Constructor {
        &self.construct
    }

    /// Invoke the constructor with fully-resolved parameters.
    pub fn construct(&self, params: &Params) -> anyhow::Result<Item> {
        (self.construct)(params)
    }
}

impl fmt::Debug for PluginSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PluginSpec")
            .field("name", &self.name)
            .field("params", &self.params)
            .finish()
    }
}

fn validate_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(ConfigError::InvalidName {
            name: name.to_string(),
        });
    }
    Ok(())
}

/// The catalogue of registrable plugin types.
///
/// Registration is append-only: a name, once taken, cannot be overwritten or
/// removed. The registry is an explicit value, constructed once at process
/// start and passed by reference into [`crate::GraphBuilder`]; there is no
/// ambient global catalogue.
#[derive(Clone, Debug)]
pub struct Registry {
    plugins: BTreeMap<Rc<str>, Rc<PluginSpec>>,
}

impl Registry {
    /// An empty registry without the built-in plugins. Most callers want
    /// [`Registry::with_builtins`].
    pub fn new() -> Self {
        Self {
            plugins: BTreeMap::new(),
        }
    }

    /// A registry pre-seeded with the base catalogue. Currently that is the
    /// `list` plugin, through which literal scalar lists are built so they
    /// flow through the same factory mechanism as every other entry.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        register_builtins(&mut registry);
        registry
    }

    /// Register a plugin. Fails if the name is invalid or already taken.
    pub fn register(&mut self, spec: PluginSpec) -> Result<()> {
        let name = spec.name().clone();
        validate_name(&name)?;
        if self.plugins.contains_key(&name) {
            return Err(ConfigError::DuplicateRegistration {
                name: name.to_string(),
            });
        }
        self.plugins.insert(name, Rc::new(spec));
        Ok(())
    }

    /// Look up a plugin by name.
    pub fn lookup(&self, name: &str) -> Result<Rc<PluginSpec>> {
        self.plugins
            .get(name)
            .cloned()
            .ok_or_else(|| ConfigError::NotFound {
                key: name.to_string(),
            })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.plugins.contains_key(name)
    }

    /// Registered names, in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &Rc<str>> {
        self.plugins.keys()
    }

    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

fn register_builtins(registry: &mut Registry) {
    // The `list` constructor simply passes its resolved items through.
    let spec = PluginSpec::new(LIST, [ParamSpec::required("items")], |p: &Params| {
        Ok(p.item("items")?.clone())
    });
    // A fresh registry cannot already contain the builtin names.
    let _ = registry.register(spec);
}
