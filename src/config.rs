// Copyright (c) The confgraph authors.
// Licensed under the MIT License.

use crate::classify::classify;
use crate::errors::Result;
use crate::graph::ExperimentGraph;
use crate::registry::Registry;
use crate::resolve::Resolver;
use crate::subst::VarSubst;
use crate::value::Value;

use std::collections::BTreeMap;
use std::path::Path;

/// Builds a resolved experiment graph from a raw configuration.
///
/// The registry is borrowed: populate it once at process start, then run as
/// many configurations against it as needed. Substitution variables
/// (typically all-caps tokens such as `HOME`) are applied to every scalar
/// string before classification.
///
/// ```ignore
/// let mut registry = Registry::with_builtins();
/// registry.register(PluginSpec::new("Box", [ParamSpec::required("value")], |p| {
///     Ok(Item::instance(BoxPlugin { value: p.item("value")?.clone() }))
/// }))?;
///
/// let graph = GraphBuilder::new(&registry)
///     .set_var("HOME", "/home/experiments")
///     .build_json(r#"{"a": 5, "b": {"_name": "Box", "value": "a"}}"#)?;
/// ```
#[derive(Debug)]
pub struct GraphBuilder<'r> {
    registry: &'r Registry,
    vars: BTreeMap<String, String>,
}

impl<'r> GraphBuilder<'r> {
    pub fn new(registry: &'r Registry) -> Self {
        Self {
            registry,
            vars: BTreeMap::new(),
        }
    }

    /// Add one substitution variable.
    pub fn set_var(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.vars.insert(key.into(), value.into());
        self
    }

    /// Add a batch of substitution variables.
    pub fn set_vars(
        mut self,
        vars: impl IntoIterator<Item = (impl Into<String>, impl Into<String>)>,
    ) -> Self {
        for (k, v) in vars {
            self.vars.insert(k.into(), v.into());
        }
        self
    }

    /// Resolve an in-memory configuration into a graph of live entries.
    pub fn build(&self, config: &Value) -> Result<ExperimentGraph> {
        let subst = VarSubst::new(self.vars.clone());
        let classified = classify(config, &subst, self.registry)?;
        Resolver::new(self.registry, classified).run()
    }

    /// Resolve a configuration from its JSON text.
    pub fn build_json(&self, json: &str) -> Result<ExperimentGraph> {
        self.build(&Value::from_json_str(json)?)
    }

    /// Resolve a configuration from a JSON file.
    pub fn build_json_file(&self, path: impl AsRef<Path>) -> Result<ExperimentGraph> {
        self.build(&Value::from_json_file(path)?)
    }

    /// Resolve a configuration from its YAML text.
    #[cfg(feature = "yaml")]
    pub fn build_yaml(&self, yaml: &str) -> Result<ExperimentGraph> {
        self.build(&Value::from_yaml_str(yaml)?)
    }

    /// Resolve a configuration from a YAML file.
    #[cfg(feature = "yaml")]
    pub fn build_yaml_file(&self, path: impl AsRef<Path>) -> Result<ExperimentGraph> {
        self.build(&Value::from_yaml_file(path)?)
    }
}
