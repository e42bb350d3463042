// Copyright (c) The confgraph authors.
// Licensed under the MIT License.

use crate::errors::{ConfigError, Result};
use crate::plugin::{Item, Params};
use crate::provenance::{Factory, ParamSource};
use crate::registry::{Registry, LIST};
use crate::subst::VarSubst;
use crate::value::Value;

use std::collections::BTreeMap;
use std::rc::Rc;

use tracing::debug;

/// Field of a descriptor mapping that selects the registered plugin type.
pub const NAME_FIELD: &str = "_name";

/// Parameter name that binds to the experiment graph itself.
pub const RESOLVER_PARAM: &str = "experiment_graph";

/// Suffix marking a descriptor field as a literal override.
const LITERAL_SUFFIX: char = '_';

/// A parameter reference inside a descriptor: either one configuration key
/// or an ordered list of keys.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum AliasRef {
    Key(Rc<str>),
    Keys(Vec<Rc<str>>),
}

/// A parsed descriptor: the plugin it names plus its parameter declarations,
/// already split into literal overrides and key aliases.
#[derive(Debug, Clone)]
pub(crate) struct Descriptor {
    pub plugin: Rc<str>,
    pub literals: BTreeMap<Rc<str>, Value>,
    pub aliases: BTreeMap<Rc<str>, AliasRef>,
}

/// The output of classification: entries resolved up front (scalars and
/// scalar lists) and the residual descriptors the resolver must construct.
#[derive(Debug, Default)]
pub(crate) struct Classified {
    pub resolved: BTreeMap<Rc<str>, Item>,
    pub order: Vec<Rc<str>>,
    pub records: BTreeMap<Rc<str>, Factory>,
    pub pending: BTreeMap<Rc<str>, Descriptor>,
}

fn malformed(key: &str, reason: impl Into<String>) -> ConfigError {
    ConfigError::MalformedEntry {
        key: key.to_string(),
        reason: reason.into(),
    }
}

/// Partition a raw configuration into resolved scalar/list entries and
/// pending descriptors. Substitution variables are applied to every scalar
/// and scalar-list element here, before anything else sees the values.
/// Shape errors are raised immediately, not deferred to the resolver.
pub(crate) fn classify(
    config: &Value,
    subst: &VarSubst,
    registry: &Registry,
) -> Result<Classified> {
    let entries = config
        .as_object()
        .ok_or_else(|| malformed("<root>", "the configuration must be a mapping"))?;

    let mut out = Classified::default();

    // Simple scalars first, then simple lists, then descriptors: resolved
    // scalars must be in place before any descriptor is considered.
    for (key, value) in entries.iter() {
        if value.is_scalar() {
            let value = subst.apply(value);
            debug!(key = %key, value = %value, "classified scalar parameter");
            out.resolved.insert(key.clone(), Item::Value(value.clone()));
            out.order.push(key.clone());
            out.records.insert(key.clone(), Factory::param(value));
        }
    }

    for (key, value) in entries.iter() {
        let Some(elements) = value.as_array() else {
            continue;
        };
        if !elements.iter().all(Value::is_scalar) {
            return Err(malformed(
                key,
                "a simple list must contain only scalar values",
            ));
        }
        let substituted: Vec<Value> = elements.iter().map(|v| subst.apply(v)).collect();
        debug!(key = %key, "classified scalar list");

        // Literal lists are built through the registry's `list` plugin so
        // they flow through the same factory mechanism as everything else.
        let spec = registry.lookup(LIST)?;
        let mut params = Params::new(spec.name().clone());
        params.insert("items".into(), Item::from_values(substituted));
        let item = spec
            .construct(&params)
            .map_err(|e| ConfigError::Constructor {
                key: key.to_string(),
                source: e,
            })?;

        let sources = BTreeMap::from([(Rc::from("items"), ParamSource::Literal)]);
        out.records.insert(
            key.clone(),
            Factory::plugin(
                spec.name().clone(),
                params,
                sources,
                spec.constructor().clone(),
            ),
        );
        out.resolved.insert(key.clone(), item);
        out.order.push(key.clone());
    }

    for (key, value) in entries.iter() {
        let Some(fields) = value.as_object() else {
            continue;
        };
        out.pending
            .insert(key.clone(), parse_descriptor(key, fields)?);
    }

    Ok(out)
}

fn parse_descriptor(key: &str, fields: &BTreeMap<Rc<str>, Value>) -> Result<Descriptor> {
    let plugin = match fields.get(NAME_FIELD) {
        Some(Value::String(name)) => name.clone(),
        Some(_) => {
            return Err(malformed(key, format!("`{NAME_FIELD}` must be a string")));
        }
        None => {
            return Err(malformed(
                key,
                format!("a complex configuration object must have a `{NAME_FIELD}` property"),
            ));
        }
    };

    let mut literals = BTreeMap::new();
    let mut aliases = BTreeMap::new();
    for (field, value) in fields.iter() {
        if field.as_ref() == NAME_FIELD {
            continue;
        }
        if let Some(name) = field.strip_suffix(LITERAL_SUFFIX) {
            // Literal overrides are used verbatim, never looked up and
            // never substituted.
            literals.insert(Rc::from(name), value.clone());
            continue;
        }
        match value {
            Value::String(alias) => {
                aliases.insert(field.clone(), AliasRef::Key(alias.clone()));
            }
            Value::Array(elements) => {
                let mut keys = Vec::with_capacity(elements.len());
                for element in elements.iter() {
                    match element {
                        Value::String(k) => keys.push(k.clone()),
                        _ => {
                            return Err(malformed(
                                key,
                                format!(
                                    "parameter names in list parameters must be strings; \
                                     use the `{field}{LITERAL_SUFFIX}` notation for a literal value"
                                ),
                            ));
                        }
                    }
                }
                aliases.insert(field.clone(), AliasRef::Keys(keys));
            }
            _ => {
                return Err(malformed(
                    key,
                    format!(
                        "parameter names must be strings; use the `{field}{LITERAL_SUFFIX}` \
                         notation for a literal value"
                    ),
                ));
            }
        }
    }

    Ok(Descriptor {
        plugin,
        literals,
        aliases,
    })
}
