// Copyright (c) The confgraph authors.
// Licensed under the MIT License.

use crate::classify::{AliasRef, Classified, Descriptor, RESOLVER_PARAM};
use crate::errors::{ConfigError, Result, UnconfiguredItems};
use crate::graph::ExperimentGraph;
use crate::plugin::{Item, Params};
use crate::provenance::{Factory, ParamSource};
use crate::registry::{PluginSpec, Registry};

use std::collections::{BTreeMap, BTreeSet};
use std::rc::Rc;

use tracing::{debug, error};

/// How missing parameters may be filled from constructor defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TierMode {
    /// Tier 0: constructor defaults are not consulted at all.
    NoDefaults,
    /// Tier 1: a default is used only when the parameter name is not also a
    /// still-pending configuration key, so a default can never mask explicit
    /// data that merely has not resolved yet.
    DefaultsUnlessPending,
    /// Tier 2: a default is used whenever the other sources came up empty.
    AllDefaults,
}

const TIERS: [TierMode; 3] = [
    TierMode::NoDefaults,
    TierMode::DefaultsUnlessPending,
    TierMode::AllDefaults,
];

/// The result of matching one descriptor against the resolved entries.
enum Gathered {
    Ready {
        params: Params,
        sources: BTreeMap<Rc<str>, ParamSource>,
    },
    Missing(BTreeSet<String>),
}

/// Turns pending descriptors into constructed entries by iterative
/// constraint propagation: repeated full scans within a tier, escalating
/// through progressively more permissive tiers when a scan fixpoints with
/// descriptors still pending.
pub(crate) struct Resolver<'r> {
    registry: &'r Registry,
    resolved: BTreeMap<Rc<str>, Item>,
    order: Vec<Rc<str>>,
    records: BTreeMap<Rc<str>, Factory>,
    pending: BTreeMap<Rc<str>, Descriptor>,
    graph: ExperimentGraph,
}

impl<'r> Resolver<'r> {
    pub(crate) fn new(registry: &'r Registry, classified: Classified) -> Self {
        Self {
            registry,
            resolved: classified.resolved,
            order: classified.order,
            records: classified.records,
            pending: classified.pending,
            graph: ExperimentGraph::unresolved(),
        }
    }

    /// Run the tiers in order, then seal and return the graph. Fails with
    /// one aggregate report naming every still-pending key and its missing
    /// parameters if tier 2 also fixpoints short of completion.
    pub(crate) fn run(mut self) -> Result<ExperimentGraph> {
        let mut missing = BTreeMap::new();
        for (tier, mode) in TIERS.iter().enumerate() {
            if self.pending.is_empty() {
                break;
            }
            debug!(tier, "initializing complex configurations");
            missing = self.run_tier(*mode)?;
        }

        if !self.pending.is_empty() {
            let items = UnconfiguredItems { items: missing };
            error!("there are unconfigured items in the experiment:");
            for (key, params) in &items.items {
                error!(key = %key, missing = ?params, "missing properties");
            }
            return Err(ConfigError::Unconfigured(items));
        }

        self.graph.seal(self.resolved, self.order, self.records);
        Ok(self.graph)
    }

    /// Repeated full scans over the pending descriptors until either none
    /// remain or a scan makes no progress. Returns the missing-parameter
    /// report of the final, progress-free scan (empty on success).
    fn run_tier(&mut self, mode: TierMode) -> Result<BTreeMap<String, BTreeSet<String>>> {
        let mut pass = 1;
        while !self.pending.is_empty() {
            debug!(pass, "resolver pass");
            let mut missing = BTreeMap::new();
            let mut progressed = false;

            let keys: Vec<Rc<str>> = self.pending.keys().cloned().collect();
            for key in keys {
                let Some(descriptor) = self.pending.get(&key).cloned() else {
                    continue;
                };
                let spec = self.registry.lookup(&descriptor.plugin).map_err(|_| {
                    ConfigError::UnknownType {
                        key: key.to_string(),
                        name: descriptor.plugin.to_string(),
                    }
                })?;

                match self.gather(&descriptor, &spec, mode) {
                    Gathered::Ready { params, sources } => {
                        self.construct(&key, &spec, params, sources)?;
                        progressed = true;
                    }
                    Gathered::Missing(names) => {
                        missing.insert(key.to_string(), names);
                    }
                }
            }

            if !progressed {
                return Ok(missing);
            }
            pass += 1;
        }
        Ok(BTreeMap::new())
    }

    /// Match one descriptor's declared parameters against the resolved
    /// entries. Per parameter the sources are tried in priority order:
    /// literal override, self-reference, alias (single key or all-keys
    /// list), direct key match, then a constructor default as the tier
    /// allows. A declared alias is authoritative: while its keys are
    /// unresolved the parameter stays missing rather than falling back.
    fn gather(&self, descriptor: &Descriptor, spec: &PluginSpec, mode: TierMode) -> Gathered {
        let mut params = Params::new(spec.name().clone());
        let mut sources = BTreeMap::new();

        for param in spec.params() {
            let name = param.name();

            if let Some(value) = descriptor.literals.get(name) {
                params.insert(name.clone(), Item::Value(value.clone()));
                sources.insert(name.clone(), ParamSource::Literal);
                continue;
            }

            if name.as_ref() == RESOLVER_PARAM {
                params.insert(name.clone(), Item::Graph(self.graph.clone()));
                sources.insert(name.clone(), ParamSource::Resolver);
                continue;
            }

            if let Some(alias) = descriptor.aliases.get(name) {
                match alias {
                    AliasRef::Key(key) => {
                        if let Some(item) = self.resolved.get(key) {
                            params.insert(name.clone(), item.clone());
                            sources.insert(name.clone(), ParamSource::Alias(key.clone()));
                        }
                    }
                    AliasRef::Keys(keys) => {
                        let items: Vec<Item> = keys
                            .iter()
                            .map_while(|k| self.resolved.get(k).cloned())
                            .collect();
                        if items.len() == keys.len() {
                            params.insert(name.clone(), Item::List(Rc::new(items)));
                            sources.insert(name.clone(), ParamSource::AliasList(keys.clone()));
                        }
                    }
                }
                continue;
            }

            if let Some(item) = self.resolved.get(name) {
                params.insert(name.clone(), item.clone());
                sources.insert(name.clone(), ParamSource::Key);
                continue;
            }

            let use_default = match mode {
                TierMode::NoDefaults => false,
                TierMode::DefaultsUnlessPending => !self.pending.contains_key(name.as_ref()),
                TierMode::AllDefaults => true,
            };
            if use_default {
                if let Some(default) = param.default() {
                    params.insert(name.clone(), Item::Value(default.clone()));
                    sources.insert(name.clone(), ParamSource::Default);
                }
            }
        }

        if params.len() == spec.params().len() {
            Gathered::Ready { params, sources }
        } else {
            let missing = spec
                .params()
                .iter()
                .filter(|p| params.get(p.name()).is_none())
                .map(|p| p.name().to_string())
                .collect();
            Gathered::Missing(missing)
        }
    }

    /// Instantiate a ready descriptor and move it from pending to resolved.
    /// A constructor failure aborts the whole run; it is not retried.
    fn construct(
        &mut self,
        key: &Rc<str>,
        spec: &PluginSpec,
        params: Params,
        sources: BTreeMap<Rc<str>, ParamSource>,
    ) -> Result<()> {
        let item = spec
            .construct(&params)
            .map_err(|e| ConfigError::Constructor {
                key: key.to_string(),
                source: e,
            })?;
        debug!(key = %key, plugin = %spec.name(), "configured entry");

        self.pending.remove(key);
        self.resolved.insert(key.clone(), item);
        self.order.push(key.clone());
        self.records.insert(
            key.clone(),
            Factory::plugin(
                spec.name().clone(),
                params,
                sources,
                spec.constructor().clone(),
            ),
        );
        Ok(())
    }
}
