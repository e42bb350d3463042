// Copyright (c) The confgraph authors.
// Licensed under the MIT License.

// Use README.md as crate documentation.
#![doc = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/README.md"))]

mod classify;
mod config;
mod errors;
mod graph;
mod plugin;
mod provenance;
mod registry;
mod resolve;
mod subst;
mod value;

pub use classify::{NAME_FIELD, RESOLVER_PARAM};
pub use config::GraphBuilder;
pub use errors::{ConfigError, Result, UnconfiguredItems};
pub use graph::ExperimentGraph;
pub use plugin::{Constructor, Instance, Item, Params};
pub use provenance::{Factory, ParamSource};
pub use registry::{ParamSpec, PluginSpec, Registry, LIST};
pub use subst::VarSubst;
pub use value::{Number, Value};
