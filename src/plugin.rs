// Copyright (c) The confgraph authors.
// Licensed under the MIT License.

use crate::errors::{ConfigError, Result};
use crate::graph::ExperimentGraph;
use crate::value::Value;

use core::fmt;
use std::any::Any;
use std::collections::BTreeMap;
use std::rc::Rc;

/// A constructed plugin instance. Resolution is single-threaded, so plain
/// `Rc` sharing is enough.
pub type Instance = Rc<dyn Any>;

/// The value of a resolved configuration entry or constructor parameter.
#[derive(Clone)]
pub enum Item {
    /// A plain scalar or a literal override.
    Value(Value),
    /// An ordered sequence of resolved items (scalar lists and list aliases).
    List(Rc<Vec<Item>>),
    /// A plugin instance produced by a registered constructor.
    Instance(Instance),
    /// A handle to the experiment graph itself (self-reference parameter).
    Graph(ExperimentGraph),
}

impl Item {
    /// Wrap a constructed plugin value.
    pub fn instance<T: 'static>(value: T) -> Item {
        Item::Instance(Rc::new(value))
    }

    pub fn from_values(values: Vec<Value>) -> Item {
        Item::List(Rc::new(values.into_iter().map(Item::Value).collect()))
    }

    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Item::Value(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Item]> {
        match self {
            Item::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_graph(&self) -> Option<&ExperimentGraph> {
        match self {
            Item::Graph(g) => Some(g),
            _ => None,
        }
    }

    /// Downcast an instance item to its concrete plugin type.
    pub fn downcast<T: 'static>(&self) -> Option<Rc<T>> {
        match self {
            Item::Instance(any) => Rc::clone(any).downcast::<T>().ok(),
            _ => None,
        }
    }
}

impl fmt::Debug for Item {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Item::Value(v) => write!(f, "Value({v})"),
            Item::List(items) => f.debug_list().entries(items.iter()).finish(),
            Item::Instance(_) => write!(f, "Instance(..)"),
            Item::Graph(_) => write!(f, "Graph(..)"),
        }
    }
}

/// The fully-resolved parameters handed to a constructor, with typed
/// accessors so constructors can state what they expect.
#[derive(Clone, Debug)]
pub struct Params {
    plugin: Rc<str>,
    items: BTreeMap<Rc<str>, Item>,
}

impl Params {
    pub(crate) fn new(plugin: Rc<str>) -> Self {
        Self {
            plugin,
            items: BTreeMap::new(),
        }
    }

    pub(crate) fn insert(&mut self, name: Rc<str>, item: Item) {
        self.items.insert(name, item);
    }

    pub(crate) fn len(&self) -> usize {
        self.items.len()
    }

    /// The plugin name these parameters were resolved for.
    pub fn plugin(&self) -> &str {
        &self.plugin
    }

    pub fn get(&self, name: &str) -> Option<&Item> {
        self.items.get(name)
    }

    pub fn item(&self, name: &str) -> Result<&Item> {
        self.items.get(name).ok_or_else(|| ConfigError::MissingParam {
            plugin: self.plugin.to_string(),
            name: name.to_string(),
        })
    }

    pub fn value(&self, name: &str) -> Result<&Value> {
        self.item(name)?
            .as_value()
            .ok_or_else(|| self.bad(name, "a scalar value"))
    }

    pub fn string(&self, name: &str) -> Result<Rc<str>> {
        match self.value(name)? {
            Value::String(s) => Ok(s.clone()),
            _ => Err(self.bad(name, "a string")),
        }
    }

    pub fn bool(&self, name: &str) -> Result<bool> {
        self.value(name)?
            .as_bool()
            .ok_or_else(|| self.bad(name, "a boolean"))
    }

    pub fn i64(&self, name: &str) -> Result<i64> {
        self.value(name)?
            .as_i64()
            .ok_or_else(|| self.bad(name, "an integer"))
    }

    pub fn f64(&self, name: &str) -> Result<f64> {
        self.value(name)?
            .as_f64()
            .ok_or_else(|| self.bad(name, "a number"))
    }

    pub fn list(&self, name: &str) -> Result<&[Item]> {
        self.item(name)?
            .as_list()
            .ok_or_else(|| self.bad(name, "a list"))
    }

    pub fn instance<T: 'static>(&self, name: &str) -> Result<Rc<T>> {
        self.item(name)?
            .downcast::<T>()
            .ok_or_else(|| self.bad(name, "a plugin instance"))
    }

    pub fn graph(&self, name: &str) -> Result<ExperimentGraph> {
        self.item(name)?
            .as_graph()
            .cloned()
            .ok_or_else(|| self.bad(name, "the experiment graph"))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Rc<str>, &Item)> {
        self.items.iter()
    }

    fn bad(&self, name: &str, expected: &'static str) -> ConfigError {
        ConfigError::BadParam {
            plugin: self.plugin.to_string(),
            name: name.to_string(),
            expected,
        }
    }
}

/// A registered constructor. It receives the resolved parameters and returns
/// the constructed item; failures abort the whole resolution run.
pub type Constructor = Rc<dyn Fn(&Params) -> anyhow::Result<Item>>;
