// Copyright (c) The confgraph authors.
// Licensed under the MIT License.

use crate::errors::{ConfigError, Result};
use crate::plugin::Item;
use crate::provenance::Factory;

use core::fmt;
use std::cell::{Ref, RefCell};
use std::collections::BTreeMap;
use std::rc::Rc;

#[derive(Default)]
struct Inner {
    items: BTreeMap<Rc<str>, Item>,
    /// Keys in the order they were resolved.
    order: Vec<Rc<str>>,
    factories: BTreeMap<Rc<str>, Factory>,
    ready: bool,
}

/// The read-only, map-like view over a fully resolved configuration.
///
/// A handle to the graph is handed to constructors that declare the reserved
/// self-reference parameter; such handles become readable once the run
/// completes. The graph cannot be mutated after construction, so it can
/// never desynchronize from its provenance records.
#[derive(Clone)]
pub struct ExperimentGraph {
    inner: Rc<RefCell<Inner>>,
}

impl ExperimentGraph {
    /// A graph in the building state; reads fail with [`ConfigError::NotReady`]
    /// until [`seal`](Self::seal) is called.
    pub(crate) fn unresolved() -> Self {
        Self {
            inner: Rc::new(RefCell::new(Inner::default())),
        }
    }

    /// Publish the resolved entries. Called exactly once, at the end of a
    /// successful resolution run.
    pub(crate) fn seal(
        &self,
        items: BTreeMap<Rc<str>, Item>,
        order: Vec<Rc<str>>,
        factories: BTreeMap<Rc<str>, Factory>,
    ) {
        let mut inner = self.inner.borrow_mut();
        inner.items = items;
        inner.order = order;
        inner.factories = factories;
        inner.ready = true;
    }

    fn read(&self) -> Result<Ref<'_, Inner>> {
        let inner = self.inner.borrow();
        if !inner.ready {
            return Err(ConfigError::NotReady);
        }
        Ok(inner)
    }

    /// Get an entry by key.
    pub fn get(&self, key: &str) -> Result<Item> {
        let inner = self.read()?;
        inner
            .items
            .get(key)
            .cloned()
            .ok_or_else(|| ConfigError::NotFound {
                key: key.to_string(),
            })
    }

    /// Get an entry by key, falling back to `default` if it is absent.
    pub fn get_or(&self, key: &str, default: Item) -> Result<Item> {
        let inner = self.read()?;
        Ok(inner.items.get(key).cloned().unwrap_or(default))
    }

    /// Membership test. False before a run has completed.
    pub fn contains(&self, key: &str) -> bool {
        let inner = self.inner.borrow();
        inner.ready && inner.items.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.inner.borrow().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Keys in resolution order.
    pub fn keys(&self) -> Result<Vec<Rc<str>>> {
        Ok(self.read()?.order.clone())
    }

    /// Values in resolution order.
    pub fn values(&self) -> Result<Vec<Item>> {
        let inner = self.read()?;
        Ok(inner
            .order
            .iter()
            .filter_map(|k| inner.items.get(k).cloned())
            .collect())
    }

    /// Key/value pairs in resolution order.
    pub fn entries(&self) -> Result<Vec<(Rc<str>, Item)>> {
        let inner = self.read()?;
        Ok(inner
            .order
            .iter()
            .filter_map(|k| inner.items.get(k).map(|v| (k.clone(), v.clone())))
            .collect())
    }

    /// The graph is read-only; every attempted update fails.
    pub fn set(&self, _key: &str, _item: Item) -> Result<()> {
        Err(ConfigError::ReadOnly)
    }

    /// How the entry under `key` was produced.
    pub fn provenance(&self, key: &str) -> Result<Factory> {
        let inner = self.read()?;
        inner
            .factories
            .get(key)
            .cloned()
            .ok_or_else(|| ConfigError::NotFound {
                key: key.to_string(),
            })
    }

    /// Re-create the entry under `key` from its recorded constructor and
    /// arguments. Dependencies are not re-resolved; the recorded arguments
    /// are reused as-is.
    pub fn recreate(&self, key: &str) -> Result<Item> {
        self.provenance(key)?.create(key)
    }
}

impl fmt::Debug for ExperimentGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("ExperimentGraph")
            .field("ready", &inner.ready)
            .field("keys", &inner.order)
            .finish()
    }
}
