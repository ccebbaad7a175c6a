//! Containers for built services.
//!
//! [`ServiceMap`] is what one module instantiation produces: flat names in
//! discovery order, each mapped to an instance, a factory, or a reconstructed
//! namespace. [`ImportMap`] is what a module receives from the modules it
//! consumes; the core only passes it through to factories.
use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::plugin_system::normalizer::{FlatName, SEPARATOR};
use crate::plugin_system::traits::{ServiceFactory, ServiceInstance};

/// One built service.
#[derive(Clone)]
pub enum ServiceEntry {
    /// A ready instance (singleton policy).
    Instance(ServiceInstance),
    /// An un-invoked factory (factory policy).
    Factory(Arc<dyn ServiceFactory>),
    /// A namespace node rebuilt from its descendants.
    Namespace(ServiceNamespace),
}

impl ServiceEntry {
    pub fn instance<T: Any + Send + Sync>(value: T) -> Self {
        ServiceEntry::Instance(Arc::new(value))
    }

    /// Downcast an instance entry to its concrete type.
    pub fn downcast<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        match self {
            ServiceEntry::Instance(instance) => Arc::clone(instance).downcast::<T>().ok(),
            _ => None,
        }
    }

    pub fn as_factory(&self) -> Option<&Arc<dyn ServiceFactory>> {
        match self {
            ServiceEntry::Factory(factory) => Some(factory),
            _ => None,
        }
    }

    pub fn as_namespace(&self) -> Option<&ServiceNamespace> {
        match self {
            ServiceEntry::Namespace(namespace) => Some(namespace),
            _ => None,
        }
    }
}

impl fmt::Debug for ServiceEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServiceEntry::Instance(_) => f.write_str("Instance(..)"),
            ServiceEntry::Factory(_) => f.write_str("Factory(..)"),
            ServiceEntry::Namespace(namespace) => f.debug_tuple("Namespace").field(namespace).finish(),
        }
    }
}

/// Relative key to entry for every descendant of a namespace node.
///
/// Deeper descendants appear both nested (under `c`) and as a dotted
/// shortcut (`c.d`), so a consumer can reach a specific service directly.
#[derive(Clone, Default)]
pub struct ServiceNamespace {
    entries: Vec<(String, ServiceEntry)>,
}

impl ServiceNamespace {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, key: String, entry: ServiceEntry) {
        self.entries.push((key, entry));
    }

    pub fn get(&self, key: &str) -> Option<&ServiceEntry> {
        self.entries.iter().find(|(existing, _)| existing == key).map(|(_, entry)| entry)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(key, _)| key.as_str())
    }

    /// Keys of direct children only, without dotted shortcuts.
    pub fn child_keys(&self) -> impl Iterator<Item = &str> {
        self.keys().filter(|key| !key.contains(SEPARATOR))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Debug for ServiceNamespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.entries.iter().map(|(k, v)| (k, v))).finish()
    }
}

/// The assembled services of one module, keyed by flat name.
#[derive(Clone, Default)]
pub struct ServiceMap {
    entries: Vec<(FlatName, ServiceEntry)>,
    index: HashMap<FlatName, usize>,
}

impl ServiceMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace an entry. Replacing keeps the original position.
    pub fn insert(&mut self, name: impl Into<FlatName>, entry: ServiceEntry) {
        let name = name.into();
        match self.index.get(&name) {
            Some(&position) => self.entries[position].1 = entry,
            None => {
                self.index.insert(name.clone(), self.entries.len());
                self.entries.push((name, entry));
            }
        }
    }

    /// Builder-style insert, handy for imperative setup entry points.
    pub fn with(mut self, name: impl Into<FlatName>, entry: ServiceEntry) -> Self {
        self.insert(name, entry);
        self
    }

    pub fn get(&self, name: &str) -> Option<&ServiceEntry> {
        self.index.get(name).map(|&position| &self.entries[position].1)
    }

    pub fn get_instance<T: Any + Send + Sync>(&self, name: &str) -> Option<Arc<T>> {
        self.get(name).and_then(ServiceEntry::downcast::<T>)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Flat names in registration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    /// Entries whose flat name has no separator: the nested view of the module.
    pub fn top_level(&self) -> impl Iterator<Item = (&str, &ServiceEntry)> {
        self.iter().filter(|(name, _)| !name.contains(SEPARATOR))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ServiceEntry)> {
        self.entries.iter().map(|(name, entry)| (name.as_str(), entry))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Debug for ServiceMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.entries.iter().map(|(k, v)| (k, v))).finish()
    }
}

/// Services a module consumes, already resolved by the surrounding application.
#[derive(Clone, Default, Debug)]
pub struct ImportMap {
    services: HashMap<String, ServiceEntry>,
}

impl ImportMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, entry: ServiceEntry) -> Option<ServiceEntry> {
        self.services.insert(name.into(), entry)
    }

    pub fn with(mut self, name: impl Into<String>, entry: ServiceEntry) -> Self {
        self.insert(name, entry);
        self
    }

    /// Import every service another module produced, under the same names.
    pub fn extend_from(&mut self, services: &ServiceMap) {
        for (name, entry) in services.iter() {
            self.services.insert(name.to_string(), entry.clone());
        }
    }

    pub fn get(&self, name: &str) -> Option<&ServiceEntry> {
        self.services.get(name)
    }

    pub fn get_instance<T: Any + Send + Sync>(&self, name: &str) -> Option<Arc<T>> {
        self.get(name).and_then(ServiceEntry::downcast::<T>)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.services.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.services.len()
    }

    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }
}
