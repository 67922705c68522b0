// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Instance cache for resolved modules

use crate::module_system::table::ModuleId;
use crate::value::Value;
use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// The `module` container handed to a factory
#[derive(Debug)]
pub struct ModuleHandle {
    /// The module's id
    id: ModuleId,
    /// The module's exports; factories may replace them
    exports: RwLock<Value>,
    /// Whether the factory has finished
    loaded: AtomicBool,
    /// Module whose require first pulled this one in
    parent: Option<ModuleId>,
}

impl ModuleHandle {
    /// Create a handle whose exports start as `exports`
    pub fn new(id: ModuleId, exports: Value, parent: Option<ModuleId>) -> Self {
        Self {
            id,
            exports: RwLock::new(exports),
            loaded: AtomicBool::new(false),
            parent,
        }
    }

    /// The module's id
    pub fn id(&self) -> &ModuleId {
        &self.id
    }

    /// Current exports
    pub fn exports(&self) -> Value {
        self.exports.read().clone()
    }

    /// Replace the exports (`module.exports = ...`)
    pub fn set_exports(&self, exports: impl Into<Value>) {
        *self.exports.write() = exports.into();
    }

    /// Whether the factory has completed
    pub fn is_loaded(&self) -> bool {
        self.loaded.load(Ordering::Acquire)
    }

    pub(crate) fn mark_loaded(&self) {
        self.loaded.store(true, Ordering::Release);
    }

    /// Module that first required this one (`None` for entry points)
    pub fn parent(&self) -> Option<&ModuleId> {
        self.parent.as_ref()
    }
}

/// Cache of instantiated modules, keyed by id.
///
/// An entry exists from the moment its factory starts running.
#[derive(Debug, Default)]
pub struct InstanceCache {
    entries: FxHashMap<ModuleId, Arc<ModuleHandle>>,
}

impl InstanceCache {
    /// Create a new empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a cached module by id
    pub fn get(&self, id: &str) -> Option<Arc<ModuleHandle>> {
        self.entries.get(id).cloned()
    }

    /// Check if a module is cached
    pub fn has(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    /// Add a module to the cache
    pub fn insert(&mut self, handle: Arc<ModuleHandle>) {
        self.entries.insert(handle.id().clone(), handle);
    }

    /// Remove a module from the cache
    pub fn remove(&mut self, id: &str) -> Option<Arc<ModuleHandle>> {
        self.entries.remove(id)
    }

    /// Get all cached module ids, sorted
    pub fn keys(&self) -> Vec<ModuleId> {
        let mut keys: Vec<_> = self.entries.keys().cloned().collect();
        keys.sort();
        keys
    }

    /// Get the number of cached modules
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the cache is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Object;

    #[test]
    fn test_handle_exports_replace() {
        let initial = Object::new();
        let handle = ModuleHandle::new("1".into(), Value::Object(initial.clone()), None);

        assert_eq!(handle.exports(), Value::Object(initial));
        handle.set_exports(7.0);
        assert_eq!(handle.exports(), Value::Number(7.0));
        assert!(!handle.is_loaded());
        handle.mark_loaded();
        assert!(handle.is_loaded());
    }

    #[test]
    fn test_cache_insert_remove() {
        let mut cache = InstanceCache::new();
        cache.insert(Arc::new(ModuleHandle::new(
            "2".into(),
            Value::Undefined,
            Some("1".into()),
        )));

        assert!(cache.has("2"));
        assert_eq!(cache.get("2").unwrap().parent(), Some(&ModuleId::from("1")));
        assert_eq!(cache.keys(), vec![ModuleId::from("2")]);
        assert!(cache.remove("2").is_some());
        assert!(cache.is_empty());
    }
}
