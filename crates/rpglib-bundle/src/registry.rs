// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Named native factories a manifest can refer to

use crate::error::Result;
use crate::module_system::{Factory, ModuleHandle, Require};
use crate::value::Object;
use rustc_hash::FxHashMap;
use std::sync::Arc;

/// Registry of module bodies, keyed by source name (e.g. `math/div`)
#[derive(Clone, Default)]
pub struct FactoryRegistry {
    factories: FxHashMap<String, Factory>,
}

impl FactoryRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a factory under `name`, replacing any previous one
    pub fn register<F>(&mut self, name: impl Into<String>, factory: F) -> &mut Self
    where
        F: Fn(&mut Require<'_>, &ModuleHandle, &Object) -> Result<()> + Send + Sync + 'static,
    {
        self.factories.insert(name.into(), Arc::new(factory));
        self
    }

    /// Look up a factory
    pub fn get(&self, name: &str) -> Option<Factory> {
        self.factories.get(name).cloned()
    }

    /// Check if a factory is registered
    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    /// Registered names, sorted
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<_> = self.factories.keys().cloned().collect();
        names.sort();
        names
    }

    /// Number of registered factories
    pub fn len(&self) -> usize {
        self.factories.len()
    }

    /// Check if the registry is empty
    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }
}

impl std::fmt::Debug for FactoryRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FactoryRegistry")
            .field("names", &self.names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_and_lookup() {
        let mut registry = FactoryRegistry::new();
        assert!(registry.is_empty());

        registry
            .register("math/div", |_, _, _| Ok(()))
            .register("core/core", |_, _, _| Ok(()));

        assert_eq!(registry.len(), 2);
        assert!(registry.contains("math/div"));
        assert!(!registry.contains("math/sum"));
        assert!(registry.get("core/core").is_some());
        assert_eq!(registry.names(), vec!["core/core", "math/div"]);
    }

    #[test]
    fn test_register_replaces() {
        let mut registry = FactoryRegistry::new();
        registry
            .register("core/core", |_, _, _| Ok(()))
            .register("core/core", |_, _, _| Ok(()));
        assert_eq!(registry.len(), 1);
    }
}
