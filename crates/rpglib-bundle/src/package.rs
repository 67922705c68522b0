// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! A loaded bundle

use crate::error::{BundleError, Result};
use crate::module_system::{ExternalRequire, ModuleId, Resolver};
use crate::value::Value;
use parking_lot::Mutex;

/// A bundle loaded into a host: its instance cache and main exports.
///
/// The cache lives as long as the package and is never torn down.
pub struct Package {
    name: String,
    global_name: String,
    resolver: Mutex<Resolver>,
    exports: Value,
}

impl Package {
    pub(crate) fn new(name: String, global_name: String, resolver: Resolver, exports: Value) -> Self {
        Self {
            name,
            global_name,
            resolver: Mutex::new(resolver),
            exports,
        }
    }

    /// Package name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Global property name
    pub fn global_name(&self) -> &str {
        &self.global_name
    }

    /// Exports of the main entry
    pub fn exports(&self) -> Value {
        self.exports.clone()
    }

    /// Resolve any module of this package by id, sharing the package's cache
    pub fn require(&self, id: &str) -> Result<Value> {
        self.resolver.lock().resolve(id)
    }

    /// Call an exported function by name
    pub fn call(&self, name: &str, args: &[Value]) -> Result<Value> {
        let target = self.exports.get(name);
        if !target.is_function() {
            return Err(BundleError::type_error(format!(
                "{}.{} is not a function",
                self.global_name, name
            )));
        }
        target.call(args)
    }

    /// Names exported by the main entry
    pub fn export_names(&self) -> Vec<String> {
        self.exports
            .as_object()
            .map(|obj| obj.keys())
            .unwrap_or_default()
    }

    /// Ids of modules instantiated so far
    pub fn loaded_modules(&self) -> Vec<ModuleId> {
        self.resolver.lock().cache().keys()
    }
}

impl ExternalRequire for Package {
    // Chained bundles address each other's modules by id
    fn load(&self, specifier: &str) -> Result<Option<Value>> {
        let mut resolver = self.resolver.lock();
        if !resolver.table().contains(specifier) {
            return Ok(None);
        }
        resolver.resolve(specifier).map(Some)
    }
}

impl std::fmt::Debug for Package {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Package")
            .field("name", &self.name)
            .field("global_name", &self.global_name)
            .field("exports", &self.exports)
            .finish_non_exhaustive()
    }
}
