// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Serialized bundle description
//!
//! The module table is stored in the same shape a generated bundle uses,
//! `{id: [factory, {literal: id}]}`, with the factory given by name:
//!
//! ```json
//! {
//!   "name": "rpglib",
//!   "version": "1.0.0",
//!   "global_name": "RPGLib",
//!   "modules": {
//!     "1": ["core/core", {}],
//!     "2": ["math/div", { "../core/core": "1" }]
//!   },
//!   "entries": ["1", "2"],
//!   "main": "2"
//! }
//! ```

use crate::error::Result;
use crate::module_system::ModuleId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Default global property name when a manifest names none
pub const DEFAULT_GLOBAL_NAME: &str = "RPGLib";

/// One module entry: factory name and dependency map
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestModule(pub String, pub BTreeMap<String, ModuleId>);

impl ManifestModule {
    /// Module with the given factory and no dependencies
    pub fn new(factory: impl Into<String>) -> Self {
        Self(factory.into(), BTreeMap::new())
    }

    /// Add a dependency edge
    pub fn depends_on(mut self, specifier: impl Into<String>, target: impl Into<ModuleId>) -> Self {
        self.1.insert(specifier.into(), target.into());
        self
    }

    /// Factory name
    pub fn factory(&self) -> &str {
        &self.0
    }

    /// Dependency map
    pub fn dependencies(&self) -> &BTreeMap<String, ModuleId> {
        &self.1
    }
}

/// A bundle manifest as produced by a package assembler
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BundleManifest {
    /// Package name
    #[serde(default = "default_name")]
    pub name: String,
    /// Package version
    #[serde(default = "default_version")]
    pub version: String,
    /// Global property used when no module system is available
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub global_name: Option<String>,
    /// Module table
    pub modules: BTreeMap<ModuleId, ManifestModule>,
    /// Entry points, resolved in this order at load
    pub entries: Vec<ModuleId>,
    /// Entry whose exports become the package value (last entry if absent)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub main: Option<ModuleId>,
}

fn default_name() -> String {
    "bundle".to_string()
}

fn default_version() -> String {
    "0.0.0".to_string()
}

impl BundleManifest {
    /// Parse a manifest from JSON
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read a manifest file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Serialize as pretty JSON
    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// The global name, falling back to [`DEFAULT_GLOBAL_NAME`]
    pub fn global_name(&self) -> &str {
        self.global_name.as_deref().unwrap_or(DEFAULT_GLOBAL_NAME)
    }
}
