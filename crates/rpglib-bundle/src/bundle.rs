// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Assembled bundles and their instantiation

use crate::error::{BundleError, Result};
use crate::manifest::{BundleManifest, DEFAULT_GLOBAL_NAME};
use crate::module_system::{ExternalRequire, ModuleId, ModuleRecord, ModuleTable, Resolver};
use crate::package::Package;
use crate::registry::FactoryRegistry;
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{debug, info};

/// A packaged set of modules plus its entry points.
///
/// Cheap to clone; every instantiation gets its own instance cache.
#[derive(Debug, Clone)]
pub struct Bundle {
    name: String,
    version: String,
    global_name: String,
    table: Arc<ModuleTable>,
    entries: Vec<ModuleId>,
    main: ModuleId,
}

impl Bundle {
    /// Create a bundle whose main entry is the last of `entries`
    pub fn new(table: ModuleTable, entries: Vec<ModuleId>) -> Result<Self> {
        let main = entries
            .last()
            .cloned()
            .ok_or_else(|| BundleError::InvalidManifest("bundle declares no entry points".into()))?;

        Ok(Self {
            name: "bundle".to_string(),
            version: "0.0.0".to_string(),
            global_name: DEFAULT_GLOBAL_NAME.to_string(),
            table: Arc::new(table),
            entries,
            main,
        })
    }

    /// Assemble a bundle from a manifest, looking factories up by name.
    ///
    /// With `strict`, every dependency edge must point at a module in the
    /// table; otherwise dangling edges surface only when required.
    pub fn assemble(manifest: &BundleManifest, factories: &FactoryRegistry, strict: bool) -> Result<Self> {
        let mut builder = ModuleTable::builder();
        for (id, module) in &manifest.modules {
            let factory = factories
                .get(module.factory())
                .ok_or_else(|| BundleError::UnknownFactory(module.factory().to_string()))?;

            let mut record = ModuleRecord::from_factory(id, factory).with_name(module.factory());
            for (specifier, target) in module.dependencies() {
                record = record.depends_on(specifier.as_str(), target);
            }
            builder = builder.record(record);
        }
        let table = builder.build();

        if strict {
            table.validate()?;
        }

        let mut bundle = Self::new(table, manifest.entries.clone())?;
        if let Some(main) = &manifest.main {
            bundle.main = main.clone();
        }
        bundle.name = manifest.name.clone();
        bundle.version = manifest.version.clone();
        bundle.global_name = manifest.global_name().to_string();

        if strict {
            bundle.validate_entry_points()?;
        }

        debug!(
            name = %bundle.name,
            modules = bundle.table.len(),
            entries = bundle.entries.len(),
            "Assembled bundle"
        );
        Ok(bundle)
    }

    /// Check that every entry point and the main entry exist in the table
    pub fn validate_entry_points(&self) -> Result<()> {
        let missing = self
            .entries
            .iter()
            .chain(std::iter::once(&self.main))
            .find(|id| !self.table.contains(id.as_str()));

        match missing {
            Some(id) => Err(BundleError::InvalidManifest(format!(
                "entry point '{}' is not in the module table",
                id
            ))),
            None => Ok(()),
        }
    }

    /// Override the main entry
    pub fn with_main(mut self, main: impl Into<ModuleId>) -> Self {
        self.main = main.into();
        self
    }

    /// Override the global property name
    pub fn with_global_name(mut self, global_name: impl Into<String>) -> Self {
        self.global_name = global_name.into();
        self
    }

    /// Set package name and version
    pub fn with_metadata(mut self, name: impl Into<String>, version: impl Into<String>) -> Self {
        self.name = name.into();
        self.version = version.into();
        self
    }

    /// Load the bundle with a fresh instance cache
    pub fn instantiate(&self) -> Result<Package> {
        self.instantiate_with(None)
    }

    /// Load the bundle, resolving undeclared literals through `external`.
    ///
    /// Every entry point is resolved in declaration order, then the main
    /// entry's exports become the package value. Any failure aborts the load.
    pub fn instantiate_with(&self, external: Option<Arc<dyn ExternalRequire>>) -> Result<Package> {
        let mut resolver = Resolver::new(Arc::clone(&self.table));
        if let Some(external) = external {
            resolver = resolver.with_external(external);
        }

        for entry in &self.entries {
            resolver.resolve(entry.as_str())?;
        }
        let exports = resolver.resolve(self.main.as_str())?;

        info!(
            name = %self.name,
            main = %self.main,
            loaded = resolver.cache().len(),
            "Bundle instantiated"
        );
        Ok(Package::new(self.name.clone(), self.global_name.clone(), resolver, exports))
    }

    /// License-style banner naming the module groups, as a bundler prints it
    pub fn banner(&self) -> String {
        format!(
            "/*! Custom {}.js v{} \nContains the following modules : {}*/",
            self.name.to_lowercase(),
            self.version,
            self.module_groups().join(", ")
        )
    }

    /// Top-level groups of named modules (`math/div` -> `math`), without `core`
    pub fn module_groups(&self) -> Vec<String> {
        self.table
            .records()
            .iter()
            .filter_map(|record| record.name())
            .filter_map(|name| name.split('/').next())
            .filter(|group| *group != "core")
            .map(str::to_string)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Package name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Package version
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Global property name
    pub fn global_name(&self) -> &str {
        &self.global_name
    }

    /// The module table
    pub fn table(&self) -> &ModuleTable {
        &self.table
    }

    /// Entry points in resolution order
    pub fn entries(&self) -> &[ModuleId] {
        &self.entries
    }

    /// The main entry
    pub fn main(&self) -> &ModuleId {
        &self.main
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::ManifestModule;
    use crate::value::Value;
    use std::collections::BTreeMap;

    fn registry() -> FactoryRegistry {
        let mut registry = FactoryRegistry::new();
        registry
            .register("base", |_, _, exports| {
                exports.set("base", true);
                Ok(())
            })
            .register("math/double", |req, module, _| {
                let base = req.require("./base")?;
                let obj = base.as_object().cloned().unwrap_or_default();
                obj.set("double", Value::function("double", 1, |args| {
                    let n = args.first().cloned().unwrap_or_default().to_number();
                    Ok(Value::Number(n * 2.0))
                }));
                module.set_exports(obj);
                Ok(())
            });
        registry
    }

    fn manifest(target: &str) -> BundleManifest {
        let mut modules = BTreeMap::new();
        modules.insert(ModuleId::from("1"), ManifestModule::new("base"));
        modules.insert(
            ModuleId::from("2"),
            ManifestModule::new("math/double").depends_on("./base", target),
        );
        BundleManifest {
            name: "Demo".to_string(),
            version: "2.1.0".to_string(),
            global_name: None,
            modules,
            entries: vec!["1".into(), "2".into()],
            main: None,
        }
    }

    #[test]
    fn test_assemble_and_instantiate() {
        let bundle = Bundle::assemble(&manifest("1"), &registry(), true).unwrap();
        assert_eq!(bundle.main().as_str(), "2");
        assert_eq!(bundle.global_name(), "RPGLib");

        let package = bundle.instantiate().unwrap();
        assert_eq!(package.call("double", &[Value::from(4.0)]).unwrap(), Value::Number(8.0));
        assert_eq!(package.exports().get("base"), Value::Boolean(true));
    }

    #[test]
    fn test_strict_assembly_rejects_dangling_edge() {
        let err = Bundle::assemble(&manifest("7"), &registry(), true).unwrap_err();
        assert!(matches!(err, BundleError::DanglingDependency { .. }));

        // Lenient assembly defers the failure to load time
        let bundle = Bundle::assemble(&manifest("7"), &registry(), false).unwrap();
        match bundle.instantiate() {
            Err(BundleError::ModuleNotFound(id)) => assert_eq!(id.as_str(), "7"),
            other => panic!("expected ModuleNotFound, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_strict_assembly_rejects_missing_entry_points() {
        let mut unknown_entry = manifest("1");
        unknown_entry.entries.push("8".into());
        let err = Bundle::assemble(&unknown_entry, &registry(), true).unwrap_err();
        assert!(matches!(err, BundleError::InvalidManifest(ref msg) if msg.contains("'8'")));

        let mut unknown_main = manifest("1");
        unknown_main.main = Some("9".into());
        let err = Bundle::assemble(&unknown_main, &registry(), true).unwrap_err();
        assert!(matches!(err, BundleError::InvalidManifest(ref msg) if msg.contains("'9'")));

        // Lenient assembly defers the failure to load time
        let bundle = Bundle::assemble(&unknown_main, &registry(), false).unwrap();
        assert!(bundle.validate_entry_points().is_err());
        assert!(matches!(bundle.instantiate(), Err(BundleError::ModuleNotFound(_))));
    }

    #[test]
    fn test_with_metadata() {
        let bundle = Bundle::new(ModuleTable::builder().build(), vec!["1".into()])
            .unwrap()
            .with_metadata("Tools", "3.0.0");
        assert_eq!(bundle.name(), "Tools");
        assert_eq!(bundle.version(), "3.0.0");
        assert!(bundle.banner().starts_with("/*! Custom tools.js v3.0.0 "));
    }

    #[test]
    fn test_unknown_factory() {
        let mut manifest = manifest("1");
        manifest
            .modules
            .insert(ModuleId::from("3"), ManifestModule::new("string/none"));
        let err = Bundle::assemble(&manifest, &registry(), true).unwrap_err();
        assert!(matches!(err, BundleError::UnknownFactory(name) if name == "string/none"));
    }

    #[test]
    fn test_no_entries() {
        let err = Bundle::new(ModuleTable::builder().build(), Vec::new()).unwrap_err();
        assert!(matches!(err, BundleError::InvalidManifest(_)));
    }

    #[test]
    fn test_banner_lists_groups() {
        let bundle = Bundle::assemble(&manifest("1"), &registry(), true).unwrap();
        assert_eq!(bundle.module_groups(), vec!["base", "math"]);
        assert_eq!(
            bundle.banner(),
            "/*! Custom demo.js v2.1.0 \nContains the following modules : base, math*/"
        );
    }

    #[test]
    fn test_each_instantiation_has_own_cache() {
        let bundle = Bundle::assemble(&manifest("1"), &registry(), true).unwrap();
        let first = bundle.instantiate().unwrap();
        let second = bundle.instantiate().unwrap();
        assert_ne!(first.exports(), second.exports());
    }
}
