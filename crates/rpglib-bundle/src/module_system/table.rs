// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Static module table

use crate::error::{BundleError, Result};
use crate::module_system::cache::ModuleHandle;
use crate::module_system::require::Require;
use crate::value::Object;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Identifier of a packaged module
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModuleId(String);

impl ModuleId {
    /// Create a module id
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The id as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ModuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for ModuleId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ModuleId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for ModuleId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&ModuleId> for ModuleId {
    fn from(id: &ModuleId) -> Self {
        id.clone()
    }
}

/// A module body.
///
/// Receives the local `require`, the `module` container (whose exports may be
/// replaced wholesale) and the initial exports object.
pub type Factory =
    Arc<dyn Fn(&mut Require<'_>, &ModuleHandle, &Object) -> Result<()> + Send + Sync>;

/// Static description of one packaged module
#[derive(Clone)]
pub struct ModuleRecord {
    id: ModuleId,
    name: Option<String>,
    factory: Factory,
    dependencies: BTreeMap<String, ModuleId>,
}

impl ModuleRecord {
    /// Create a record with no dependencies
    pub fn new<F>(id: impl Into<ModuleId>, factory: F) -> Self
    where
        F: Fn(&mut Require<'_>, &ModuleHandle, &Object) -> Result<()> + Send + Sync + 'static,
    {
        Self::from_factory(id, Arc::new(factory))
    }

    /// Create a record around a shared factory
    pub fn from_factory(id: impl Into<ModuleId>, factory: Factory) -> Self {
        Self {
            id: id.into(),
            name: None,
            factory,
            dependencies: BTreeMap::new(),
        }
    }

    /// Declare that the literal `specifier` resolves to `target`
    pub fn depends_on(mut self, specifier: impl Into<String>, target: impl Into<ModuleId>) -> Self {
        self.dependencies.insert(specifier.into(), target.into());
        self
    }

    /// Attach the source name (e.g. `math/div`)
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// The module id
    pub fn id(&self) -> &ModuleId {
        &self.id
    }

    /// The source name, if known
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Declared dependency map
    pub fn dependencies(&self) -> &BTreeMap<String, ModuleId> {
        &self.dependencies
    }

    /// Target id of a literal require string
    pub fn dependency(&self, specifier: &str) -> Option<&ModuleId> {
        self.dependencies.get(specifier)
    }

    pub(crate) fn factory(&self) -> &Factory {
        &self.factory
    }
}

impl fmt::Debug for ModuleRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModuleRecord")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("dependencies", &self.dependencies)
            .finish_non_exhaustive()
    }
}

/// Mapping from module id to record. Read-only once built.
#[derive(Debug, Default)]
pub struct ModuleTable {
    records: FxHashMap<ModuleId, Arc<ModuleRecord>>,
}

impl ModuleTable {
    /// Start assembling a table
    pub fn builder() -> ModuleTableBuilder {
        ModuleTableBuilder::default()
    }

    /// Look up a record
    pub fn get(&self, id: &str) -> Option<Arc<ModuleRecord>> {
        self.records.get(id).cloned()
    }

    /// Check if an id is registered
    pub fn contains(&self, id: &str) -> bool {
        self.records.contains_key(id)
    }

    /// All ids, sorted
    pub fn ids(&self) -> Vec<ModuleId> {
        let mut ids: Vec<_> = self.records.keys().cloned().collect();
        ids.sort();
        ids
    }

    /// All records, sorted by id
    pub fn records(&self) -> Vec<Arc<ModuleRecord>> {
        let mut records: Vec<_> = self.records.values().cloned().collect();
        records.sort_by(|a, b| a.id().cmp(b.id()));
        records
    }

    /// Number of registered modules
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Check if the table is empty
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Check every dependency edge, reporting the first dangling one in id order
    pub fn validate(&self) -> Result<()> {
        for record in self.records() {
            for (specifier, target) in record.dependencies() {
                if !self.contains(target.as_str()) {
                    return Err(BundleError::DanglingDependency {
                        module: record.id().clone(),
                        specifier: specifier.clone(),
                        target: target.clone(),
                    });
                }
            }
        }
        Ok(())
    }
}

/// Builder for [`ModuleTable`]
#[derive(Default)]
pub struct ModuleTableBuilder {
    records: FxHashMap<ModuleId, Arc<ModuleRecord>>,
}

impl ModuleTableBuilder {
    /// Add a record; a later record with the same id replaces the earlier one
    pub fn record(mut self, record: ModuleRecord) -> Self {
        self.records.insert(record.id().clone(), Arc::new(record));
        self
    }

    /// Finish assembly. No factory runs here.
    pub fn build(self) -> ModuleTable {
        ModuleTable {
            records: self.records,
        }
    }
}

/// Builds a [`ModuleTable`] in the `{id: [factory, {literal: id}]}` shape of a
/// generated bundle.
///
/// # Example
///
/// ```
/// use rpglib_bundle::module_table;
///
/// let table = module_table! {
///     "1" => [|_req, _module, exports| {
///         exports.set("answer", 42.0);
///         Ok(())
///     }, {}],
///     "2" => [|req, module, _exports| {
///         let answer = req.require("./answer")?;
///         module.set_exports(answer.get("answer"));
///         Ok(())
///     }, { "./answer" => "1" }],
/// };
/// assert_eq!(table.len(), 2);
/// assert!(table.validate().is_ok());
/// ```
#[macro_export]
macro_rules! module_table {
    () => {
        $crate::ModuleTable::builder().build()
    };
    ($($id:expr => [$factory:expr, { $($specifier:expr => $target:expr),* $(,)? }]),+ $(,)?) => {{
        let builder = $crate::ModuleTable::builder();
        $(
            let builder = builder.record(
                $crate::ModuleRecord::new($id, $factory)$(.depends_on($specifier, $target))*
            );
        )+
        builder.build()
    }};
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noop(_: &mut Require<'_>, _: &ModuleHandle, _: &Object) -> Result<()> {
        Ok(())
    }

    #[test]
    fn test_get_and_contains() {
        let table = ModuleTable::builder()
            .record(ModuleRecord::new("1", noop).with_name("core/core"))
            .record(ModuleRecord::new("2", noop).depends_on("../core/core", "1"))
            .build();

        assert_eq!(table.len(), 2);
        assert!(table.contains("1"));
        assert!(table.get("3").is_none());

        let record = table.get("2").unwrap();
        assert_eq!(record.dependency("../core/core"), Some(&ModuleId::from("1")));
        assert_eq!(record.dependency("./missing"), None);
        assert_eq!(table.get("1").unwrap().name(), Some("core/core"));
    }

    #[test]
    fn test_validate_reports_dangling_edge() {
        let table = ModuleTable::builder()
            .record(ModuleRecord::new("1", noop).depends_on("./gone", "9"))
            .build();

        match table.validate() {
            Err(BundleError::DanglingDependency {
                module,
                specifier,
                target,
            }) => {
                assert_eq!(module.as_str(), "1");
                assert_eq!(specifier, "./gone");
                assert_eq!(target.as_str(), "9");
            }
            other => panic!("expected dangling dependency, got {:?}", other),
        }
    }

    #[test]
    fn test_ids_sorted() {
        let table = ModuleTable::builder()
            .record(ModuleRecord::new("b", noop))
            .record(ModuleRecord::new("a", noop))
            .build();
        assert_eq!(table.ids(), vec![ModuleId::from("a"), ModuleId::from("b")]);
    }

    #[test]
    fn test_macro_builds_edges() {
        let table = crate::module_table! {
            "1" => [noop, {}],
            "2" => [noop, { "./one" => "1", "./self" => "2" }],
        };
        assert_eq!(table.get("2").unwrap().dependencies().len(), 2);
        assert!(table.validate().is_ok());

        let empty = crate::module_table!();
        assert!(empty.is_empty());
    }
}
