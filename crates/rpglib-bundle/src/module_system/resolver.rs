// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Lazy module resolution over a [`ModuleTable`]

use crate::error::{BundleError, Result};
use crate::module_system::cache::{InstanceCache, ModuleHandle};
use crate::module_system::require::Require;
use crate::module_system::table::{ModuleId, ModuleTable};
use crate::value::{Object, Value};
use std::sync::Arc;
use tracing::{debug, trace, warn};

/// A source of modules outside the table: the host's own `require`, or a
/// previously loaded package.
pub trait ExternalRequire: Send + Sync {
    /// Load `specifier`, or `Ok(None)` when this source does not know it
    fn load(&self, specifier: &str) -> Result<Option<Value>>;
}

/// Resolver owning one instance cache
pub struct Resolver {
    /// Static module table
    table: Arc<ModuleTable>,
    /// Modules whose factories have started
    cache: InstanceCache,
    /// Fallback for literals missing from a dependency map
    external: Option<Arc<dyn ExternalRequire>>,
}

impl Resolver {
    /// Create a resolver with a fresh cache
    pub fn new(table: Arc<ModuleTable>) -> Self {
        Self {
            table,
            cache: InstanceCache::new(),
            external: None,
        }
    }

    /// Attach an external require
    pub fn with_external(mut self, external: Arc<dyn ExternalRequire>) -> Self {
        self.external = Some(external);
        self
    }

    /// Resolve a module id to its exports.
    ///
    /// A cached id returns immediately, even while its factory is still on
    /// the stack; that is what stops a require cycle from recursing.
    pub fn resolve(&mut self, id: &str) -> Result<Value> {
        self.resolve_from(id, None)
    }

    pub(crate) fn resolve_from(&mut self, id: &str, parent: Option<&ModuleId>) -> Result<Value> {
        if let Some(handle) = self.cache.get(id) {
            trace!(module = id, loaded = handle.is_loaded(), "Cache hit");
            return Ok(handle.exports());
        }

        // Look up before touching the cache so a miss leaves it unchanged
        let record = self
            .table
            .get(id)
            .ok_or_else(|| BundleError::module_not_found(id))?;

        let exports = Object::new();
        let handle = Arc::new(ModuleHandle::new(
            record.id().clone(),
            Value::Object(exports.clone()),
            parent.cloned(),
        ));
        self.cache.insert(Arc::clone(&handle));

        debug!(module = id, parent = ?parent, "Executing module factory");
        let factory = Arc::clone(record.factory());
        let outcome = {
            let mut require = Require::new(self, &record);
            factory(&mut require, &handle, &exports)
        };

        if let Err(err) = outcome {
            warn!(module = id, error = %err, "Module factory failed");
            self.cache.remove(id);
            return Err(err);
        }

        handle.mark_loaded();
        trace!(module = id, "Module loaded");
        Ok(handle.exports())
    }

    pub(crate) fn require_external(&self, specifier: &str, requested_by: &ModuleId) -> Result<Value> {
        if let Some(external) = &self.external {
            if let Some(value) = external.load(specifier)? {
                debug!(specifier, module = %requested_by, "Resolved from external require");
                return Ok(value);
            }
        }

        Err(BundleError::HostModuleNotFound {
            specifier: specifier.to_string(),
            requested_by: requested_by.clone(),
        })
    }

    /// The module table
    pub fn table(&self) -> &ModuleTable {
        &self.table
    }

    /// The instance cache
    pub fn cache(&self) -> &InstanceCache {
        &self.cache
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::module_system::table::ModuleRecord;
    use parking_lot::Mutex;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn resolver(table: ModuleTable) -> Resolver {
        Resolver::new(Arc::new(table))
    }

    #[test]
    fn test_resolve_twice_returns_same_exports() {
        let runs = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&runs);
        let table = ModuleTable::builder()
            .record(ModuleRecord::new("1", move |_, _, exports| {
                counter.fetch_add(1, Ordering::SeqCst);
                exports.set("x", 1.0);
                Ok(())
            }))
            .build();
        let mut resolver = resolver(table);

        let first = resolver.resolve("1").unwrap();
        let second = resolver.resolve("1").unwrap();

        assert!(first.as_object().unwrap().ptr_eq(second.as_object().unwrap()));
        assert_eq!(runs.load(Ordering::SeqCst), 1);
        assert!(resolver.cache().get("1").unwrap().is_loaded());
    }

    #[test]
    fn test_cycle_sees_partial_exports() {
        let a_runs = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&a_runs);
        let table = ModuleTable::builder()
            .record(
                ModuleRecord::new("a", move |req, _, exports| {
                    counter.fetch_add(1, Ordering::SeqCst);
                    exports.set("early", true);
                    let b = req.require("./b")?;
                    exports.set("b", b);
                    Ok(())
                })
                .depends_on("./b", "b"),
            )
            .record(
                ModuleRecord::new("b", |req, _, exports| {
                    let a = req.require("./a")?;
                    exports.set("saw_early", a.get("early"));
                    exports.set("saw_b", !a.get("b").is_undefined());
                    Ok(())
                })
                .depends_on("./a", "a"),
            )
            .build();
        let mut resolver = resolver(table);

        let a = resolver.resolve("a").unwrap();
        let b = resolver.resolve("b").unwrap();

        assert_eq!(a_runs.load(Ordering::SeqCst), 1);
        assert_eq!(b.get("saw_early"), Value::Boolean(true));
        assert_eq!(b.get("saw_b"), Value::Boolean(false));
        assert_eq!(a.get("b"), b);
        assert_eq!(
            resolver.cache().get("b").unwrap().parent(),
            Some(&ModuleId::from("a"))
        );
    }

    #[test]
    fn test_require_resolve_does_not_load() {
        let table = ModuleTable::builder()
            .record(
                ModuleRecord::new("main", |req, _, exports| {
                    let target = req.resolve("./dep").map(|id| id.to_string());
                    exports.set("target", target.unwrap_or_default());
                    exports.set("unmapped", req.resolve("fs").is_none());
                    exports.set("self", req.module_id().as_str());
                    Ok(())
                })
                .depends_on("./dep", "dep"),
            )
            .record(ModuleRecord::new("dep", |_, _, _| Ok(())))
            .build();
        let mut resolver = resolver(table);

        let exports = resolver.resolve("main").unwrap();
        assert_eq!(exports.get("target"), Value::from("dep"));
        assert_eq!(exports.get("unmapped"), Value::Boolean(true));
        assert_eq!(exports.get("self"), Value::from("main"));
        assert!(!resolver.cache().has("dep"));
    }

    #[test]
    fn test_missing_module_leaves_cache_untouched() {
        let mut resolver = resolver(ModuleTable::builder().build());

        match resolver.resolve("nope") {
            Err(BundleError::ModuleNotFound(id)) => assert_eq!(id.as_str(), "nope"),
            other => panic!("expected ModuleNotFound, got {:?}", other),
        }
        assert!(resolver.cache().is_empty());
    }

    #[test]
    fn test_sum_module_yields_value() {
        let table = ModuleTable::builder()
            .record(ModuleRecord::new("sum", |_, _, exports| {
                let (a, b) = (Value::from(2.0), Value::from(3.0));
                exports.set("value", a.add(&b));
                Ok(())
            }))
            .build();

        let exports = resolver(table).resolve("sum").unwrap();
        assert_eq!(exports.get("value"), Value::Number(5.0));
        assert_eq!(exports.as_object().unwrap().keys(), vec!["value"]);
    }

    #[test]
    fn test_replaced_module_exports_are_returned() {
        let table = ModuleTable::builder()
            .record(ModuleRecord::new("1", |_, module, _| {
                module.set_exports("replaced");
                Ok(())
            }))
            .build();

        assert_eq!(
            resolver(table).resolve("1").unwrap(),
            Value::String("replaced".to_string())
        );
    }

    #[test]
    fn test_failed_factory_evicts_only_itself() {
        let runs = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&runs);
        let table = ModuleTable::builder()
            .record(ModuleRecord::new("1", |_, _, _| Ok(())))
            .record(
                ModuleRecord::new("2", move |req, _, _| {
                    counter.fetch_add(1, Ordering::SeqCst);
                    req.require("./one")?;
                    Err(BundleError::factory("2", "boom"))
                })
                .depends_on("./one", "1"),
            )
            .build();
        let mut resolver = resolver(table);

        assert!(matches!(resolver.resolve("2"), Err(BundleError::Factory { .. })));
        assert!(resolver.cache().has("1"));
        assert!(!resolver.cache().has("2"));

        // Not cached, so the factory runs again
        assert!(resolver.resolve("2").is_err());
        assert_eq!(runs.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_transitive_missing_module() {
        let table = ModuleTable::builder()
            .record(ModuleRecord::new("1", |req, _, _| {
                req.require("./gone")?;
                Ok(())
            }).depends_on("./gone", "9"))
            .build();
        let mut resolver = resolver(table);

        match resolver.resolve("1") {
            Err(BundleError::ModuleNotFound(id)) => assert_eq!(id.as_str(), "9"),
            other => panic!("expected ModuleNotFound, got {:?}", other),
        }
        assert!(resolver.cache().is_empty());
    }

    struct Host(HashMap<String, Value>);

    impl ExternalRequire for Host {
        fn load(&self, specifier: &str) -> Result<Option<Value>> {
            Ok(self.0.get(specifier).cloned())
        }
    }

    #[test]
    fn test_undeclared_literal_uses_external_require() {
        let table = ModuleTable::builder()
            .record(ModuleRecord::new("1", |req, module, _| {
                module.set_exports(req.require("host-thing")?);
                Ok(())
            }))
            .build();

        let mut without_host = Resolver::new(Arc::new(table));
        match without_host.resolve("1") {
            Err(BundleError::HostModuleNotFound {
                specifier,
                requested_by,
            }) => {
                assert_eq!(specifier, "host-thing");
                assert_eq!(requested_by.as_str(), "1");
            }
            other => panic!("expected HostModuleNotFound, got {:?}", other),
        }

        let host = Host(HashMap::from([("host-thing".to_string(), Value::from(9.0))]));
        let table = ModuleTable::builder()
            .record(ModuleRecord::new("1", |req, module, _| {
                module.set_exports(req.require("host-thing")?);
                Ok(())
            }))
            .build();
        let mut with_host = Resolver::new(Arc::new(table)).with_external(Arc::new(host));
        assert_eq!(with_host.resolve("1").unwrap(), Value::Number(9.0));
    }

    #[test]
    fn test_resolution_is_preorder() {
        let order = Arc::new(Mutex::new(Vec::new()));
        let node = |name: &'static str, deps: &'static [&'static str]| {
            let order = Arc::clone(&order);
            let mut record = ModuleRecord::new(name, move |req, _, _| {
                order.lock().push(name);
                for dep in deps {
                    req.require(dep)?;
                }
                Ok(())
            });
            for dep in deps {
                record = record.depends_on(*dep, *dep);
            }
            record
        };
        let table = ModuleTable::builder()
            .record(node("root", &["a", "b"]))
            .record(node("a", &["c"]))
            .record(node("b", &["c"]))
            .record(node("c", &[]))
            .build();

        resolver(table).resolve("root").unwrap();
        assert_eq!(*order.lock(), vec!["root", "a", "c", "b"]);
    }
}
