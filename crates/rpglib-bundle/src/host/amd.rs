// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Anonymous module registration (`define([], factory)`)

use crate::bundle::Bundle;
use crate::error::Result;
use crate::host::{Exposure, ExposureKind, ExposureStrategy, HostContext};
use crate::value::Value;
use parking_lot::Mutex;
use std::collections::VecDeque;
use tracing::debug;

/// A package factory the loader invokes later
pub type DeferredFactory = Box<dyn FnOnce() -> Result<Value> + Send>;

/// A host function that registers a module without a fixed id
pub trait AnonymousLoader: Send + Sync {
    /// Register `factory`, to run once `dependencies` are available
    fn define(&self, dependencies: Vec<String>, factory: DeferredFactory) -> Result<()>;
}

struct Definition {
    dependencies: Vec<String>,
    factory: DeferredFactory,
}

/// Minimal loader resolving definitions in registration order
#[derive(Default)]
pub struct AmdRegistry {
    pending: Mutex<VecDeque<Definition>>,
    defined: Mutex<Vec<Value>>,
}

impl AmdRegistry {
    /// Create an empty loader
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of definitions not yet run
    pub fn pending_len(&self) -> usize {
        self.pending.lock().len()
    }

    /// Dependency lists of pending definitions
    pub fn pending_dependencies(&self) -> Vec<Vec<String>> {
        self.pending
            .lock()
            .iter()
            .map(|definition| definition.dependencies.clone())
            .collect()
    }

    /// Run pending definitions in order, returning their values.
    ///
    /// Stops at the first failure; later definitions stay pending.
    pub fn run_pending(&self) -> Result<Vec<Value>> {
        let mut values = Vec::new();
        loop {
            // Release the lock before running: factories may define more
            let next = self.pending.lock().pop_front();
            let Some(definition) = next else {
                break;
            };
            let value = (definition.factory)()?;
            self.defined.lock().push(value.clone());
            values.push(value);
        }
        Ok(values)
    }

    /// Values of every definition run so far
    pub fn defined(&self) -> Vec<Value> {
        self.defined.lock().clone()
    }
}

impl AnonymousLoader for AmdRegistry {
    fn define(&self, dependencies: Vec<String>, factory: DeferredFactory) -> Result<()> {
        self.pending.lock().push_back(Definition {
            dependencies,
            factory,
        });
        Ok(())
    }
}

/// Registers the whole package with an anonymous loader
pub struct AnonymousLoaderStrategy;

impl ExposureStrategy for AnonymousLoaderStrategy {
    fn name(&self) -> &'static str {
        "anonymous-loader"
    }

    fn detect(&self, host: &dyn HostContext) -> bool {
        host.anonymous_loader().is_some()
    }

    fn expose(&self, bundle: &Bundle, host: &dyn HostContext) -> Result<Exposure> {
        if let Some(loader) = host.anonymous_loader() {
            let bundle = bundle.clone();
            let external = host.host_require();
            loader.define(
                Vec::new(),
                Box::new(move || -> Result<Value> {
                    Ok(bundle.instantiate_with(external)?.exports())
                }),
            )?;
            debug!("Registered anonymous definition");
        }

        Ok(Exposure {
            kind: ExposureKind::AnonymousLoader,
            package: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BundleError;

    #[test]
    fn test_definitions_run_in_order() {
        let loader = AmdRegistry::new();
        loader
            .define(vec!["a".to_string()], Box::new(|| Ok(Value::from(1.0))))
            .unwrap();
        loader.define(Vec::new(), Box::new(|| Ok(Value::from(2.0)))).unwrap();

        assert_eq!(loader.pending_dependencies(), vec![vec!["a".to_string()], vec![]]);
        let values = loader.run_pending().unwrap();
        assert_eq!(values, vec![Value::Number(1.0), Value::Number(2.0)]);
        assert_eq!(loader.defined().len(), 2);
        assert!(loader.run_pending().unwrap().is_empty());
    }

    #[test]
    fn test_failure_keeps_later_definitions_pending() {
        let loader = AmdRegistry::new();
        loader
            .define(Vec::new(), Box::new(|| Err(BundleError::module_not_found("1"))))
            .unwrap();
        loader.define(Vec::new(), Box::new(|| Ok(Value::Null))).unwrap();

        assert!(loader.run_pending().is_err());
        assert_eq!(loader.pending_len(), 1);
    }
}
