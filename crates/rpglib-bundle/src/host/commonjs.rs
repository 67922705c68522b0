// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Host module system surface (`module.exports`)

use crate::bundle::Bundle;
use crate::error::Result;
use crate::host::{Exposure, ExposureKind, ExposureStrategy, HostContext};
use crate::value::{Object, Value};
use std::sync::Arc;
use tracing::debug;

/// The `exports` object and `module` container a module system hands a script
#[derive(Debug, Clone)]
pub struct CommonJsHost {
    exports: Object,
    module: Object,
}

impl CommonJsHost {
    /// Create a pair where `module.exports === exports`
    pub fn new() -> Self {
        let exports = Object::new();
        let module = Object::new();
        module.set("exports", exports.clone());
        Self { exports, module }
    }

    /// The initial `exports` object
    pub fn exports(&self) -> &Object {
        &self.exports
    }

    /// The `module` container
    pub fn module(&self) -> &Object {
        &self.module
    }

    /// Current `module.exports`
    pub fn module_exports(&self) -> Value {
        self.module.get("exports").unwrap_or_default()
    }
}

impl Default for CommonJsHost {
    fn default() -> Self {
        Self::new()
    }
}

/// Assigns the main exports to `module.exports`
pub struct ModuleSystemStrategy;

impl ExposureStrategy for ModuleSystemStrategy {
    fn name(&self) -> &'static str {
        "module-system"
    }

    fn detect(&self, host: &dyn HostContext) -> bool {
        host.module_system().is_some()
    }

    fn expose(&self, bundle: &Bundle, host: &dyn HostContext) -> Result<Exposure> {
        let package = Arc::new(bundle.instantiate_with(host.host_require())?);
        if let Some(cjs) = host.module_system() {
            cjs.module().set("exports", package.exports());
            debug!(package = bundle.name(), "Assigned module.exports");
        }

        Ok(Exposure {
            kind: ExposureKind::ModuleSystem,
            package: Some(package),
        })
    }
}
