// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Global scope fallback

use crate::bundle::Bundle;
use crate::error::Result;
use crate::host::{Exposure, ExposureKind, ExposureStrategy, GlobalScope, HostContext};
use crate::value::Object;
use std::sync::Arc;
use tracing::debug;

/// Assigns the main exports to a fixed property of the best global scope
pub struct GlobalStrategy;

impl GlobalStrategy {
    fn locate(host: &dyn HostContext) -> (GlobalScope, &Object) {
        GlobalScope::SEARCH_ORDER
            .into_iter()
            .find_map(|scope| host.global_scope(scope).map(|object| (scope, object)))
            .unwrap_or((GlobalScope::This, host.this_scope()))
    }
}

impl ExposureStrategy for GlobalStrategy {
    fn name(&self) -> &'static str {
        "global"
    }

    // Every host has at least `this`
    fn detect(&self, _host: &dyn HostContext) -> bool {
        true
    }

    fn expose(&self, bundle: &Bundle, host: &dyn HostContext) -> Result<Exposure> {
        let (scope, target) = Self::locate(host);
        let package = Arc::new(bundle.instantiate_with(host.host_require())?);
        target.set(bundle.global_name(), package.exports());
        debug!(scope = %scope, property = bundle.global_name(), "Assigned global");

        Ok(Exposure {
            kind: ExposureKind::Global(scope),
            package: Some(package),
        })
    }
}
