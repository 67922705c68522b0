// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! The `require` handed to a running factory

use crate::error::Result;
use crate::module_system::resolver::Resolver;
use crate::module_system::table::{ModuleId, ModuleRecord};
use crate::value::Value;

/// Local `require` scoped to one module's dependency map
pub struct Require<'a> {
    resolver: &'a mut Resolver,
    record: &'a ModuleRecord,
}

impl<'a> Require<'a> {
    pub(crate) fn new(resolver: &'a mut Resolver, record: &'a ModuleRecord) -> Self {
        Self { resolver, record }
    }

    /// require() - resolve a literal dependency string to its exports
    pub fn require(&mut self, specifier: &str) -> Result<Value> {
        let record = self.record;
        match record.dependency(specifier) {
            Some(target) => self.resolver.resolve_from(target.as_str(), Some(record.id())),
            None => self.resolver.require_external(specifier, record.id()),
        }
    }

    /// require.resolve() - the target id without loading
    pub fn resolve(&self, specifier: &str) -> Option<&ModuleId> {
        self.record.dependency(specifier)
    }

    /// Id of the module this require belongs to
    pub fn module_id(&self) -> &ModuleId {
        self.record.id()
    }
}
