// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Host environments and how a bundle exposes itself to them
//!
//! Detection runs once per load, first match wins:
//! - host module system (`exports` + `module`) - `module.exports = main`
//! - anonymous module loader (`define`) - deferred registration, no dependencies
//! - global scope (`window`, `global`, `self`, then `this`) - `scope[global_name] = main`

mod amd;
mod commonjs;
mod global;

pub use amd::{AmdRegistry, AnonymousLoader, AnonymousLoaderStrategy, DeferredFactory};
pub use commonjs::{CommonJsHost, ModuleSystemStrategy};
pub use global::GlobalStrategy;

use crate::bundle::Bundle;
use crate::error::{BundleError, Result};
use crate::module_system::ExternalRequire;
use crate::package::Package;
use crate::value::{Object, Value};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tracing::info;

/// Global scope candidates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GlobalScope {
    /// Browser window
    Window,
    /// Server-side global object
    Global,
    /// Worker scope
    SelfScope,
    /// The loader's own `this`
    This,
}

impl GlobalScope {
    /// Named scopes in the order they are probed; `This` is the fallback
    pub const SEARCH_ORDER: [GlobalScope; 3] =
        [GlobalScope::Window, GlobalScope::Global, GlobalScope::SelfScope];

    /// Name of the scope as a host spells it
    pub fn name(&self) -> &'static str {
        match self {
            GlobalScope::Window => "window",
            GlobalScope::Global => "global",
            GlobalScope::SelfScope => "self",
            GlobalScope::This => "this",
        }
    }
}

impl fmt::Display for GlobalScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Capabilities a host offers a loading bundle
pub trait HostContext {
    /// A CommonJS-style `exports`/`module` pair, if present
    fn module_system(&self) -> Option<&CommonJsHost>;

    /// An AMD-style `define`, if present
    fn anonymous_loader(&self) -> Option<&dyn AnonymousLoader>;

    /// A named global scope, if present
    fn global_scope(&self, scope: GlobalScope) -> Option<&Object>;

    /// The scope the loader runs in; always present
    fn this_scope(&self) -> &Object;

    /// The host's own require, consulted for undeclared literals
    fn host_require(&self) -> Option<Arc<dyn ExternalRequire>> {
        None
    }
}

/// One way of exposing a bundle to a host
pub trait ExposureStrategy: Send + Sync {
    /// Short name for logs
    fn name(&self) -> &'static str;

    /// Whether the host offers this strategy's surface
    fn detect(&self, host: &dyn HostContext) -> bool;

    /// Load and expose the bundle
    fn expose(&self, bundle: &Bundle, host: &dyn HostContext) -> Result<Exposure>;
}

/// Where a bundle ended up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExposureKind {
    /// Assigned to `module.exports`
    ModuleSystem,
    /// Registered with an anonymous loader, not yet instantiated
    AnonymousLoader,
    /// Assigned to a property of a global scope
    Global(GlobalScope),
}

/// Outcome of exposing a bundle
#[derive(Debug)]
pub struct Exposure {
    /// Chosen surface
    pub kind: ExposureKind,
    /// The loaded package, unless instantiation was deferred
    pub package: Option<Arc<Package>>,
}

/// Picks the first strategy whose surface the host offers
pub struct EnvironmentAdapter {
    strategies: Vec<Box<dyn ExposureStrategy>>,
}

impl EnvironmentAdapter {
    /// Adapter with strategies in the given priority order
    pub fn new(strategies: Vec<Box<dyn ExposureStrategy>>) -> Self {
        Self { strategies }
    }

    /// The strategy that would be used for `host`
    pub fn detect(&self, host: &dyn HostContext) -> Option<&dyn ExposureStrategy> {
        self.strategies
            .iter()
            .find(|strategy| strategy.detect(host))
            .map(|strategy| strategy.as_ref())
    }

    /// Load `bundle` into `host`
    pub fn load(&self, bundle: &Bundle, host: &dyn HostContext) -> Result<Exposure> {
        let strategy = self
            .detect(host)
            .ok_or_else(|| BundleError::NoHostSurface(bundle.name().to_string()))?;

        info!(strategy = strategy.name(), package = bundle.name(), "Exposing bundle");
        strategy.expose(bundle, host)
    }
}

impl Default for EnvironmentAdapter {
    fn default() -> Self {
        Self::new(vec![
            Box::new(ModuleSystemStrategy),
            Box::new(AnonymousLoaderStrategy),
            Box::new(GlobalStrategy),
        ])
    }
}

/// Host-provided modules keyed by name
#[derive(Debug, Clone, Default)]
pub struct HostModules {
    modules: FxHashMap<String, Value>,
}

impl HostModules {
    /// Create an empty set
    pub fn new() -> Self {
        Self::default()
    }

    /// Provide a module
    pub fn insert(mut self, name: impl Into<String>, exports: impl Into<Value>) -> Self {
        self.modules.insert(name.into(), exports.into());
        self
    }
}

impl ExternalRequire for HostModules {
    fn load(&self, specifier: &str) -> Result<Option<Value>> {
        Ok(self.modules.get(specifier).cloned())
    }
}

/// Preset host shapes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HostKind {
    /// Module system plus a `global` scope
    Node,
    /// Anonymous loader plus a `window`
    Amd,
    /// `window` only
    #[default]
    Browser,
    /// `self` only
    Worker,
    /// Nothing but `this`
    Bare,
}

impl HostKind {
    /// All presets
    pub const ALL: [HostKind; 5] = [
        HostKind::Node,
        HostKind::Amd,
        HostKind::Browser,
        HostKind::Worker,
        HostKind::Bare,
    ];

    /// Preset name
    pub fn name(&self) -> &'static str {
        match self {
            HostKind::Node => "node",
            HostKind::Amd => "amd",
            HostKind::Browser => "browser",
            HostKind::Worker => "worker",
            HostKind::Bare => "bare",
        }
    }
}

impl fmt::Display for HostKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for HostKind {
    type Err = BundleError;

    fn from_str(s: &str) -> Result<Self> {
        HostKind::ALL
            .into_iter()
            .find(|kind| kind.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| BundleError::UnknownHost(s.to_string()))
    }
}

/// A simulated host with configurable capabilities
#[derive(Default)]
pub struct HostEnvironment {
    module_system: Option<CommonJsHost>,
    loader: Option<AmdRegistry>,
    window: Option<Object>,
    global: Option<Object>,
    self_scope: Option<Object>,
    this: Object,
    require: Option<Arc<dyn ExternalRequire>>,
}

impl HostEnvironment {
    /// A host offering nothing but `this`
    pub fn bare() -> Self {
        Self::default()
    }

    /// A host shaped like `kind`
    pub fn for_kind(kind: HostKind) -> Self {
        let host = Self::bare();
        match kind {
            HostKind::Node => host
                .with_module_system()
                .with_scope(GlobalScope::Global, Object::new()),
            HostKind::Amd => host
                .with_anonymous_loader()
                .with_scope(GlobalScope::Window, Object::new()),
            HostKind::Browser => host.with_scope(GlobalScope::Window, Object::new()),
            HostKind::Worker => host.with_scope(GlobalScope::SelfScope, Object::new()),
            HostKind::Bare => host,
        }
    }

    /// Offer a CommonJS module system
    pub fn with_module_system(mut self) -> Self {
        self.module_system = Some(CommonJsHost::new());
        self
    }

    /// Offer an anonymous module loader
    pub fn with_anonymous_loader(mut self) -> Self {
        self.loader = Some(AmdRegistry::new());
        self
    }

    /// Offer a global scope object
    pub fn with_scope(mut self, scope: GlobalScope, object: Object) -> Self {
        match scope {
            GlobalScope::Window => self.window = Some(object),
            GlobalScope::Global => self.global = Some(object),
            GlobalScope::SelfScope => self.self_scope = Some(object),
            GlobalScope::This => self.this = object,
        }
        self
    }

    /// Offer a host require
    pub fn with_require(mut self, require: Arc<dyn ExternalRequire>) -> Self {
        self.require = Some(require);
        self
    }

    /// The CommonJS pair, if offered
    pub fn commonjs(&self) -> Option<&CommonJsHost> {
        self.module_system.as_ref()
    }

    /// The anonymous loader, if offered
    pub fn amd(&self) -> Option<&AmdRegistry> {
        self.loader.as_ref()
    }

    /// Fetch the main exports back from wherever `exposure` put them.
    ///
    /// For a deferred registration this runs the loader's pending factories.
    pub fn exposed_exports(&self, exposure: &Exposure, global_name: &str) -> Result<Value> {
        let missing = || BundleError::NoHostSurface(global_name.to_string());
        match exposure.kind {
            ExposureKind::ModuleSystem => Ok(self.commonjs().ok_or_else(missing)?.module_exports()),
            ExposureKind::AnonymousLoader => {
                let loader = self.amd().ok_or_else(missing)?;
                loader.run_pending()?;
                loader.defined().pop().ok_or_else(missing)
            }
            ExposureKind::Global(scope) => self
                .global_scope(scope)
                .and_then(|object| object.get(global_name))
                .ok_or_else(missing),
        }
    }
}

impl HostContext for HostEnvironment {
    fn module_system(&self) -> Option<&CommonJsHost> {
        self.module_system.as_ref()
    }

    fn anonymous_loader(&self) -> Option<&dyn AnonymousLoader> {
        self.loader.as_ref().map(|loader| loader as &dyn AnonymousLoader)
    }

    fn global_scope(&self, scope: GlobalScope) -> Option<&Object> {
        match scope {
            GlobalScope::Window => self.window.as_ref(),
            GlobalScope::Global => self.global.as_ref(),
            GlobalScope::SelfScope => self.self_scope.as_ref(),
            GlobalScope::This => Some(&self.this),
        }
    }

    fn this_scope(&self) -> &Object {
        &self.this
    }

    fn host_require(&self) -> Option<Arc<dyn ExternalRequire>> {
        self.require.clone()
    }
}
