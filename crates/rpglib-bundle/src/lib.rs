// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! # rpglib-bundle
//!
//! A self-contained module registry and lazy resolver, plus the RPGLib
//! utility library packaged through it.
//!
//! A bundle is a module table (`id -> [factory, {literal: id}]`), an ordered
//! list of entry points and a main entry. Loading a bundle:
//!
//! - resolves every entry in order with a fresh instance cache
//! - runs each factory at most once, registering its exports before the
//!   factory body runs so cyclic requires see partial exports
//! - exposes the main exports through the first surface the host offers:
//!   `module.exports`, an anonymous `define`, or a global property
//!
//! ## Quick Start
//!
//! ```rust
//! use rpglib_bundle::{modules, EnvironmentAdapter, HostEnvironment, HostKind, Value};
//!
//! let bundle = modules::rpglib_bundle().unwrap();
//! let host = HostEnvironment::for_kind(HostKind::Node);
//!
//! let exposure = EnvironmentAdapter::default().load(&bundle, &host).unwrap();
//! let rpglib = host.exposed_exports(&exposure, bundle.global_name()).unwrap();
//!
//! let five = rpglib.get("div").call(&[Value::from(10.0), Value::from(2.0)]).unwrap();
//! assert_eq!(five, Value::Number(5.0));
//! ```
//!
//! ## Custom tables
//!
//! ```rust
//! use rpglib_bundle::{module_table, Bundle};
//!
//! let table = module_table! {
//!     "1" => [|_, _, exports| { exports.set("value", 2.0 + 3.0); Ok(()) }, {}],
//! };
//! let package = Bundle::new(table, vec!["1".into()]).unwrap().instantiate().unwrap();
//! assert_eq!(package.exports().get("value").to_number(), 5.0);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod bundle;
pub mod config;
pub mod error;
pub mod host;
pub mod manifest;
pub mod module_system;
pub mod modules;
pub mod package;
pub mod registry;
pub mod value;

// Re-exports
pub use bundle::Bundle;
pub use config::LoaderConfig;
pub use error::{BundleError, Result};
pub use host::{
    EnvironmentAdapter, Exposure, ExposureKind, ExposureStrategy, GlobalScope, HostContext,
    HostEnvironment, HostKind, HostModules,
};
pub use manifest::{BundleManifest, ManifestModule, DEFAULT_GLOBAL_NAME};
pub use module_system::{ExternalRequire, ModuleId, ModuleRecord, ModuleTable, Resolver};
pub use package::Package;
pub use registry::FactoryRegistry;
pub use value::{Object, Value};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
