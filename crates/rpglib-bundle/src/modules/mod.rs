// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! The RPGLib utility library
//!
//! Four modules sharing one library object: `core/core` creates it and the
//! others each require it through `../core/core`, attach a function and
//! re-export it. The packaged bundle resolves `[1, 3, 2, 4]` and exposes the
//! exports of `string/join`.

pub mod core;
pub mod div;
pub mod join;
pub mod sum;

use crate::bundle::Bundle;
use crate::error::{BundleError, Result};
use crate::manifest::{BundleManifest, ManifestModule};
use crate::module_system::{ModuleHandle, ModuleId, Require};
use crate::registry::FactoryRegistry;
use crate::value::{NativeFn, Value};
use std::collections::BTreeMap;

/// Factory name of the core module
pub const CORE: &str = "core/core";
/// Factory name of the division module
pub const DIV: &str = "math/div";
/// Factory name of the addition module
pub const SUM: &str = "math/sum";
/// Factory name of the concatenation module
pub const JOIN: &str = "string/join";

/// Literal the library modules use to reach the core
pub const CORE_SPECIFIER: &str = "../core/core";

/// Library version
pub const RPGLIB_VERSION: &str = "1.0.0";

/// Register every RPGLib factory
pub fn register_factories(registry: &mut FactoryRegistry) -> &mut FactoryRegistry {
    registry
        .register(CORE, self::core::factory)
        .register(DIV, div::factory)
        .register(SUM, sum::factory)
        .register(JOIN, join::factory)
}

/// A registry holding only the RPGLib factories
pub fn rpglib_factories() -> FactoryRegistry {
    let mut registry = FactoryRegistry::new();
    register_factories(&mut registry);
    registry
}

/// The manifest of the packaged library
pub fn rpglib_manifest() -> BundleManifest {
    let mut modules = BTreeMap::new();
    modules.insert(ModuleId::from("1"), ManifestModule::new(CORE));
    modules.insert(ModuleId::from("2"), ManifestModule::new(DIV).depends_on(CORE_SPECIFIER, "1"));
    modules.insert(ModuleId::from("3"), ManifestModule::new(SUM).depends_on(CORE_SPECIFIER, "1"));
    modules.insert(ModuleId::from("4"), ManifestModule::new(JOIN).depends_on(CORE_SPECIFIER, "1"));

    BundleManifest {
        name: "rpglib".to_string(),
        version: RPGLIB_VERSION.to_string(),
        global_name: Some("RPGLib".to_string()),
        modules,
        entries: vec!["1".into(), "3".into(), "2".into(), "4".into()],
        main: Some("4".into()),
    }
}

/// The packaged library, strictly assembled
pub fn rpglib_bundle() -> Result<Bundle> {
    Bundle::assemble(&rpglib_manifest(), &rpglib_factories(), true)
}

/// Require the shared library object, attach `func` as `name` and re-export it
fn extend_core(
    req: &mut Require<'_>,
    module: &ModuleHandle,
    name: &str,
    arity: i32,
    func: NativeFn,
) -> Result<()> {
    let library = req.require(CORE_SPECIFIER)?;
    let Some(object) = library.as_object() else {
        return Err(BundleError::factory(
            req.module_id(),
            format!("'{}' exported {}, not an object", CORE_SPECIFIER, library.type_of()),
        ));
    };
    object.set(name, Value::function(name, arity, func));
    module.set_exports(library.clone());
    Ok(())
}

/// Positional argument, `undefined` when missing
fn arg(args: &[Value], index: usize) -> Value {
    args.get(index).cloned().unwrap_or_default()
}
