// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! `core/core`: the shared library object

use crate::error::Result;
use crate::module_system::{ModuleHandle, Require};
use crate::value::{Object, Value};
use tracing::info;

/// Create the library object with `textWorking` and export it
pub fn factory(_req: &mut Require<'_>, module: &ModuleHandle, _exports: &Object) -> Result<()> {
    let library = Object::new();
    library.set("textWorking", Value::function("textWorking", 0, text_working));
    module.set_exports(library);
    Ok(())
}

/// `textWorking()`: log a liveness line and return 2
pub fn text_working(_args: &[Value]) -> Result<Value> {
    info!(target: "rpglib::console", "Working");
    Ok(Value::Number(2.0))
}
