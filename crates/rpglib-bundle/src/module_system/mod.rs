// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Module registration and resolution
//!
//! ## Module table
//! - Static `id -> (factory, dependency map)` description of a bundle
//! - Built once, read-only afterwards
//!
//! ## Resolver
//! - Lazy, synchronous `resolve(id)`
//! - Each factory runs at most once per instance cache
//! - Cyclic requires observe the partially populated exports
//! - Literals missing from a dependency map fall back to an external require

mod cache;
mod require;
mod resolver;
mod table;

pub use cache::{InstanceCache, ModuleHandle};
pub use require::Require;
pub use resolver::{ExternalRequire, Resolver};
pub use table::{Factory, ModuleId, ModuleRecord, ModuleTable, ModuleTableBuilder};
