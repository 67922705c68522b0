// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Error types for the bundle runtime

use crate::module_system::ModuleId;
use thiserror::Error;

/// Result type for bundle runtime operations
pub type Result<T> = std::result::Result<T, BundleError>;

/// Errors that can occur while assembling, loading or running a bundle
#[derive(Debug, Error)]
pub enum BundleError {
    /// A requested id has no entry in the module table
    #[error("Cannot find module '{0}'")]
    ModuleNotFound(ModuleId),

    /// A literal require string is neither a declared dependency nor a host module
    #[error("Cannot find module '{specifier}' (required from module '{requested_by}')")]
    HostModuleNotFound {
        /// The literal string passed to require
        specifier: String,
        /// The module whose factory issued the require
        requested_by: ModuleId,
    },

    /// A dependency edge points at an id missing from the table
    #[error("Module '{module}' maps '{specifier}' to missing module '{target}'")]
    DanglingDependency {
        /// Module declaring the edge
        module: ModuleId,
        /// Literal require string of the edge
        specifier: String,
        /// Missing target id
        target: ModuleId,
    },

    /// A manifest names a factory the registry does not know
    #[error("No factory registered under '{0}'")]
    UnknownFactory(String),

    /// Structurally invalid bundle manifest
    #[error("Invalid bundle manifest: {0}")]
    InvalidManifest(String),

    /// A module body failed while executing
    #[error("Error in module '{module}': {reason}")]
    Factory {
        /// Module whose factory failed
        module: ModuleId,
        /// Reason for failure
        reason: String,
    },

    /// No exposure strategy accepted the host context
    #[error("No host surface available for package '{0}'")]
    NoHostSurface(String),

    /// Unknown host kind name
    #[error("Unknown host '{0}' (expected node, amd, browser, worker or bare)")]
    UnknownHost(String),

    /// Type error (wrong value type)
    #[error("TypeError: {0}")]
    TypeError(String),

    /// File system error
    #[error("File system error: {0}")]
    Fs(#[from] std::io::Error),

    /// JSON parsing error
    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// Config file parsing error
    #[error("Config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),
}

impl BundleError {
    /// Create a module not found error
    pub fn module_not_found(id: impl Into<ModuleId>) -> Self {
        Self::ModuleNotFound(id.into())
    }

    /// Create a new TypeError
    pub fn type_error(msg: impl Into<String>) -> Self {
        Self::TypeError(msg.into())
    }

    /// Create a factory failure for `module`
    pub fn factory(module: impl Into<ModuleId>, reason: impl Into<String>) -> Self {
        Self::Factory {
            module: module.into(),
            reason: reason.into(),
        }
    }

    /// Machine-readable error code, mirroring the codes a JavaScript host would see
    pub fn code(&self) -> &'static str {
        match self {
            Self::ModuleNotFound(_) | Self::HostModuleNotFound { .. } => "MODULE_NOT_FOUND",
            Self::DanglingDependency { .. } => "DANGLING_DEPENDENCY",
            Self::UnknownFactory(_) | Self::InvalidManifest(_) => "INVALID_BUNDLE",
            Self::TypeError(_) => "ERR_INVALID_ARG_TYPE",
            Self::ConfigParse(_) => "ERR_CONFIG",
            _ => "ERR_BUNDLE",
        }
    }

    /// Whether this error means some module could not be located
    pub fn is_not_found(&self) -> bool {
        self.code() == "MODULE_NOT_FOUND"
    }
}
