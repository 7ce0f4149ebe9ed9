// /////////////////////////////////////////////////////////////////////////////
// Pipeliner
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Application Configuration
//!
//! Bootstrap-side entry point for configuration loading. Delegates the
//! actual defaults/file/environment layering to
//! [`pipeliner::AppConfig::load`]; this module exists so the composition
//! root has a single, bootstrap-owned name to call rather than reaching into
//! the `pipeliner` crate's infrastructure module directly.

use std::path::Path;

pub use pipeliner::{AppConfig, AppConfigError};

/// Loads the application configuration for a single process invocation.
pub fn load(config_path: Option<&Path>) -> Result<AppConfig, AppConfigError> {
    AppConfig::load(config_path)
}
