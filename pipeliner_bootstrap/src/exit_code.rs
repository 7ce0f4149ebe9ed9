// /////////////////////////////////////////////////////////////////////////////
// Pipeliner
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Exit Codes
//!
//! Maps the top-level `Result` the binary returns onto a small process exit
//! code enumeration, in the BSD `sysexits.h` idiom the reference bootstrap
//! follows: a clean success code, a distinct code for configuration/usage
//! problems (caught before anything ran), and a generic failure code for
//! everything that went wrong at runtime.

use std::process::ExitCode as StdExitCode;

use crate::runtime::BootstrapError;

/// Process exit status. `Success` and `Config` mirror `sysexits.h`'s `EX_OK`
/// and `EX_CONFIG`; `Runtime` collapses every other failure, since the
/// reference bootstrap does not expose a finer-grained mapping than that for
/// this binary's callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    Success,
    Config,
    Runtime,
}

impl ExitCode {
    fn code(self) -> u8 {
        match self {
            ExitCode::Success => 0,
            ExitCode::Config => 78,
            ExitCode::Runtime => 1,
        }
    }
}

impl From<ExitCode> for StdExitCode {
    fn from(value: ExitCode) -> Self {
        StdExitCode::from(value.code())
    }
}

/// Classifies a [`BootstrapError`] into an [`ExitCode`]. CLI parsing and
/// configuration-load failures are usage/config errors; everything that
/// reached the pipeline service or the adapters is a runtime error.
pub fn map_error_to_exit_code(err: &BootstrapError) -> ExitCode {
    match err {
        BootstrapError::Cli(_) | BootstrapError::Config(_) => ExitCode::Config,
        BootstrapError::Runner(_) | BootstrapError::Metrics(_) => ExitCode::Runtime,
    }
}

/// Converts a command's outcome into the process exit code, logging the
/// error (if any) on the way out.
pub fn result_to_exit_code<T>(result: Result<T, BootstrapError>) -> StdExitCode {
    match result {
        Ok(_) => ExitCode::Success.into(),
        Err(err) => {
            tracing::error!(error = %err, "pipeliner exited with an error");
            map_error_to_exit_code(&err).into()
        }
    }
}
