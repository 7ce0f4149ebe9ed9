// /////////////////////////////////////////////////////////////////////////////
// Pipeliner
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

// Production code safety enforced via CI and `make lint-strict`
// (lib/bins checked separately from tests - tests may use unwrap/expect)

//! # Bootstrap Module
//!
//! The bootstrap crate sits **outside** the enterprise application layers
//! (domain, application, infrastructure) and provides:
//!
//! - **Entry point** - application lifecycle management
//! - **Signal handling** - graceful shutdown (`SIGTERM`, `SIGINT`, `SIGHUP`)
//! - **Argument parsing** - secure CLI argument validation
//! - **Composition root** - wiring the `pipeliner` crate's object graph
//! - **Exit codes** - process exit code mapping
//!
//! ## Architecture Position
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │          BOOTSTRAP (This Crate)             │
//! │  - Entry Point                              │
//! │  - Composition Root                         │
//! │  - Signal Handling                          │
//! │  - Secure Arg Parsing                       │
//! └─────────────────────────────────────────────┘
//!                      │
//!                      ▼
//! ┌─────────────────────────────────────────────┐
//! │         PIPELINER (application +            │
//! │         infrastructure layers)              │
//! └─────────────────────────────────────────────┘
//!                      │
//!                      ▼
//! ┌─────────────────────────────────────────────┐
//! │           PIPELINER_DOMAIN                  │
//! │  - Business Logic                           │
//! │  - Domain Services                          │
//! │  - Entities & Value Objects                 │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Key Design Principles
//!
//! 1. **Separation from enterprise layers** - bootstrap can reach into every
//!    layer below it; nothing below reaches back up.
//! 2. **Graceful shutdown** - signal handlers stop the scheduler, which
//!    joins every in-flight pipeline run before the log bus is closed.
//! 3. **Security first** - every CLI argument passes a validation pass
//!    before use.
//! 4. **Testability** - the composition root and CLI validation are plain
//!    functions, exercised directly in unit tests.

pub mod cli;
pub mod config;
pub mod exit_code;
pub mod runtime;
pub mod shutdown;
pub mod signals;

pub use cli::{parse_and_validate, ValidatedCli, ValidatedCommand};
pub use exit_code::{map_error_to_exit_code, result_to_exit_code, ExitCode};
pub use runtime::{run_command, AppContext, BootstrapError};

/// Parses and validates `argv`. Clap handles `--help`/`--version` itself and
/// exits the process before this returns in those cases.
pub fn bootstrap_cli() -> Result<ValidatedCli, cli::ParseError> {
    cli::parse_and_validate()
}
