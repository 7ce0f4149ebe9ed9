// /////////////////////////////////////////////////////////////////////////////
// Pipeliner
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Process entry point: parse and validate CLI arguments, load
//! configuration, install the global `tracing` subscriber, then dispatch
//! the chosen command against a freshly wired object graph.

use std::process::ExitCode;
use std::sync::Arc;

use pipeliner::LogBus;
use pipeliner_bootstrap::{bootstrap_cli, config, result_to_exit_code, run_command, ExitCode as AppExitCode};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = match bootstrap_cli() {
        Ok(cli) => cli,
        Err(err) => {
            eprintln!("{err}");
            return AppExitCode::Config.into();
        }
    };

    let app_config = match config::load(cli.config.as_deref()) {
        Ok(app_config) => app_config,
        Err(err) => {
            eprintln!("{err}");
            return AppExitCode::Config.into();
        }
    };

    let log_bus = Arc::new(LogBus::new(app_config.log_queue_max_size));
    pipeliner::observability::init(&app_config.log_level, Arc::clone(&log_bus));

    result_to_exit_code(run_command(cli, app_config, log_bus).await)
}
