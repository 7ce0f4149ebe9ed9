// /////////////////////////////////////////////////////////////////////////////
// Pipeliner
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Signal Handling
//!
//! Waits for the signals the reference bootstrap treats as shutdown or
//! reload hints: `SIGTERM` and `SIGINT` both initiate graceful shutdown,
//! `SIGHUP` is a log-level-reload hint. On platforms without POSIX signals
//! only `Ctrl+C` is observable, which is treated the same as `SIGTERM`.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownReason {
    Terminate,
    Interrupt,
    ReloadRequested,
}

/// Resolves once a shutdown-worthy signal arrives. `ReloadRequested`
/// (`SIGHUP`) is reported but does not end the wait; callers that want to
/// act on it should re-call this function in a loop.
#[cfg(unix)]
pub async fn wait_for_shutdown_signal() -> ShutdownReason {
    use tokio::signal::unix::{signal, SignalKind};

    let mut term = signal(SignalKind::terminate()).expect("failed to install SIGTERM handler");
    let mut int = signal(SignalKind::interrupt()).expect("failed to install SIGINT handler");
    let mut hup = signal(SignalKind::hangup()).expect("failed to install SIGHUP handler");

    loop {
        tokio::select! {
            _ = term.recv() => return ShutdownReason::Terminate,
            _ = int.recv() => return ShutdownReason::Interrupt,
            _ = hup.recv() => {
                tracing::info!("received SIGHUP, treating as a log-level reload hint");
                return ShutdownReason::ReloadRequested;
            }
        }
    }
}

#[cfg(not(unix))]
pub async fn wait_for_shutdown_signal() -> ShutdownReason {
    let _ = tokio::signal::ctrl_c().await;
    ShutdownReason::Interrupt
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reload_requested_is_distinct_from_terminate() {
        assert_ne!(ShutdownReason::ReloadRequested, ShutdownReason::Terminate);
    }
}
