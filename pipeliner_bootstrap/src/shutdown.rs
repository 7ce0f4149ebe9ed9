// /////////////////////////////////////////////////////////////////////////////
// Pipeliner
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Shutdown Coordination
//!
//! A thin, atomic-flag state marker around the signal-to-quiescence window:
//! [`ShutdownCoordinator::initiate_shutdown`] logs the start of the window
//! and flips `is_shutting_down`, [`ShutdownCoordinator::complete_shutdown`]
//! logs its end. The actual waiting — joining every in-flight pipeline run
//! and closing the log bus's subscribers — is owned by
//! [`pipeliner::Scheduler::run`] and [`pipeliner::LogBus::close`]
//! respectively, since those are the components that know what "in flight"
//! means; this coordinator only brackets that work for the log.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Tracks whether the process has begun shutting down. Cheaply clonable and
/// shareable across the handful of call sites (signal handler, composition
/// root) that need to observe or flip it.
#[derive(Clone, Default)]
pub struct ShutdownCoordinator {
    shutdown_initiated: Arc<AtomicBool>,
}

impl ShutdownCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether shutdown has been initiated.
    pub fn is_shutting_down(&self) -> bool {
        self.shutdown_initiated.load(Ordering::SeqCst)
    }

    /// Marks shutdown as initiated. Idempotent: only the first call logs.
    pub fn initiate_shutdown(&self) {
        if self
            .shutdown_initiated
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
        {
            tracing::info!("initiating graceful shutdown");
        }
    }

    /// Marks shutdown as complete, once every in-flight run has joined and
    /// the log bus has been closed.
    pub fn complete_shutdown(&self) {
        tracing::info!("graceful shutdown complete");
    }
}
