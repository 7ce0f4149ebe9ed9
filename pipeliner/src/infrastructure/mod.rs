// /////////////////////////////////////////////////////////////////////////////
// Pipeliner
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Infrastructure Layer
//!
//! Concrete implementations of the domain's ports: the three source
//! adapters, the in-memory repository, the scheduler, the per-run log bus,
//! process configuration, logging, and metrics. The run executor lives in
//! `application::pipeline_service`, folded into the facade rather than given
//! its own infrastructure module.

pub mod adapters;
pub mod config;
pub mod log_bus;
pub mod logging;
pub mod metrics;
pub mod repository;
pub mod scheduler;
