// /////////////////////////////////////////////////////////////////////////////
// Pipeliner
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Pipeliner
//!
//! Application and infrastructure layer for the pipeliner data-integration
//! runner. Composes the pure domain (`pipeliner_domain`) with concrete
//! adapters, an in-memory store, a recurrence-driven scheduler, and a
//! per-run log bus.
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────┐
//! │                Application Layer                │
//! │  PipelineService facade, ingestion orchestrator  │
//! └───────────────────────────────────────────────┘
//!                         │
//! ┌───────────────────────────────────────────────┐
//! │              Infrastructure Layer                │
//! │  adapters, InMemoryPipelineRepository,           │
//! │  scheduler, run executor, log bus, metrics       │
//! └───────────────────────────────────────────────┘
//!                         │
//! ┌───────────────────────────────────────────────┐
//! │                 Domain Layer                     │
//! │          (pipeliner_domain, no I/O)              │
//! └───────────────────────────────────────────────┘
//! ```
//!
//! The bootstrap crate (`pipeliner_bootstrap`) sits outside this crate and
//! owns process entry, CLI parsing, and shutdown coordination; it
//! constructs the graph this crate provides.

pub mod application;
pub mod infrastructure;

// Tests are organized as:
// - Unit tests: #[cfg(test)] modules within each source file
// - Integration tests: separate files in tests/ directory

pub use pipeliner_domain::{
    AdapterError, ConfigError, ExecutorError, IngestStrategy, Pipeline, PipelineId, PipelineRepository,
    PipelineRunnerError, PipelineStatus, RunFrequency, ScrapeConfig, SchedulerError, SourceConfig, StoreError,
};

pub use application::{PipelineService, SchedulerHandle};
pub use infrastructure::adapters::{ScrapeBackend, ScrapeExtraction};
pub use infrastructure::config::{AppConfig, AppConfigError};
pub use infrastructure::log_bus::LogBus;
pub use infrastructure::logging as observability;
pub use infrastructure::metrics::MetricsService;
pub use infrastructure::repository::InMemoryPipelineRepository;
pub use infrastructure::scheduler::{Scheduler, SchedulerConfig};
