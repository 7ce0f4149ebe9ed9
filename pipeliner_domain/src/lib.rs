// /////////////////////////////////////////////////////////////////////////////
// Pipeliner
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Pipeline Domain
//!
//! The pipeline domain represents the core business logic and rules of the
//! data-integration pipeline runner. It implements Domain-Driven Design (DDD)
//! patterns and is completely independent of external concerns like
//! databases, HTTP, or the scheduler's timer loop.
//!
//! ## Module Structure
//!
//! - `entities` — `Pipeline`, the one entity this domain has identity for.
//! - `value_objects` — `PipelineId`, `SourceConfig`, `AdapterRecord`,
//!   `OutputData`, `RunLogEvent`.
//! - `repositories` — the `PipelineRepository` port implemented by
//!   infrastructure.
//! - `services` — the recurrence calculator, the one pure domain service.
//! - `error` — the error taxonomy shared by every layer above this one.
//!
//! ## Business Rules and Invariants
//!
//! - `status == ACTIVE` implies exactly one in-flight run for that pipeline.
//! - `next_run`, when present, is strictly in the future except immediately
//!   after a run completes, when equality with "now" is allowed.
//! - `last_run`, when present, never exceeds `updated_at`.

pub mod entities;
pub mod error;
pub mod repositories;
pub mod services;
pub mod value_objects;

pub use entities::{IngestStrategy, Pipeline, PipelineConfig, PipelineStatus, RunFrequency};
pub use error::{
    AdapterError, ConfigError, ExecutorError, PipelineRunnerError, SchedulerError, StoreError,
};
pub use repositories::PipelineRepository;
pub use services::calculate_next_run;
pub use value_objects::{
    AdapterRecord, ApiConfig, FileConfig, LogLevel, OutputData, PipelineId, RunLogEvent, ScrapeConfig,
    SourceConfig, SourceFormat,
};
