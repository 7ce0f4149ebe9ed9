// /////////////////////////////////////////////////////////////////////////////
// Pipeliner
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Pipeline Repository Port
//!
//! `PipelineRepository` is the contract infrastructure must satisfy to
//! persist pipelines. The domain depends only on this trait, never on a
//! concrete storage technology.
//!
//! # Design Principles
//!
//! - **Async-first**: every operation is asynchronous to support non-blocking
//!   I/O without forcing the caller onto a particular runtime.
//! - **Deep copies across the boundary**: `save`/`get`/`get_all` move or
//!   clone owned [`Pipeline`] values; no reference escapes the repository, so
//!   callers cannot observe another caller's in-flight mutation.
//! - **Thread safety**: implementations must be `Send + Sync` to support
//!   concurrent access from the scheduler, the executor, and the facade at
//!   once.

use async_trait::async_trait;

use crate::entities::Pipeline;
use crate::error::StoreError;
use crate::value_objects::PipelineId;

#[async_trait]
pub trait PipelineRepository: Send + Sync {
    /// Upserts a pipeline. The caller is responsible for having set the
    /// timestamps it wants persisted; the repository stores the entity as
    /// given.
    async fn save(&self, pipeline: Pipeline) -> Result<(), StoreError>;

    /// Retrieves a pipeline by id, or `None` if it does not exist.
    async fn get(&self, id: PipelineId) -> Result<Option<Pipeline>, StoreError>;

    /// Retrieves every stored pipeline. Order is not significant.
    async fn get_all(&self) -> Result<Vec<Pipeline>, StoreError>;

    /// Deletes a pipeline by id. Returns `true` if a pipeline was removed,
    /// `false` if none existed with that id.
    async fn delete(&self, id: PipelineId) -> Result<bool, StoreError>;
}
