// /////////////////////////////////////////////////////////////////////////////
// Pipeliner
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Entities: objects with identity that persists through state changes.

mod pipeline;

pub use pipeline::{IngestStrategy, Pipeline, PipelineConfig, PipelineStatus, RunFrequency};
