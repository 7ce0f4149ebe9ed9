// /////////////////////////////////////////////////////////////////////////////
// Pipeliner
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Run Log Event
//!
//! Ephemeral, never persisted by the core: the shape the per-run log bus
//! routes to subscribers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::value_objects::PipelineId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunLogEvent {
    pub pipeline_id: PipelineId,
    pub level: LogLevel,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub tags: HashMap<String, String>,
}

impl RunLogEvent {
    pub fn new(pipeline_id: PipelineId, level: LogLevel, message: impl Into<String>) -> Self {
        Self {
            pipeline_id,
            level,
            message: message.into(),
            timestamp: Utc::now(),
            tags: HashMap::new(),
        }
    }
}
