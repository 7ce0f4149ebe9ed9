// /////////////////////////////////////////////////////////////////////////////
// Pipeliner
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Adapter Output Envelope
//!
//! [`AdapterRecord`] is the uniform shape every adapter emits regardless of
//! source kind; [`OutputData`] is what the ingestion orchestrator aggregates
//! them into for one pipeline run.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One record fetched from a source, tagged with where it came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdapterRecord {
    pub source: String,
    pub data: Map<String, Value>,
}

impl AdapterRecord {
    pub fn new(source: impl Into<String>, data: Map<String, Value>) -> Self {
        Self {
            source: source.into(),
            data,
        }
    }
}

/// Aggregated output of one ingestion run over a pipeline's sources.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OutputData {
    pub records: Vec<AdapterRecord>,
    #[serde(default)]
    pub unified: bool,
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

impl OutputData {
    pub fn empty_unified() -> Self {
        Self {
            records: Vec::new(),
            unified: true,
            metadata: Map::new(),
        }
    }
}
