// /////////////////////////////////////////////////////////////////////////////
// Pipeliner
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Pipeline Identifier
//!
//! A type-safe wrapper around a random (v4) [`uuid::Uuid`]. This domain has
//! exactly one identified entity, so a newtype is enough to keep a
//! `PipelineId` from being confused with any other string or uuid value in a
//! function signature; it does not need the time-ordering or cross-entity
//! phantom-typing a multi-entity domain would justify.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PipelineId(Uuid);

impl PipelineId {
    /// Generates a new random pipeline identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for PipelineId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for PipelineId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for PipelineId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

impl From<Uuid> for PipelineId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl From<PipelineId> for Uuid {
    fn from(id: PipelineId) -> Self {
        id.0
    }
}
