// /////////////////////////////////////////////////////////////////////////////
// Pipeliner
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Pipeline Entity
//!
//! `Pipeline` is the single entity in this domain: a named, recurring
//! data-integration job. Its identity (`id`) never changes; its `status`,
//! `updated_at`, and `config.{last_run,next_run}` mutate over its lifecycle
//! as it is created, scheduled, run, and eventually deleted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::value_objects::{PipelineId, SourceConfig};

/// Lifecycle status of a pipeline. See the module docs for the state
/// machine the run executor drives this through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PipelineStatus {
    Inactive,
    Active,
    Failed,
}

/// Recurrence cadence used by the recurrence calculator to derive
/// `next_run`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunFrequency {
    Daily,
    Weekly,
    Monthly,
}

/// Ingestion strategy tag. Only `Simple` is required to be implemented;
/// `Ml` is a reserved no-op.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IngestStrategy {
    Simple,
    Ml,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub sources: Vec<SourceConfig>,
    pub strategy: IngestStrategy,
    pub run_frequency: RunFrequency,
    #[serde(default)]
    pub last_run: Option<DateTime<Utc>>,
    #[serde(default)]
    pub next_run: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pipeline {
    id: PipelineId,
    name: String,
    description: String,
    status: PipelineStatus,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    config: PipelineConfig,
}

impl Pipeline {
    /// Constructs a brand new pipeline: `INACTIVE`, no `last_run`, and
    /// `next_run` left to the caller (the pipeline service computes it
    /// immediately after construction, per the facade's `create` contract).
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        sources: Vec<SourceConfig>,
        strategy: IngestStrategy,
        run_frequency: RunFrequency,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: PipelineId::new(),
            name: name.into(),
            description: description.into(),
            status: PipelineStatus::Inactive,
            created_at: now,
            updated_at: now,
            config: PipelineConfig {
                sources,
                strategy,
                run_frequency,
                last_run: None,
                next_run: None,
            },
        }
    }

    /// Reconstructs a pipeline from stored state (store implementations use
    /// this; it performs no validation beyond what serde already did).
    #[allow(clippy::too_many_arguments)]
    pub fn from_parts(
        id: PipelineId,
        name: String,
        description: String,
        status: PipelineStatus,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
        config: PipelineConfig,
    ) -> Self {
        Self {
            id,
            name,
            description,
            status,
            created_at,
            updated_at,
            config,
        }
    }

    pub fn id(&self) -> PipelineId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn status(&self) -> PipelineStatus {
        self.status
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn is_active(&self) -> bool {
        self.status == PipelineStatus::Active
    }

    /// Overlays name/description/config from an update request, leaving
    /// identity, status, and timestamps untouched (the store sets
    /// `updated_at` on save).
    pub fn apply_update(
        &mut self,
        name: String,
        description: String,
        sources: Vec<SourceConfig>,
        strategy: IngestStrategy,
        run_frequency: RunFrequency,
    ) {
        self.name = name;
        self.description = description;
        self.config.sources = sources;
        self.config.strategy = strategy;
        self.config.run_frequency = run_frequency;
    }

    pub fn set_next_run(&mut self, next_run: Option<DateTime<Utc>>) {
        self.config.next_run = next_run;
    }

    /// Run executor step 3: the idempotence-guarded transition into
    /// `ACTIVE`.
    pub fn mark_active(&mut self, now: DateTime<Utc>) {
        self.status = PipelineStatus::Active;
        self.updated_at = now;
    }

    /// Run executor step 6, success path.
    pub fn mark_completed(&mut self, completed_at: DateTime<Utc>, next_run: Option<DateTime<Utc>>) {
        self.status = PipelineStatus::Inactive;
        self.config.last_run = Some(completed_at);
        self.config.next_run = next_run;
        self.updated_at = completed_at;
    }

    /// Run executor step 6, failure path: `last_run` is left untouched.
    pub fn mark_failed(&mut self, failed_at: DateTime<Utc>, next_run: Option<DateTime<Utc>>) {
        self.status = PipelineStatus::Failed;
        self.config.next_run = next_run;
        self.updated_at = failed_at;
    }

    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = now;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn now() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2025-05-12T12:30:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    #[test]
    fn new_pipeline_starts_inactive_with_no_run_history() {
        let p = Pipeline::new(
            "daily-feed",
            "desc",
            vec![],
            IngestStrategy::Simple,
            RunFrequency::Daily,
            now(),
        );
        assert_eq!(p.status(), PipelineStatus::Inactive);
        assert!(p.config().last_run.is_none());
        assert!(p.config().next_run.is_none());
    }

    #[test]
    fn mark_completed_sets_last_run_and_leaves_status_inactive() {
        let mut p = Pipeline::new(
            "x",
            "d",
            vec![],
            IngestStrategy::Simple,
            RunFrequency::Daily,
            now(),
        );
        p.mark_active(now());
        let completed = now() + chrono::Duration::seconds(5);
        p.mark_completed(completed, Some(completed + chrono::Duration::days(1)));
        assert_eq!(p.status(), PipelineStatus::Inactive);
        assert_eq!(p.config().last_run, Some(completed));
        assert!(p.config().next_run.unwrap() > p.config().last_run.unwrap());
    }

    #[test]
    fn mark_failed_leaves_last_run_unchanged() {
        let mut p = Pipeline::new(
            "x",
            "d",
            vec![],
            IngestStrategy::Simple,
            RunFrequency::Daily,
            now(),
        );
        p.mark_active(now());
        p.mark_completed(now(), Some(now() + chrono::Duration::days(1)));
        let prior_last_run = p.config().last_run;

        p.mark_active(now());
        p.mark_failed(now() + chrono::Duration::hours(1), None);
        assert_eq!(p.status(), PipelineStatus::Failed);
        assert_eq!(p.config().last_run, prior_last_run);
    }
}
