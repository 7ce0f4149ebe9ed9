// /////////////////////////////////////////////////////////////////////////////
// Pipeliner
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Pipeline Service
//!
//! The facade that composes the store, the recurrence calculator, the
//! scheduler, and the run executor into the operations external callers use:
//! `create`, `update`, `delete`, `get`, `list`, `run_now`, `get_latest_results`.
//! It also owns the run executor itself (`run`), since the reference
//! architecture folds the executor into the service rather than giving it a
//! standalone component.
//!
//! The service is constructed before the scheduler exists; [`SchedulerHandle`]
//! is injected afterward through [`PipelineService::set_scheduler`] to break
//! the cyclic dependency (the scheduler needs to call back into the service
//! to run a pipeline, and the service needs to notify the scheduler of new
//! or changed schedules).

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use once_cell::sync::OnceCell;
use tokio::sync::{mpsc, Mutex, RwLock};
use uuid::Uuid;

use pipeliner_domain::{
    calculate_next_run, IngestStrategy, OutputData, Pipeline, PipelineId, PipelineRepository,
    PipelineRunnerError, RunFrequency, RunLogEvent, SchedulerError, SourceConfig, StoreError,
};

use crate::application::ingestion;
use crate::infrastructure::adapters::ScrapeBackend;
use crate::infrastructure::log_bus::{self, LogBus};
use crate::infrastructure::metrics::MetricsService;

/// What the service needs from the scheduler: schedule/unschedule a
/// recurring entry and accept a manual trigger. Implemented by
/// [`crate::infrastructure::scheduler::Scheduler`].
#[async_trait]
pub trait SchedulerHandle: Send + Sync {
    async fn schedule(&self, id: PipelineId, fire_at: DateTime<Utc>);
    async fn unschedule(&self, id: PipelineId);
    async fn trigger_manual(&self, id: PipelineId) -> Result<(), SchedulerError>;
}

pub struct PipelineService {
    repository: Arc<dyn PipelineRepository>,
    log_bus: Arc<LogBus>,
    scrape_backend: Arc<dyn ScrapeBackend>,
    metrics: Arc<MetricsService>,
    scheduler: OnceCell<Arc<dyn SchedulerHandle>>,
    latest_results: RwLock<HashMap<Uuid, OutputData>>,
    /// Pipeline ids with a run currently executing, guarding the
    /// `INACTIVE -> ACTIVE` transition atomically so two dispatches racing
    /// on the same id (e.g. a recurring fire and a manual trigger in the
    /// same scheduler tick) can't both pass the `is_active` check before
    /// either persists `ACTIVE`.
    in_flight: Mutex<HashSet<Uuid>>,
}

impl PipelineService {
    pub fn new(
        repository: Arc<dyn PipelineRepository>,
        log_bus: Arc<LogBus>,
        scrape_backend: Arc<dyn ScrapeBackend>,
        metrics: Arc<MetricsService>,
    ) -> Self {
        Self {
            repository,
            log_bus,
            scrape_backend,
            metrics,
            scheduler: OnceCell::new(),
            latest_results: RwLock::new(HashMap::new()),
            in_flight: Mutex::new(HashSet::new()),
        }
    }

    /// One-time setter, called by the composition root once the scheduler
    /// has been constructed with an `Arc` to this same service.
    pub fn set_scheduler(&self, scheduler: Arc<dyn SchedulerHandle>) {
        let _ = self.scheduler.set(scheduler);
    }

    fn scheduler(&self) -> &Arc<dyn SchedulerHandle> {
        self.scheduler.get().expect("scheduler handle not wired during composition")
    }

    #[cfg(test)]
    pub fn repository_for_test(&self) -> Arc<dyn PipelineRepository> {
        Arc::clone(&self.repository)
    }

    pub async fn subscribe_logs(&self, id: PipelineId) -> mpsc::Receiver<RunLogEvent> {
        self.log_bus.subscribe(id).await
    }

    #[tracing::instrument(skip(self, sources))]
    pub async fn create(
        &self,
        name: String,
        description: String,
        sources: Vec<SourceConfig>,
        strategy: IngestStrategy,
        run_frequency: RunFrequency,
    ) -> Result<Pipeline, PipelineRunnerError> {
        for source in &sources {
            source.validate()?;
        }

        let now = Utc::now();
        let mut pipeline = Pipeline::new(name, description, sources, strategy, run_frequency, now);
        let next_run = calculate_next_run(run_frequency, None, now);
        pipeline.set_next_run(Some(next_run));

        self.repository.save(pipeline.clone()).await?;
        self.scheduler().schedule(pipeline.id(), next_run).await;
        self.metrics.record_pipeline_scheduled();

        Ok(pipeline)
    }

    #[tracing::instrument(skip(self, sources))]
    pub async fn update(
        &self,
        id: PipelineId,
        name: String,
        description: String,
        sources: Vec<SourceConfig>,
        strategy: IngestStrategy,
        run_frequency: RunFrequency,
    ) -> Result<Pipeline, PipelineRunnerError> {
        for source in &sources {
            source.validate()?;
        }

        let mut pipeline = self
            .repository
            .get(id)
            .await?
            .ok_or(StoreError::NotFound(id.as_uuid()))?;

        let frequency_changed = pipeline.config().run_frequency != run_frequency;
        let last_run = pipeline.config().last_run;
        pipeline.apply_update(name, description, sources, strategy, run_frequency);

        let now = Utc::now();
        if frequency_changed {
            pipeline.set_next_run(Some(calculate_next_run(run_frequency, last_run, now)));
        }
        pipeline.touch(now);

        self.repository.save(pipeline.clone()).await?;
        if let Some(next_run) = pipeline.config().next_run {
            self.scheduler().schedule(id, next_run).await;
        }

        Ok(pipeline)
    }

    #[tracing::instrument(skip(self))]
    pub async fn delete(&self, id: PipelineId) -> Result<bool, PipelineRunnerError> {
        self.scheduler().unschedule(id).await;
        Ok(self.repository.delete(id).await?)
    }

    pub async fn get(&self, id: PipelineId) -> Result<Option<Pipeline>, PipelineRunnerError> {
        Ok(self.repository.get(id).await?)
    }

    pub async fn list(&self) -> Result<Vec<Pipeline>, PipelineRunnerError> {
        Ok(self.repository.get_all().await?)
    }

    /// Delegates to the scheduler's manual-trigger path, which performs the
    /// `ACTIVE` rejection check before adding a one-shot job entry. The
    /// actual run executes asynchronously once the scheduler's dispatch loop
    /// picks the entry up.
    #[tracing::instrument(skip(self))]
    pub async fn run_now(&self, id: PipelineId) -> Result<(), PipelineRunnerError> {
        self.scheduler().trigger_manual(id).await?;
        Ok(())
    }

    pub async fn get_latest_results(&self, id: PipelineId) -> Result<Option<OutputData>, PipelineRunnerError> {
        if self.repository.get(id).await?.is_none() {
            return Err(StoreError::NotFound(id.as_uuid()).into());
        }
        Ok(self.latest_results.read().await.get(&id.as_uuid()).cloned())
    }

    /// The run executor: `INACTIVE -> ACTIVE -> (INACTIVE | FAILED)`.
    /// Always tags its log emissions with `id` via the log bus's task-local
    /// context, regardless of which path (scheduler fire, manual trigger)
    /// invoked it.
    pub async fn run(&self, id: PipelineId) {
        log_bus::with_pipeline_context(id, self.run_inner(id)).await
    }

    /// Atomically reserves `id` for this run. Returns `false` if another run
    /// already holds the reservation, in which case the caller must not
    /// touch the store for this run at all.
    async fn begin_run(&self, id: PipelineId) -> bool {
        self.in_flight.lock().await.insert(id.as_uuid())
    }

    async fn end_run(&self, id: PipelineId) {
        self.in_flight.lock().await.remove(&id.as_uuid());
    }

    async fn run_inner(&self, id: PipelineId) {
        if !self.begin_run(id).await {
            tracing::info!(pipeline_id = %id, "pipeline already running, skipping");
            return;
        }

        self.execute_run(id).await;
        self.end_run(id).await;
    }

    async fn execute_run(&self, id: PipelineId) {
        let start = Utc::now();

        let pipeline = match self.repository.get(id).await {
            Ok(Some(pipeline)) => pipeline,
            Ok(None) => {
                tracing::info!(pipeline_id = %id, "pipeline not found, skipping run");
                return;
            }
            Err(err) => {
                tracing::error!(pipeline_id = %id, error = %err, "failed to load pipeline for run");
                return;
            }
        };

        if pipeline.is_active() {
            tracing::info!(pipeline_id = %id, "pipeline already marked active in the store, skipping");
            return;
        }

        let mut pipeline = pipeline;
        pipeline.mark_active(start);
        if let Err(err) = self.repository.save(pipeline.clone()).await {
            tracing::error!(pipeline_id = %id, error = %err, "failed to mark pipeline active, aborting run");
            return;
        }
        self.metrics.record_run_started();

        let output = ingestion::run(
            &pipeline.config().sources,
            pipeline.config().strategy,
            Arc::clone(&self.scrape_backend),
        )
        .await;

        let mut pipeline = match self.repository.get(id).await {
            Ok(Some(pipeline)) => pipeline,
            Ok(None) => {
                tracing::warn!(pipeline_id = %id, "pipeline deleted mid-run, dropping orphan schedule entry");
                self.scheduler().unschedule(id).await;
                return;
            }
            Err(err) => {
                tracing::error!(pipeline_id = %id, error = %err, "failed to reload pipeline after run");
                return;
            }
        };

        // Ingestion isolates per-source adapter failures (see
        // `application::ingestion`) and never fails as a whole in this
        // implementation, so the executor's failure branch from the
        // reference design is unreachable here; recorded in DESIGN.md.
        let now = Utc::now();
        let next_run = calculate_next_run(pipeline.config().run_frequency, Some(now), now);
        pipeline.mark_completed(now, Some(next_run));

        if let Err(err) = self.repository.save(pipeline.clone()).await {
            tracing::error!(pipeline_id = %id, error = %err, "failed to persist completed run");
            return;
        }

        self.latest_results.write().await.insert(id.as_uuid(), output);
        self.metrics.record_run_completed(true);
        self.scheduler().schedule(id, next_run).await;
    }
}
