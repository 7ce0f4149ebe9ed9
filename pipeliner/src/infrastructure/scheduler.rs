// /////////////////////////////////////////////////////////////////////////////
// Pipeliner
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Scheduler
//!
//! Owns a process-local job table keyed by pipeline id. Each entry may carry
//! an independent recurring fire time and an independent one-shot manual
//! fire time — the two never cancel each other, matching the contract that a
//! manual trigger does not disturb the pipeline's normal schedule.
//!
//! One internal tick drives both the discovery/reconciliation pass (aligning
//! the table with the store) and the fire-dispatch pass (invoking the run
//! executor for anything due); both are cheap enough to share a cadence.
//! Reconciliation and dispatch both take the job-table mutex but never hold
//! it across an await that waits on store or adapter I/O.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::{watch, Mutex, Semaphore};
use tokio::task::JoinHandle;
use uuid::Uuid;

use pipeliner_domain::{PipelineId, PipelineRepository, PipelineStatus, SchedulerError};

use crate::application::pipeline_service::{PipelineService, SchedulerHandle};
use crate::infrastructure::log_bus;

pub const DEFAULT_CHECK_INTERVAL_SECS: u64 = 60;
pub const DEFAULT_MISFIRE_GRACE_SECS: u64 = 300;
pub const DEFAULT_MANUAL_MISFIRE_GRACE_SECS: u64 = 10;
pub const DEFAULT_MAX_CONCURRENT_RUNS: usize = 5;

#[derive(Debug, Clone, Copy)]
pub struct SchedulerConfig {
    pub check_interval: Duration,
    pub misfire_grace: Duration,
    pub manual_misfire_grace: Duration,
    pub max_concurrent_runs: usize,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            check_interval: Duration::from_secs(DEFAULT_CHECK_INTERVAL_SECS),
            misfire_grace: Duration::from_secs(DEFAULT_MISFIRE_GRACE_SECS),
            manual_misfire_grace: Duration::from_secs(DEFAULT_MANUAL_MISFIRE_GRACE_SECS),
            max_concurrent_runs: DEFAULT_MAX_CONCURRENT_RUNS,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct JobEntry {
    fire_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Default)]
struct PipelineJobs {
    recurring: Option<JobEntry>,
    manual: Option<JobEntry>,
}

impl PipelineJobs {
    fn is_empty(&self) -> bool {
        self.recurring.is_none() && self.manual.is_none()
    }
}

pub struct Scheduler {
    repository: Arc<dyn PipelineRepository>,
    executor: Arc<PipelineService>,
    jobs: Mutex<HashMap<Uuid, PipelineJobs>>,
    semaphore: Arc<Semaphore>,
    config: SchedulerConfig,
    shutdown_tx: watch::Sender<bool>,
    shutdown_rx: watch::Receiver<bool>,
    in_flight: Mutex<Vec<JoinHandle<()>>>,
}

impl Scheduler {
    pub fn new(repository: Arc<dyn PipelineRepository>, executor: Arc<PipelineService>, config: SchedulerConfig) -> Self {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        Self {
            repository,
            executor,
            jobs: Mutex::new(HashMap::new()),
            semaphore: Arc::new(Semaphore::new(config.max_concurrent_runs)),
            config,
            shutdown_tx,
            shutdown_rx,
            in_flight: Mutex::new(Vec::new()),
        }
    }

    /// Signals the reconciliation/dispatch loop to stop after its current
    /// tick. `run` waits out every run it dispatched before returning, so
    /// joining the task `run` was spawned on is enough to know every
    /// in-flight run has finished.
    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(true);
    }

    /// Drives the scheduler for the lifetime of the process: reconciles and
    /// dispatches once immediately, then again on every `check_interval`
    /// tick, until `shutdown` is called. Waits for every dispatched run to
    /// finish before returning.
    pub async fn run(self: Arc<Self>) {
        self.reconcile().await;
        self.dispatch_due().await;

        let mut interval = tokio::time::interval(self.config.check_interval);
        interval.tick().await; // first tick fires immediately; already handled above

        let mut shutdown_rx = self.shutdown_rx.clone();
        loop {
            tokio::select! {
                _ = interval.tick() => {
                    self.reconcile().await;
                    self.dispatch_due().await;
                }
                _ = shutdown_rx.changed() => {
                    if *shutdown_rx.borrow() {
                        break;
                    }
                }
            }
        }

        self.join_in_flight().await;
    }

    /// Awaits every run task dispatched so far. Nothing dispatches once
    /// `shutdown` has fired, so this observes the final set.
    async fn join_in_flight(&self) {
        let handles = std::mem::take(&mut *self.in_flight.lock().await);
        for handle in handles {
            let _ = handle.await;
        }
    }

    #[tracing::instrument(skip(self))]
    async fn reconcile(&self) {
        let pipelines = match self.repository.get_all().await {
            Ok(pipelines) => pipelines,
            Err(err) => {
                tracing::warn!(error = %err, "reconciliation could not read the store, skipping this pass");
                return;
            }
        };

        let existing_ids: HashSet<Uuid> = pipelines.iter().map(|p| p.id().as_uuid()).collect();
        let mut jobs = self.jobs.lock().await;

        jobs.retain(|id, _| existing_ids.contains(id));

        for pipeline in &pipelines {
            let id = pipeline.id().as_uuid();
            let entry = jobs.entry(id).or_default();

            if pipeline.status() == PipelineStatus::Inactive {
                match pipeline.config().next_run {
                    Some(fire_at) if entry.recurring.map(|j| j.fire_at) != Some(fire_at) => {
                        entry.recurring = Some(JobEntry { fire_at });
                    }
                    Some(_) => {}
                    None => entry.recurring = None,
                }
            } else {
                entry.recurring = None;
            }
        }

        jobs.retain(|_, entry| !entry.is_empty());
    }

    async fn dispatch_due(self: &Arc<Self>) {
        let now = Utc::now();
        // A HashSet, not a Vec: a recurring entry and a manual entry for the
        // same id can both be due in one pass, and `dispatch` must only be
        // called once per id per tick — the service's own in-flight guard
        // is the last line of defense, not the first.
        let mut to_run: HashSet<Uuid> = HashSet::new();

        {
            let mut jobs = self.jobs.lock().await;
            for (id, entry) in jobs.iter_mut() {
                if let Some(job) = entry.recurring.take() {
                    if job.fire_at > now {
                        entry.recurring = Some(job);
                    } else if (now - job.fire_at).to_std().unwrap_or(Duration::MAX) <= self.config.misfire_grace {
                        to_run.insert(*id);
                    } else {
                        tracing::warn!(pipeline_id = %id, fire_at = %job.fire_at, "dropping missed recurring fire beyond misfire grace");
                    }
                }
                if let Some(job) = entry.manual.take() {
                    if job.fire_at > now {
                        entry.manual = Some(job);
                    } else if (now - job.fire_at).to_std().unwrap_or(Duration::MAX) <= self.config.manual_misfire_grace {
                        to_run.insert(*id);
                    } else {
                        tracing::warn!(pipeline_id = %id, fire_at = %job.fire_at, "dropping missed manual trigger beyond misfire grace");
                    }
                }
            }
            jobs.retain(|_, entry| !entry.is_empty());
        }

        for id in to_run {
            self.dispatch(PipelineId::from_uuid(id)).await;
        }
    }

    async fn dispatch(self: &Arc<Self>, id: PipelineId) {
        let scheduler = Arc::clone(self);
        let handle = tokio::spawn(async move {
            let Ok(permit) = Arc::clone(&scheduler.semaphore).acquire_owned().await else {
                return;
            };
            log_bus::with_pipeline_context(id, scheduler.executor.run(id)).await;
            drop(permit);
        });

        let mut in_flight = self.in_flight.lock().await;
        in_flight.retain(|h| !h.is_finished());
        in_flight.push(handle);
    }
}

#[async_trait]
impl SchedulerHandle for Scheduler {
    async fn schedule(&self, id: PipelineId, fire_at: DateTime<Utc>) {
        self.jobs.lock().await.entry(id.as_uuid()).or_default().recurring = Some(JobEntry { fire_at });
    }

    async fn unschedule(&self, id: PipelineId) {
        self.jobs.lock().await.remove(&id.as_uuid());
    }

    async fn trigger_manual(&self, id: PipelineId) -> Result<(), SchedulerError> {
        let pipeline = self
            .repository
            .get(id)
            .await?
            .ok_or(SchedulerError::NoSuchEntry(id.as_uuid()))?;

        if pipeline.is_active() {
            return Err(SchedulerError::AlreadyActive(id.as_uuid()));
        }

        self.jobs.lock().await.entry(id.as_uuid()).or_default().manual = Some(JobEntry { fire_at: Utc::now() });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::adapters::ScrapeBackend;
    use crate::infrastructure::log_bus::LogBus;
    use crate::infrastructure::metrics::MetricsService;
    use crate::infrastructure::repository::InMemoryPipelineRepository;
    use pipeliner_domain::{IngestStrategy, RunFrequency};

    struct NoopScrapeBackend;

    #[async_trait]
    impl ScrapeBackend for NoopScrapeBackend {
        async fn extract(
            &self,
            _url: &str,
            _config: &pipeliner_domain::ScrapeConfig,
        ) -> Option<crate::infrastructure::adapters::ScrapeExtraction> {
            None
        }
    }

    fn fast_config() -> SchedulerConfig {
        SchedulerConfig {
            check_interval: Duration::from_millis(10),
            ..SchedulerConfig::default()
        }
    }

    async fn harness() -> (Arc<PipelineService>, Arc<Scheduler>) {
        let repository: Arc<dyn PipelineRepository> = Arc::new(InMemoryPipelineRepository::default());
        let log_bus = Arc::new(LogBus::default());
        let scrape_backend: Arc<dyn ScrapeBackend> = Arc::new(NoopScrapeBackend);
        let metrics = Arc::new(MetricsService::new().unwrap());
        let service = Arc::new(PipelineService::new(Arc::clone(&repository), log_bus, scrape_backend, metrics));
        let scheduler = Arc::new(Scheduler::new(Arc::clone(&repository), Arc::clone(&service), fast_config()));
        service.set_scheduler(Arc::clone(&scheduler) as Arc<dyn SchedulerHandle>);
        (service, scheduler)
    }

    #[tokio::test]
    async fn reconcile_creates_an_entry_for_every_inactive_pipeline_with_a_next_run() {
        let (service, scheduler) = harness().await;
        let pipeline = service
            .create("x".into(), "d".into(), vec![], IngestStrategy::Simple, RunFrequency::Daily)
            .await
            .unwrap();

        scheduler.reconcile().await;

        let jobs = scheduler.jobs.lock().await;
        assert!(jobs.contains_key(&pipeline.id().as_uuid()));
    }

    #[tokio::test]
    async fn reconcile_removes_entries_for_pipelines_no_longer_in_the_store() {
        let (service, scheduler) = harness().await;
        let pipeline = service
            .create("x".into(), "d".into(), vec![], IngestStrategy::Simple, RunFrequency::Daily)
            .await
            .unwrap();
        scheduler.reconcile().await;

        service.delete(pipeline.id()).await.unwrap();
        scheduler.reconcile().await;

        let jobs = scheduler.jobs.lock().await;
        assert!(!jobs.contains_key(&pipeline.id().as_uuid()));
    }

    #[tokio::test]
    async fn manual_trigger_is_rejected_while_active() {
        let (service, scheduler) = harness().await;
        let pipeline = service
            .create("x".into(), "d".into(), vec![], IngestStrategy::Simple, RunFrequency::Daily)
            .await
            .unwrap();

        let mut active = service.get(pipeline.id()).await.unwrap().unwrap();
        active.mark_active(Utc::now());
        service.repository_for_test().save(active).await.unwrap();

        let err = scheduler.trigger_manual(pipeline.id()).await.unwrap_err();
        assert!(matches!(err, SchedulerError::AlreadyActive(_)));
    }

    #[tokio::test]
    async fn manual_trigger_on_unknown_pipeline_fails_with_no_such_entry() {
        let (_service, scheduler) = harness().await;
        let err = scheduler.trigger_manual(PipelineId::new()).await.unwrap_err();
        assert!(matches!(err, SchedulerError::NoSuchEntry(_)));
    }

    #[tokio::test]
    async fn dispatch_due_runs_a_pipeline_whose_fire_time_has_passed() {
        let (service, scheduler) = harness().await;
        let pipeline = service
            .create("x".into(), "d".into(), vec![], IngestStrategy::Simple, RunFrequency::Daily)
            .await
            .unwrap();

        scheduler.schedule(pipeline.id(), Utc::now() - chrono::Duration::seconds(1)).await;
        scheduler.dispatch_due().await;

        tokio::time::sleep(Duration::from_millis(50)).await;
        let after = service.get(pipeline.id()).await.unwrap().unwrap();
        assert!(after.config().last_run.is_some());
    }

    #[tokio::test]
    async fn dispatch_due_dispatches_a_pipeline_only_once_when_both_entries_fire_together() {
        let (service, scheduler) = harness().await;
        let pipeline = service
            .create("x".into(), "d".into(), vec![], IngestStrategy::Simple, RunFrequency::Daily)
            .await
            .unwrap();

        let fire_at = Utc::now() - chrono::Duration::seconds(1);
        scheduler.schedule(pipeline.id(), fire_at).await;
        scheduler.jobs.lock().await.entry(pipeline.id().as_uuid()).or_default().manual = Some(JobEntry { fire_at });

        scheduler.dispatch_due().await;

        let in_flight = scheduler.in_flight.lock().await;
        assert_eq!(in_flight.len(), 1);
    }

    #[tokio::test]
    async fn run_joins_every_dispatched_task_before_returning() {
        let (service, scheduler) = harness().await;
        let pipeline = service
            .create("x".into(), "d".into(), vec![], IngestStrategy::Simple, RunFrequency::Daily)
            .await
            .unwrap();
        scheduler.schedule(pipeline.id(), Utc::now() - chrono::Duration::seconds(1)).await;

        let run_task = tokio::spawn(Arc::clone(&scheduler).run());
        tokio::time::sleep(Duration::from_millis(20)).await;
        scheduler.shutdown();
        run_task.await.unwrap();

        let after = service.get(pipeline.id()).await.unwrap().unwrap();
        assert!(after.config().last_run.is_some());
    }
}
