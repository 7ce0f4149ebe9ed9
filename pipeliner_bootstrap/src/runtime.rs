// /////////////////////////////////////////////////////////////////////////////
// Pipeliner
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Composition Root
//!
//! Wires the object graph this binary needs: the in-memory repository, the
//! per-run log bus, the metrics registry, the pipeline service, and the
//! scheduler, breaking the service/scheduler cyclic dependency the way the
//! reference architecture does — construct the service first with an empty
//! scheduler handle, build the scheduler around an `Arc` to that service,
//! then wire the handle back in.
//!
//! [`run_command`] then dispatches one [`ValidatedCommand`] against that
//! graph: `serve` starts the scheduler loop and blocks on a shutdown signal,
//! the rest perform one operation and return immediately.

use std::sync::Arc;

use async_trait::async_trait;

use pipeliner::{
    AppConfig, AppConfigError, InMemoryPipelineRepository, LogBus, MetricsService, PipelineRepository,
    PipelineRunnerError, PipelineService, ScrapeBackend, ScrapeConfig, ScrapeExtraction, Scheduler, SchedulerHandle,
};

use crate::cli::{ParseError, ValidatedCli, ValidatedCommand};
use crate::shutdown::ShutdownCoordinator;
use crate::signals::wait_for_shutdown_signal;

#[derive(Debug, thiserror::Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Cli(#[from] ParseError),
    #[error(transparent)]
    Config(#[from] AppConfigError),
    #[error(transparent)]
    Runner(#[from] PipelineRunnerError),
    #[error("failed to initialize metrics registry: {0}")]
    Metrics(#[from] prometheus::Error),
}

/// No scrape backend ships with the core; real browser/LLM-driven extraction
/// is a plug-in the operator supplies. This stand-in always reports "no
/// result", so scrape-configured pipelines run but contribute no records
/// until a real backend is wired in.
struct UnconfiguredScrapeBackend;

#[async_trait]
impl ScrapeBackend for UnconfiguredScrapeBackend {
    async fn extract(&self, url: &str, _config: &ScrapeConfig) -> Option<ScrapeExtraction> {
        tracing::warn!(url = %url, "no scrape backend configured, skipping extraction");
        None
    }
}

pub struct AppContext {
    pub service: Arc<PipelineService>,
    pub scheduler: Arc<Scheduler>,
    pub log_bus: Arc<LogBus>,
}

/// Builds the object graph around an already-constructed log bus, so the
/// same instance that is wired into the global `tracing` subscriber is the
/// one the pipeline service publishes run logs to.
pub fn build_context(config: &AppConfig, log_bus: Arc<LogBus>) -> Result<AppContext, BootstrapError> {
    let repository: Arc<dyn PipelineRepository> = Arc::new(InMemoryPipelineRepository::new());
    let scrape_backend: Arc<dyn ScrapeBackend> = Arc::new(UnconfiguredScrapeBackend);
    let metrics = Arc::new(MetricsService::new()?);

    let service = Arc::new(PipelineService::new(
        Arc::clone(&repository),
        Arc::clone(&log_bus),
        scrape_backend,
        metrics,
    ));

    let scheduler = Arc::new(Scheduler::new(repository, Arc::clone(&service), config.scheduler_config()));
    service.set_scheduler(Arc::clone(&scheduler) as Arc<dyn SchedulerHandle>);

    Ok(AppContext { service, scheduler, log_bus })
}

/// Dispatches one validated command against a freshly built context. `serve`
/// runs the scheduler loop until a shutdown signal arrives; everything else
/// performs one operation and returns.
pub async fn run_command(cli: ValidatedCli, config: AppConfig, log_bus: Arc<LogBus>) -> Result<(), BootstrapError> {
    let context = build_context(&config, log_bus)?;

    match cli.command {
        ValidatedCommand::Serve => serve(context).await,
        ValidatedCommand::Create {
            name,
            description,
            sources,
            strategy,
            frequency,
        } => {
            let pipeline = context.service.create(name, description, sources, strategy, frequency).await?;
            println!("{}", pipeline.id());
            Ok(())
        }
        ValidatedCommand::List => {
            for pipeline in context.service.list().await? {
                println!("{}\t{}\t{:?}", pipeline.id(), pipeline.name(), pipeline.status());
            }
            Ok(())
        }
        ValidatedCommand::Show { id } => match context.service.get(id.into()).await? {
            Some(pipeline) => {
                println!("{:#?}", pipeline.config());
                Ok(())
            }
            None => {
                eprintln!("pipeline {id} not found");
                Ok(())
            }
        },
        ValidatedCommand::Delete { id } => {
            let deleted = context.service.delete(id.into()).await?;
            println!("{deleted}");
            Ok(())
        }
        ValidatedCommand::Run { id } => {
            context.service.run_now(id.into()).await?;
            Ok(())
        }
    }
}

/// Runs the scheduler loop until `SIGTERM`/`SIGINT`/`Ctrl+C`, then signals
/// the scheduler to stop after its current tick, waits for every in-flight
/// pipeline run to finish, and closes the log bus so every log subscriber
/// observes the run is over.
async fn serve(context: AppContext) -> Result<(), BootstrapError> {
    let coordinator = ShutdownCoordinator::default();
    let scheduler_task = tokio::spawn(Arc::clone(&context.scheduler).run());

    let reason = wait_for_shutdown_signal().await;
    tracing::info!(?reason, "shutdown signal received, stopping scheduler");
    coordinator.initiate_shutdown();
    context.scheduler.shutdown();

    // `Scheduler::run` itself waits out every run it dispatched before this
    // resolves, so no pipeline is still writing to the log bus past here.
    let _ = scheduler_task.await;
    context.log_bus.close().await;
    coordinator.complete_shutdown();
    Ok(())
}
