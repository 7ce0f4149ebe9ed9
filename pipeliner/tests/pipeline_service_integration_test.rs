// /////////////////////////////////////////////////////////////////////////////
// Pipeliner
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! End-to-end exercise of the pipeline service facade wired to the in-memory
//! repository and an unconfigured scrape backend, the same graph the
//! composition root assembles.

use std::sync::Arc;

use async_trait::async_trait;

use pipeliner::{
    AppConfig, IngestStrategy, InMemoryPipelineRepository, LogBus, MetricsService, PipelineRepository,
    PipelineService, RunFrequency, ScrapeBackend, ScrapeConfig, ScrapeExtraction, Scheduler, SchedulerHandle,
    SourceConfig,
};

struct NoopScrapeBackend;

#[async_trait]
impl ScrapeBackend for NoopScrapeBackend {
    async fn extract(&self, _url: &str, _config: &ScrapeConfig) -> Option<ScrapeExtraction> {
        None
    }
}

fn wire_service() -> (Arc<PipelineService>, Arc<Scheduler>) {
    let config = AppConfig::default();
    let repository: Arc<dyn PipelineRepository> = Arc::new(InMemoryPipelineRepository::new());
    let log_bus = Arc::new(LogBus::new(config.log_queue_max_size));
    let scrape_backend: Arc<dyn ScrapeBackend> = Arc::new(NoopScrapeBackend);
    let metrics = Arc::new(MetricsService::new().unwrap());

    let service = Arc::new(PipelineService::new(
        Arc::clone(&repository),
        log_bus,
        scrape_backend,
        metrics,
    ));
    let scheduler = Arc::new(Scheduler::new(repository, Arc::clone(&service), config.scheduler_config()));
    service.set_scheduler(Arc::clone(&scheduler) as Arc<dyn SchedulerHandle>);

    (service, scheduler)
}

#[tokio::test]
async fn create_populates_next_run_and_shows_up_in_list() {
    let (service, _scheduler) = wire_service();

    let pipeline = service
        .create(
            "nightly-orders".into(),
            "orders feed".into(),
            vec![SourceConfig::Api(pipeliner_domain::value_objects::ApiConfig {
                url: "https://example.com/orders".into(),
                headers: None,
                timeout: None,
                bearer_token: None,
            })],
            IngestStrategy::Simple,
            RunFrequency::Daily,
        )
        .await
        .unwrap();

    assert!(pipeline.config().next_run.is_some());

    let listed = service.list().await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id(), pipeline.id());
}

#[tokio::test]
async fn delete_removes_the_pipeline_and_unschedules_it() {
    let (service, _scheduler) = wire_service();

    let pipeline = service
        .create("once".into(), "d".into(), vec![], IngestStrategy::Simple, RunFrequency::Weekly)
        .await
        .unwrap();

    let deleted = service.delete(pipeline.id()).await.unwrap();
    assert!(deleted);
    assert!(service.get(pipeline.id()).await.unwrap().is_none());
}

#[tokio::test]
async fn run_now_executes_synchronously_enough_to_produce_results() {
    let (service, _scheduler) = wire_service();

    let pipeline = service
        .create("empty-sources".into(), "d".into(), vec![], IngestStrategy::Simple, RunFrequency::Monthly)
        .await
        .unwrap();

    service.run(pipeline.id()).await;

    let results = service.get_latest_results(pipeline.id()).await.unwrap();
    assert!(results.is_some());
}

#[tokio::test]
async fn get_latest_results_on_an_unknown_pipeline_is_an_error() {
    let (service, _scheduler) = wire_service();
    let unknown = pipeliner::PipelineId::new();
    assert!(service.get_latest_results(unknown).await.is_err());
}
