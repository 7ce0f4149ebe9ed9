// /////////////////////////////////////////////////////////////////////////////
// Pipeliner
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Ingestion Orchestrator
//!
//! Fans a pipeline's configured sources out to their adapters, isolating
//! per-source failures so one bad source never fails the whole run.

use std::sync::Arc;

use serde_json::{json, Map};

use pipeliner_domain::{IngestStrategy, OutputData, SourceConfig};

use crate::infrastructure::adapters::{build_adapter, ScrapeBackend};

/// Runs ingestion over `sources` using `strategy`.
///
/// `Simple` iterates sources in order, dispatches each to its adapter, and
/// continues past a failing source after logging it. `Ml` is a reserved
/// no-op that returns an empty, `unified` output.
#[tracing::instrument(skip(sources, scrape_backend), fields(source_count = sources.len()))]
pub async fn run(
    sources: &[SourceConfig],
    strategy: IngestStrategy,
    scrape_backend: Arc<dyn ScrapeBackend>,
) -> OutputData {
    match strategy {
        IngestStrategy::Simple => run_simple(sources, scrape_backend).await,
        IngestStrategy::Ml => OutputData::empty_unified(),
    }
}

async fn run_simple(sources: &[SourceConfig], scrape_backend: Arc<dyn ScrapeBackend>) -> OutputData {
    let mut records = Vec::new();

    for source in sources {
        let adapter = build_adapter(source, Arc::clone(&scrape_backend));
        match adapter.fetch().await {
            Ok(fetched) => records.extend(fetched),
            Err(err) => {
                tracing::warn!(kind = source.kind(), error = %err, "source adapter failed, continuing with remaining sources");
            }
        }
    }

    let mut metadata = Map::new();
    metadata.insert("source_count".to_string(), json!(sources.len()));
    metadata.insert("record_count".to_string(), json!(records.len()));

    OutputData {
        records,
        unified: false,
        metadata,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::adapters::ScrapeExtraction;
    use async_trait::async_trait;
    use pipeliner_domain::ApiConfig;

    struct NoopBackend;

    #[async_trait]
    impl ScrapeBackend for NoopBackend {
        async fn extract(&self, _url: &str, _config: &pipeliner_domain::ScrapeConfig) -> Option<ScrapeExtraction> {
            None
        }
    }

    #[tokio::test]
    async fn ml_strategy_returns_empty_unified_output() {
        let output = run(&[], IngestStrategy::Ml, Arc::new(NoopBackend)).await;
        assert!(output.unified);
        assert!(output.records.is_empty());
    }

    #[tokio::test]
    async fn simple_strategy_isolates_one_failing_source() {
        let sources = vec![
            SourceConfig::Api(ApiConfig {
                url: "not a url".to_string(),
                headers: None,
                timeout: Some(1),
                bearer_token: None,
            }),
        ];
        let output = run(&sources, IngestStrategy::Simple, Arc::new(NoopBackend)).await;
        assert_eq!(output.metadata.get("source_count").unwrap(), 1);
        assert_eq!(output.metadata.get("record_count").unwrap(), 0);
        assert!(!output.unified);
    }
}
