// /////////////////////////////////////////////////////////////////////////////
// Pipeliner
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Scrape Source Adapter
//!
//! Drives an external headless-crawler capability (the [`ScrapeBackend`]
//! collaborator) over a list of URLs, accepting either schema-doc or
//! prompt-driven extraction. The core ships the dispatch and record-shaping
//! logic; the actual browser/LLM call is a plug-in the core does not
//! implement.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use pipeliner_domain::{AdapterError, AdapterRecord, ScrapeConfig};

use super::SourceAdapter;

/// The result of one successful extraction against one URL.
#[derive(Debug, Clone)]
pub struct ScrapeExtraction {
    pub payload: Value,
}

/// External collaborator: a headless browser plus either a CSS/JSON
/// extraction schema or an LLM-driven extraction. Implementations are
/// supplied by the bootstrap layer or by tests; the core has none built in.
#[async_trait]
pub trait ScrapeBackend: Send + Sync {
    async fn extract(&self, url: &str, config: &ScrapeConfig) -> Option<ScrapeExtraction>;
}

pub struct ScrapeAdapter {
    config: ScrapeConfig,
    backend: Arc<dyn ScrapeBackend>,
}

impl ScrapeAdapter {
    pub fn new(config: ScrapeConfig, backend: Arc<dyn ScrapeBackend>) -> Self {
        Self { config, backend }
    }
}

#[async_trait]
impl SourceAdapter for ScrapeAdapter {
    #[tracing::instrument(skip(self))]
    async fn fetch(&self) -> Result<Vec<AdapterRecord>, AdapterError> {
        if self.config.schema_doc.is_none() && self.config.prompt.is_none() {
            return Err(AdapterError::ScrapeNotConfigured);
        }

        let mut records = Vec::new();
        for url in &self.config.urls {
            match self.backend.extract(url, &self.config).await {
                Some(extraction) => {
                    let mut data = match extraction.payload {
                        Value::Object(map) => map,
                        other => {
                            let mut map = serde_json::Map::new();
                            map.insert("value".to_string(), other);
                            map
                        }
                    };
                    data.insert("source_url".to_string(), Value::String(url.clone()));
                    records.push(AdapterRecord::new(url, data));
                }
                None => {
                    tracing::warn!(url = %url, "scrape extraction produced no usable result, skipping");
                }
            }
        }

        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct AlwaysExtracts;

    #[async_trait]
    impl ScrapeBackend for AlwaysExtracts {
        async fn extract(&self, _url: &str, _config: &ScrapeConfig) -> Option<ScrapeExtraction> {
            Some(ScrapeExtraction { payload: json!({"title": "ok"}) })
        }
    }

    struct NeverExtracts;

    #[async_trait]
    impl ScrapeBackend for NeverExtracts {
        async fn extract(&self, _url: &str, _config: &ScrapeConfig) -> Option<ScrapeExtraction> {
            None
        }
    }

    fn config(urls: Vec<&str>) -> ScrapeConfig {
        ScrapeConfig {
            urls: urls.into_iter().map(String::from).collect(),
            api_key: "k".into(),
            schema_doc: None,
            prompt: Some("extract the title".into()),
            llm_provider: "openai".into(),
            output_format: "json".into(),
            verbose: false,
            cache_mode: "bypass".into(),
        }
    }

    #[tokio::test]
    async fn annotates_each_record_with_source_url() {
        let adapter = ScrapeAdapter::new(config(vec!["https://a", "https://b"]), Arc::new(AlwaysExtracts));
        let records = adapter.fetch().await.unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].data.get("source_url").unwrap(), "https://a");
    }

    #[tokio::test]
    async fn drops_failed_extractions_without_failing_the_fetch() {
        let adapter = ScrapeAdapter::new(config(vec!["https://a"]), Arc::new(NeverExtracts));
        let records = adapter.fetch().await.unwrap();
        assert!(records.is_empty());
    }

    #[tokio::test]
    async fn fails_fast_when_neither_schema_doc_nor_prompt_is_set() {
        let mut cfg = config(vec!["https://a"]);
        cfg.prompt = None;
        let adapter = ScrapeAdapter::new(cfg, Arc::new(AlwaysExtracts));
        let err = adapter.fetch().await.unwrap_err();
        assert!(matches!(err, AdapterError::ScrapeNotConfigured));
    }
}
