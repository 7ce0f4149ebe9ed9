// /////////////////////////////////////////////////////////////////////////////
// Pipeliner
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Source Adapters
//!
//! One adapter per [`pipeliner_domain::SourceConfig`] variant, all
//! implementing the same [`SourceAdapter`] contract so the ingestion
//! orchestrator can dispatch without knowing the transport details of any
//! particular source kind.

mod api_adapter;
mod file_adapter;
mod scrape_adapter;

pub use api_adapter::{ApiAdapter, DEFAULT_API_TIMEOUT_SECS};
pub use file_adapter::FileAdapter;
pub use scrape_adapter::{ScrapeAdapter, ScrapeBackend, ScrapeExtraction};

use async_trait::async_trait;
use pipeliner_domain::{AdapterError, AdapterRecord};

/// Port every source adapter implements. One invocation fetches every
/// record available from that one configured source.
#[async_trait]
pub trait SourceAdapter: Send + Sync {
    async fn fetch(&self) -> Result<Vec<AdapterRecord>, AdapterError>;
}

/// Builds the adapter for one configured source, keyed by
/// `SourceConfig::kind()`. New source kinds are added here without touching
/// the orchestrator's iteration logic.
pub fn build_adapter(
    config: &pipeliner_domain::SourceConfig,
    scrape_backend: std::sync::Arc<dyn ScrapeBackend>,
) -> Box<dyn SourceAdapter> {
    use pipeliner_domain::SourceConfig;
    match config {
        SourceConfig::Api(cfg) => Box::new(ApiAdapter::new(cfg.clone())),
        SourceConfig::File(cfg) => Box::new(FileAdapter::new(cfg.clone())),
        SourceConfig::Scrape(cfg) => Box::new(ScrapeAdapter::new(cfg.clone(), scrape_backend)),
    }
}
