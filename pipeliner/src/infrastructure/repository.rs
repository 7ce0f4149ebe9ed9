// /////////////////////////////////////////////////////////////////////////////
// Pipeliner
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # In-Memory Pipeline Repository
//!
//! The only persistence backend the core ships. Guarded by a single
//! `tokio::sync::RwLock` over a `HashMap`; every operation returns owned
//! copies so callers never observe another caller's in-flight mutation.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use pipeliner_domain::{Pipeline, PipelineId, PipelineRepository, StoreError};

#[derive(Default)]
pub struct InMemoryPipelineRepository {
    pipelines: RwLock<HashMap<Uuid, Pipeline>>,
}

impl InMemoryPipelineRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PipelineRepository for InMemoryPipelineRepository {
    async fn save(&self, pipeline: Pipeline) -> Result<(), StoreError> {
        let mut guard = self.pipelines.write().await;
        guard.insert(pipeline.id().as_uuid(), pipeline);
        Ok(())
    }

    async fn get(&self, id: PipelineId) -> Result<Option<Pipeline>, StoreError> {
        let guard = self.pipelines.read().await;
        Ok(guard.get(&id.as_uuid()).cloned())
    }

    async fn get_all(&self) -> Result<Vec<Pipeline>, StoreError> {
        let guard = self.pipelines.read().await;
        Ok(guard.values().cloned().collect())
    }

    async fn delete(&self, id: PipelineId) -> Result<bool, StoreError> {
        let mut guard = self.pipelines.write().await;
        Ok(guard.remove(&id.as_uuid()).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use pipeliner_domain::{IngestStrategy, RunFrequency};

    fn sample() -> Pipeline {
        Pipeline::new("daily-feed", "desc", vec![], IngestStrategy::Simple, RunFrequency::Daily, Utc::now())
    }

    #[tokio::test]
    async fn save_then_get_round_trips() {
        let repo = InMemoryPipelineRepository::new();
        let pipeline = sample();
        let id = pipeline.id();
        repo.save(pipeline).await.unwrap();

        let fetched = repo.get(id).await.unwrap();
        assert!(fetched.is_some());
        assert_eq!(fetched.unwrap().id(), id);
    }

    #[tokio::test]
    async fn get_missing_returns_none() {
        let repo = InMemoryPipelineRepository::new();
        assert!(repo.get(PipelineId::new()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn get_all_returns_every_saved_pipeline() {
        let repo = InMemoryPipelineRepository::new();
        repo.save(sample()).await.unwrap();
        repo.save(sample()).await.unwrap();
        assert_eq!(repo.get_all().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn delete_returns_false_when_absent() {
        let repo = InMemoryPipelineRepository::new();
        assert!(!repo.delete(PipelineId::new()).await.unwrap());
    }

    #[tokio::test]
    async fn delete_removes_and_reports_true() {
        let repo = InMemoryPipelineRepository::new();
        let pipeline = sample();
        let id = pipeline.id();
        repo.save(pipeline).await.unwrap();

        assert!(repo.delete(id).await.unwrap());
        assert!(repo.get(id).await.unwrap().is_none());
    }
}
