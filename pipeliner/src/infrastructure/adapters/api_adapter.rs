// /////////////////////////////////////////////////////////////////////////////
// Pipeliner
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # API Source Adapter
//!
//! Fetches one JSON document from an HTTP endpoint. Retries on 5xx
//! gateway-class errors with a small linear backoff; any other failure is
//! not retried.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::Value;

use pipeliner_domain::{AdapterError, AdapterRecord, ApiConfig};

use super::SourceAdapter;

pub const DEFAULT_API_TIMEOUT_SECS: u64 = 30;
const MAX_ATTEMPTS: u32 = 3;
const BACKOFF_FACTOR_SECS: f64 = 0.3;
const RETRYABLE_STATUSES: [StatusCode; 4] = [
    StatusCode::INTERNAL_SERVER_ERROR,
    StatusCode::BAD_GATEWAY,
    StatusCode::SERVICE_UNAVAILABLE,
    StatusCode::GATEWAY_TIMEOUT,
];

pub struct ApiAdapter {
    config: ApiConfig,
    client: Client,
}

impl ApiAdapter {
    pub fn new(config: ApiConfig) -> Self {
        Self {
            config,
            client: Client::new(),
        }
    }

    fn timeout(&self) -> Duration {
        Duration::from_secs(self.config.timeout.unwrap_or(DEFAULT_API_TIMEOUT_SECS))
    }

    async fn fetch_once(&self) -> Result<reqwest::Response, AdapterError> {
        let mut request = self.client.get(&self.config.url);
        if let Some(token) = &self.config.bearer_token {
            request = request.bearer_auth(token);
        }
        if let Some(headers) = &self.config.headers {
            for (name, value) in headers {
                request = request.header(name, value);
            }
        }

        let timeout_secs = self.timeout().as_secs();
        let response = tokio::time::timeout(self.timeout(), request.send())
            .await
            .map_err(|_| AdapterError::Timeout {
                url: self.config.url.clone(),
                timeout_secs,
            })?
            .map_err(|err| AdapterError::Request {
                url: self.config.url.clone(),
                message: err.to_string(),
            })?;

        Ok(response)
    }
}

#[async_trait]
impl SourceAdapter for ApiAdapter {
    #[tracing::instrument(skip(self), fields(url = %self.config.url))]
    async fn fetch(&self) -> Result<Vec<AdapterRecord>, AdapterError> {
        let mut last_err = None;

        for attempt in 0..MAX_ATTEMPTS {
            if attempt > 0 {
                let backoff = BACKOFF_FACTOR_SECS * 2f64.powi(attempt as i32 - 1);
                tokio::time::sleep(Duration::from_secs_f64(backoff)).await;
            }

            match self.fetch_once().await {
                Ok(response) if RETRYABLE_STATUSES.contains(&response.status()) => {
                    last_err = Some(AdapterError::Request {
                        url: self.config.url.clone(),
                        message: format!("server returned {}", response.status()),
                    });
                    continue;
                }
                Ok(response) => {
                    let response = response.error_for_status().map_err(|err| AdapterError::Request {
                        url: self.config.url.clone(),
                        message: err.to_string(),
                    })?;
                    let body: Value = response.json().await.map_err(|err| AdapterError::InvalidJson {
                        source_url: self.config.url.clone(),
                        message: err.to_string(),
                    })?;
                    return shape_records(&self.config.url, body);
                }
                Err(err) => return Err(err),
            }
        }

        Err(last_err.unwrap_or_else(|| AdapterError::Request {
            url: self.config.url.clone(),
            message: "exhausted retries".to_string(),
        }))
    }
}

fn shape_records(url: &str, body: Value) -> Result<Vec<AdapterRecord>, AdapterError> {
    match body {
        Value::Object(map) => Ok(vec![AdapterRecord::new(url, map)]),
        Value::Array(items) => {
            let mut records = Vec::with_capacity(items.len());
            for item in items {
                match item {
                    Value::Object(map) => records.push(AdapterRecord::new(url, map)),
                    _ => return Err(AdapterError::UnexpectedShape { source_url: url.to_string() }),
                }
            }
            Ok(records)
        }
        _ => Err(AdapterError::UnexpectedShape { source_url: url.to_string() }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn object_body_becomes_single_record() {
        let records = shape_records("https://x", json!({"a": 1})).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].source, "https://x");
    }

    #[test]
    fn array_body_becomes_one_record_per_element() {
        let records = shape_records("https://x", json!([{"a": 1}, {"b": 2}])).unwrap();
        assert_eq!(records.len(), 2);
    }

    #[test]
    fn scalar_body_is_rejected() {
        let err = shape_records("https://x", json!(42)).unwrap_err();
        assert!(matches!(err, AdapterError::UnexpectedShape { .. }));
    }
}
