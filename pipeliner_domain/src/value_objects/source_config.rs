// /////////////////////////////////////////////////////////////////////////////
// Pipeliner
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Source Configuration
//!
//! [`SourceConfig`] is a closed, tagged sum of the three source kinds the
//! ingestion orchestrator knows how to dispatch. Unknown tags are rejected at
//! deserialization by serde's default behavior for tagged enums; there is no
//! catch-all variant.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::ConfigError;

/// One configured data source within a pipeline's `ingestor_config`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "config", rename_all = "lowercase")]
pub enum SourceConfig {
    Api(ApiConfig),
    File(FileConfig),
    Scrape(ScrapeConfig),
}

impl SourceConfig {
    /// Name used for the adapter registry lookup and in log tags.
    pub fn kind(&self) -> &'static str {
        match self {
            SourceConfig::Api(_) => "api",
            SourceConfig::File(_) => "file",
            SourceConfig::Scrape(_) => "scrape",
        }
    }

    /// Validates the invariants `SourceConfig` cannot express in its type
    /// alone (the scrape exactly-one-of and the file format/extension match).
    pub fn validate(&self) -> Result<(), ConfigError> {
        match self {
            SourceConfig::Api(_) => Ok(()),
            SourceConfig::File(file) => file.validate(),
            SourceConfig::Scrape(scrape) => scrape.validate(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub url: String,
    #[serde(default)]
    pub headers: Option<HashMap<String, String>>,
    /// Per-request timeout in seconds; falls back to `DEFAULT_API_TIMEOUT`
    /// when absent.
    #[serde(default)]
    pub timeout: Option<u64>,
    #[serde(default)]
    pub bearer_token: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceFormat {
    Csv,
    Json,
}

impl SourceFormat {
    fn matches_extension(&self, ext: &str) -> bool {
        match self {
            SourceFormat::Csv => ext.eq_ignore_ascii_case("csv"),
            SourceFormat::Json => ext.eq_ignore_ascii_case("json"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileConfig {
    pub upload_bytes: Vec<u8>,
    pub declared_filename: String,
    pub declared_format: SourceFormat,
}

impl FileConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        let ext = self
            .declared_filename
            .rsplit('.')
            .next()
            .unwrap_or_default();
        if self.declared_format.matches_extension(ext) {
            Ok(())
        } else {
            Err(ConfigError::FormatMismatch {
                filename: self.declared_filename.clone(),
                declared: format!("{:?}", self.declared_format).to_lowercase(),
            })
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScrapeConfig {
    pub urls: Vec<String>,
    pub api_key: String,
    #[serde(default)]
    pub schema_doc: Option<String>,
    #[serde(default)]
    pub prompt: Option<String>,
    pub llm_provider: String,
    pub output_format: String,
    #[serde(default)]
    pub verbose: bool,
    pub cache_mode: String,
}

impl ScrapeConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        match (&self.schema_doc, &self.prompt) {
            (Some(_), None) | (None, Some(_)) => Ok(()),
            _ => Err(ConfigError::AmbiguousScrapeExtraction),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_config_rejects_extension_mismatch() {
        let cfg = FileConfig {
            upload_bytes: vec![],
            declared_filename: "data.csv".into(),
            declared_format: SourceFormat::Json,
        };
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::FormatMismatch { .. })
        ));
    }

    #[test]
    fn file_config_accepts_matching_extension() {
        let cfg = FileConfig {
            upload_bytes: vec![],
            declared_filename: "data.csv".into(),
            declared_format: SourceFormat::Csv,
        };
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn scrape_config_requires_exactly_one_extraction_mode() {
        let neither = ScrapeConfig {
            urls: vec![],
            api_key: "k".into(),
            schema_doc: None,
            prompt: None,
            llm_provider: "openai".into(),
            output_format: "json".into(),
            verbose: false,
            cache_mode: "bypass".into(),
        };
        assert!(matches!(
            neither.validate(),
            Err(ConfigError::AmbiguousScrapeExtraction)
        ));

        let both = ScrapeConfig {
            schema_doc: Some("{}".into()),
            prompt: Some("extract".into()),
            ..neither.clone()
        };
        assert!(matches!(
            both.validate(),
            Err(ConfigError::AmbiguousScrapeExtraction)
        ));

        let one = ScrapeConfig {
            prompt: Some("extract".into()),
            ..neither
        };
        assert!(one.validate().is_ok());
    }

    #[test]
    fn source_config_kind_matches_tag() {
        let api = SourceConfig::Api(ApiConfig {
            url: "https://example.com".into(),
            headers: None,
            timeout: None,
            bearer_token: None,
        });
        assert_eq!(api.kind(), "api");
    }
}
