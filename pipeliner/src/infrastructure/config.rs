// /////////////////////////////////////////////////////////////////////////////
// Pipeliner
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Process Configuration
//!
//! Layers, in increasing precedence: built-in defaults, an optional TOML
//! file (`--config PATH`), then environment variables. Field names match the
//! fixed environment variable names verbatim so `config::Environment`'s
//! default case-insensitive matching needs no prefix or alias table.

use std::path::Path;
use std::time::Duration;

use config::{Config, Environment, File};
use serde::Deserialize;

use crate::infrastructure::adapters::DEFAULT_API_TIMEOUT_SECS;
use crate::infrastructure::log_bus::DEFAULT_QUEUE_CAPACITY;
use crate::infrastructure::scheduler::{
    SchedulerConfig, DEFAULT_CHECK_INTERVAL_SECS, DEFAULT_MANUAL_MISFIRE_GRACE_SECS,
    DEFAULT_MAX_CONCURRENT_RUNS, DEFAULT_MISFIRE_GRACE_SECS,
};

#[derive(Debug, thiserror::Error)]
pub enum AppConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct AppConfig {
    pub store_type: String,
    pub scheduler_check_interval: u64,
    pub scheduler_max_concurrent_runs: usize,
    pub scheduler_misfire_grace_sec: u64,
    pub default_api_timeout: u64,
    pub default_scraper_llm_provider: String,
    pub default_scraper_cache_mode: String,
    pub default_scraper_prompt: Option<String>,
    pub log_queue_max_size: usize,
    pub log_level: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            store_type: "memory".to_string(),
            scheduler_check_interval: DEFAULT_CHECK_INTERVAL_SECS,
            scheduler_max_concurrent_runs: DEFAULT_MAX_CONCURRENT_RUNS,
            scheduler_misfire_grace_sec: DEFAULT_MISFIRE_GRACE_SECS,
            default_api_timeout: DEFAULT_API_TIMEOUT_SECS,
            default_scraper_llm_provider: "openai".to_string(),
            default_scraper_cache_mode: "bypass".to_string(),
            default_scraper_prompt: None,
            log_queue_max_size: DEFAULT_QUEUE_CAPACITY,
            log_level: "info".to_string(),
        }
    }
}

impl AppConfig {
    /// Loads configuration layering defaults, then `config_path` if given
    /// and present on disk, then the process environment.
    pub fn load(config_path: Option<&Path>) -> Result<Self, AppConfigError> {
        let defaults = Self::default();

        let mut builder = Config::builder()
            .set_default("store_type", defaults.store_type)?
            .set_default("scheduler_check_interval", defaults.scheduler_check_interval as i64)?
            .set_default("scheduler_max_concurrent_runs", defaults.scheduler_max_concurrent_runs as i64)?
            .set_default("scheduler_misfire_grace_sec", defaults.scheduler_misfire_grace_sec as i64)?
            .set_default("default_api_timeout", defaults.default_api_timeout as i64)?
            .set_default("default_scraper_llm_provider", defaults.default_scraper_llm_provider)?
            .set_default("default_scraper_cache_mode", defaults.default_scraper_cache_mode)?
            .set_default("log_queue_max_size", defaults.log_queue_max_size as i64)?
            .set_default("log_level", defaults.log_level)?;

        if let Some(path) = config_path {
            builder = builder.add_source(File::from(path.to_path_buf()).required(false));
        }

        let config = builder.add_source(Environment::default()).build()?;
        config.try_deserialize().map_err(AppConfigError::from)
    }

    pub fn scheduler_config(&self) -> SchedulerConfig {
        SchedulerConfig {
            check_interval: Duration::from_secs(self.scheduler_check_interval),
            misfire_grace: Duration::from_secs(self.scheduler_misfire_grace_sec),
            manual_misfire_grace: Duration::from_secs(DEFAULT_MANUAL_MISFIRE_GRACE_SECS),
            max_concurrent_runs: self.scheduler_max_concurrent_runs,
        }
    }

    pub fn api_timeout(&self) -> Duration {
        Duration::from_secs(self.default_api_timeout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loading_with_no_file_and_a_clean_environment_yields_defaults() {
        let config = AppConfig::load(None).unwrap();
        assert_eq!(config.store_type, "memory");
        assert_eq!(config.scheduler_check_interval, DEFAULT_CHECK_INTERVAL_SECS);
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn a_missing_config_file_path_is_not_an_error() {
        let config = AppConfig::load(Some(Path::new("/nonexistent/pipeliner.toml"))).unwrap();
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn scheduler_config_maps_seconds_into_durations() {
        let mut config = AppConfig::default();
        config.scheduler_check_interval = 30;
        config.scheduler_misfire_grace_sec = 120;
        let scheduler_config = config.scheduler_config();
        assert_eq!(scheduler_config.check_interval, Duration::from_secs(30));
        assert_eq!(scheduler_config.misfire_grace, Duration::from_secs(120));
    }
}
