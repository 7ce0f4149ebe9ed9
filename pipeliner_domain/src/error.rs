// /////////////////////////////////////////////////////////////////////////////
// Pipeliner
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Error Taxonomy
//!
//! Five narrow error kinds, one per component boundary, plus a unifying
//! [`PipelineRunnerError`] for call sites that need a single return type
//! (the facade, the CLI). Each kind carries a [`category`](ErrorCategory) and
//! an `is_recoverable` predicate so callers can make policy decisions without
//! matching on every variant.

use std::fmt;

/// Coarse classification shared by every error kind in this crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Bad input; retrying with the same input will not help.
    Config,
    /// Likely to succeed if retried (network blip, lock contention).
    Transient,
    /// The store could not durably commit a change.
    Persistence,
    /// A bug or an invariant violation inside this process.
    Internal,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorCategory::Config => "config",
            ErrorCategory::Transient => "transient",
            ErrorCategory::Persistence => "persistence",
            ErrorCategory::Internal => "internal",
        };
        write!(f, "{s}")
    }
}

/// Malformed source config, unknown ingestion strategy, or a scrape source
/// missing both `schema_doc` and `prompt`. Surfaced, never retried.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("unknown ingestion strategy: {0}")]
    UnknownStrategy(String),

    #[error("scrape source must set exactly one of schema_doc or prompt")]
    AmbiguousScrapeExtraction,

    #[error("declared format {declared} does not match filename extension in {filename}")]
    FormatMismatch { filename: String, declared: String },

    #[error("invalid source configuration: {0}")]
    InvalidSource(String),
}

impl ConfigError {
    pub fn category(&self) -> ErrorCategory {
        ErrorCategory::Config
    }

    pub fn is_recoverable(&self) -> bool {
        false
    }
}

/// Transport or parse failure for a single source. Logged and swallowed by
/// the ingestion orchestrator; never fails a run on its own.
#[derive(Debug, thiserror::Error)]
pub enum AdapterError {
    #[error("request to {url} failed: {message}")]
    Request { url: String, message: String },

    #[error("request to {url} timed out after {timeout_secs}s")]
    Timeout { url: String, timeout_secs: u64 },

    #[error("could not parse response from {source_url} as JSON: {message}")]
    InvalidJson { source_url: String, message: String },

    #[error("unexpected response shape from {source_url}: expected a JSON object or array")]
    UnexpectedShape { source_url: String },

    #[error("could not parse {filename} as {format}: {message}")]
    InvalidFile {
        filename: String,
        format: String,
        message: String,
    },

    #[error("scrape adapter has neither schema_doc nor prompt configured")]
    ScrapeNotConfigured,

    #[error("scrape of {url} produced no usable extraction")]
    ScrapeEmpty { url: String },

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl AdapterError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            AdapterError::Request { .. } | AdapterError::Timeout { .. } => {
                ErrorCategory::Transient
            }
            AdapterError::Config(inner) => inner.category(),
            _ => ErrorCategory::Config,
        }
    }

    pub fn is_recoverable(&self) -> bool {
        matches!(self.category(), ErrorCategory::Transient)
    }
}

impl From<serde_json::Error> for AdapterError {
    fn from(err: serde_json::Error) -> Self {
        AdapterError::InvalidJson {
            source_url: "<unknown>".to_string(),
            message: err.to_string(),
        }
    }
}

/// Persistence failure. Bubbles to the caller; the caller does not attempt
/// to revert in-memory state beyond what was actually committed.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("pipeline {0} not found")]
    NotFound(uuid::Uuid),

    #[error("backing store is unavailable: {0}")]
    Unavailable(String),

    #[error("io error while persisting pipeline state: {0}")]
    Io(#[from] std::io::Error),
}

impl StoreError {
    pub fn category(&self) -> ErrorCategory {
        ErrorCategory::Persistence
    }

    pub fn is_recoverable(&self) -> bool {
        matches!(self, StoreError::Unavailable(_) | StoreError::Io(_))
    }
}

/// Job-table inconsistency inside the scheduler. Logged; the next
/// reconciliation pass is expected to repair it.
#[derive(Debug, thiserror::Error)]
pub enum SchedulerError {
    #[error("pipeline {0} is already active; refusing manual trigger")]
    AlreadyActive(uuid::Uuid),

    #[error("pipeline {0} has no entry to reschedule")]
    NoSuchEntry(uuid::Uuid),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl SchedulerError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            SchedulerError::Store(inner) => inner.category(),
            _ => ErrorCategory::Internal,
        }
    }

    pub fn is_recoverable(&self) -> bool {
        matches!(self.category(), ErrorCategory::Persistence)
    }
}

/// Raised when a run cannot even reach the ingestion step. Results in
/// `status = FAILED` without updating `last_run`.
#[derive(Debug, thiserror::Error)]
pub enum ExecutorError {
    #[error("pipeline {0} not found")]
    PipelineNotFound(uuid::Uuid),

    #[error("pipeline {0} is already active")]
    AlreadyActive(uuid::Uuid),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl ExecutorError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            ExecutorError::Store(inner) => inner.category(),
            ExecutorError::Config(inner) => inner.category(),
            _ => ErrorCategory::Internal,
        }
    }

    pub fn is_recoverable(&self) -> bool {
        matches!(self.category(), ErrorCategory::Persistence | ErrorCategory::Transient)
    }
}

/// Unifying error for call sites (the facade, the CLI) that want one return
/// type across the five component-level error kinds.
#[derive(Debug, thiserror::Error)]
pub enum PipelineRunnerError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Adapter(#[from] AdapterError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Scheduler(#[from] SchedulerError),

    #[error(transparent)]
    Executor(#[from] ExecutorError),
}

impl PipelineRunnerError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            PipelineRunnerError::Config(e) => e.category(),
            PipelineRunnerError::Adapter(e) => e.category(),
            PipelineRunnerError::Store(e) => e.category(),
            PipelineRunnerError::Scheduler(e) => e.category(),
            PipelineRunnerError::Executor(e) => e.category(),
        }
    }

    pub fn is_recoverable(&self) -> bool {
        match self {
            PipelineRunnerError::Config(e) => e.is_recoverable(),
            PipelineRunnerError::Adapter(e) => e.is_recoverable(),
            PipelineRunnerError::Store(e) => e.is_recoverable(),
            PipelineRunnerError::Scheduler(e) => e.is_recoverable(),
            PipelineRunnerError::Executor(e) => e.is_recoverable(),
        }
    }
}
