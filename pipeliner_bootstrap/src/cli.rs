// /////////////////////////////////////////////////////////////////////////////
// Pipeliner
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Command-Line Interface
//!
//! Two-phase parse-then-validate pipeline: `clap` parses the raw argument
//! strings into [`Cli`], then [`validate_cli`] runs every argument through
//! [`SecureArgParser`] (non-empty, no control characters, bounded length)
//! before producing a [`ValidatedCli`] the composition root can act on
//! without re-checking anything.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use uuid::Uuid;

use pipeliner::{IngestStrategy, RunFrequency, SourceConfig};

const MAX_ARGUMENT_LEN: usize = 8192;

#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("--{arg} is invalid: {reason}")]
    InvalidArgument { arg: String, reason: String },
    #[error("--{arg} must be one of daily, weekly, monthly, got {reason}")]
    InvalidValue { arg: String, reason: String },
    #[error("--sources is not valid JSON: {0}")]
    Sources(#[from] serde_json::Error),
    #[error("--{arg} must be a valid UUID: {source}")]
    InvalidId {
        arg: String,
        #[source]
        source: uuid::Error,
    },
}

/// Security validation for raw CLI argument strings, applied before any
/// value is trusted downstream. Rejects the empty string, embedded control
/// characters (a vector for terminal escape injection), and arguments well
/// past any legitimate length.
pub struct SecureArgParser;

impl SecureArgParser {
    pub fn validate_argument(arg: &str, value: &str) -> Result<(), ParseError> {
        if value.is_empty() {
            return Err(ParseError::InvalidArgument {
                arg: arg.to_string(),
                reason: "must not be empty".to_string(),
            });
        }
        if value.chars().any(|c| c.is_control()) {
            return Err(ParseError::InvalidArgument {
                arg: arg.to_string(),
                reason: "must not contain control characters".to_string(),
            });
        }
        if value.len() > MAX_ARGUMENT_LEN {
            return Err(ParseError::InvalidArgument {
                arg: arg.to_string(),
                reason: format!("must not exceed {MAX_ARGUMENT_LEN} bytes"),
            });
        }
        Ok(())
    }

    pub fn validate_uuid(arg: &str, value: &str) -> Result<Uuid, ParseError> {
        Self::validate_argument(arg, value)?;
        Uuid::parse_str(value).map_err(|source| ParseError::InvalidId {
            arg: arg.to_string(),
            source,
        })
    }

    pub fn validate_frequency(value: &str) -> Result<RunFrequency, ParseError> {
        match value {
            "daily" => Ok(RunFrequency::Daily),
            "weekly" => Ok(RunFrequency::Weekly),
            "monthly" => Ok(RunFrequency::Monthly),
            other => Err(ParseError::InvalidValue {
                arg: "frequency".to_string(),
                reason: other.to_string(),
            }),
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "pipeliner", version, about = "Schedules and runs recurring data-integration pipelines")]
pub struct Cli {
    /// Optional TOML config file, layered under environment variables.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the scheduler and pipeline service as a long-lived process.
    Serve,
    /// Register a new pipeline.
    Create {
        #[arg(long)]
        name: String,
        #[arg(long)]
        description: String,
        /// JSON array of source configs, e.g. `[{"kind":"api","url":"...","headers":{},"timeout":30}]`.
        #[arg(long)]
        sources: String,
        #[arg(long)]
        frequency: String,
    },
    /// List every registered pipeline.
    List,
    /// Show one pipeline by id.
    Show {
        #[arg(long)]
        id: String,
    },
    /// Delete one pipeline by id.
    Delete {
        #[arg(long)]
        id: String,
    },
    /// Manually trigger one pipeline's run, outside its normal schedule.
    Run {
        #[arg(long)]
        id: String,
    },
}

pub fn parse_cli() -> Cli {
    Cli::parse()
}

#[derive(Debug, Clone)]
pub struct ValidatedCli {
    pub command: ValidatedCommand,
    pub config: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub enum ValidatedCommand {
    Serve,
    Create {
        name: String,
        description: String,
        sources: Vec<SourceConfig>,
        strategy: IngestStrategy,
        frequency: RunFrequency,
    },
    List,
    Show { id: Uuid },
    Delete { id: Uuid },
    Run { id: Uuid },
}

/// Parses argv and validates every argument, in one call.
pub fn parse_and_validate() -> Result<ValidatedCli, ParseError> {
    validate_cli(parse_cli())
}

fn validate_cli(cli: Cli) -> Result<ValidatedCli, ParseError> {
    if let Some(ref path) = cli.config {
        SecureArgParser::validate_argument("config", &path.to_string_lossy())?;
    }

    let command = match cli.command {
        Commands::Serve => ValidatedCommand::Serve,
        Commands::Create {
            name,
            description,
            sources,
            frequency,
        } => {
            SecureArgParser::validate_argument("name", &name)?;
            SecureArgParser::validate_argument("description", &description)?;
            SecureArgParser::validate_argument("sources", &sources)?;
            let strategy = IngestStrategy::Simple;
            let sources: Vec<SourceConfig> = serde_json::from_str(&sources)?;
            let frequency = SecureArgParser::validate_frequency(&frequency)?;

            ValidatedCommand::Create {
                name,
                description,
                sources,
                strategy,
                frequency,
            }
        }
        Commands::List => ValidatedCommand::List,
        Commands::Show { id } => ValidatedCommand::Show {
            id: SecureArgParser::validate_uuid("id", &id)?,
        },
        Commands::Delete { id } => ValidatedCommand::Delete {
            id: SecureArgParser::validate_uuid("id", &id)?,
        },
        Commands::Run { id } => ValidatedCommand::Run {
            id: SecureArgParser::validate_uuid("id", &id)?,
        },
    };

    Ok(ValidatedCli {
        command,
        config: cli.config,
    })
}
