// /////////////////////////////////////////////////////////////////////////////
// Pipeliner
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Logging
//!
//! Installs the global `tracing` subscriber: an `EnvFilter`-gated `fmt` layer
//! for the operator-facing console, and [`LogBusLayer`], a custom
//! `tracing_subscriber::Layer` that republishes events emitted while a
//! pipeline-id task-local is set as [`RunLogEvent`]s on the per-run log bus.
//! A single `tracing::info!` call inside the executor therefore satisfies
//! both the console log and any streaming log-bus consumer.

use std::sync::Arc;

use tracing::field::{Field, Visit};
use tracing::{Event, Subscriber};
use tracing_subscriber::layer::{Context, SubscriberExt};
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer};

use pipeliner_domain::{LogLevel, RunLogEvent};

use crate::infrastructure::log_bus::{self, LogBus};

#[derive(Default)]
struct MessageVisitor {
    message: String,
}

impl Visit for MessageVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            self.message = format!("{value:?}");
        }
    }
}

fn to_log_level(level: &tracing::Level) -> LogLevel {
    match *level {
        tracing::Level::ERROR => LogLevel::Error,
        tracing::Level::WARN => LogLevel::Warn,
        tracing::Level::INFO => LogLevel::Info,
        tracing::Level::DEBUG | tracing::Level::TRACE => LogLevel::Debug,
    }
}

pub struct LogBusLayer {
    bus: Arc<LogBus>,
}

impl LogBusLayer {
    pub fn new(bus: Arc<LogBus>) -> Self {
        Self { bus }
    }
}

impl<S: Subscriber> Layer<S> for LogBusLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let Some(pipeline_id) = log_bus::current_pipeline_id() else {
            return;
        };

        let mut visitor = MessageVisitor::default();
        event.record(&mut visitor);

        let log_event = RunLogEvent::new(pipeline_id, to_log_level(event.metadata().level()), visitor.message);

        // on_event runs synchronously on whatever thread is polling this
        // task; publishing is async (it takes the subscriber-table lock), so
        // hand it to the runtime rather than blocking the tracing call site.
        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            let bus = Arc::clone(&self.bus);
            handle.spawn(async move {
                bus.publish(log_event).await;
            });
        }
    }
}

/// Installs the global subscriber. Call exactly once, from the bootstrap
/// composition root, before any `tracing` call site runs.
pub fn init(log_level: &str, log_bus: Arc<LogBus>) {
    let filter = EnvFilter::try_new(log_level).unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .with(LogBusLayer::new(log_bus))
        .init();
}
