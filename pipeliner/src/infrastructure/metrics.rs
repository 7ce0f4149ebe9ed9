// /////////////////////////////////////////////////////////////////////////////
// Pipeliner
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Metrics
//!
//! A small `prometheus` registry tracking scheduled pipelines, in-flight
//! runs, completed runs by outcome, and adapter failures by source kind.
//! Ambient observability, not wired to any scrape endpoint since the public
//! HTTP surface is out of scope here.

use prometheus::{IntCounter, IntCounterVec, IntGauge, Opts, Registry};

pub struct MetricsService {
    registry: Registry,
    pipelines_scheduled: IntGauge,
    runs_in_flight: IntGauge,
    runs_completed: IntCounter,
    runs_failed: IntCounter,
    adapter_failures: IntCounterVec,
}

impl MetricsService {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new_custom(Some("pipeliner".to_string()), None)?;

        let pipelines_scheduled = IntGauge::new("pipelines_scheduled", "Pipelines currently holding a scheduler entry")?;
        let runs_in_flight = IntGauge::new("runs_in_flight", "Pipeline runs currently executing")?;
        let runs_completed = IntCounter::new("runs_completed_total", "Pipeline runs that completed successfully")?;
        let runs_failed = IntCounter::new("runs_failed_total", "Pipeline runs that completed with failure")?;
        let adapter_failures = IntCounterVec::new(
            Opts::new("adapter_failures_total", "Source adapter fetch failures by source kind"),
            &["kind"],
        )?;

        registry.register(Box::new(pipelines_scheduled.clone()))?;
        registry.register(Box::new(runs_in_flight.clone()))?;
        registry.register(Box::new(runs_completed.clone()))?;
        registry.register(Box::new(runs_failed.clone()))?;
        registry.register(Box::new(adapter_failures.clone()))?;

        Ok(Self {
            registry,
            pipelines_scheduled,
            runs_in_flight,
            runs_completed,
            runs_failed,
            adapter_failures,
        })
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn record_pipeline_scheduled(&self) {
        self.pipelines_scheduled.inc();
    }

    pub fn record_pipeline_unscheduled(&self) {
        self.pipelines_scheduled.dec();
    }

    pub fn record_run_started(&self) {
        self.runs_in_flight.inc();
    }

    pub fn record_run_completed(&self, succeeded: bool) {
        self.runs_in_flight.dec();
        if succeeded {
            self.runs_completed.inc();
        } else {
            self.runs_failed.inc();
        }
    }

    pub fn record_adapter_failure(&self, kind: &str) {
        self.adapter_failures.with_label_values(&[kind]).inc();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registers_every_metric_without_name_collisions() {
        let metrics = MetricsService::new().unwrap();
        assert!(!metrics.registry().gather().is_empty());
    }

    #[test]
    fn run_lifecycle_updates_in_flight_and_outcome_counters() {
        let metrics = MetricsService::new().unwrap();
        metrics.record_run_started();
        assert_eq!(metrics.runs_in_flight.get(), 1);
        metrics.record_run_completed(true);
        assert_eq!(metrics.runs_in_flight.get(), 0);
        assert_eq!(metrics.runs_completed.get(), 1);
    }

    #[test]
    fn adapter_failures_are_tracked_per_kind() {
        let metrics = MetricsService::new().unwrap();
        metrics.record_adapter_failure("api");
        metrics.record_adapter_failure("api");
        metrics.record_adapter_failure("file");
        assert_eq!(metrics.adapter_failures.with_label_values(&["api"]).get(), 2);
        assert_eq!(metrics.adapter_failures.with_label_values(&["file"]).get(), 1);
    }
}
