// /////////////////////////////////////////////////////////////////////////////
// Pipeliner
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Per-Run Log Bus
//!
//! A process-wide broker that tags log events with the pipeline id of the
//! run that produced them and fans them out to any subscriber watching that
//! id. Tagging is carried through suspension points with a
//! `tokio::task_local!`, since task-locals do not cross `tokio::spawn` on
//! their own — anything that spawns a detached task must re-enter the scope
//! inside the new task.
//!
//! Publish is always non-blocking (`try_send`): a slow or absent consumer
//! never stalls the run that is emitting events. A consumer sees only
//! events emitted after it subscribes; there is no replay.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{mpsc, RwLock};
use uuid::Uuid;

use pipeliner_domain::{PipelineId, RunLogEvent};

pub const DEFAULT_QUEUE_CAPACITY: usize = 1_000;

tokio::task_local! {
    static CURRENT_PIPELINE_ID: PipelineId;
}

/// Runs `fut` with `id` attached as the current run's log context. Any
/// `tracing` event emitted synchronously within `fut` (including across
/// `.await` points, but not across a bare `tokio::spawn`) is tagged with
/// `id` by the bridging layer in [`crate::infrastructure::logging`].
pub async fn with_pipeline_context<F>(id: PipelineId, fut: F) -> F::Output
where
    F: std::future::Future,
{
    CURRENT_PIPELINE_ID.scope(id, fut).await
}

/// The pipeline id of the run currently executing on this task, if any.
pub fn current_pipeline_id() -> Option<PipelineId> {
    CURRENT_PIPELINE_ID.try_with(|id| *id).ok()
}

struct Subscribers {
    by_pipeline: HashMap<Uuid, Vec<mpsc::Sender<RunLogEvent>>>,
    global: Vec<mpsc::Sender<RunLogEvent>>,
}

/// Many-producers / many-consumers broker for [`RunLogEvent`]s.
pub struct LogBus {
    subscribers: RwLock<Subscribers>,
    capacity: usize,
}

impl LogBus {
    pub fn new(capacity: usize) -> Self {
        Self {
            subscribers: RwLock::new(Subscribers {
                by_pipeline: HashMap::new(),
                global: Vec::new(),
            }),
            capacity,
        }
    }

    /// Subscribes to events tagged with `id`. The returned receiver
    /// resolves to `None` once every sender for it (including this one's
    /// registration) is dropped.
    pub async fn subscribe(&self, id: PipelineId) -> mpsc::Receiver<RunLogEvent> {
        let (tx, rx) = mpsc::channel(self.capacity);
        self.subscribers.write().await.by_pipeline.entry(id.as_uuid()).or_default().push(tx);
        rx
    }

    /// Subscribes to every event regardless of pipeline id. Used by the
    /// bootstrap layer's console sink.
    pub async fn subscribe_global(&self) -> mpsc::Receiver<RunLogEvent> {
        let (tx, rx) = mpsc::channel(self.capacity);
        self.subscribers.write().await.global.push(tx);
        rx
    }

    /// Publishes `event` to every live subscriber of its pipeline id and to
    /// every global subscriber. Never blocks: a full subscriber queue drops
    /// the event with a single warning, and a disconnected subscriber is
    /// pruned lazily on its next publish attempt.
    pub async fn publish(&self, event: RunLogEvent) {
        let mut guard = self.subscribers.write().await;

        if let Some(senders) = guard.by_pipeline.get_mut(&event.pipeline_id.as_uuid()) {
            send_to_all(senders, &event);
            if senders.is_empty() {
                guard.by_pipeline.remove(&event.pipeline_id.as_uuid());
            }
        }

        send_to_all(&mut guard.global, &event);
    }

    /// Drops every registered subscriber sender, closing all live
    /// subscriptions: each subscriber's next `recv()` resolves to `None`.
    /// Called once at shutdown, after the last run that could publish has
    /// finished.
    pub async fn close(&self) {
        let mut guard = self.subscribers.write().await;
        guard.by_pipeline.clear();
        guard.global.clear();
    }
}

fn send_to_all(senders: &mut Vec<mpsc::Sender<RunLogEvent>>, event: &RunLogEvent) {
    senders.retain(|sender| match sender.try_send(event.clone()) {
        Ok(()) => true,
        Err(mpsc::error::TrySendError::Closed(_)) => false,
        Err(mpsc::error::TrySendError::Full(_)) => {
            tracing::warn!(pipeline_id = %event.pipeline_id, "log bus subscriber queue full, dropping event");
            true
        }
    });
}

impl Default for LogBus {
    fn default() -> Self {
        Self::new(DEFAULT_QUEUE_CAPACITY)
    }
}

/// Convenience wrapper so the composition root can hold one `Arc<LogBus>`.
pub fn new_shared(capacity: usize) -> Arc<LogBus> {
    Arc::new(LogBus::new(capacity))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pipeliner_domain::LogLevel;

    fn event(id: PipelineId) -> RunLogEvent {
        RunLogEvent::new(id, LogLevel::Info, "hello")
    }

    #[tokio::test]
    async fn subscriber_receives_only_its_own_pipelines_events() {
        let bus = LogBus::new(8);
        let a = PipelineId::new();
        let b = PipelineId::new();

        let mut rx_a = bus.subscribe(a).await;
        let mut rx_b = bus.subscribe(b).await;

        bus.publish(event(a)).await;

        assert!(rx_a.recv().await.is_some());
        assert!(tokio::time::timeout(std::time::Duration::from_millis(20), rx_b.recv()).await.is_err());
    }

    #[tokio::test]
    async fn global_subscriber_sees_every_pipelines_events() {
        let bus = LogBus::new(8);
        let a = PipelineId::new();
        let mut rx = bus.subscribe_global().await;

        bus.publish(event(a)).await;

        assert!(rx.recv().await.is_some());
    }

    #[tokio::test]
    async fn dropping_the_receiver_does_not_panic_a_later_publish() {
        let bus = LogBus::new(8);
        let a = PipelineId::new();
        let rx = bus.subscribe(a).await;
        drop(rx);

        bus.publish(event(a)).await;
    }

    #[tokio::test]
    async fn close_causes_every_subscriber_to_observe_channel_closed() {
        let bus = LogBus::new(8);
        let a = PipelineId::new();
        let mut by_pipeline = bus.subscribe(a).await;
        let mut global = bus.subscribe_global().await;

        bus.close().await;

        assert!(by_pipeline.recv().await.is_none());
        assert!(global.recv().await.is_none());
    }

    #[tokio::test]
    async fn task_local_context_round_trips_through_an_await_point() {
        let id = PipelineId::new();
        let observed = with_pipeline_context(id, async {
            tokio::time::sleep(std::time::Duration::from_millis(1)).await;
            current_pipeline_id()
        })
        .await;
        assert_eq!(observed, Some(id));
    }

    #[test]
    fn no_context_outside_a_scope() {
        assert_eq!(current_pipeline_id(), None);
    }
}
