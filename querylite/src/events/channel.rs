// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Per-context event channel: readiness gate plus ordered delivery.
//!
//! One channel exists per coordinator session. Events published before the
//! consumer registers readiness are buffered; `mark_ready` flushes the
//! buffer exactly once, after which publishing delivers synchronously.

use std::sync::Arc;

use log::debug;
use parking_lot::Mutex;

use crate::coordinator::sinks::DataSink;
use crate::model::{ContextId, QueryEvent};

use super::queue::EventQueue;

struct ChannelState {
    ready: bool,
    queue: EventQueue,
}

/// Routes a runner's events either to the data sink (consumer ready) or
/// into the context's event queue (consumer not yet attached).
///
/// All routing happens under one short-lived lock, so the delivered
/// sequence is exactly the published sequence even when a flush races a
/// publish. Sink implementations must hand events off without calling back
/// into the coordinator.
pub struct EventChannel {
    context: ContextId,
    sink: Arc<dyn DataSink>,
    state: Mutex<ChannelState>,
}

impl EventChannel {
    pub fn new(context: ContextId, sink: Arc<dyn DataSink>) -> Self {
        EventChannel {
            context,
            sink,
            state: Mutex::new(ChannelState {
                ready: false,
                queue: EventQueue::new(),
            }),
        }
    }

    /// Deliver the event now if the consumer is ready, otherwise buffer it
    pub fn publish(&self, event: QueryEvent) {
        let mut state = self.state.lock();
        if state.ready {
            self.sink.deliver(event);
        } else {
            debug!(
                "Queueing '{}' event for context '{}' (consumer not ready)",
                event.kind(),
                self.context
            );
            state.queue.push(event);
        }
    }

    /// Mark the consumer ready and flush buffered events in FIFO order.
    ///
    /// Readiness is monotonic; calling again is a no-op and never
    /// redelivers.
    pub fn mark_ready(&self) {
        let mut state = self.state.lock();
        if state.ready {
            return;
        }
        state.ready = true;

        if !state.queue.is_empty() {
            debug!(
                "Flushing {} queued events for context '{}'",
                state.queue.len(),
                self.context
            );
        }
        for event in state.queue.drain() {
            self.sink.deliver(event);
        }
    }

    #[cfg(test)]
    pub fn queued_len(&self) -> usize {
        self.state.lock().queue.len()
    }
}
