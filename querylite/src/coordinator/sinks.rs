// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Consumer-facing delivery seams.
//!
//! A `DataSink` is where one context's events land once delivered; the
//! coordinator obtains one per session from a `DataSinkProvider` when the
//! session is created. Out-of-band failures that no caller is waiting on
//! (cancel rejections, edit mutation failures) go to the `ErrorSink`.
//!
//! The crate ships two ready-made implementations: `ChannelSinkProvider`,
//! which backs every sink with an unbounded tokio channel, and
//! `LogErrorSink`, which writes errors to the log.

use std::collections::HashMap;
use std::sync::Arc;

use log::{error, warn};
use parking_lot::Mutex;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use crate::model::{ContextId, QueryEvent};

/// Delivery target for one context's events.
///
/// `deliver` is called on whatever task published or flushed the event and
/// must hand the event off quickly without calling back into the
/// coordinator.
pub trait DataSink: Send + Sync {
    /// Deliver one event to the consumer
    fn deliver(&self, event: QueryEvent);
}

/// Creates the data sink for a context when its session is created.
///
/// # Arguments
///
/// The context id is passed so providers can key per-context plumbing
/// (channels, subscriptions) off it.
pub trait DataSinkProvider: Send + Sync {
    /// Create the sink that will receive the context's events
    fn create_sink(&self, context: &ContextId) -> Arc<dyn DataSink>;
}

/// Receiver for failures no caller is positioned to observe
pub trait ErrorSink: Send + Sync {
    /// Report an out-of-band failure for a context
    fn report(&self, context: &ContextId, message: &str);
}

/// `DataSink` backed by an unbounded tokio channel
struct ChannelSink {
    context: ContextId,
    tx: UnboundedSender<QueryEvent>,
}

impl DataSink for ChannelSink {
    fn deliver(&self, event: QueryEvent) {
        if self.tx.send(event).is_err() {
            warn!(
                "Dropping event for context '{}': consumer receiver was dropped",
                self.context
            );
        }
    }
}

/// `DataSinkProvider` that backs each context's sink with an unbounded
/// tokio mpsc channel.
///
/// The consumer side fetches its receiver with `take_receiver` and should
/// do so before calling `register_consumer_ready`, otherwise flushed events
/// sit in the channel until it does.
///
/// # Example
///
/// ```rust,ignore
/// let sinks = Arc::new(ChannelSinkProvider::new());
/// let coordinator = QueryCoordinator::new(backend, sinks.clone(), errors, config);
/// coordinator.run_query_text(&ctx, "SELECT 1", "untitled").await?;
/// let mut rx = sinks.take_receiver(&ctx).expect("sink exists after run");
/// coordinator.register_consumer_ready(&ctx);
/// while let Some(event) = rx.recv().await { /* render */ }
/// ```
#[derive(Default)]
pub struct ChannelSinkProvider {
    receivers: Mutex<HashMap<ContextId, UnboundedReceiver<QueryEvent>>>,
}

impl ChannelSinkProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take ownership of the receiver for a context's events.
    ///
    /// # Returns
    ///
    /// `None` if no sink was created for the context yet, or the receiver
    /// was already taken.
    pub fn take_receiver(&self, context: &ContextId) -> Option<UnboundedReceiver<QueryEvent>> {
        self.receivers.lock().remove(context)
    }
}

impl DataSinkProvider for ChannelSinkProvider {
    fn create_sink(&self, context: &ContextId) -> Arc<dyn DataSink> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.receivers.lock().insert(context.clone(), rx);
        Arc::new(ChannelSink {
            context: context.clone(),
            tx,
        })
    }
}

/// `ErrorSink` that reports through the log
#[derive(Debug, Default)]
pub struct LogErrorSink;

impl ErrorSink for LogErrorSink {
    fn report(&self, context: &ContextId, message: &str) {
        error!("Query error for context '{}': {}", context, message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_sink_round_trip() {
        let provider = ChannelSinkProvider::new();
        let ctx = ContextId::from("ctx");

        let sink = provider.create_sink(&ctx);
        sink.deliver(QueryEvent::Start);

        let mut rx = provider.take_receiver(&ctx).expect("receiver registered");
        let event = rx.try_recv().expect("event delivered");
        assert_eq!(event.kind(), "start");
    }

    #[test]
    fn test_take_receiver_is_one_shot() {
        let provider = ChannelSinkProvider::new();
        let ctx = ContextId::from("ctx");

        let _sink = provider.create_sink(&ctx);
        assert!(provider.take_receiver(&ctx).is_some());
        assert!(provider.take_receiver(&ctx).is_none());
    }

    #[test]
    fn test_deliver_without_receiver_does_not_panic() {
        let provider = ChannelSinkProvider::new();
        let ctx = ContextId::from("ctx");

        let sink = provider.create_sink(&ctx);
        drop(provider.take_receiver(&ctx));
        sink.deliver(QueryEvent::Start);
    }
}
