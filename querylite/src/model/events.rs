// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Typed event and notification unions.
//!
//! `QueryEvent` is what consumers observe: a tagged union whose serialized
//! form is `{"type": ..., "data": ...}` with the historical event names as
//! tags. `QueryNotification` is the inbound counterpart: the asynchronous
//! notifications a backend pushes into the coordinator, each carrying the
//! owning context.

use serde::{Deserialize, Serialize};

use super::types::{BatchSummary, ContextId, ResultMessage, ResultSetSummary};

/// One event delivered to a context's data sink.
///
/// Events are produced by the runner in backend order and either delivered
/// immediately or buffered in the context's event queue until the consumer
/// registers readiness. The serialized tag names form the consumer-facing
/// contract: `start`, `batchStart`, `resultSet`, `batchComplete`, `message`,
/// `complete`, `editSessionReady`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "camelCase")]
pub enum QueryEvent {
    /// The backend accepted a run or edit-initialize submission
    Start,

    /// A batch began executing; carries the re-based batch summary
    BatchStart(BatchSummary),

    /// A result set completed or grew; carries the current summary
    ResultSet(ResultSetSummary),

    /// A batch finished executing
    BatchComplete(BatchSummary),

    /// Informational or error output arrived
    Message(ResultMessage),

    /// Execution ended; carries the accumulated elapsed time
    #[serde(rename_all = "camelCase")]
    Complete { total_elapsed_ms: u64 },

    /// The backend finished preparing an edit session
    #[serde(rename_all = "camelCase")]
    EditSessionReady { success: bool, message: String },
}

impl QueryEvent {
    /// The serialized tag name, for logging and diagnostics
    pub fn kind(&self) -> &'static str {
        match self {
            QueryEvent::Start => "start",
            QueryEvent::BatchStart(_) => "batchStart",
            QueryEvent::ResultSet(_) => "resultSet",
            QueryEvent::BatchComplete(_) => "batchComplete",
            QueryEvent::Message(_) => "message",
            QueryEvent::Complete { .. } => "complete",
            QueryEvent::EditSessionReady { .. } => "editSessionReady",
        }
    }
}

/// One asynchronous notification pushed by the backend.
///
/// The host's transport glue converts provider callbacks into these values
/// and hands them to `QueryCoordinator::handle_notification`, which routes
/// each to the runner owning the context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "params", rename_all = "camelCase")]
pub enum QueryNotification {
    /// A batch began executing
    BatchStart {
        context: ContextId,
        batch: BatchSummary,
    },

    /// A batch finished executing
    BatchComplete {
        context: ContextId,
        batch: BatchSummary,
    },

    /// A result set finished streaming
    #[serde(rename_all = "camelCase")]
    ResultSetComplete {
        context: ContextId,
        result_set: ResultSetSummary,
    },

    /// A still-streaming result set grew
    #[serde(rename_all = "camelCase")]
    ResultSetUpdated {
        context: ContextId,
        result_set: ResultSetSummary,
    },

    /// Informational or error output
    Message {
        context: ContextId,
        message: ResultMessage,
    },

    /// Execution ended; carries the authoritative batch set
    #[serde(rename_all = "camelCase")]
    QueryComplete {
        context: ContextId,
        batch_summaries: Vec<BatchSummary>,
    },

    /// Edit session preparation finished
    EditSessionReady {
        context: ContextId,
        success: bool,
        message: String,
    },
}

impl QueryNotification {
    /// The context this notification belongs to
    pub fn context(&self) -> &ContextId {
        match self {
            QueryNotification::BatchStart { context, .. }
            | QueryNotification::BatchComplete { context, .. }
            | QueryNotification::ResultSetComplete { context, .. }
            | QueryNotification::ResultSetUpdated { context, .. }
            | QueryNotification::Message { context, .. }
            | QueryNotification::QueryComplete { context, .. }
            | QueryNotification::EditSessionReady { context, .. } => context,
        }
    }

    /// The serialized tag name, for logging and diagnostics
    pub fn kind(&self) -> &'static str {
        match self {
            QueryNotification::BatchStart { .. } => "batchStart",
            QueryNotification::BatchComplete { .. } => "batchComplete",
            QueryNotification::ResultSetComplete { .. } => "resultSetComplete",
            QueryNotification::ResultSetUpdated { .. } => "resultSetUpdated",
            QueryNotification::Message { .. } => "message",
            QueryNotification::QueryComplete { .. } => "queryComplete",
            QueryNotification::EditSessionReady { .. } => "editSessionReady",
        }
    }
}
