// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! QueryLite - A lightweight query execution coordination engine
//!
//! QueryLite coordinates query execution between frontend consumers (editors,
//! result grids) and a backend execution service, one session per context.
//!
//! # Features
//!
//! - **Session Coordination**: One runner per context, at most one concurrent
//!   execution, silent guards against double submission
//! - **Ordered Event Delivery**: Typed lifecycle events delivered to each
//!   context's sink in backend order
//! - **Deferred Consumers**: Events are buffered until the consumer registers
//!   readiness, then replayed FIFO exactly once
//! - **Line Re-basing**: Batch selections are re-based against the executed
//!   selection so they map back to document coordinates
//! - **Edit Sessions**: Initialize, mutate, and commit row edits over the
//!   same session and event plumbing
//! - **Pluggable Backends**: The execution service is a trait; any transport
//!   or engine can sit behind it
//!
//! # Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use querylite::{ChannelSinkProvider, ContextId, QueryCoordinator};
//!
//! let sinks = Arc::new(ChannelSinkProvider::new());
//! let coordinator = QueryCoordinator::with_defaults(backend, sinks.clone());
//!
//! // Submit a run, then surface its events once the grid is up.
//! let ctx = ContextId::from("untitled-1");
//! coordinator.run_query_text(&ctx, "MATCH (n) RETURN n", "untitled-1").await?;
//! let mut events = sinks.take_receiver(&ctx).unwrap();
//! coordinator.register_consumer_ready(&ctx);
//! while let Some(event) = events.recv().await {
//!     println!("{}", event.kind());
//! }
//! ```

// Public modules - exposed to external users
pub mod backend;
pub mod config;
pub mod coordinator;
pub mod model;

// Internal modules - only visible within querylite crate
pub(crate) mod events;
pub(crate) mod runner;

// Re-export the public API - QueryCoordinator is the main entry point
pub use backend::{BackendError, ExecutionBackend};
pub use config::CoordinatorConfig;
pub use coordinator::{
    ChannelSinkProvider, CoordinatorError, DataSink, DataSinkProvider, ErrorSink, LogErrorSink,
    QueryCoordinator,
};

// Re-export the model types (needed for building requests and inspecting events)
pub use model::{
    BatchSummary, CancelResult, CellValue, ColumnInfo, ContextId, EditCell, EditCellResult,
    EditCreateRowResult, EditRow, EditRowState, EditSessionParams, EditSubsetResult,
    ExecutionOptions, QueryEvent, QueryNotification, ResultMessage, ResultSetSummary, RowSet,
    Selection,
};

/// QueryLite version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// QueryLite crate name
pub const CRATE_NAME: &str = env!("CARGO_PKG_NAME");
