// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Coordination layer: session registry, notification dispatch, and the
//! sinks events and errors are reported through

pub mod error;
pub mod query_coordinator;
pub mod sinks;

pub use error::CoordinatorError;
pub use query_coordinator::QueryCoordinator;
pub use sinks::{ChannelSinkProvider, DataSink, DataSinkProvider, ErrorSink, LogErrorSink};
