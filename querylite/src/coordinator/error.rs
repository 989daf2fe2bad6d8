// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Error type for coordinator operations

use thiserror::Error;

use crate::backend::BackendError;
use crate::model::ContextId;

/// Failures surfaced by coordinator and runner operations.
///
/// Out-of-band failures (mid-execution backend errors, cancel failures)
/// additionally flow to the error sink; this type covers what the immediate
/// caller sees.
#[derive(Error, Debug)]
pub enum CoordinatorError {
    /// The context has no query session (nothing was ever run or it was
    /// disposed)
    #[error("No query session for context '{0}'")]
    NoSession(ContextId),

    /// An edit or row operation arrived while the context's runner was
    /// still executing
    #[error("A query is still executing for context '{0}'")]
    ExecutionInProgress(ContextId),

    /// The backend rejected or failed the underlying request
    #[error("Backend operation failed: {0}")]
    Backend(#[from] BackendError),
}
