// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Error type for the backend execution service interface

use thiserror::Error;

/// Failures reported by a backend execution service.
///
/// Submission-time rejections surface synchronously through these variants;
/// mid-execution failures arrive instead as error-tagged `message`
/// notifications and never through this type.
#[derive(Error, Debug)]
pub enum BackendError {
    /// The service refused the request (bad query, unknown context, busy)
    #[error("Request rejected by backend: {0}")]
    Rejected(String),

    /// The service could not be reached or went away mid-request
    #[error("Backend unavailable: {0}")]
    Unavailable(String),

    /// A row fetch named a batch/result-set pair the backend does not have
    #[error("No result set at batch {batch_id}, result set {result_set_id}")]
    InvalidSubset {
        batch_id: usize,
        result_set_id: usize,
    },

    /// An edit operation arrived for a context with no initialized session
    #[error("No edit session for context '{0}'")]
    NoEditSession(String),

    /// Backend-internal failure that fits no other variant
    #[error("Internal backend error: {0}")]
    Internal(String),
}
