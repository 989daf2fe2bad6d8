// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Backend execution service abstraction

pub mod error;
pub mod traits;

pub use error::BackendError;
pub use traits::ExecutionBackend;
