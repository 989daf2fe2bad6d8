// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Per-context query execution state machine

pub mod elapsed;
pub mod query_runner;

pub use elapsed::format_elapsed;
pub use query_runner::{EventListener, QueryRunner};
