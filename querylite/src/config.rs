// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Coordinator configuration

use serde::{Deserialize, Serialize};

/// Runtime configuration for the query coordinator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoordinatorConfig {
    /// Emit a synthetic message carrying each batch's execution time when
    /// the batch completes
    pub show_batch_time: bool,

    /// strftime-style format used when localizing message timestamps to
    /// clock time
    pub message_clock_format: String,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            show_batch_time: false,
            message_clock_format: "%H:%M:%S".to_string(),
        }
    }
}

impl CoordinatorConfig {
    /// Configuration with per-batch timing messages enabled
    pub fn with_batch_timing() -> Self {
        Self {
            show_batch_time: true,
            ..Self::default()
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.message_clock_format.is_empty() {
            return Err("message_clock_format must not be empty".to_string());
        }
        Ok(())
    }
}
