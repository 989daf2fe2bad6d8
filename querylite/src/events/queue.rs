// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Ordered event buffer for a single context

use std::collections::VecDeque;

use crate::model::QueryEvent;

/// FIFO buffer holding events produced before the context's consumer
/// attached.
///
/// The queue is a single ordered stream: batch, result-set and message
/// events all share one sequence, so draining reproduces exactly the order
/// a live consumer would have observed.
#[derive(Debug, Default)]
pub struct EventQueue {
    entries: VecDeque<QueryEvent>,
}

impl EventQueue {
    pub fn new() -> Self {
        EventQueue {
            entries: VecDeque::new(),
        }
    }

    /// Append an event in arrival order
    pub fn push(&mut self, event: QueryEvent) {
        self.entries.push_back(event);
    }

    /// Remove and return all buffered events, oldest first.
    ///
    /// The queue is empty afterwards; a second drain yields nothing, which
    /// is what makes flush-on-ready exactly-once.
    pub fn drain(&mut self) -> Vec<QueryEvent> {
        self.entries.drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
