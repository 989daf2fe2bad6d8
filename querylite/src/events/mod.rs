// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Event buffering and per-context delivery discipline

pub mod channel;
pub mod queue;

pub use channel::EventChannel;
pub use queue::EventQueue;
