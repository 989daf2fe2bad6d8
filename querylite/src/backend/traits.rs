// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Abstract interface to the backend execution service.
//!
//! The coordinator never speaks a wire protocol itself; everything it needs
//! from the outside world goes through `ExecutionBackend`. Hosts implement
//! this trait over whatever transport they use and push the backend's
//! asynchronous notifications back in through
//! `QueryCoordinator::handle_notification`.

use async_trait::async_trait;

use crate::model::{
    CancelResult, ContextId, EditCellResult, EditCreateRowResult, EditSessionParams,
    EditSubsetResult, ExecutionOptions, RowSet, Selection,
};

use super::error::BackendError;

/// Backend execution service consumed by the coordinator.
///
/// All operations are scoped to an opaque context identifier. Implementations
/// must be shareable across tasks; the coordinator holds the backend behind
/// an `Arc` and calls it concurrently for independent contexts.
#[async_trait]
pub trait ExecutionBackend: Send + Sync {
    // Query execution

    /// Submit a query for the given context.
    ///
    /// # Arguments
    ///
    /// * `context` - Owning context for the execution
    /// * `selection` - Document range to execute, or `None` for the whole
    ///   document
    /// * `options` - Execution-plan display options, passed through opaquely
    ///
    /// # Returns
    ///
    /// `Ok(())` when the backend accepted the submission. Progress and
    /// completion arrive later as notifications.
    async fn run_query(
        &self,
        context: &ContextId,
        selection: Option<Selection>,
        options: &ExecutionOptions,
    ) -> Result<(), BackendError>;

    /// Submit the single statement under the given document position
    async fn run_query_statement(
        &self,
        context: &ContextId,
        line: u32,
        column: u32,
    ) -> Result<(), BackendError>;

    /// Submit a literal query text not tied to any document range
    async fn run_query_string(&self, context: &ContextId, query: &str)
        -> Result<(), BackendError>;

    /// Ask the backend to cancel the context's in-flight execution.
    ///
    /// Acknowledgment does not mean execution has stopped; the definitive
    /// end is still the `queryComplete` notification.
    async fn cancel_query(&self, context: &ContextId) -> Result<CancelResult, BackendError>;

    /// Fetch a page of rows from a completed result set.
    ///
    /// # Arguments
    ///
    /// * `row_start` - Zero-based index of the first row to fetch
    /// * `row_count` - Maximum number of rows to return
    /// * `batch_id` - Batch the result set belongs to
    /// * `result_set_id` - Result set within the batch
    async fn get_query_rows(
        &self,
        context: &ContextId,
        row_start: u64,
        row_count: u64,
        batch_id: usize,
        result_set_id: usize,
    ) -> Result<RowSet, BackendError>;

    /// Release backend resources held for the context's query
    async fn dispose_query(&self, context: &ContextId) -> Result<(), BackendError>;

    // Edit sessions

    /// Open an edit session on a database object.
    ///
    /// Readiness arrives later as an `editSessionReady` notification.
    async fn initialize_edit(
        &self,
        context: &ContextId,
        params: &EditSessionParams,
    ) -> Result<(), BackendError>;

    /// Stage a new value for one cell
    async fn update_cell(
        &self,
        context: &ContextId,
        row_id: u64,
        column_id: usize,
        new_value: &str,
    ) -> Result<EditCellResult, BackendError>;

    /// Commit all staged changes in the session
    async fn commit_edit(&self, context: &ContextId) -> Result<(), BackendError>;

    /// Stage a new row; returns its defaults and assigned id
    async fn create_row(&self, context: &ContextId) -> Result<EditCreateRowResult, BackendError>;

    /// Stage deletion of a row
    async fn delete_row(&self, context: &ContextId, row_id: u64) -> Result<(), BackendError>;

    /// Discard the staged change for one cell
    async fn revert_cell(
        &self,
        context: &ContextId,
        row_id: u64,
        column_id: usize,
    ) -> Result<EditCellResult, BackendError>;

    /// Discard all staged changes for one row
    async fn revert_row(&self, context: &ContextId, row_id: u64) -> Result<(), BackendError>;

    /// Fetch a page of rows from the edit session
    async fn get_edit_rows(
        &self,
        context: &ContextId,
        row_start: u64,
        row_count: u64,
    ) -> Result<EditSubsetResult, BackendError>;

    /// Close the edit session and release its backend resources
    async fn dispose_edit(&self, context: &ContextId) -> Result<(), BackendError>;
}
