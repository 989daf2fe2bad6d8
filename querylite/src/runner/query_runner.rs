// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Per-context query execution state machine.
//!
//! A `QueryRunner` drives one in-flight or completed execution for a single
//! context: it submits runs to the backend, folds the backend's notifications
//! into batch/result-set state, and emits typed `QueryEvent`s through the
//! listener the coordinator installed. Runners never talk to consumers or
//! other contexts; delivery and buffering live in the coordinator's event
//! channel.
//!
//! States: Idle -> Executing -> {Completed, Failed-at-submission}; a
//! completed runner is re-armed by the next run call. Cancellation resolves
//! either through the backend's own `queryComplete` notification (backend
//! acknowledged) or through a locally forced completion (backend rejected
//! the cancel).

use std::sync::Arc;

use chrono::{DateTime, Local, Utc};
use log::{debug, error, warn};

use crate::backend::ExecutionBackend;
use crate::config::CoordinatorConfig;
use crate::coordinator::error::CoordinatorError;
use crate::model::{
    BatchSummary, CancelResult, ContextId, EditCellResult, EditCreateRowResult, EditSessionParams,
    EditSubsetResult, ExecutionOptions, QueryEvent, ResultMessage, ResultSetSummary, RowSet,
    Selection,
};

use super::elapsed::format_elapsed;

/// Callback through which the runner hands events to the coordinator
pub type EventListener = Box<dyn Fn(QueryEvent) + Send + Sync>;

/// State machine for one context's query and edit-session execution
pub struct QueryRunner {
    context: ContextId,
    title: String,
    backend: Arc<dyn ExecutionBackend>,
    config: CoordinatorConfig,
    listener: EventListener,

    // === Execution state ===
    batches: Vec<BatchSummary>,
    messages: Vec<ResultMessage>,
    is_executing: bool,
    has_completed: bool,
    total_elapsed_ms: u64,
    result_line_offset: u32,
    query_start_time: Option<DateTime<Utc>>,
    query_end_time: Option<DateTime<Utc>>,

    // === Edit session state ===
    edit_session_ready: bool,
    edit_params: Option<EditSessionParams>,
}

impl QueryRunner {
    pub fn new(
        context: ContextId,
        backend: Arc<dyn ExecutionBackend>,
        config: CoordinatorConfig,
        listener: EventListener,
    ) -> Self {
        QueryRunner {
            context,
            title: String::new(),
            backend,
            config,
            listener,
            batches: Vec::new(),
            messages: Vec::new(),
            is_executing: false,
            has_completed: false,
            total_elapsed_ms: 0,
            result_line_offset: 0,
            query_start_time: None,
            query_end_time: None,
            edit_session_ready: false,
            edit_params: None,
        }
    }

    // === Accessors ===

    pub fn context(&self) -> &ContextId {
        &self.context
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn is_executing(&self) -> bool {
        self.is_executing
    }

    pub fn has_completed(&self) -> bool {
        self.has_completed
    }

    pub fn total_elapsed_ms(&self) -> u64 {
        self.total_elapsed_ms
    }

    pub fn batches(&self) -> &[BatchSummary] {
        &self.batches
    }

    pub fn messages(&self) -> &[ResultMessage] {
        &self.messages
    }

    pub fn query_start_time(&self) -> Option<DateTime<Utc>> {
        self.query_start_time
    }

    pub fn query_end_time(&self) -> Option<DateTime<Utc>> {
        self.query_end_time
    }

    pub fn edit_session_ready(&self) -> bool {
        self.edit_session_ready
    }

    pub fn edit_params(&self) -> Option<&EditSessionParams> {
        self.edit_params.as_ref()
    }

    fn emit(&self, event: QueryEvent) {
        (self.listener)(event);
    }

    // === Run entry points ===

    /// Run the document range `selection`, or the whole document when absent.
    ///
    /// Silent no-op while a run is already executing. On submission failure
    /// no `start` event is emitted, the executing state is rolled back, and
    /// the error is returned.
    pub async fn run_query_selection(
        &mut self,
        selection: Option<Selection>,
        title: &str,
        options: ExecutionOptions,
    ) -> Result<(), CoordinatorError> {
        if self.is_executing {
            debug!(
                "Ignoring run for context '{}': a query is already executing",
                self.context
            );
            return Ok(());
        }
        self.prepare_run(title, selection.map(|s| s.start_line).unwrap_or(0));

        match self.backend.run_query(&self.context, selection, &options).await {
            Ok(()) => {
                self.submission_succeeded();
                Ok(())
            }
            Err(err) => Err(self.submission_failed(err)),
        }
    }

    /// Run the single statement under the selection's start position
    pub async fn run_query_statement(
        &mut self,
        selection: Selection,
        title: &str,
    ) -> Result<(), CoordinatorError> {
        if self.is_executing {
            debug!(
                "Ignoring statement run for context '{}': a query is already executing",
                self.context
            );
            return Ok(());
        }
        self.prepare_run(title, selection.start_line);

        match self
            .backend
            .run_query_statement(&self.context, selection.start_line, selection.start_column)
            .await
        {
            Ok(()) => {
                self.submission_succeeded();
                Ok(())
            }
            Err(err) => Err(self.submission_failed(err)),
        }
    }

    /// Run a literal query text not tied to any document range
    pub async fn run_query_text(
        &mut self,
        query: &str,
        title: &str,
    ) -> Result<(), CoordinatorError> {
        if self.is_executing {
            debug!(
                "Ignoring text run for context '{}': a query is already executing",
                self.context
            );
            return Ok(());
        }
        self.prepare_run(title, 0);

        match self.backend.run_query_string(&self.context, query).await {
            Ok(()) => {
                self.submission_succeeded();
                Ok(())
            }
            Err(err) => Err(self.submission_failed(err)),
        }
    }

    fn prepare_run(&mut self, title: &str, result_line_offset: u32) {
        self.title = title.to_string();
        self.batches.clear();
        self.messages.clear();
        self.has_completed = false;
        self.total_elapsed_ms = 0;
        self.result_line_offset = result_line_offset;
        self.query_start_time = None;
        self.query_end_time = None;
        self.edit_session_ready = false;
        self.is_executing = true;
    }

    fn submission_succeeded(&mut self) {
        self.query_start_time = Some(Utc::now());
        debug!("Query submitted for context '{}'", self.context);
        self.emit(QueryEvent::Start);
    }

    fn submission_failed(&mut self, err: crate::backend::BackendError) -> CoordinatorError {
        self.is_executing = false;
        error!(
            "Query submission failed for context '{}': {}",
            self.context, err
        );
        CoordinatorError::Backend(err)
    }

    // === Backend notification handlers ===

    /// A batch began executing: re-base its selection onto document
    /// coordinates, reset its result sets, store it, emit `batchStart`.
    pub fn handle_batch_start(&mut self, mut batch: BatchSummary) {
        batch.offset_selection(self.result_line_offset);
        batch.result_set_summaries = Vec::new();
        self.store_batch(batch.clone());
        self.emit(QueryEvent::BatchStart(batch));
    }

    /// A batch finished: store the finalized summary, accumulate its elapsed
    /// time, optionally emit a timing message, emit `batchComplete`.
    pub fn handle_batch_complete(&mut self, mut batch: BatchSummary) {
        batch.offset_selection(self.result_line_offset);
        let elapsed = batch.execution_elapsed_ms;
        self.total_elapsed_ms += elapsed;
        self.store_batch(batch.clone());

        if elapsed > 0 && self.config.show_batch_time {
            let message = ResultMessage {
                batch_id: Some(batch.id),
                is_error: false,
                time: None,
                message: format!("Batch execution time: {}", format_elapsed(elapsed)),
            };
            self.messages.push(message.clone());
            self.emit(QueryEvent::Message(message));
        }

        self.emit(QueryEvent::BatchComplete(batch));
    }

    /// A result set finished streaming: resolve its batch (falling back to
    /// batch 0 when the backend omitted the id), store it, emit `resultSet`.
    pub fn handle_result_set_complete(&mut self, result_set: ResultSetSummary) {
        let batch_idx = match self.resolve_batch(result_set.batch_id, true) {
            Some(idx) => idx,
            None => return,
        };

        let summaries = &mut self.batches[batch_idx].result_set_summaries;
        let id = result_set.id;
        if id < summaries.len() {
            // Re-announcement of a known set: the newer summary wins
            summaries[id] = result_set.clone();
            self.emit(QueryEvent::ResultSet(result_set));
            return;
        }
        while summaries.len() < id {
            warn!(
                "Result set {} for batch {} on context '{}' arrived out of order; padding slot {}",
                id,
                batch_idx,
                self.context,
                summaries.len()
            );
            summaries.push(ResultSetSummary {
                id: summaries.len(),
                batch_id: Some(batch_idx),
                row_count: 0,
                column_info: Vec::new(),
                complete: false,
            });
        }
        summaries.push(result_set.clone());

        self.emit(QueryEvent::ResultSet(result_set));
    }

    /// A still-streaming result set grew: replace the stored summary and
    /// re-emit `resultSet` with the updated counts.
    pub fn handle_result_set_updated(&mut self, result_set: ResultSetSummary) {
        let batch_idx = match self.resolve_batch(result_set.batch_id, false) {
            Some(idx) => idx,
            None => return,
        };

        let summaries = &mut self.batches[batch_idx].result_set_summaries;
        match summaries.get_mut(result_set.id) {
            Some(slot) => *slot = result_set.clone(),
            None => {
                warn!(
                    "Dropping update for unknown result set {} of batch {} on context '{}'",
                    result_set.id, batch_idx, self.context
                );
                return;
            }
        }

        self.emit(QueryEvent::ResultSet(result_set));
    }

    /// Informational or error output arrived: localize its timestamp to
    /// clock time, append it to the message log, emit `message`.
    pub fn handle_message(&mut self, mut message: ResultMessage) {
        message.time = Some(self.localize_time(message.time.as_deref()));
        self.messages.push(message.clone());
        self.emit(QueryEvent::Message(message));
    }

    /// Execution ended: the backend's batch set is authoritative and replaces
    /// everything built incrementally. Emits `complete` with the accumulated
    /// elapsed time.
    pub fn handle_query_complete(&mut self, batch_summaries: Vec<BatchSummary>) {
        self.query_end_time = Some(Utc::now());
        self.is_executing = false;
        self.has_completed = true;

        let offset = self.result_line_offset;
        self.batches = batch_summaries
            .into_iter()
            .map(|mut batch| {
                batch.offset_selection(offset);
                batch
            })
            .collect();

        debug!(
            "Query completed for context '{}' in {}ms across {} batches",
            self.context,
            self.total_elapsed_ms,
            self.batches.len()
        );
        self.emit(QueryEvent::Complete {
            total_elapsed_ms: self.total_elapsed_ms,
        });
    }

    /// The backend finished preparing the edit session
    pub fn handle_edit_session_ready(&mut self, success: bool, message: String) {
        self.edit_session_ready = success;
        self.is_executing = false;
        if !success {
            warn!(
                "Edit session failed for context '{}': {}",
                self.context, message
            );
        }
        self.emit(QueryEvent::EditSessionReady { success, message });
    }

    // === Cancellation ===

    /// Ask the backend to cancel the in-flight execution.
    ///
    /// Backend acknowledgment does not end the run; the `queryComplete`
    /// notification still does. If the backend rejects the cancel, the run
    /// is forced complete locally (one `complete` event, elapsed 0) so
    /// consumers are not left waiting on state the backend may never
    /// deliver, and the error is returned.
    pub async fn cancel_query(&mut self) -> Result<CancelResult, CoordinatorError> {
        match self.backend.cancel_query(&self.context).await {
            Ok(result) => {
                debug!("Cancel acknowledged for context '{}'", self.context);
                Ok(result)
            }
            Err(err) => {
                error!(
                    "Cancel failed for context '{}'; forcing local completion: {}",
                    self.context, err
                );
                self.force_complete();
                Err(CoordinatorError::Backend(err))
            }
        }
    }

    /// Mark the run complete locally without backend confirmation
    fn force_complete(&mut self) {
        self.is_executing = false;
        self.has_completed = true;
        self.query_end_time = Some(Utc::now());
        self.emit(QueryEvent::Complete { total_elapsed_ms: 0 });
    }

    // === Row retrieval ===

    /// Fetch a page of rows from a result set. Pure delegation; nothing is
    /// cached locally.
    pub async fn get_query_rows(
        &self,
        row_start: u64,
        row_count: u64,
        batch_id: usize,
        result_set_id: usize,
    ) -> Result<RowSet, CoordinatorError> {
        let rows = self
            .backend
            .get_query_rows(&self.context, row_start, row_count, batch_id, result_set_id)
            .await?;
        Ok(rows)
    }

    // === Edit session operations ===

    /// Open an edit session on a database object.
    ///
    /// Follows the same executing guard as the run entry points; readiness
    /// arrives later through `handle_edit_session_ready`.
    pub async fn initialize_edit(
        &mut self,
        params: EditSessionParams,
    ) -> Result<(), CoordinatorError> {
        if self.is_executing {
            debug!(
                "Ignoring edit initialize for context '{}': a query is already executing",
                self.context
            );
            return Ok(());
        }
        self.edit_session_ready = false;
        self.has_completed = false;
        self.total_elapsed_ms = 0;
        self.is_executing = true;

        match self.backend.initialize_edit(&self.context, &params).await {
            Ok(()) => {
                self.edit_params = Some(params);
                debug!("Edit session submitted for context '{}'", self.context);
                self.emit(QueryEvent::Start);
                Ok(())
            }
            Err(err) => {
                self.is_executing = false;
                error!(
                    "Edit initialize failed for context '{}': {}",
                    self.context, err
                );
                Err(CoordinatorError::Backend(err))
            }
        }
    }

    pub async fn update_cell(
        &self,
        row_id: u64,
        column_id: usize,
        new_value: &str,
    ) -> Result<EditCellResult, CoordinatorError> {
        let result = self
            .backend
            .update_cell(&self.context, row_id, column_id, new_value)
            .await?;
        Ok(result)
    }

    pub async fn commit_edit(&self) -> Result<(), CoordinatorError> {
        self.backend.commit_edit(&self.context).await?;
        Ok(())
    }

    pub async fn create_row(&self) -> Result<EditCreateRowResult, CoordinatorError> {
        let result = self.backend.create_row(&self.context).await?;
        Ok(result)
    }

    pub async fn delete_row(&self, row_id: u64) -> Result<(), CoordinatorError> {
        self.backend.delete_row(&self.context, row_id).await?;
        Ok(())
    }

    pub async fn revert_cell(
        &self,
        row_id: u64,
        column_id: usize,
    ) -> Result<EditCellResult, CoordinatorError> {
        let result = self
            .backend
            .revert_cell(&self.context, row_id, column_id)
            .await?;
        Ok(result)
    }

    pub async fn revert_row(&self, row_id: u64) -> Result<(), CoordinatorError> {
        self.backend.revert_row(&self.context, row_id).await?;
        Ok(())
    }

    pub async fn get_edit_rows(
        &self,
        row_start: u64,
        row_count: u64,
    ) -> Result<EditSubsetResult, CoordinatorError> {
        let result = self
            .backend
            .get_edit_rows(&self.context, row_start, row_count)
            .await?;
        Ok(result)
    }

    pub async fn dispose_edit(&self) -> Result<(), CoordinatorError> {
        self.backend.dispose_edit(&self.context).await?;
        Ok(())
    }

    /// Release backend resources for the query itself
    pub async fn dispose(&self) -> Result<(), CoordinatorError> {
        self.backend.dispose_query(&self.context).await?;
        Ok(())
    }

    // === Internal helpers ===

    /// Resolve the batch index a result set belongs to.
    ///
    /// A present `batch_id` must name a known batch or the notification is
    /// dropped. A missing `batch_id` falls back to batch 0; when
    /// `synthesize` is set and no batch exists yet, a placeholder batch 0 is
    /// created so the result set has somewhere to live.
    fn resolve_batch(&mut self, batch_id: Option<usize>, synthesize: bool) -> Option<usize> {
        match batch_id {
            Some(id) if id < self.batches.len() => Some(id),
            Some(id) => {
                warn!(
                    "Dropping result set for unknown batch {} on context '{}'",
                    id, self.context
                );
                None
            }
            None => {
                warn!(
                    "Result set for context '{}' arrived without a batch id; attaching to batch 0",
                    self.context
                );
                if self.batches.is_empty() {
                    if !synthesize {
                        return None;
                    }
                    self.batches.push(BatchSummary::placeholder(0));
                }
                Some(0)
            }
        }
    }

    /// Store a batch at its backend-assigned index, padding any gap with
    /// placeholder batches
    fn store_batch(&mut self, batch: BatchSummary) {
        let id = batch.id;
        if id < self.batches.len() {
            self.batches[id] = batch;
            return;
        }
        while self.batches.len() < id {
            warn!(
                "Batch {} for context '{}' arrived out of order; padding slot {}",
                id,
                self.context,
                self.batches.len()
            );
            let placeholder = BatchSummary::placeholder(self.batches.len());
            self.batches.push(placeholder);
        }
        self.batches.push(batch);
    }

    /// Rewrite a backend timestamp as local clock time for display
    fn localize_time(&self, time: Option<&str>) -> String {
        use std::fmt::Write as _;

        let stamp = time
            .and_then(|t| DateTime::parse_from_rfc3339(t).ok())
            .map(|t| t.with_timezone(&Local))
            .unwrap_or_else(Local::now);

        let mut out = String::new();
        if write!(out, "{}", stamp.format(&self.config.message_clock_format)).is_err() {
            return stamp.format("%H:%M:%S").to_string();
        }
        out
    }
}
