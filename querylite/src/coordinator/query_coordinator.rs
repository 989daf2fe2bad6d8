// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Query Coordinator - Central orchestration for query execution
//!
//! The QueryCoordinator owns one session per context: the runner state
//! machine, the event channel that buffers or delivers the runner's events,
//! and the selection history recorded from batch starts. It routes commands
//! to the right runner, dispatches backend notifications, and flushes
//! buffered events when a consumer declares readiness.
//!
//! One coordinator is constructed per application instance and shared by
//! `Arc`; there is no global registry.

use std::collections::HashMap;
use std::sync::Arc;

use log::{debug, info, warn};
use parking_lot::{Mutex, RwLock};
use tokio::sync::Mutex as AsyncMutex;

use crate::backend::ExecutionBackend;
use crate::config::CoordinatorConfig;
use crate::events::EventChannel;
use crate::model::{
    BatchSummary, CancelResult, ContextId, EditCellResult, EditCreateRowResult, EditSessionParams,
    EditSubsetResult, ExecutionOptions, QueryEvent, QueryNotification, ResultMessage, RowSet,
    Selection,
};
use crate::runner::{EventListener, QueryRunner};

use super::error::CoordinatorError;
use super::sinks::{DataSinkProvider, ErrorSink, LogErrorSink};

/// Per-context session state owned by the coordinator.
///
/// The runner sits behind an async mutex so every command and notification
/// for a context is serialized; the channel and history have their own short
/// locks and are shared with the runner's event listener.
struct SessionState {
    runner: AsyncMutex<QueryRunner>,
    channel: Arc<EventChannel>,
    selection_history: Arc<Mutex<Vec<Selection>>>,
}

/// Central coordination point for query and edit-session execution.
///
/// The coordinator multiplexes many independent contexts over one backend
/// execution service. For each context it maintains at most one runner,
/// guarantees at most one concurrent execution, and delivers the runner's
/// events to the context's data sink in backend order, buffering them until
/// the consumer registers readiness.
///
/// # Example
///
/// ```rust,ignore
/// let sinks = Arc::new(ChannelSinkProvider::new());
/// let coordinator = QueryCoordinator::with_defaults(backend, sinks.clone());
///
/// let ctx = ContextId::from("editor-1");
/// coordinator
///     .run_query_selection(&ctx, Some(selection), "query1.sql", Default::default())
///     .await?;
/// coordinator.register_consumer_ready(&ctx);
/// ```
pub struct QueryCoordinator {
    backend: Arc<dyn ExecutionBackend>,
    sink_provider: Arc<dyn DataSinkProvider>,
    error_sink: Arc<dyn ErrorSink>,
    config: CoordinatorConfig,
    sessions: RwLock<HashMap<ContextId, Arc<SessionState>>>,
}

impl QueryCoordinator {
    /// Create a coordinator with explicit collaborators.
    ///
    /// # Arguments
    ///
    /// * `backend` - The backend execution service
    /// * `sink_provider` - Creates the per-context data sinks events are
    ///   delivered to
    /// * `error_sink` - Receives out-of-band failures (cancel rejections,
    ///   edit mutation failures)
    /// * `config` - Runtime configuration
    pub fn new(
        backend: Arc<dyn ExecutionBackend>,
        sink_provider: Arc<dyn DataSinkProvider>,
        error_sink: Arc<dyn ErrorSink>,
        config: CoordinatorConfig,
    ) -> Self {
        QueryCoordinator {
            backend,
            sink_provider,
            error_sink,
            config,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Create a coordinator with default configuration and log-based error
    /// reporting
    pub fn with_defaults(
        backend: Arc<dyn ExecutionBackend>,
        sink_provider: Arc<dyn DataSinkProvider>,
    ) -> Self {
        Self::new(
            backend,
            sink_provider,
            Arc::new(LogErrorSink),
            CoordinatorConfig::default(),
        )
    }

    // === Run entry points ===

    /// Run a document range for the given context, or the whole document
    /// when `selection` is `None`.
    ///
    /// If the context's runner is already executing this is a silent no-op.
    /// Otherwise the existing runner is reused (its selection history
    /// cleared) or a new session is created, and the run is submitted.
    ///
    /// # Returns
    ///
    /// `Ok(())` once the backend accepted the submission (or the call was a
    /// no-op); the submission error otherwise.
    pub async fn run_query_selection(
        &self,
        context: &ContextId,
        selection: Option<Selection>,
        title: &str,
        options: ExecutionOptions,
    ) -> Result<(), CoordinatorError> {
        let session = self.ensure_session(context);
        let mut runner = session.runner.lock().await;
        if runner.is_executing() {
            debug!(
                "Ignoring run for context '{}': a query is already executing",
                context
            );
            return Ok(());
        }
        session.selection_history.lock().clear();
        runner.run_query_selection(selection, title, options).await
    }

    /// Run the single statement under the selection's start position
    pub async fn run_query_statement(
        &self,
        context: &ContextId,
        selection: Selection,
        title: &str,
    ) -> Result<(), CoordinatorError> {
        let session = self.ensure_session(context);
        let mut runner = session.runner.lock().await;
        if runner.is_executing() {
            debug!(
                "Ignoring statement run for context '{}': a query is already executing",
                context
            );
            return Ok(());
        }
        session.selection_history.lock().clear();
        runner.run_query_statement(selection, title).await
    }

    /// Run a literal query text for the given context
    pub async fn run_query_text(
        &self,
        context: &ContextId,
        query: &str,
        title: &str,
    ) -> Result<(), CoordinatorError> {
        let session = self.ensure_session(context);
        let mut runner = session.runner.lock().await;
        if runner.is_executing() {
            debug!(
                "Ignoring text run for context '{}': a query is already executing",
                context
            );
            return Ok(());
        }
        session.selection_history.lock().clear();
        runner.run_query_text(query, title).await
    }

    // === Cancellation ===

    /// Cancel the context's in-flight execution.
    ///
    /// No-op returning `Ok(None)` when the context is unknown or idle. When
    /// the backend rejects the cancel, the failure is reported to the error
    /// sink, the runner forces a local completion so consumers converge, and
    /// the error is returned.
    pub async fn cancel_query(
        &self,
        context: &ContextId,
    ) -> Result<Option<CancelResult>, CoordinatorError> {
        let Some(session) = self.session(context) else {
            debug!("Cancel for unknown context '{}' is a no-op", context);
            return Ok(None);
        };
        let mut runner = session.runner.lock().await;
        if !runner.is_executing() {
            debug!("Cancel for idle context '{}' is a no-op", context);
            return Ok(None);
        }

        match runner.cancel_query().await {
            Ok(result) => Ok(Some(result)),
            Err(err) => {
                self.error_sink
                    .report(context, &format!("Canceling the query failed: {err}"));
                Err(err)
            }
        }
    }

    // === Row retrieval ===

    /// Fetch a page of rows from one of the context's result sets
    pub async fn get_query_rows(
        &self,
        context: &ContextId,
        row_start: u64,
        row_count: u64,
        batch_id: usize,
        result_set_id: usize,
    ) -> Result<RowSet, CoordinatorError> {
        let session = self.session_or_err(context)?;
        let runner = session.runner.lock().await;
        runner
            .get_query_rows(row_start, row_count, batch_id, result_set_id)
            .await
    }

    // === Notification dispatch ===

    /// Route one backend notification to the runner owning its context.
    ///
    /// Notifications for unknown contexts are dropped with a warning; they
    /// are asynchronous and have no caller to fail.
    pub async fn handle_notification(&self, notification: QueryNotification) {
        let context = notification.context().clone();
        let Some(session) = self.session(&context) else {
            warn!(
                "Dropping '{}' notification for unknown context '{}'",
                notification.kind(),
                context
            );
            return;
        };

        debug!(
            "Dispatching '{}' notification for context '{}'",
            notification.kind(),
            context
        );
        let mut runner = session.runner.lock().await;
        match notification {
            QueryNotification::BatchStart { batch, .. } => runner.handle_batch_start(batch),
            QueryNotification::BatchComplete { batch, .. } => runner.handle_batch_complete(batch),
            QueryNotification::ResultSetComplete { result_set, .. } => {
                runner.handle_result_set_complete(result_set)
            }
            QueryNotification::ResultSetUpdated { result_set, .. } => {
                runner.handle_result_set_updated(result_set)
            }
            QueryNotification::Message { message, .. } => runner.handle_message(message),
            QueryNotification::QueryComplete {
                batch_summaries, ..
            } => runner.handle_query_complete(batch_summaries),
            QueryNotification::EditSessionReady {
                success, message, ..
            } => runner.handle_edit_session_ready(success, message),
        }
    }

    // === Consumer readiness ===

    /// Mark the context's consumer ready and flush its buffered events in
    /// FIFO order.
    ///
    /// Readiness is monotonic: later calls are no-ops and events published
    /// after this point are delivered synchronously.
    pub fn register_consumer_ready(&self, context: &ContextId) {
        match self.session(context) {
            Some(session) => session.channel.mark_ready(),
            None => warn!("Consumer ready for unknown context '{}'", context),
        }
    }

    // === Edit sessions ===

    /// Open an edit session on a database object for the given context.
    ///
    /// Follows the same silent guard as the run entry points; failures are
    /// reported to the error sink and returned.
    pub async fn initialize_edit(
        &self,
        context: &ContextId,
        params: EditSessionParams,
    ) -> Result<(), CoordinatorError> {
        let session = self.ensure_session(context);
        let mut runner = session.runner.lock().await;
        if runner.is_executing() {
            debug!(
                "Ignoring edit initialize for context '{}': a query is already executing",
                context
            );
            return Ok(());
        }
        session.selection_history.lock().clear();

        match runner.initialize_edit(params).await {
            Ok(()) => Ok(()),
            Err(err) => {
                self.error_sink.report(
                    context,
                    &format!("Failed to initialize the edit session: {err}"),
                );
                Err(err)
            }
        }
    }

    /// Stage a new value for one cell. Failures are reported to the error
    /// sink and returned.
    pub async fn update_cell(
        &self,
        context: &ContextId,
        row_id: u64,
        column_id: usize,
        new_value: &str,
    ) -> Result<EditCellResult, CoordinatorError> {
        let session = self.session_or_err(context)?;
        let runner = session.runner.lock().await;
        self.guard_not_executing(context, &runner)?;
        match runner.update_cell(row_id, column_id, new_value).await {
            Ok(result) => Ok(result),
            Err(err) => {
                self.error_sink
                    .report(context, &format!("Failed to update the cell: {err}"));
                Err(err)
            }
        }
    }

    /// Commit all staged changes in the context's edit session. Failures
    /// are reported to the error sink and returned.
    pub async fn commit_edit(&self, context: &ContextId) -> Result<(), CoordinatorError> {
        let session = self.session_or_err(context)?;
        let runner = session.runner.lock().await;
        self.guard_not_executing(context, &runner)?;
        match runner.commit_edit().await {
            Ok(()) => Ok(()),
            Err(err) => {
                self.error_sink
                    .report(context, &format!("Failed to commit the edit session: {err}"));
                Err(err)
            }
        }
    }

    /// Stage a new row in the context's edit session
    pub async fn create_row(
        &self,
        context: &ContextId,
    ) -> Result<EditCreateRowResult, CoordinatorError> {
        let session = self.session_or_err(context)?;
        let runner = session.runner.lock().await;
        self.guard_not_executing(context, &runner)?;
        runner.create_row().await
    }

    /// Stage deletion of a row in the context's edit session
    pub async fn delete_row(
        &self,
        context: &ContextId,
        row_id: u64,
    ) -> Result<(), CoordinatorError> {
        let session = self.session_or_err(context)?;
        let runner = session.runner.lock().await;
        self.guard_not_executing(context, &runner)?;
        runner.delete_row(row_id).await
    }

    /// Discard the staged change for one cell
    pub async fn revert_cell(
        &self,
        context: &ContextId,
        row_id: u64,
        column_id: usize,
    ) -> Result<EditCellResult, CoordinatorError> {
        let session = self.session_or_err(context)?;
        let runner = session.runner.lock().await;
        self.guard_not_executing(context, &runner)?;
        runner.revert_cell(row_id, column_id).await
    }

    /// Discard all staged changes for one row
    pub async fn revert_row(
        &self,
        context: &ContextId,
        row_id: u64,
    ) -> Result<(), CoordinatorError> {
        let session = self.session_or_err(context)?;
        let runner = session.runner.lock().await;
        self.guard_not_executing(context, &runner)?;
        runner.revert_row(row_id).await
    }

    /// Fetch a page of rows from the context's edit session
    pub async fn get_edit_rows(
        &self,
        context: &ContextId,
        row_start: u64,
        row_count: u64,
    ) -> Result<EditSubsetResult, CoordinatorError> {
        let session = self.session_or_err(context)?;
        let runner = session.runner.lock().await;
        self.guard_not_executing(context, &runner)?;
        runner.get_edit_rows(row_start, row_count).await
    }

    // === Disposal ===

    /// Release the context's query resources and remove its session.
    ///
    /// Unknown contexts are a no-op success. A backend disposal failure is
    /// logged but does not keep the session alive.
    pub async fn dispose(&self, context: &ContextId) -> Result<(), CoordinatorError> {
        let Some(session) = self.session(context) else {
            debug!("Dispose for unknown context '{}' is a no-op", context);
            return Ok(());
        };

        let runner = session.runner.lock().await;
        if let Err(err) = runner.dispose().await {
            warn!(
                "Backend query disposal failed for context '{}': {}",
                context, err
            );
        }
        drop(runner);

        self.remove_session(context);
        Ok(())
    }

    /// Close the context's edit session and remove its session entry.
    ///
    /// Unknown contexts are a no-op success, mirroring `dispose`.
    pub async fn dispose_edit(&self, context: &ContextId) -> Result<(), CoordinatorError> {
        let Some(session) = self.session(context) else {
            debug!("Edit dispose for unknown context '{}' is a no-op", context);
            return Ok(());
        };

        let runner = session.runner.lock().await;
        if let Err(err) = runner.dispose_edit().await {
            warn!(
                "Backend edit disposal failed for context '{}': {}",
                context, err
            );
        }
        drop(runner);

        self.remove_session(context);
        Ok(())
    }

    // === State inspection ===

    /// Whether the context currently has an executing query
    pub async fn is_running_query(&self, context: &ContextId) -> bool {
        match self.session(context) {
            Some(session) => session.runner.lock().await.is_executing(),
            None => false,
        }
    }

    /// Whether any session exists for the context
    pub fn has_session(&self, context: &ContextId) -> bool {
        self.sessions.read().contains_key(context)
    }

    /// Number of live sessions across all contexts
    pub fn session_count(&self) -> usize {
        self.sessions.read().len()
    }

    /// Batch selections recorded from the context's batch starts, oldest
    /// first. Empty when the context is unknown.
    pub fn selection_history(&self, context: &ContextId) -> Vec<Selection> {
        match self.session(context) {
            Some(session) => session.selection_history.lock().clone(),
            None => Vec::new(),
        }
    }

    /// The context's current batch summaries. Empty when the context is
    /// unknown.
    pub async fn batch_sets(&self, context: &ContextId) -> Vec<BatchSummary> {
        match self.session(context) {
            Some(session) => session.runner.lock().await.batches().to_vec(),
            None => Vec::new(),
        }
    }

    /// The context's message log, oldest first. Empty when the context is
    /// unknown.
    pub async fn messages(&self, context: &ContextId) -> Vec<ResultMessage> {
        match self.session(context) {
            Some(session) => session.runner.lock().await.messages().to_vec(),
            None => Vec::new(),
        }
    }

    // === Internal helpers ===

    fn session(&self, context: &ContextId) -> Option<Arc<SessionState>> {
        self.sessions.read().get(context).cloned()
    }

    fn session_or_err(&self, context: &ContextId) -> Result<Arc<SessionState>, CoordinatorError> {
        self.session(context)
            .ok_or_else(|| CoordinatorError::NoSession(context.clone()))
    }

    fn guard_not_executing(
        &self,
        context: &ContextId,
        runner: &QueryRunner,
    ) -> Result<(), CoordinatorError> {
        if runner.is_executing() {
            Err(CoordinatorError::ExecutionInProgress(context.clone()))
        } else {
            Ok(())
        }
    }

    /// Find the context's session or create one, wiring a fresh runner to
    /// its event channel and selection history
    fn ensure_session(&self, context: &ContextId) -> Arc<SessionState> {
        if let Some(session) = self.session(context) {
            return session;
        }

        let mut sessions = self.sessions.write();
        if let Some(session) = sessions.get(context) {
            return session.clone();
        }

        let sink = self.sink_provider.create_sink(context);
        let channel = Arc::new(EventChannel::new(context.clone(), sink));
        let selection_history: Arc<Mutex<Vec<Selection>>> = Arc::new(Mutex::new(Vec::new()));

        // The runner's single listener: record batch selections, then hand
        // the event to the channel for delivery or buffering.
        let listener_channel = channel.clone();
        let listener_history = selection_history.clone();
        let listener: EventListener = Box::new(move |event| {
            if let QueryEvent::BatchStart(batch) = &event {
                if let Some(selection) = batch.selection {
                    listener_history.lock().push(selection);
                }
            }
            listener_channel.publish(event);
        });

        let runner = QueryRunner::new(
            context.clone(),
            self.backend.clone(),
            self.config.clone(),
            listener,
        );
        let session = Arc::new(SessionState {
            runner: AsyncMutex::new(runner),
            channel,
            selection_history,
        });
        sessions.insert(context.clone(), session.clone());
        info!("Created query session for context '{}'", context);
        session
    }

    fn remove_session(&self, context: &ContextId) {
        if self.sessions.write().remove(context).is_some() {
            info!("Removed query session for context '{}'", context);
        }
    }
}
