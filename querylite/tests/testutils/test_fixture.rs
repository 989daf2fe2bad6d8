//! Test fixture for QueryLite integration tests
//!
//! Wires a coordinator to the scripted backend, a channel sink provider and
//! a recording error sink, all through the public QueryCoordinator API. Each
//! fixture gets a unique context id so tests stay independent.

use std::sync::{Arc, Mutex};

use querylite::{
    BatchSummary, ChannelSinkProvider, ContextId, CoordinatorConfig, ErrorSink, ExecutionOptions,
    QueryCoordinator, QueryEvent, QueryNotification, ResultMessage, ResultSetSummary, Selection,
};
use tokio::sync::mpsc::UnboundedReceiver;

use super::stub_backend::StubBackend;

/// Error sink that records every report for later assertions
#[derive(Debug, Default)]
pub struct RecordingErrorSink {
    reports: Mutex<Vec<String>>,
}

impl RecordingErrorSink {
    pub fn reports(&self) -> Vec<String> {
        self.reports.lock().unwrap().clone()
    }
}

impl ErrorSink for RecordingErrorSink {
    fn report(&self, context: &ContextId, message: &str) {
        self.reports
            .lock()
            .unwrap()
            .push(format!("{}: {}", context, message));
    }
}

/// Coordinator fixture with a scripted backend and one test context
pub struct TestFixture {
    coordinator: QueryCoordinator,
    backend: Arc<StubBackend>,
    sinks: Arc<ChannelSinkProvider>,
    errors: Arc<RecordingErrorSink>,
    context: ContextId,
    receiver: Mutex<Option<UnboundedReceiver<QueryEvent>>>,
}

impl TestFixture {
    /// Fixture with an accepting backend and default configuration
    pub fn new() -> Self {
        Self::with_backend(Arc::new(StubBackend::new()), CoordinatorConfig::default())
    }

    /// Fixture with batch timing messages enabled
    pub fn with_batch_timing() -> Self {
        Self::with_backend(
            Arc::new(StubBackend::new()),
            CoordinatorConfig::with_batch_timing(),
        )
    }

    /// Fixture over an explicit backend double and configuration
    pub fn with_backend(backend: Arc<StubBackend>, config: CoordinatorConfig) -> Self {
        init_logging();
        let sinks = Arc::new(ChannelSinkProvider::new());
        let errors = Arc::new(RecordingErrorSink::default());
        let coordinator =
            QueryCoordinator::new(backend.clone(), sinks.clone(), errors.clone(), config);

        // Unique context name for test isolation
        let context = ContextId::from(format!("test_context_{}", fastrand::u64(..)));

        TestFixture {
            coordinator,
            backend,
            sinks,
            errors,
            context,
            receiver: Mutex::new(None),
        }
    }

    pub fn coordinator(&self) -> &QueryCoordinator {
        &self.coordinator
    }

    pub fn backend(&self) -> &StubBackend {
        &self.backend
    }

    pub fn context(&self) -> &ContextId {
        &self.context
    }

    /// Everything reported to the error sink so far
    pub fn error_reports(&self) -> Vec<String> {
        self.errors.reports()
    }

    /// A second, unrelated context id for cross-context tests
    pub fn other_context(&self) -> ContextId {
        ContextId::from(format!("test_context_{}", fastrand::u64(..)))
    }

    // === Submission helpers ===

    /// Submit a literal query text, expecting acceptance
    pub async fn run_text(&self, query: &str) {
        self.coordinator
            .run_query_text(&self.context, query, self.context.as_str())
            .await
            .expect("Query submission failed");
    }

    /// Submit a selection run, expecting acceptance
    pub async fn run_selection(&self, selection: Option<Selection>) {
        self.coordinator
            .run_query_selection(
                &self.context,
                selection,
                self.context.as_str(),
                ExecutionOptions::default(),
            )
            .await
            .expect("Query submission failed");
    }

    /// Mark the consumer ready, flushing buffered events to the sink
    pub fn mark_ready(&self) {
        self.coordinator.register_consumer_ready(&self.context);
    }

    /// Drain every event delivered to the context's sink so far
    pub fn drain_events(&self) -> Vec<QueryEvent> {
        let mut guard = self.receiver.lock().unwrap();
        if guard.is_none() {
            *guard = self.sinks.take_receiver(&self.context);
        }
        let Some(receiver) = guard.as_mut() else {
            return Vec::new();
        };

        let mut events = Vec::new();
        while let Ok(event) = receiver.try_recv() {
            events.push(event);
        }
        events
    }

    // === Notification feeds ===

    pub async fn feed_batch_start(&self, batch: BatchSummary) {
        self.coordinator
            .handle_notification(QueryNotification::BatchStart {
                context: self.context.clone(),
                batch,
            })
            .await;
    }

    pub async fn feed_batch_complete(&self, batch: BatchSummary) {
        self.coordinator
            .handle_notification(QueryNotification::BatchComplete {
                context: self.context.clone(),
                batch,
            })
            .await;
    }

    pub async fn feed_result_set(&self, result_set: ResultSetSummary) {
        self.coordinator
            .handle_notification(QueryNotification::ResultSetComplete {
                context: self.context.clone(),
                result_set,
            })
            .await;
    }

    pub async fn feed_result_set_updated(&self, result_set: ResultSetSummary) {
        self.coordinator
            .handle_notification(QueryNotification::ResultSetUpdated {
                context: self.context.clone(),
                result_set,
            })
            .await;
    }

    pub async fn feed_message(&self, message: ResultMessage) {
        self.coordinator
            .handle_notification(QueryNotification::Message {
                context: self.context.clone(),
                message,
            })
            .await;
    }

    pub async fn feed_query_complete(&self, batch_summaries: Vec<BatchSummary>) {
        self.coordinator
            .handle_notification(QueryNotification::QueryComplete {
                context: self.context.clone(),
                batch_summaries,
            })
            .await;
    }

    pub async fn feed_edit_ready(&self, success: bool, message: &str) {
        self.coordinator
            .handle_notification(QueryNotification::EditSessionReady {
                context: self.context.clone(),
                success,
                message: message.to_string(),
            })
            .await;
    }

    /// Drive one single-batch execution to completion: batch 0 with one
    /// completed result set of `row_count` rows, 1125 ms elapsed
    pub async fn drive_single_batch(&self, row_count: u64) {
        self.feed_batch_start(batch(0)).await;
        self.feed_result_set(result_set(0, Some(0), row_count)).await;
        let mut done = batch(0);
        done.execution_elapsed_ms = 1125;
        self.feed_batch_complete(done.clone()).await;
        self.feed_query_complete(vec![done]).await;
    }
}

// === Builders ===

/// Minimal batch summary with the given id
pub fn batch(id: usize) -> BatchSummary {
    BatchSummary::placeholder(id)
}

/// Batch summary carrying a selection
pub fn batch_with_selection(id: usize, selection: Selection) -> BatchSummary {
    let mut batch = BatchSummary::placeholder(id);
    batch.selection = Some(selection);
    batch
}

/// Completed result-set summary with no column info
pub fn result_set(id: usize, batch_id: Option<usize>, row_count: u64) -> ResultSetSummary {
    ResultSetSummary {
        id,
        batch_id,
        row_count,
        column_info: Vec::new(),
        complete: true,
    }
}

/// Serialized tag names for a slice of events
pub fn kinds(events: &[QueryEvent]) -> Vec<&'static str> {
    events.iter().map(QueryEvent::kind).collect()
}

/// Initialize test logging; safe to call from every test
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}
