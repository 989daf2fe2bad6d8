//! Scripted execution backend for QueryLite integration tests
//!
//! Acknowledges or rejects submissions on demand and synthesizes row pages
//! from the requested range. It never produces lifecycle notifications on
//! its own; tests feed those through `QueryCoordinator::handle_notification`
//! to drive the exact sequences they want to observe.

use std::sync::Mutex;

use async_trait::async_trait;
use querylite::{
    BackendError, CancelResult, CellValue, ContextId, EditCell, EditCellResult,
    EditCreateRowResult, EditRow, EditRowState, EditSessionParams, EditSubsetResult,
    ExecutionBackend, ExecutionOptions, RowSet, Selection,
};

#[derive(Debug, Default)]
struct StubState {
    reject_submissions: bool,
    reject_cancels: bool,
    reject_edits: bool,
    run_count: usize,
    cancel_count: usize,
    commit_count: usize,
    dispose_count: usize,
    edit_dispose_count: usize,
    created_rows: u64,
    submitted_selections: Vec<Option<Selection>>,
    submitted_queries: Vec<String>,
    edit_params: Vec<EditSessionParams>,
}

/// Backend double driven entirely by the tests
#[derive(Debug, Default)]
pub struct StubBackend {
    state: Mutex<StubState>,
}

impl StubBackend {
    /// Backend that accepts everything
    pub fn new() -> Self {
        Self::default()
    }

    /// Backend that rejects every run and edit-initialize submission
    pub fn rejecting_submissions() -> Self {
        let backend = Self::new();
        backend.state.lock().unwrap().reject_submissions = true;
        backend
    }

    /// Backend that accepts submissions but rejects cancel requests
    pub fn rejecting_cancels() -> Self {
        let backend = Self::new();
        backend.state.lock().unwrap().reject_cancels = true;
        backend
    }

    /// Make edit mutations fail from now on
    pub fn set_reject_edits(&self, reject: bool) {
        self.state.lock().unwrap().reject_edits = reject;
    }

    /// Toggle submission rejection at runtime
    pub fn set_reject_submissions(&self, reject: bool) {
        self.state.lock().unwrap().reject_submissions = reject;
    }

    /// Number of run submissions attempted against this backend
    pub fn run_count(&self) -> usize {
        self.state.lock().unwrap().run_count
    }

    pub fn cancel_count(&self) -> usize {
        self.state.lock().unwrap().cancel_count
    }

    pub fn commit_count(&self) -> usize {
        self.state.lock().unwrap().commit_count
    }

    pub fn dispose_count(&self) -> usize {
        self.state.lock().unwrap().dispose_count
    }

    pub fn edit_dispose_count(&self) -> usize {
        self.state.lock().unwrap().edit_dispose_count
    }

    /// Selections passed to `run_query`, in submission order
    pub fn submitted_selections(&self) -> Vec<Option<Selection>> {
        self.state.lock().unwrap().submitted_selections.clone()
    }

    /// Query texts passed to `run_query_string`, in submission order
    pub fn submitted_queries(&self) -> Vec<String> {
        self.state.lock().unwrap().submitted_queries.clone()
    }

    /// Parameters of the most recent edit-initialize call
    pub fn last_edit_params(&self) -> Option<EditSessionParams> {
        self.state.lock().unwrap().edit_params.last().cloned()
    }
}

#[async_trait]
impl ExecutionBackend for StubBackend {
    async fn run_query(
        &self,
        _context: &ContextId,
        selection: Option<Selection>,
        _options: &ExecutionOptions,
    ) -> Result<(), BackendError> {
        let mut state = self.state.lock().unwrap();
        state.run_count += 1;
        if state.reject_submissions {
            return Err(BackendError::Rejected(
                "the execution service rejected the submission".to_string(),
            ));
        }
        state.submitted_selections.push(selection);
        Ok(())
    }

    async fn run_query_statement(
        &self,
        _context: &ContextId,
        line: u32,
        column: u32,
    ) -> Result<(), BackendError> {
        let mut state = self.state.lock().unwrap();
        state.run_count += 1;
        if state.reject_submissions {
            return Err(BackendError::Rejected(
                "the execution service rejected the submission".to_string(),
            ));
        }
        state
            .submitted_queries
            .push(format!("statement@{line}:{column}"));
        Ok(())
    }

    async fn run_query_string(
        &self,
        _context: &ContextId,
        query: &str,
    ) -> Result<(), BackendError> {
        let mut state = self.state.lock().unwrap();
        state.run_count += 1;
        if state.reject_submissions {
            return Err(BackendError::Rejected(
                "the execution service rejected the submission".to_string(),
            ));
        }
        state.submitted_queries.push(query.to_string());
        Ok(())
    }

    async fn cancel_query(&self, _context: &ContextId) -> Result<CancelResult, BackendError> {
        let mut state = self.state.lock().unwrap();
        if state.reject_cancels {
            return Err(BackendError::Rejected(
                "no cancellable request found".to_string(),
            ));
        }
        state.cancel_count += 1;
        Ok(CancelResult {
            messages: "Query canceled.".to_string(),
        })
    }

    async fn get_query_rows(
        &self,
        _context: &ContextId,
        row_start: u64,
        row_count: u64,
        batch_id: usize,
        result_set_id: usize,
    ) -> Result<RowSet, BackendError> {
        if batch_id > 7 || result_set_id > 7 {
            return Err(BackendError::InvalidSubset {
                batch_id,
                result_set_id,
            });
        }
        // Rows are synthesized from the requested range so paging tests can
        // assert exact cell content.
        let rows = (0..row_count)
            .map(|i| {
                vec![
                    CellValue::new(format!("r{}c0", row_start + i)),
                    CellValue::new(format!("r{}c1", row_start + i)),
                ]
            })
            .collect();
        Ok(RowSet { row_count, rows })
    }

    async fn dispose_query(&self, _context: &ContextId) -> Result<(), BackendError> {
        self.state.lock().unwrap().dispose_count += 1;
        Ok(())
    }

    async fn initialize_edit(
        &self,
        _context: &ContextId,
        params: &EditSessionParams,
    ) -> Result<(), BackendError> {
        let mut state = self.state.lock().unwrap();
        if state.reject_submissions {
            return Err(BackendError::Rejected(
                "the execution service rejected the submission".to_string(),
            ));
        }
        state.edit_params.push(params.clone());
        Ok(())
    }

    async fn update_cell(
        &self,
        _context: &ContextId,
        _row_id: u64,
        _column_id: usize,
        new_value: &str,
    ) -> Result<EditCellResult, BackendError> {
        let state = self.state.lock().unwrap();
        if state.reject_edits {
            return Err(BackendError::NoEditSession(
                "update rejected by the execution service".to_string(),
            ));
        }
        Ok(EditCellResult {
            cell: EditCell {
                value: CellValue::new(new_value),
                is_dirty: true,
            },
            is_row_dirty: true,
        })
    }

    async fn commit_edit(&self, _context: &ContextId) -> Result<(), BackendError> {
        let mut state = self.state.lock().unwrap();
        if state.reject_edits {
            return Err(BackendError::NoEditSession(
                "commit rejected by the execution service".to_string(),
            ));
        }
        state.commit_count += 1;
        Ok(())
    }

    async fn create_row(&self, _context: &ContextId) -> Result<EditCreateRowResult, BackendError> {
        let mut state = self.state.lock().unwrap();
        state.created_rows += 1;
        Ok(EditCreateRowResult {
            default_values: vec!["NULL".to_string(), "NULL".to_string()],
            new_row_id: 100 + state.created_rows,
        })
    }

    async fn delete_row(&self, _context: &ContextId, _row_id: u64) -> Result<(), BackendError> {
        Ok(())
    }

    async fn revert_cell(
        &self,
        _context: &ContextId,
        _row_id: u64,
        _column_id: usize,
    ) -> Result<EditCellResult, BackendError> {
        Ok(EditCellResult {
            cell: EditCell {
                value: CellValue::new("original"),
                is_dirty: false,
            },
            is_row_dirty: false,
        })
    }

    async fn revert_row(&self, _context: &ContextId, _row_id: u64) -> Result<(), BackendError> {
        Ok(())
    }

    async fn get_edit_rows(
        &self,
        _context: &ContextId,
        row_start: u64,
        row_count: u64,
    ) -> Result<EditSubsetResult, BackendError> {
        let subset = (0..row_count)
            .map(|i| EditRow {
                cells: vec![EditCell {
                    value: CellValue::new(format!("v{}", row_start + i)),
                    is_dirty: false,
                }],
                id: row_start + i,
                is_dirty: false,
                state: EditRowState::Clean,
            })
            .collect();
        Ok(EditSubsetResult { row_count, subset })
    }

    async fn dispose_edit(&self, _context: &ContextId) -> Result<(), BackendError> {
        self.state.lock().unwrap().edit_dispose_count += 1;
        Ok(())
    }
}
