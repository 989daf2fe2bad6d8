// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Core protocol types shared by the runner, coordinator and backend interface

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque identifier for one logical editing surface ("context").
///
/// Every query or edit session is owned by exactly one context, and all
/// coordinator state is partitioned by it. The value is caller-supplied and
/// never interpreted; typical hosts use editor URIs or document ids.
///
/// # Example
///
/// ```rust,ignore
/// let ctx = ContextId::from("untitled:query1.sql");
/// assert_eq!(ctx.as_str(), "untitled:query1.sql");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContextId(String);

impl ContextId {
    /// Create a context id from any string-like value
    pub fn new(id: impl Into<String>) -> Self {
        ContextId(id.into())
    }

    /// Borrow the underlying string key
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContextId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ContextId {
    fn from(id: &str) -> Self {
        ContextId(id.to_string())
    }
}

impl From<String> for ContextId {
    fn from(id: String) -> Self {
        ContextId(id)
    }
}

/// Half-open line/column range within the document that produced a query.
///
/// Lines and columns are zero-based. When a query runs from a selection the
/// backend reports batch ranges relative to the selected text; the runner
/// re-bases them onto document coordinates by adding the selection's start
/// line to both ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Selection {
    pub start_line: u32,
    pub start_column: u32,
    pub end_line: u32,
    pub end_column: u32,
}

impl Selection {
    /// Create a selection covering `[start_line:start_column, end_line:end_column)`
    pub fn new(start_line: u32, start_column: u32, end_line: u32, end_column: u32) -> Self {
        Selection {
            start_line,
            start_column,
            end_line,
            end_column,
        }
    }

    /// Shift both ends of the range down by `lines`
    pub fn offset_lines(&mut self, lines: u32) {
        self.start_line += lines;
        self.end_line += lines;
    }
}

/// Name/type descriptor for one column of a result set
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnInfo {
    /// Column name as reported by the backend
    pub column_name: String,

    /// Backend type name (e.g. "int", "nvarchar")
    pub data_type_name: String,

    /// Position within the result set, when the backend reports one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column_ordinal: Option<usize>,
}

impl ColumnInfo {
    pub fn new(column_name: impl Into<String>, data_type_name: impl Into<String>) -> Self {
        ColumnInfo {
            column_name: column_name.into(),
            data_type_name: data_type_name.into(),
            column_ordinal: None,
        }
    }
}

/// One rendered cell value within a fetched row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CellValue {
    /// Display-ready string form of the value
    pub display_value: String,

    /// True when the cell is SQL NULL
    #[serde(default)]
    pub is_null: bool,

    /// Culture-invariant rendering, when it differs from `display_value`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub invariant_culture_display_value: Option<String>,
}

impl CellValue {
    /// Create a non-null cell from its display string
    pub fn new(display_value: impl Into<String>) -> Self {
        CellValue {
            display_value: display_value.into(),
            is_null: false,
            invariant_culture_display_value: None,
        }
    }

    /// Create a NULL cell
    pub fn null() -> Self {
        CellValue {
            display_value: "NULL".to_string(),
            is_null: true,
            invariant_culture_display_value: None,
        }
    }
}

/// Summary of one result set produced by a batch.
///
/// `batch_id` is optional on the wire: some backends omit it, in which case
/// the runner attaches the result set to batch 0 (see the fallback rule on
/// the runner).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultSetSummary {
    /// Result-set index within its batch
    pub id: usize,

    /// Owning batch index, when the backend reported one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub batch_id: Option<usize>,

    /// Number of rows available for paging
    pub row_count: u64,

    /// Ordered column descriptors
    #[serde(default)]
    pub column_info: Vec<ColumnInfo>,

    /// False while the backend is still streaming rows into the set
    #[serde(default)]
    pub complete: bool,
}

/// Summary of one batch within a multi-statement execution.
///
/// Batches are created by `batchStart` notifications, finalized (never
/// removed) by `batchComplete`, and replaced wholesale by the authoritative
/// set carried on `queryComplete`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchSummary {
    /// Backend-assigned batch index, used as the position in `batches`
    pub id: usize,

    /// Document range the batch was parsed from, if it ran from a selection
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selection: Option<Selection>,

    /// Result sets reported for this batch so far
    #[serde(default)]
    pub result_set_summaries: Vec<ResultSetSummary>,

    /// Wall-clock execution time reported at batch completion
    #[serde(default)]
    pub execution_elapsed_ms: u64,

    /// True when any statement in the batch failed
    #[serde(default)]
    pub has_error: bool,

    /// Backend timestamp for batch start, when reported
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub execution_start: Option<DateTime<Utc>>,

    /// Backend timestamp for batch end, when reported
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub execution_end: Option<DateTime<Utc>>,
}

impl BatchSummary {
    /// Empty placeholder batch used when a result set must be attached to a
    /// batch the backend never announced
    pub fn placeholder(id: usize) -> Self {
        BatchSummary {
            id,
            selection: None,
            result_set_summaries: Vec::new(),
            execution_elapsed_ms: 0,
            has_error: false,
            execution_start: None,
            execution_end: None,
        }
    }

    /// Re-base the batch selection onto document coordinates
    pub fn offset_selection(&mut self, lines: u32) {
        if let Some(selection) = self.selection.as_mut() {
            selection.offset_lines(lines);
        }
    }
}

/// A page of rows fetched from one result set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RowSet {
    /// Number of rows in this page
    pub row_count: u64,

    /// Row data in request order
    pub rows: Vec<Vec<CellValue>>,
}

/// Informational or error message emitted during execution.
///
/// `time` arrives as a backend timestamp and is rewritten by the runner to a
/// human-readable clock time before delivery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultMessage {
    /// Batch the message relates to, when the backend scoped it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub batch_id: Option<usize>,

    /// True for error output, false for informational output
    #[serde(default)]
    pub is_error: bool,

    /// Timestamp; RFC 3339 from the backend, clock time after localization
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,

    /// Message text
    pub message: String,
}

impl ResultMessage {
    /// Create an informational message with no timestamp
    pub fn info(message: impl Into<String>) -> Self {
        ResultMessage {
            batch_id: None,
            is_error: false,
            time: None,
            message: message.into(),
        }
    }

    /// Create an error message with no timestamp
    pub fn error(message: impl Into<String>) -> Self {
        ResultMessage {
            batch_id: None,
            is_error: true,
            time: None,
            message: message.into(),
        }
    }
}

/// Execution-plan display options passed through to the backend untouched
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionOptions {
    #[serde(default)]
    pub display_estimated_query_plan: bool,

    #[serde(default)]
    pub display_actual_query_plan: bool,
}

/// Backend acknowledgment of a cancel request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CancelResult {
    /// Backend-provided status text describing the cancellation
    pub messages: String,
}
