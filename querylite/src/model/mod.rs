// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Protocol data model shared by the coordinator, runner and backend
//! interface: context keys, batch/result-set summaries, messages, edit
//! types and the typed event unions.

pub mod edit;
pub mod events;
pub mod types;

pub use edit::{
    EditCell, EditCellResult, EditCreateRowResult, EditRow, EditRowState, EditSessionParams,
    EditSubsetResult,
};
pub use events::{QueryEvent, QueryNotification};
pub use types::{
    BatchSummary, CancelResult, CellValue, ColumnInfo, ContextId, ExecutionOptions, ResultMessage,
    ResultSetSummary, RowSet, Selection,
};
