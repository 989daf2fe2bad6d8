// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Edit-session types: initialize parameters, editable rows and per-operation
//! results returned by the backend edit API

use serde::{Deserialize, Serialize};

use super::types::CellValue;

/// Parameters for opening an edit session on a database object
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditSessionParams {
    /// Schema owning the object (e.g. "dbo")
    pub schema_name: String,

    /// Object to edit
    pub object_name: String,

    /// Object kind (e.g. "TABLE", "VIEW")
    pub object_type: String,

    /// Maximum number of rows the session loads
    pub row_limit: u64,

    /// Custom query to seed the session instead of a full table scan
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query_string: Option<String>,
}

impl EditSessionParams {
    pub fn new(
        schema_name: impl Into<String>,
        object_name: impl Into<String>,
        object_type: impl Into<String>,
        row_limit: u64,
    ) -> Self {
        EditSessionParams {
            schema_name: schema_name.into(),
            object_name: object_name.into(),
            object_type: object_type.into(),
            row_limit,
            query_string: None,
        }
    }

    /// Seed the session from a custom query instead of the whole object
    pub fn with_query_string(mut self, query_string: impl Into<String>) -> Self {
        self.query_string = Some(query_string.into());
        self
    }
}

/// Dirty-state of one editable row
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EditRowState {
    #[default]
    Clean,
    DirtyInsert,
    DirtyDelete,
    DirtyUpdate,
}

/// One cell of an editable row; a plain cell value plus its dirty flag
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditCell {
    #[serde(flatten)]
    pub value: CellValue,

    #[serde(default)]
    pub is_dirty: bool,
}

/// One row of an edit session subset
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditRow {
    /// Cell values in column order
    pub cells: Vec<EditCell>,

    /// Backend row identifier used by mutation operations
    pub id: u64,

    #[serde(default)]
    pub is_dirty: bool,

    #[serde(default)]
    pub state: EditRowState,
}

/// Result of a cell-level mutation (update or revert)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditCellResult {
    /// The cell after the operation
    pub cell: EditCell,

    /// Whether the owning row still carries uncommitted changes
    pub is_row_dirty: bool,
}

/// Result of creating a new row in an edit session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditCreateRowResult {
    /// Default cell values for the new row, in column order
    pub default_values: Vec<String>,

    /// Identifier assigned to the new row
    pub new_row_id: u64,
}

/// A page of rows fetched from an edit session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditSubsetResult {
    pub row_count: u64,

    /// Rows in request order
    pub subset: Vec<EditRow>,
}
