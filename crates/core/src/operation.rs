// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Operations for the write-ahead log

use crate::watch::{NotificationMethod, WatchRequest};
use serde::{Deserialize, Serialize};

/// A persisted watch request row
///
/// `id` is a surrogate key assigned when the row is first written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestRow {
    pub id: String,
    pub caller_id: String,
    pub method: NotificationMethod,
}

impl RequestRow {
    pub fn new(id: impl Into<String>, request: &WatchRequest) -> Self {
        Self {
            id: id.into(),
            caller_id: request.caller_id.clone(),
            method: request.method.clone(),
        }
    }

    pub fn to_request(&self) -> WatchRequest {
        WatchRequest::new(self.caller_id.clone(), self.method.clone())
    }
}

/// Operations that can be persisted to the WAL
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operation {
    /// Create the aggregate row for a target with its first requests
    WatchCreate {
        target_id: String,
        created_by: String,
        requests: Vec<RequestRow>,
    },

    /// Add request rows under an existing aggregate
    WatchAppend {
        target_id: String,
        requests: Vec<RequestRow>,
    },

    /// Delete the caller's request row
    WatchRequestDelete { target_id: String, caller_id: String },

    /// Delete the aggregate row
    WatchDelete { target_id: String },
}

impl Operation {
    /// Target the operation applies to
    pub fn target_id(&self) -> &str {
        match self {
            Operation::WatchCreate { target_id, .. }
            | Operation::WatchAppend { target_id, .. }
            | Operation::WatchRequestDelete { target_id, .. }
            | Operation::WatchDelete { target_id } => target_id,
        }
    }
}

#[cfg(test)]
#[path = "operation_tests.rs"]
mod tests;
