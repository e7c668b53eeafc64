// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Materialized state from WAL replay

use std::collections::HashMap;
use wp_core::{Operation, RequestRow, WatchRequest, WatchedTarget};

/// Persisted aggregate row for one target plus its request rows
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchRecord {
    pub target_id: String,
    /// Caller whose request created the aggregate row
    pub created_by: String,
    pub requests: Vec<RequestRow>,
}

impl WatchRecord {
    pub fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }

    pub fn callers(&self) -> impl Iterator<Item = &str> {
        self.requests.iter().map(|r| r.caller_id.as_str())
    }

    pub fn to_requests(&self) -> Vec<WatchRequest> {
        self.requests.iter().map(RequestRow::to_request).collect()
    }

    /// In-memory aggregate for this record, `None` when it has no rows
    pub fn to_target(&self) -> Option<WatchedTarget> {
        WatchedTarget::from_requests(self.target_id.clone(), self.to_requests())
    }
}

/// Materialized state built from WAL operations
#[derive(Debug, Default)]
pub struct MaterializedState {
    pub watches: HashMap<String, WatchRecord>,
}

impl MaterializedState {
    pub fn get(&self, target_id: &str) -> Option<&WatchRecord> {
        self.watches.get(target_id)
    }

    /// Apply an operation to update the state
    pub fn apply(&mut self, op: &Operation) {
        match op {
            Operation::WatchCreate {
                target_id,
                created_by,
                requests,
            } => {
                self.watches.insert(
                    target_id.clone(),
                    WatchRecord {
                        target_id: target_id.clone(),
                        created_by: created_by.clone(),
                        requests: requests.clone(),
                    },
                );
            }

            Operation::WatchAppend {
                target_id,
                requests,
            } => {
                if let Some(record) = self.watches.get_mut(target_id) {
                    record.requests.extend(requests.iter().cloned());
                }
            }

            Operation::WatchRequestDelete {
                target_id,
                caller_id,
            } => {
                if let Some(record) = self.watches.get_mut(target_id) {
                    record.requests.retain(|r| &r.caller_id != caller_id);
                }
            }

            Operation::WatchDelete { target_id } => {
                self.watches.remove(target_id);
            }
        }
    }

    /// Operations that rebuild the current state from nothing
    ///
    /// One `WatchCreate` per aggregate, ordered by target id.
    pub fn to_operations(&self) -> Vec<Operation> {
        let mut records: Vec<_> = self.watches.values().collect();
        records.sort_by(|a, b| a.target_id.cmp(&b.target_id));
        records
            .into_iter()
            .map(|record| Operation::WatchCreate {
                target_id: record.target_id.clone(),
                created_by: record.created_by.clone(),
                requests: record.requests.clone(),
            })
            .collect()
    }
}

#[cfg(test)]
#[path = "state_tests.rs"]
mod tests;
