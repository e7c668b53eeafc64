// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake store for testing
#![cfg_attr(coverage_nightly, coverage(off))]

use crate::state::{MaterializedState, WatchRecord};
use crate::store::{StoreError, WatchStore};
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use wp_core::{IdGen, Operation, RequestRow, SequentialIdGen, WatchRequest};

/// Store operation, used to select calls for failure injection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOp {
    Create,
    Append,
    DeleteRequest,
    DeleteAggregate,
    Find,
    LoadAll,
}

/// Recorded store call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreCall {
    Create {
        target_id: String,
        callers: Vec<String>,
        created_by: String,
    },
    Append {
        target_id: String,
        callers: Vec<String>,
    },
    DeleteRequest {
        target_id: String,
        caller_id: String,
    },
    DeleteAggregate {
        target_id: String,
    },
    Find {
        target_id: String,
    },
    LoadAll,
}

#[derive(Default)]
struct FakeStoreState {
    records: MaterializedState,
    calls: Vec<StoreCall>,
    failures: HashSet<StoreOp>,
}

/// In-memory store for testing
///
/// Mirrors [`crate::WalStore`] semantics without touching disk. Calls are
/// recorded even when they are made to fail.
#[derive(Clone, Default)]
pub struct FakeStore {
    inner: Arc<Mutex<FakeStoreState>>,
    ids: SequentialIdGen,
}

impl FakeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get all recorded calls
    pub fn calls(&self) -> Vec<StoreCall> {
        self.lock().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.lock().calls.clear();
    }

    /// Make the next call of `op` fail with [`StoreError::Unavailable`]
    pub fn fail_next(&self, op: StoreOp) {
        self.lock().failures.insert(op);
    }

    /// Get a stored record without recording a call
    pub fn record(&self, target_id: &str) -> Option<WatchRecord> {
        self.lock().records.get(target_id).cloned()
    }

    /// Seed a record directly, bypassing call recording
    pub fn insert(&self, target_id: &str, created_by: &str, requests: &[WatchRequest]) {
        let op = Operation::WatchCreate {
            target_id: target_id.to_string(),
            created_by: created_by.to_string(),
            requests: self.rows(requests),
        };
        self.lock().records.apply(&op);
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, FakeStoreState> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn rows(&self, requests: &[WatchRequest]) -> Vec<RequestRow> {
        requests
            .iter()
            .map(|r| RequestRow::new(self.ids.next(), r))
            .collect()
    }
}

impl FakeStoreState {
    fn record_call(&mut self, op: StoreOp, call: StoreCall) -> Result<(), StoreError> {
        self.calls.push(call);
        if self.failures.remove(&op) {
            return Err(StoreError::Unavailable(format!("injected {:?} failure", op)));
        }
        Ok(())
    }
}

fn callers(requests: &[WatchRequest]) -> Vec<String> {
    requests.iter().map(|r| r.caller_id.clone()).collect()
}

#[async_trait]
impl WatchStore for FakeStore {
    async fn create_aggregate(
        &self,
        target_id: &str,
        requests: &[WatchRequest],
        created_by: &str,
    ) -> Result<WatchRecord, StoreError> {
        let rows = self.rows(requests);
        let mut inner = self.lock();
        inner.record_call(
            StoreOp::Create,
            StoreCall::Create {
                target_id: target_id.to_string(),
                callers: callers(requests),
                created_by: created_by.to_string(),
            },
        )?;

        if inner.records.get(target_id).is_some_and(|r| !r.is_empty()) {
            return Err(StoreError::AlreadyExists(target_id.to_string()));
        }
        inner.records.apply(&Operation::WatchCreate {
            target_id: target_id.to_string(),
            created_by: created_by.to_string(),
            requests: rows,
        });
        inner
            .records
            .get(target_id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(target_id.to_string()))
    }

    async fn append_requests(
        &self,
        target_id: &str,
        requests: &[WatchRequest],
    ) -> Result<WatchRecord, StoreError> {
        let rows = self.rows(requests);
        let mut inner = self.lock();
        inner.record_call(
            StoreOp::Append,
            StoreCall::Append {
                target_id: target_id.to_string(),
                callers: callers(requests),
            },
        )?;

        if inner.records.get(target_id).is_none() {
            return Err(StoreError::NotFound(target_id.to_string()));
        }
        inner.records.apply(&Operation::WatchAppend {
            target_id: target_id.to_string(),
            requests: rows,
        });
        inner
            .records
            .get(target_id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(target_id.to_string()))
    }

    async fn delete_request(&self, target_id: &str, caller_id: &str) -> Result<(), StoreError> {
        let mut inner = self.lock();
        inner.record_call(
            StoreOp::DeleteRequest,
            StoreCall::DeleteRequest {
                target_id: target_id.to_string(),
                caller_id: caller_id.to_string(),
            },
        )?;
        inner.records.apply(&Operation::WatchRequestDelete {
            target_id: target_id.to_string(),
            caller_id: caller_id.to_string(),
        });
        Ok(())
    }

    async fn delete_aggregate_if_empty(&self, target_id: &str) -> Result<(), StoreError> {
        let mut inner = self.lock();
        inner.record_call(
            StoreOp::DeleteAggregate,
            StoreCall::DeleteAggregate {
                target_id: target_id.to_string(),
            },
        )?;
        if inner.records.get(target_id).is_some_and(WatchRecord::is_empty) {
            inner.records.apply(&Operation::WatchDelete {
                target_id: target_id.to_string(),
            });
        }
        Ok(())
    }

    async fn find_aggregate(&self, target_id: &str) -> Result<Option<WatchRecord>, StoreError> {
        let mut inner = self.lock();
        inner.record_call(
            StoreOp::Find,
            StoreCall::Find {
                target_id: target_id.to_string(),
            },
        )?;
        Ok(inner.records.get(target_id).cloned())
    }

    async fn load_all(&self) -> Result<Vec<WatchRecord>, StoreError> {
        let mut inner = self.lock();
        inner.record_call(StoreOp::LoadAll, StoreCall::LoadAll)?;
        let mut records: Vec<_> = inner.records.watches.values().cloned().collect();
        records.sort_by(|a, b| a.target_id.cmp(&b.target_id));
        Ok(records)
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
