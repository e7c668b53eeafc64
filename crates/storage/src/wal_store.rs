// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Store backed by the write-ahead log

use crate::state::{MaterializedState, WatchRecord};
use crate::store::{StoreError, WatchStore};
use crate::wal::Wal;
use async_trait::async_trait;
use std::path::Path;
use std::sync::{Arc, Mutex};
use wp_core::{IdGen, Operation, RequestRow, WatchRequest};

/// [`WatchStore`] that logs every mutation to a [`Wal`] before applying it to
/// an in-memory [`MaterializedState`]
///
/// Writers take the WAL lock first, then the state lock, so checks against
/// the state and the append they guard are atomic.
#[derive(Clone)]
pub struct WalStore<I> {
    wal: Arc<Mutex<Wal>>,
    state: Arc<Mutex<MaterializedState>>,
    ids: I,
}

impl<I: IdGen> WalStore<I> {
    /// Open the log at `path`, replaying existing entries
    ///
    /// A torn tail left by a crash is truncated first, so the caller must own
    /// the log exclusively.
    pub fn open(path: &Path, ids: I) -> Result<Self, StoreError> {
        Wal::repair(path)?;

        let mut state = MaterializedState::default();
        let ops = Wal::replay(path)?;
        for op in &ops {
            state.apply(op);
        }
        let wal = Wal::open(path)?;

        tracing::debug!(
            path = %path.display(),
            entries = ops.len(),
            watches = state.watches.len(),
            "replayed watch log"
        );

        Ok(Self {
            wal: Arc::new(Mutex::new(wal)),
            state: Arc::new(Mutex::new(state)),
            ids,
        })
    }

    /// Rewrite the log as one entry per live aggregate
    ///
    /// Returns the number of entries dropped.
    pub fn compact(&self) -> Result<u64, StoreError> {
        let mut wal = self.wal.lock().unwrap_or_else(|e| e.into_inner());
        let state = self.state.lock().unwrap_or_else(|e| e.into_inner());

        let ops = state.to_operations();
        let before = wal.sequence();
        wal.compact(&ops)?;
        let removed = before.saturating_sub(wal.sequence());

        tracing::info!(entries_removed = removed, entries_kept = ops.len(), "compacted watch log");
        Ok(removed)
    }

    /// Number of aggregates currently stored
    pub fn len(&self) -> usize {
        self.state
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .watches
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn rows(&self, requests: &[WatchRequest]) -> Vec<RequestRow> {
        requests
            .iter()
            .map(|r| RequestRow::new(self.ids.next(), r))
            .collect()
    }
}

#[async_trait]
impl<I: IdGen> WatchStore for WalStore<I> {
    async fn create_aggregate(
        &self,
        target_id: &str,
        requests: &[WatchRequest],
        created_by: &str,
    ) -> Result<WatchRecord, StoreError> {
        let mut wal = self.wal.lock().unwrap_or_else(|e| e.into_inner());
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());

        // An empty leftover row may be overwritten; a live one may not
        if state.get(target_id).is_some_and(|r| !r.is_empty()) {
            return Err(StoreError::AlreadyExists(target_id.to_string()));
        }

        let op = Operation::WatchCreate {
            target_id: target_id.to_string(),
            created_by: created_by.to_string(),
            requests: self.rows(requests),
        };
        wal.append(&op)?;
        state.apply(&op);

        state
            .get(target_id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(target_id.to_string()))
    }

    async fn append_requests(
        &self,
        target_id: &str,
        requests: &[WatchRequest],
    ) -> Result<WatchRecord, StoreError> {
        let mut wal = self.wal.lock().unwrap_or_else(|e| e.into_inner());
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());

        if state.get(target_id).is_none() {
            return Err(StoreError::NotFound(target_id.to_string()));
        }

        let op = Operation::WatchAppend {
            target_id: target_id.to_string(),
            requests: self.rows(requests),
        };
        wal.append(&op)?;
        state.apply(&op);

        state
            .get(target_id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(target_id.to_string()))
    }

    async fn delete_request(&self, target_id: &str, caller_id: &str) -> Result<(), StoreError> {
        let mut wal = self.wal.lock().unwrap_or_else(|e| e.into_inner());
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());

        let present = state
            .get(target_id)
            .is_some_and(|r| r.callers().any(|c| c == caller_id));
        if !present {
            return Ok(());
        }

        let op = Operation::WatchRequestDelete {
            target_id: target_id.to_string(),
            caller_id: caller_id.to_string(),
        };
        wal.append(&op)?;
        state.apply(&op);
        Ok(())
    }

    async fn delete_aggregate_if_empty(&self, target_id: &str) -> Result<(), StoreError> {
        let mut wal = self.wal.lock().unwrap_or_else(|e| e.into_inner());
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());

        if !state.get(target_id).is_some_and(WatchRecord::is_empty) {
            return Ok(());
        }

        let op = Operation::WatchDelete {
            target_id: target_id.to_string(),
        };
        wal.append(&op)?;
        state.apply(&op);
        Ok(())
    }

    async fn find_aggregate(&self, target_id: &str) -> Result<Option<WatchRecord>, StoreError> {
        let state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        Ok(state.get(target_id).cloned())
    }

    async fn load_all(&self) -> Result<Vec<WatchRecord>, StoreError> {
        let state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        let mut records: Vec<_> = state.watches.values().cloned().collect();
        records.sort_by(|a, b| a.target_id.cmp(&b.target_id));
        Ok(records)
    }
}

#[cfg(test)]
#[path = "wal_store_tests.rs"]
mod tests;
