// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Persistent store contract for watch records

use crate::state::WatchRecord;
use crate::wal::WalError;
use async_trait::async_trait;
use thiserror::Error;
use wp_core::WatchRequest;

/// Errors from store operations
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("WAL error: {0}")]
    Wal(#[from] WalError),
    #[error("watch already exists for target: {0}")]
    AlreadyExists(String),
    #[error("no watch for target: {0}")]
    NotFound(String),
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Durable CRUD over watch records
///
/// Implementations hold no business rules: duplicate detection and the
/// decision to delete belong to the caller. Row-level deletes are no-ops when
/// there is nothing to delete.
#[async_trait]
pub trait WatchStore: Clone + Send + Sync + 'static {
    /// Create the aggregate row for `target_id` with its first request rows
    async fn create_aggregate(
        &self,
        target_id: &str,
        requests: &[WatchRequest],
        created_by: &str,
    ) -> Result<WatchRecord, StoreError>;

    /// Add request rows under an existing aggregate
    async fn append_requests(
        &self,
        target_id: &str,
        requests: &[WatchRequest],
    ) -> Result<WatchRecord, StoreError>;

    /// Delete the caller's request row, if any
    async fn delete_request(&self, target_id: &str, caller_id: &str) -> Result<(), StoreError>;

    /// Delete the aggregate row if it has no request rows left
    async fn delete_aggregate_if_empty(&self, target_id: &str) -> Result<(), StoreError>;

    /// Read one aggregate
    async fn find_aggregate(&self, target_id: &str) -> Result<Option<WatchRecord>, StoreError>;

    /// Read every aggregate, ordered by target id
    async fn load_all(&self) -> Result<Vec<WatchRecord>, StoreError>;
}
