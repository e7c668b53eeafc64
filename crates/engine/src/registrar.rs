// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Watch registrar: the single choke point for watch mutations
//!
//! Every add and remove runs under the target's lock and writes through to
//! the store before the in-memory index changes. A store failure therefore
//! leaves the index as it was, except for the final empty-aggregate cleanup
//! (see [`Registrar::remove_watch_locked`]).

use crate::error::RegistryError;
use crate::index::WatchIndex;
use crate::locks::{TargetGuard, TargetLocks};
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use tracing::Instrument;
use wp_core::{NotificationMethod, WatchRequest, WatchedTarget};
use wp_storage::WatchStore;

/// Result of comparing a target's in-memory and persisted request sets
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Consistency {
    Consistent,
    /// Caller ids on each side, sorted
    Diverged {
        in_memory: Vec<String>,
        persisted: Vec<String>,
    },
}

/// Adds and removes watch requests, keeping index and store in step
#[derive(Clone)]
pub struct Registrar<S> {
    index: Arc<WatchIndex>,
    locks: TargetLocks,
    store: S,
    /// (target, caller) rows of fulfilled requests the store refused to delete
    orphans: Arc<Mutex<HashSet<(String, String)>>>,
}

impl<S: WatchStore> Registrar<S> {
    pub fn new(index: Arc<WatchIndex>, store: S) -> Self {
        Self {
            index,
            locks: TargetLocks::new(),
            store,
            orphans: Arc::default(),
        }
    }

    /// Read access to the index
    pub fn index(&self) -> &WatchIndex {
        &self.index
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Snapshot of a target's pending requests
    pub fn watches_for(&self, target_id: &str) -> Option<WatchedTarget> {
        self.index.get(target_id)
    }

    /// Register `caller_id`'s interest in `target_id`
    ///
    /// Returns `Ok(false)` without touching anything when the caller already
    /// watches the target, whatever method they used.
    pub async fn add_watch(
        &self,
        target_id: &str,
        caller_id: &str,
        method: NotificationMethod,
    ) -> Result<bool, RegistryError> {
        let span = tracing::info_span!(
            "watch.add",
            target_id,
            caller_id,
            method = method.name()
        );

        async move {
            let start = std::time::Instant::now();
            let result = self.add_watch_inner(target_id, caller_id, method).await;
            let elapsed_ms = start.elapsed().as_millis() as u64;

            match &result {
                Ok(true) => tracing::info!(elapsed_ms, "watch added"),
                Ok(false) => tracing::debug!(elapsed_ms, "already watching"),
                Err(e) => tracing::error!(elapsed_ms, error = %e, "add failed"),
            }
            result
        }
        .instrument(span)
        .await
    }

    async fn add_watch_inner(
        &self,
        target_id: &str,
        caller_id: &str,
        method: NotificationMethod,
    ) -> Result<bool, RegistryError> {
        require_id("target_id", target_id)?;
        require_id("caller_id", caller_id)?;
        if let Some(channel_id) = method.channel_id() {
            require_id("channel_id", channel_id)?;
        }

        let _guard = self.locks.acquire(target_id).await;
        self.settle_locked(target_id).await?;
        let request = WatchRequest::new(caller_id, method);

        match self.index.get(target_id) {
            None => {
                self.store
                    .create_aggregate(target_id, std::slice::from_ref(&request), caller_id)
                    .await?;
                self.index.put(WatchedTarget::new(target_id, request));
            }
            Some(mut target) => {
                if target.contains(caller_id) {
                    return Ok(false);
                }
                self.store
                    .append_requests(target_id, std::slice::from_ref(&request))
                    .await?;
                target.push(request);
                self.index.put(target);
            }
        }

        Ok(true)
    }

    /// Cancel `caller_id`'s watch on `target_id`
    ///
    /// Returns `Ok(false)`, with no store calls, when there is nothing to
    /// remove.
    pub async fn remove_watch(
        &self,
        target_id: &str,
        caller_id: &str,
    ) -> Result<bool, RegistryError> {
        let guard = self.lock_target(target_id).await;
        self.remove_watch_locked(&guard, caller_id).await
    }

    /// Wait for exclusive access to a target
    ///
    /// While the guard is alive no add or remove for the target can run, which
    /// lets a caller check, act, and remove as one step.
    pub async fn lock_target(&self, target_id: &str) -> TargetGuard {
        self.locks.acquire(target_id).await
    }

    /// [`Registrar::remove_watch`] for a target the caller already holds
    ///
    /// The request row is deleted first; if that fails nothing changes. If
    /// the follow-up empty-aggregate cleanup fails, the in-memory removal is
    /// still applied (the row is gone) and the error is returned. The empty
    /// aggregate left behind is purged by [`Registrar::restore`].
    pub async fn remove_watch_locked(
        &self,
        guard: &TargetGuard,
        caller_id: &str,
    ) -> Result<bool, RegistryError> {
        let target_id = guard.target_id();
        let span = tracing::info_span!("watch.remove", target_id, caller_id);

        async move {
            let Some(mut target) = self.index.get(target_id) else {
                tracing::debug!("target not watched");
                return Ok(false);
            };
            if !target.contains(caller_id) {
                tracing::debug!("caller not watching");
                return Ok(false);
            }

            if let Err(e) = self.store.delete_request(target_id, caller_id).await {
                tracing::error!(error = %e, "request delete failed, watch kept");
                return Err(e.into());
            }
            let cleanup = self.store.delete_aggregate_if_empty(target_id).await;

            target.remove(caller_id);
            if target.is_empty() {
                self.index.delete(target_id);
            } else {
                self.index.put(target);
            }

            if let Err(e) = cleanup {
                tracing::error!(error = %e, "aggregate cleanup failed");
                return Err(e.into());
            }

            tracing::info!("watch removed");
            Ok(true)
        }
        .instrument(span)
        .await
    }

    /// Remove a request that has just been fulfilled
    ///
    /// Unlike [`Registrar::remove_watch_locked`], the request leaves the index
    /// even when the store refuses to delete its row, so it can never fire
    /// twice. The row is remembered and deleted by [`Registrar::settle`] or
    /// before the next add on the target; until then
    /// [`Registrar::check_consistency`] reports the divergence.
    pub async fn complete_watch_locked(
        &self,
        guard: &TargetGuard,
        caller_id: &str,
    ) -> Result<(), RegistryError> {
        let Err(e) = self.remove_watch_locked(guard, caller_id).await else {
            return Ok(());
        };

        let target_id = guard.target_id();
        if let Some(mut target) = self.index.get(target_id) {
            if target.remove(caller_id).is_some() {
                self.index.put(target);
                self.orphans_lock()
                    .insert((target_id.to_string(), caller_id.to_string()));
                tracing::warn!(target_id, caller_id, "fulfilled watch left in store");
            }
        }
        Err(e)
    }

    /// Retry deleting rows of fulfilled requests
    ///
    /// Returns the number of rows deleted.
    pub async fn settle(&self) -> Result<usize, RegistryError> {
        let mut targets: Vec<String> = self
            .orphans_lock()
            .iter()
            .map(|(target_id, _)| target_id.clone())
            .collect();
        targets.sort();
        targets.dedup();

        let mut settled = 0;
        for target_id in targets {
            let _guard = self.locks.acquire(&target_id).await;
            settled += self.settle_locked(&target_id).await?;
        }
        Ok(settled)
    }

    /// Number of fulfilled requests whose rows are still stored
    pub fn unsettled(&self) -> usize {
        self.orphans_lock().len()
    }

    async fn settle_locked(&self, target_id: &str) -> Result<usize, RegistryError> {
        let callers: Vec<String> = self
            .orphans_lock()
            .iter()
            .filter(|(t, _)| t == target_id)
            .map(|(_, c)| c.clone())
            .collect();
        if callers.is_empty() {
            return Ok(0);
        }

        for caller_id in &callers {
            self.store.delete_request(target_id, caller_id).await?;
            self.orphans_lock()
                .remove(&(target_id.to_string(), caller_id.clone()));
        }
        self.store.delete_aggregate_if_empty(target_id).await?;

        tracing::info!(target_id, rows = callers.len(), "settled fulfilled watches");
        Ok(callers.len())
    }

    fn orphans_lock(&self) -> std::sync::MutexGuard<'_, HashSet<(String, String)>> {
        self.orphans.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Rebuild the index from the store
    ///
    /// Aggregates without requests (left by a failed cleanup) are deleted
    /// instead of indexed. Returns the number of targets restored.
    pub async fn restore(&self) -> Result<usize, RegistryError> {
        self.settle().await?;
        let records = self.store.load_all().await?;
        let mut restored = 0;

        for record in records {
            let _guard = self.locks.acquire(&record.target_id).await;
            match record.to_target() {
                Some(target) => {
                    self.index.put(target);
                    restored += 1;
                }
                None => {
                    tracing::warn!(target_id = %record.target_id, "purging empty aggregate");
                    self.store
                        .delete_aggregate_if_empty(&record.target_id)
                        .await?;
                }
            }
        }

        tracing::info!(targets = restored, "restored watch index");
        Ok(restored)
    }

    /// Compare a target's in-memory requests with a fresh store read
    pub async fn check_consistency(&self, target_id: &str) -> Result<Consistency, RegistryError> {
        let _guard = self.locks.acquire(target_id).await;

        let mut persisted: Vec<String> = self
            .store
            .find_aggregate(target_id)
            .await?
            .map(|r| r.callers().map(str::to_string).collect())
            .unwrap_or_default();
        let mut in_memory: Vec<String> = self
            .index
            .get(target_id)
            .map(|t| t.callers().map(str::to_string).collect())
            .unwrap_or_default();

        persisted.sort();
        in_memory.sort();

        if persisted == in_memory {
            Ok(Consistency::Consistent)
        } else {
            tracing::warn!(target_id, ?in_memory, ?persisted, "index and store diverged");
            Ok(Consistency::Diverged {
                in_memory,
                persisted,
            })
        }
    }
}

fn require_id(field: &'static str, value: &str) -> Result<(), RegistryError> {
    if value.trim().is_empty() {
        return Err(RegistryError::InvalidId { field });
    }
    Ok(())
}

#[cfg(test)]
#[path = "registrar_tests.rs"]
mod tests;
