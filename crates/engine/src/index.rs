// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory watch index

use std::collections::HashMap;
use std::sync::Mutex;
use wp_core::WatchedTarget;

/// Target id to [`WatchedTarget`] map used to route incoming events
///
/// Holds no persistence logic. Only the registrar (and startup hydration
/// through it) mutates the index; every mutation is paired with a store call.
/// Readers get owned clones, so a value returned by [`WatchIndex::get`] is a
/// stable snapshot.
#[derive(Debug, Default)]
pub struct WatchIndex {
    targets: Mutex<HashMap<String, WatchedTarget>>,
}

impl WatchIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of a target's requests
    pub fn get(&self, target_id: &str) -> Option<WatchedTarget> {
        self.lock().get(target_id).cloned()
    }

    /// Whether `caller_id` currently watches `target_id`
    pub fn contains(&self, target_id: &str, caller_id: &str) -> bool {
        self.lock()
            .get(target_id)
            .is_some_and(|t| t.contains(caller_id))
    }

    /// Number of watched targets
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Watched target ids, sorted
    pub fn target_ids(&self) -> Vec<String> {
        let mut ids: Vec<_> = self.lock().keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Targets a caller is watching, sorted
    pub fn targets_watched_by(&self, caller_id: &str) -> Vec<String> {
        let mut ids: Vec<_> = self
            .lock()
            .values()
            .filter(|t| t.contains(caller_id))
            .map(|t| t.target_id().to_string())
            .collect();
        ids.sort();
        ids
    }

    /// Insert or replace the entry for `target.target_id()`
    ///
    /// An empty aggregate is never stored; putting one removes the entry.
    pub(crate) fn put(&self, target: WatchedTarget) {
        let mut targets = self.lock();
        if target.is_empty() {
            targets.remove(target.target_id());
        } else {
            targets.insert(target.target_id().to_string(), target);
        }
    }

    pub(crate) fn delete(&self, target_id: &str) -> Option<WatchedTarget> {
        self.lock().remove(target_id)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, WatchedTarget>> {
        self.targets.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[cfg(test)]
#[path = "index_tests.rs"]
mod tests;
