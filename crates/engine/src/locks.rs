// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-target mutual exclusion

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

type LockTable = Mutex<HashMap<String, Arc<AsyncMutex<()>>>>;

/// One async lock per target id
///
/// Table entries are created on first use and dropped again when the last
/// guard for a target is released with nobody waiting.
#[derive(Clone, Default)]
pub struct TargetLocks {
    table: Arc<LockTable>,
}

impl TargetLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `target_id`
    pub async fn acquire(&self, target_id: &str) -> TargetGuard {
        let lock = {
            let mut table = self.table.lock().unwrap_or_else(|e| e.into_inner());
            Arc::clone(table.entry(target_id.to_string()).or_default())
        };

        let guard = lock.lock_owned().await;
        TargetGuard {
            target_id: target_id.to_string(),
            guard: Some(guard),
            table: Arc::clone(&self.table),
        }
    }

    /// Number of targets with a live table entry
    pub fn len(&self) -> usize {
        self.table.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Exclusive access to one target, released on drop
pub struct TargetGuard {
    target_id: String,
    guard: Option<OwnedMutexGuard<()>>,
    table: Arc<LockTable>,
}

impl TargetGuard {
    pub fn target_id(&self) -> &str {
        &self.target_id
    }
}

impl std::fmt::Debug for TargetGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TargetGuard")
            .field("target_id", &self.target_id)
            .finish()
    }
}

impl Drop for TargetGuard {
    fn drop(&mut self) {
        // Release the target before inspecting the table
        drop(self.guard.take());

        let mut table = self.table.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(lock) = table.get(&self.target_id) {
            // Only the table's own reference left: no holder, no waiter
            if Arc::strong_count(lock) == 1 {
                table.remove(&self.target_id);
            }
        }
    }
}

#[cfg(test)]
#[path = "locks_tests.rs"]
mod tests;
