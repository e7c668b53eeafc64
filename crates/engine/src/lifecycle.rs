// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Registry startup and shutdown

use crate::config::{Config, ConfigError, StatePaths};
use crate::dispatcher::Dispatcher;
use crate::error::RegistryError;
use crate::index::WatchIndex;
use crate::registrar::Registrar;
use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};
use wp_adapters::{ChatAdapter, TracedChatAdapter};
use wp_core::{IdGen, UuidIdGen};
use wp_storage::{StoreError, WalStore, WatchStore};

/// Lifecycle errors
#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    #[error("failed to acquire lock: registry already running?")]
    LockFailed(#[source] std::io::Error),

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("registry error: {0}")]
    Registry(#[from] RegistryError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("logging setup failed: {0}")]
    Logging(String),
}

/// A running registry
pub struct Watchpost<S, C> {
    registrar: Registrar<S>,
    dispatcher: Dispatcher<S, C>,
    paths: StatePaths,
    // NOTE(lifetime): Held to maintain exclusive file lock; released on drop
    #[allow(dead_code)]
    lock_file: File,
}

impl<S: WatchStore, C: ChatAdapter> Watchpost<S, C> {
    /// Entry point for add/remove commands
    pub fn registrar(&self) -> &Registrar<S> {
        &self.registrar
    }

    /// Entry point for observed target events
    pub fn dispatcher(&self) -> &Dispatcher<S, C> {
        &self.dispatcher
    }

    pub fn paths(&self) -> &StatePaths {
        &self.paths
    }
}

impl<I: IdGen, C: ChatAdapter> Watchpost<WalStore<I>, C> {
    /// Settle fulfilled watches, compact the log and release the state
    /// directory
    pub async fn shutdown(self) -> Result<(), LifecycleError> {
        info!("shutting down watch registry");

        if let Err(e) = self.registrar.settle().await {
            // Left in the log; those watches fire once more after restart
            warn!(
                unsettled = self.registrar.unsettled(),
                error = %e,
                "failed to settle fulfilled watches"
            );
        }
        self.registrar.store().compact()?;

        if self.paths.lock_path.exists() {
            if let Err(e) = std::fs::remove_file(&self.paths.lock_path) {
                warn!("failed to remove PID file: {}", e);
            }
        }

        // Lock is released when self.lock_file is dropped
        info!("watch registry shutdown complete");
        Ok(())
    }
}

/// Start the registry on `config`'s state directory
///
/// Takes an exclusive lock on the state directory, replays the watch log,
/// purges aggregates left empty by a failed cleanup, compacts, and hydrates
/// the index. Every chat call is traced.
pub async fn startup<C: ChatAdapter>(
    config: &Config,
    chat: C,
) -> Result<Watchpost<WalStore<UuidIdGen>, TracedChatAdapter<C>>, LifecycleError> {
    let paths = config.paths()?;

    // 1. Create state directories
    if let Some(parent) = paths.wal_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    // 2. Acquire lock file FIRST - one registry per state directory
    // Not truncated until locked; a running instance keeps its PID
    let lock_file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(false)
        .open(&paths.lock_path)?;
    lock_file
        .try_lock_exclusive()
        .map_err(LifecycleError::LockFailed)?;

    // Write PID to lock file
    use std::io::Write;
    lock_file.set_len(0)?;
    let mut lock_file = lock_file;
    writeln!(lock_file, "{}", std::process::id())?;
    let lock_file = lock_file;

    match startup_inner(config, &paths, chat).await {
        Ok((registrar, dispatcher)) => Ok(Watchpost {
            registrar,
            dispatcher,
            paths,
            lock_file,
        }),
        Err(e) => {
            // The lock is ours, so the PID file is too
            let _ = std::fs::remove_file(&paths.lock_path);
            Err(e)
        }
    }
}

type Components<C> = (
    Registrar<WalStore<UuidIdGen>>,
    Dispatcher<WalStore<UuidIdGen>, TracedChatAdapter<C>>,
);

async fn startup_inner<C: ChatAdapter>(
    config: &Config,
    paths: &StatePaths,
    chat: C,
) -> Result<Components<C>, LifecycleError> {
    // 3. Open and replay the watch log
    let store = WalStore::open(&paths.wal_path, UuidIdGen)?;

    // 4. Hydrate the index, purging empty aggregates
    let registrar = Registrar::new(Arc::new(WatchIndex::new()), store.clone());
    let targets = registrar.restore().await?;

    // 5. Drop superseded log entries
    store.compact()?;

    let dispatcher = Dispatcher::new(
        registrar.clone(),
        TracedChatAdapter::new(chat),
        config.notify.clone(),
    );

    info!(
        state_dir = %paths.state_dir.display(),
        targets,
        "watch registry started"
    );
    Ok((registrar, dispatcher))
}

#[cfg(test)]
#[path = "lifecycle_tests.rs"]
mod tests;
