// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Watchpost registry engine
//!
//! Keeps the in-memory watch index and the persistent store in step, and
//! turns observed target events into one-shot notifications.

mod config;
mod dispatcher;
mod error;
mod index;
mod lifecycle;
mod locks;
mod logging;
pub mod message;
mod registrar;

pub use config::{Config, ConfigError, NotifyConfig, StatePaths};
pub use dispatcher::{DispatchReport, Dispatcher};
pub use error::RegistryError;
pub use index::WatchIndex;
pub use lifecycle::{startup, LifecycleError, Watchpost};
pub use locks::{TargetGuard, TargetLocks};
pub use logging::setup_logging;
pub use registrar::{Consistency, Registrar};
