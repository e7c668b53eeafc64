// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! wp-core: domain types for the Watchpost watch registry
//!
//! This crate provides:
//! - Watch requests and the per-target aggregate they live in
//! - Observed target events
//! - Operations persisted to the write-ahead log
//! - ID generation for persisted rows

pub mod event;
pub mod id;
pub mod operation;
pub mod watch;

pub use event::{EventContext, TargetEvent};
pub use id::{IdGen, SequentialIdGen, UuidIdGen};
pub use operation::{Operation, RequestRow};
pub use watch::{NotificationMethod, WatchRequest, WatchedTarget};
