// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for registry operations

use thiserror::Error;
use wp_storage::StoreError;

/// Errors that can occur in registrar operations
///
/// Duplicate watches and missing watches are not errors; they are reported
/// as `Ok(false)`.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("store error: {0}")]
    Store(#[from] StoreError),
    #[error("invalid {field}: must not be empty")]
    InvalidId { field: &'static str },
}
