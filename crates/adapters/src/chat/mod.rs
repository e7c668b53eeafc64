// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Identity and channel resolution plus message delivery

mod noop;

pub use noop::NoOpChatAdapter;

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::{ChatCall, FakeChatAdapter, SentMessage};

use async_trait::async_trait;
use std::fmt;
use thiserror::Error;

/// Errors from chat operations
#[derive(Debug, Error)]
pub enum ChatError {
    #[error("transport error: {0}")]
    Transport(String),
    #[error("send rejected by {destination}: {reason}")]
    Rejected { destination: String, reason: String },
}

/// A place a message can be posted
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Destination {
    /// Direct-message conversation with a user
    User { user_id: String },
    /// Channel inside a scope
    Channel { scope_id: String, channel_id: String },
}

impl Destination {
    pub fn user(user_id: impl Into<String>) -> Self {
        Self::User {
            user_id: user_id.into(),
        }
    }

    pub fn channel(scope_id: impl Into<String>, channel_id: impl Into<String>) -> Self {
        Self::Channel {
            scope_id: scope_id.into(),
            channel_id: channel_id.into(),
        }
    }
}

impl fmt::Display for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Destination::User { user_id } => write!(f, "user:{}", user_id),
            Destination::Channel {
                scope_id,
                channel_id,
            } => write!(f, "channel:{}/{}", scope_id, channel_id),
        }
    }
}

/// Adapter for the chat transport
///
/// Resolution returns `Ok(None)` when the identity or channel does not exist
/// (or is not reachable) right now; errors are reserved for transport faults.
#[async_trait]
pub trait ChatAdapter: Clone + Send + Sync + 'static {
    /// Resolve a user to a direct-message destination
    async fn resolve_user(&self, user_id: &str) -> Result<Option<Destination>, ChatError>;

    /// Resolve a channel within a scope to a postable destination
    async fn resolve_channel(
        &self,
        scope_id: &str,
        channel_id: &str,
    ) -> Result<Option<Destination>, ChatError>;

    /// Send a message
    async fn send(&self, destination: &Destination, text: &str) -> Result<(), ChatError>;
}
