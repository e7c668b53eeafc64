// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake chat adapter for testing
#![cfg_attr(coverage_nightly, coverage(off))]

use super::{ChatAdapter, ChatError, Destination};
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Recorded chat call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatCall {
    ResolveUser {
        user_id: String,
    },
    ResolveChannel {
        scope_id: String,
        channel_id: String,
    },
    Send {
        destination: Destination,
    },
}

/// A message that was delivered
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMessage {
    pub destination: Destination,
    pub text: String,
}

#[derive(Default)]
struct FakeChatState {
    users: HashSet<String>,
    channels: HashSet<(String, String)>,
    broken_users: HashSet<String>,
    rejecting: HashSet<Destination>,
    sent: Vec<SentMessage>,
    calls: Vec<ChatCall>,
    send_delay: Option<Duration>,
}

/// Fake chat adapter for testing
///
/// Only registered users and channels resolve. Sends are recorded unless the
/// destination was marked as rejecting.
#[derive(Clone, Default)]
pub struct FakeChatAdapter {
    inner: Arc<Mutex<FakeChatState>>,
}

impl FakeChatAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make a user resolvable
    pub fn add_user(&self, user_id: &str) -> &Self {
        self.lock().users.insert(user_id.to_string());
        self
    }

    pub fn remove_user(&self, user_id: &str) {
        self.lock().users.remove(user_id);
    }

    /// Make a channel resolvable within a scope
    pub fn add_channel(&self, scope_id: &str, channel_id: &str) -> &Self {
        self.lock()
            .channels
            .insert((scope_id.to_string(), channel_id.to_string()));
        self
    }

    /// Resolving this user returns a transport error
    pub fn break_user(&self, user_id: &str) {
        self.lock().broken_users.insert(user_id.to_string());
    }

    /// Sends to this destination fail
    pub fn reject_sends_to(&self, destination: Destination) {
        self.lock().rejecting.insert(destination);
    }

    /// Delay every send, to widen race windows in concurrency tests
    pub fn set_send_delay(&self, delay: Duration) {
        self.lock().send_delay = Some(delay);
    }

    /// Get all delivered messages
    pub fn sent(&self) -> Vec<SentMessage> {
        self.lock().sent.clone()
    }

    /// Delivered messages for one destination
    pub fn sent_to(&self, destination: &Destination) -> Vec<SentMessage> {
        self.lock()
            .sent
            .iter()
            .filter(|m| &m.destination == destination)
            .cloned()
            .collect()
    }

    /// Get all recorded calls
    pub fn calls(&self) -> Vec<ChatCall> {
        self.lock().calls.clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, FakeChatState> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl ChatAdapter for FakeChatAdapter {
    async fn resolve_user(&self, user_id: &str) -> Result<Option<Destination>, ChatError> {
        let mut inner = self.lock();
        inner.calls.push(ChatCall::ResolveUser {
            user_id: user_id.to_string(),
        });

        if inner.broken_users.contains(user_id) {
            return Err(ChatError::Transport(format!("lookup of {} timed out", user_id)));
        }
        Ok(inner
            .users
            .contains(user_id)
            .then(|| Destination::user(user_id)))
    }

    async fn resolve_channel(
        &self,
        scope_id: &str,
        channel_id: &str,
    ) -> Result<Option<Destination>, ChatError> {
        let mut inner = self.lock();
        inner.calls.push(ChatCall::ResolveChannel {
            scope_id: scope_id.to_string(),
            channel_id: channel_id.to_string(),
        });

        let key = (scope_id.to_string(), channel_id.to_string());
        Ok(inner
            .channels
            .contains(&key)
            .then(|| Destination::channel(scope_id, channel_id)))
    }

    async fn send(&self, destination: &Destination, text: &str) -> Result<(), ChatError> {
        let delay = {
            let mut inner = self.lock();
            inner.calls.push(ChatCall::Send {
                destination: destination.clone(),
            });
            inner.send_delay
        };

        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let mut inner = self.lock();
        if inner.rejecting.contains(destination) {
            return Err(ChatError::Rejected {
                destination: destination.to_string(),
                reason: "missing permissions".to_string(),
            });
        }
        inner.sent.push(SentMessage {
            destination: destination.clone(),
            text: text.to_string(),
        });
        Ok(())
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
