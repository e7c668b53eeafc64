// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Watch requests and the per-target aggregate
//!
//! A [`WatchedTarget`] groups every pending [`WatchRequest`] for one target
//! identity. Requests keep insertion order and each caller appears at most
//! once per target.

use serde::{Deserialize, Serialize};

/// How a watcher wants to be told about activity
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NotificationMethod {
    /// Direct message to the caller
    DirectMessage,
    /// Post in a channel, mentioning the caller
    Channel { channel_id: String },
}

impl NotificationMethod {
    pub fn channel(channel_id: impl Into<String>) -> Self {
        Self::Channel {
            channel_id: channel_id.into(),
        }
    }

    /// Destination channel, present only for [`NotificationMethod::Channel`]
    pub fn channel_id(&self) -> Option<&str> {
        match self {
            Self::DirectMessage => None,
            Self::Channel { channel_id } => Some(channel_id),
        }
    }

    /// Short name used in logs
    pub fn name(&self) -> &'static str {
        match self {
            Self::DirectMessage => "direct_message",
            Self::Channel { .. } => "channel",
        }
    }
}

/// One caller's pending interest in one target
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WatchRequest {
    pub caller_id: String,
    pub method: NotificationMethod,
}

impl WatchRequest {
    pub fn new(caller_id: impl Into<String>, method: NotificationMethod) -> Self {
        Self {
            caller_id: caller_id.into(),
            method,
        }
    }

    pub fn direct(caller_id: impl Into<String>) -> Self {
        Self::new(caller_id, NotificationMethod::DirectMessage)
    }

    pub fn in_channel(caller_id: impl Into<String>, channel_id: impl Into<String>) -> Self {
        Self::new(caller_id, NotificationMethod::channel(channel_id))
    }
}

/// All pending watch requests for a single target
///
/// Constructed with at least one request. Removing the last request leaves an
/// empty aggregate which the owner is expected to discard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchedTarget {
    target_id: String,
    watch_requests: Vec<WatchRequest>,
}

impl WatchedTarget {
    pub fn new(target_id: impl Into<String>, first: WatchRequest) -> Self {
        Self {
            target_id: target_id.into(),
            watch_requests: vec![first],
        }
    }

    /// Build an aggregate from persisted requests
    ///
    /// Returns `None` for an empty list. Later duplicates of a caller are
    /// dropped so the result always holds one request per caller.
    pub fn from_requests(
        target_id: impl Into<String>,
        requests: impl IntoIterator<Item = WatchRequest>,
    ) -> Option<Self> {
        let mut watch_requests: Vec<WatchRequest> = Vec::new();
        for request in requests {
            if !watch_requests
                .iter()
                .any(|r| r.caller_id == request.caller_id)
            {
                watch_requests.push(request);
            }
        }

        if watch_requests.is_empty() {
            return None;
        }

        Some(Self {
            target_id: target_id.into(),
            watch_requests,
        })
    }

    pub fn target_id(&self) -> &str {
        &self.target_id
    }

    /// Requests in insertion order
    pub fn requests(&self) -> &[WatchRequest] {
        &self.watch_requests
    }

    pub fn len(&self) -> usize {
        self.watch_requests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.watch_requests.is_empty()
    }

    pub fn find(&self, caller_id: &str) -> Option<&WatchRequest> {
        self.watch_requests.iter().find(|r| r.caller_id == caller_id)
    }

    pub fn contains(&self, caller_id: &str) -> bool {
        self.find(caller_id).is_some()
    }

    /// Append a request unless the caller already has one
    ///
    /// Returns `false` and leaves the aggregate untouched for a duplicate.
    pub fn push(&mut self, request: WatchRequest) -> bool {
        if self.contains(&request.caller_id) {
            return false;
        }
        self.watch_requests.push(request);
        true
    }

    /// Remove the caller's request, preserving the order of the rest
    pub fn remove(&mut self, caller_id: &str) -> Option<WatchRequest> {
        let pos = self
            .watch_requests
            .iter()
            .position(|r| r.caller_id == caller_id)?;
        Some(self.watch_requests.remove(pos))
    }

    pub fn callers(&self) -> impl Iterator<Item = &str> {
        self.watch_requests.iter().map(|r| r.caller_id.as_str())
    }
}

#[cfg(test)]
#[path = "watch_tests.rs"]
mod tests;
