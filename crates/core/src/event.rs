// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Observed target activity

use serde::{Deserialize, Serialize};

/// Where and how a target's activity was observed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventContext {
    /// Space the event happened in (server, workspace); channel watches
    /// resolve their channel within it
    pub scope_id: String,
    /// Human-facing name of the place the event happened
    pub location: String,
    /// Direct link to the event, when the transport has one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
}

/// A target produced an observable event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetEvent {
    pub target_id: String,
    pub context: EventContext,
}

impl TargetEvent {
    pub fn new(
        target_id: impl Into<String>,
        scope_id: impl Into<String>,
        location: impl Into<String>,
    ) -> Self {
        Self {
            target_id: target_id.into(),
            context: EventContext {
                scope_id: scope_id.into(),
                location: location.into(),
                link: None,
            },
        }
    }

    pub fn with_link(mut self, link: impl Into<String>) -> Self {
        self.context.link = Some(link.into());
        self
    }
}

#[cfg(test)]
#[path = "event_tests.rs"]
mod tests;
