// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! No-op chat adapter for when no transport is connected.

use super::{ChatAdapter, ChatError, Destination};
use async_trait::async_trait;

/// Chat adapter that resolves nothing and drops every message.
///
/// With it every watch stays pending, which makes it suitable for running the
/// registry without a transport (maintenance, recovery checks).
#[derive(Clone, Copy, Debug, Default)]
pub struct NoOpChatAdapter;

impl NoOpChatAdapter {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ChatAdapter for NoOpChatAdapter {
    async fn resolve_user(&self, _user_id: &str) -> Result<Option<Destination>, ChatError> {
        Ok(None)
    }

    async fn resolve_channel(
        &self,
        _scope_id: &str,
        _channel_id: &str,
    ) -> Result<Option<Destination>, ChatError> {
        Ok(None)
    }

    async fn send(&self, _destination: &Destination, _text: &str) -> Result<(), ChatError> {
        Ok(())
    }
}
