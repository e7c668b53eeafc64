// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Traced adapter wrappers for consistent observability

use crate::chat::{ChatAdapter, ChatError, Destination};
use async_trait::async_trait;
use tracing::Instrument;

/// Wrapper that adds tracing to any ChatAdapter
#[derive(Clone)]
pub struct TracedChatAdapter<C> {
    inner: C,
}

impl<C> TracedChatAdapter<C> {
    pub fn new(inner: C) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl<C: ChatAdapter> ChatAdapter for TracedChatAdapter<C> {
    async fn resolve_user(&self, user_id: &str) -> Result<Option<Destination>, ChatError> {
        let span = tracing::debug_span!("chat.resolve_user", user_id);

        async move {
            let result = self.inner.resolve_user(user_id).await;
            match &result {
                Ok(Some(_)) => tracing::debug!("resolved"),
                Ok(None) => tracing::debug!("user not found"),
                Err(e) => tracing::warn!(error = %e, "resolve failed"),
            }
            result
        }
        .instrument(span)
        .await
    }

    async fn resolve_channel(
        &self,
        scope_id: &str,
        channel_id: &str,
    ) -> Result<Option<Destination>, ChatError> {
        let span = tracing::debug_span!("chat.resolve_channel", scope_id, channel_id);

        async move {
            let result = self.inner.resolve_channel(scope_id, channel_id).await;
            match &result {
                Ok(Some(_)) => tracing::debug!("resolved"),
                Ok(None) => tracing::debug!("channel not found"),
                Err(e) => tracing::warn!(error = %e, "resolve failed"),
            }
            result
        }
        .instrument(span)
        .await
    }

    async fn send(&self, destination: &Destination, text: &str) -> Result<(), ChatError> {
        let span = tracing::info_span!("chat.send", destination = %destination);

        async move {
            tracing::info!(text_len = text.len(), "sending");

            // Precondition: never post an empty message
            if text.trim().is_empty() {
                tracing::error!("refusing to send empty message");
                return Err(ChatError::Rejected {
                    destination: destination.to_string(),
                    reason: "empty message".to_string(),
                });
            }

            let start = std::time::Instant::now();
            let result = self.inner.send(destination, text).await;
            let elapsed = start.elapsed();

            match &result {
                Ok(()) => tracing::info!(elapsed_ms = elapsed.as_millis() as u64, "sent"),
                Err(e) => tracing::error!(
                    elapsed_ms = elapsed.as_millis() as u64,
                    error = %e,
                    "send failed"
                ),
            }

            result
        }
        .instrument(span)
        .await
    }
}

#[cfg(test)]
#[path = "traced_tests.rs"]
mod tests;
