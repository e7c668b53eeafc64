// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Notification dispatcher
//!
//! Turns an observed target event into one message per pending watch. The
//! request list is snapshotted when dispatch starts; each request is then
//! handled under the target's lock so a watch cancelled, replaced or
//! fulfilled in the meantime is skipped instead of notified twice.

use crate::config::NotifyConfig;
use crate::message;
use crate::registrar::Registrar;
use tokio::task::JoinHandle;
use tracing::Instrument;
use wp_adapters::{ChatAdapter, Destination};
use wp_core::{NotificationMethod, TargetEvent, WatchRequest};
use wp_storage::WatchStore;

/// What happened to each request during one dispatch, by caller id
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchReport {
    /// Notified and removed
    pub delivered: Vec<String>,
    /// Destination could not be resolved; still pending
    pub unresolved: Vec<String>,
    /// Send failed; still pending
    pub failed: Vec<String>,
    /// Removed or replaced after the snapshot was taken
    pub skipped: Vec<String>,
}

impl DispatchReport {
    /// Requests left pending by this dispatch
    pub fn pending(&self) -> usize {
        self.unresolved.len() + self.failed.len()
    }
}

enum Outcome {
    Delivered,
    Unresolved,
    Failed,
    Skipped,
}

/// Fulfils watches when their target becomes active
#[derive(Clone)]
pub struct Dispatcher<S, C> {
    registrar: Registrar<S>,
    chat: C,
    notify: NotifyConfig,
}

impl<S, C> Dispatcher<S, C>
where
    S: WatchStore,
    C: ChatAdapter,
{
    pub fn new(registrar: Registrar<S>, chat: C, notify: NotifyConfig) -> Self {
        Self {
            registrar,
            chat,
            notify,
        }
    }

    /// Run [`Dispatcher::on_target_event`] as an independent task
    pub fn spawn(&self, event: TargetEvent) -> JoinHandle<DispatchReport> {
        let dispatcher = self.clone();
        tokio::spawn(async move { dispatcher.on_target_event(&event).await })
    }

    /// Notify everyone watching `event.target_id`
    ///
    /// A failure on one request never stops the others. Requests whose
    /// destination cannot be resolved or whose send fails stay pending for a
    /// later event.
    pub async fn on_target_event(&self, event: &TargetEvent) -> DispatchReport {
        let span = tracing::info_span!(
            "dispatch",
            target_id = %event.target_id,
            location = %event.context.location
        );

        async move {
            let mut report = DispatchReport::default();

            let Some(snapshot) = self.registrar.watches_for(&event.target_id) else {
                tracing::trace!("target not watched");
                return report;
            };

            for request in snapshot.requests() {
                let caller = request.caller_id.clone();
                match self.fulfill(event, request).await {
                    Outcome::Delivered => report.delivered.push(caller),
                    Outcome::Unresolved => report.unresolved.push(caller),
                    Outcome::Failed => report.failed.push(caller),
                    Outcome::Skipped => report.skipped.push(caller),
                }
            }

            tracing::info!(
                delivered = report.delivered.len(),
                pending = report.pending(),
                skipped = report.skipped.len(),
                "dispatch complete"
            );
            report
        }
        .instrument(span)
        .await
    }

    async fn fulfill(&self, event: &TargetEvent, request: &WatchRequest) -> Outcome {
        let caller_id = request.caller_id.as_str();
        let guard = self.registrar.lock_target(&event.target_id).await;

        // Only the request as snapshotted; a re-added one waits for the next event
        let current = self
            .registrar
            .watches_for(&event.target_id)
            .and_then(|t| t.find(caller_id).cloned());
        if current.as_ref() != Some(request) {
            tracing::debug!(caller_id, "watch changed since snapshot");
            return Outcome::Skipped;
        }

        let Some(destination) = self.resolve(event, request).await else {
            return Outcome::Unresolved;
        };

        let text = message::render(caller_id, event, &self.notify);
        if let Err(e) = self.chat.send(&destination, &text).await {
            tracing::warn!(caller_id, %destination, error = %e, "notification not sent, keeping watch");
            return Outcome::Failed;
        }

        if let Err(e) = self.registrar.complete_watch_locked(&guard, caller_id).await {
            tracing::error!(caller_id, error = %e, "fulfilled watch not cleared from store");
        }
        Outcome::Delivered
    }

    async fn resolve(&self, event: &TargetEvent, request: &WatchRequest) -> Option<Destination> {
        let caller_id = request.caller_id.as_str();
        let result = match &request.method {
            NotificationMethod::DirectMessage => self.chat.resolve_user(caller_id).await,
            NotificationMethod::Channel { channel_id } => {
                self.chat
                    .resolve_channel(&event.context.scope_id, channel_id)
                    .await
            }
        };

        match result {
            Ok(Some(destination)) => Some(destination),
            Ok(None) => {
                tracing::warn!(
                    caller_id,
                    method = request.method.name(),
                    "destination not resolvable, keeping watch"
                );
                None
            }
            Err(e) => {
                tracing::warn!(
                    caller_id,
                    method = request.method.name(),
                    error = %e,
                    "destination lookup failed, keeping watch"
                );
                None
            }
        }
    }
}

#[cfg(test)]
#[path = "dispatcher_tests.rs"]
mod tests;
