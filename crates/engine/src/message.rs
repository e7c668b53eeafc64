// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Notification text

use crate::config::NotifyConfig;
use wp_core::TargetEvent;

/// Render the message sent to a watcher when their target becomes active
///
/// The watcher is mentioned so channel posts reach them; the target is named
/// in plain text so it is not pinged about being watched.
pub fn render(caller_id: &str, event: &TargetEvent, config: &NotifyConfig) -> String {
    let mut text = format!(
        "<@{}>, {} was just active in {}.",
        caller_id, event.target_id, event.context.location
    );

    if config.include_link {
        if let Some(link) = &event.context.link {
            text.push('\n');
            text.push_str(link);
        }
    }

    text
}

#[cfg(test)]
#[path = "message_tests.rs"]
mod tests;
