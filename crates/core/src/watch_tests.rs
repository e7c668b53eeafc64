// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn new_target_has_single_request() {
    let target = WatchedTarget::new("u1", WatchRequest::direct("c1"));

    assert_eq!(target.target_id(), "u1");
    assert_eq!(target.len(), 1);
    assert!(target.contains("c1"));
}

#[test]
fn push_rejects_duplicate_caller() {
    let mut target = WatchedTarget::new("u1", WatchRequest::direct("c1"));

    // Same caller with a different method is still a duplicate
    assert!(!target.push(WatchRequest::in_channel("c1", "general")));
    assert_eq!(target.len(), 1);
    assert_eq!(
        target.find("c1").unwrap().method,
        NotificationMethod::DirectMessage
    );
}

#[test]
fn push_keeps_insertion_order() {
    let mut target = WatchedTarget::new("u1", WatchRequest::direct("c1"));
    assert!(target.push(WatchRequest::in_channel("c2", "general")));
    assert!(target.push(WatchRequest::direct("c3")));

    let callers: Vec<_> = target.callers().collect();
    assert_eq!(callers, vec!["c1", "c2", "c3"]);
}

#[test]
fn remove_returns_request_and_keeps_order() {
    let mut target = WatchedTarget::new("u1", WatchRequest::direct("c1"));
    target.push(WatchRequest::direct("c2"));
    target.push(WatchRequest::direct("c3"));

    let removed = target.remove("c2").unwrap();
    assert_eq!(removed.caller_id, "c2");

    let callers: Vec<_> = target.callers().collect();
    assert_eq!(callers, vec!["c1", "c3"]);
}

#[test]
fn remove_missing_caller_is_none() {
    let mut target = WatchedTarget::new("u1", WatchRequest::direct("c1"));
    assert!(target.remove("nobody").is_none());
    assert_eq!(target.len(), 1);
}

#[test]
fn removing_last_request_leaves_empty_aggregate() {
    let mut target = WatchedTarget::new("u1", WatchRequest::direct("c1"));
    target.remove("c1");
    assert!(target.is_empty());
}

#[test]
fn from_requests_empty_is_none() {
    assert!(WatchedTarget::from_requests("u1", Vec::new()).is_none());
}

#[test]
fn from_requests_drops_later_duplicates() {
    let target = WatchedTarget::from_requests(
        "u1",
        vec![
            WatchRequest::direct("c1"),
            WatchRequest::in_channel("c2", "general"),
            WatchRequest::in_channel("c1", "random"),
        ],
    )
    .unwrap();

    assert_eq!(target.len(), 2);
    assert_eq!(
        target.find("c1").unwrap().method,
        NotificationMethod::DirectMessage
    );
}

#[test]
fn channel_id_only_for_channel_method() {
    assert_eq!(NotificationMethod::DirectMessage.channel_id(), None);
    assert_eq!(
        NotificationMethod::channel("general").channel_id(),
        Some("general")
    );
}

#[test]
fn method_serializes_with_kind_tag() {
    let json = serde_json::to_string(&NotificationMethod::channel("general")).unwrap();
    assert_eq!(json, r#"{"kind":"channel","channel_id":"general"}"#);

    let json = serde_json::to_string(&NotificationMethod::DirectMessage).unwrap();
    assert_eq!(json, r#"{"kind":"direct_message"}"#);
}
