// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::index::WatchIndex;
use std::sync::Arc;
use std::time::Duration;
use wp_adapters::FakeChatAdapter;
use wp_storage::{FakeStore, StoreOp};

struct Harness {
    registrar: Registrar<FakeStore>,
    dispatcher: Dispatcher<FakeStore, FakeChatAdapter>,
    store: FakeStore,
    chat: FakeChatAdapter,
}

fn setup() -> Harness {
    let store = FakeStore::new();
    let chat = FakeChatAdapter::new();
    let registrar = Registrar::new(Arc::new(WatchIndex::new()), store.clone());
    let dispatcher = Dispatcher::new(registrar.clone(), chat.clone(), NotifyConfig::default());
    Harness {
        registrar,
        dispatcher,
        store,
        chat,
    }
}

fn event() -> TargetEvent {
    TargetEvent::new("u1", "guild", "#general").with_link("https://chat/m/1")
}

async fn watch_dm_and_channel(h: &Harness) {
    h.registrar
        .add_watch("u1", "c1", NotificationMethod::DirectMessage)
        .await
        .unwrap();
    h.registrar
        .add_watch("u1", "c2", NotificationMethod::channel("lobby"))
        .await
        .unwrap();
}

#[tokio::test]
async fn unwatched_target_is_a_no_op() {
    let h = setup();

    let report = h.dispatcher.on_target_event(&event()).await;

    assert_eq!(report, DispatchReport::default());
    assert!(h.chat.calls().is_empty());
    assert!(h.store.calls().is_empty());
}

#[tokio::test]
async fn all_resolvable_watches_are_fulfilled() {
    let h = setup();
    watch_dm_and_channel(&h).await;
    h.chat.add_user("c1").add_channel("guild", "lobby");

    let report = h.dispatcher.on_target_event(&event()).await;

    assert_eq!(report.delivered, vec!["c1", "c2"]);
    assert_eq!(report.pending(), 0);

    let dm = h.chat.sent_to(&Destination::user("c1"));
    assert_eq!(dm.len(), 1);
    assert_eq!(
        dm[0].text,
        "<@c1>, u1 was just active in #general.\nhttps://chat/m/1"
    );
    let post = h.chat.sent_to(&Destination::channel("guild", "lobby"));
    assert_eq!(post.len(), 1);
    assert!(post[0].text.starts_with("<@c2>"));

    assert!(h.registrar.watches_for("u1").is_none());
    assert!(h.store.record("u1").is_none());
}

#[tokio::test]
async fn unresolvable_caller_stays_pending() {
    let h = setup();
    watch_dm_and_channel(&h).await;
    // c1 cannot be resolved right now, the channel can
    h.chat.add_channel("guild", "lobby");

    let report = h.dispatcher.on_target_event(&event()).await;

    assert_eq!(report.delivered, vec!["c2"]);
    assert_eq!(report.unresolved, vec!["c1"]);
    assert!(h.chat.sent_to(&Destination::user("c1")).is_empty());

    let target = h.registrar.watches_for("u1").unwrap();
    assert_eq!(target.callers().collect::<Vec<_>>(), vec!["c1"]);
    assert_eq!(
        h.store.record("u1").unwrap().callers().collect::<Vec<_>>(),
        vec!["c1"]
    );

    // Once resolvable, the next event fulfils it
    h.chat.add_user("c1");
    let report = h.dispatcher.on_target_event(&event()).await;
    assert_eq!(report.delivered, vec!["c1"]);
    assert!(h.registrar.watches_for("u1").is_none());
}

#[tokio::test]
async fn lookup_errors_are_treated_as_unresolved() {
    let h = setup();
    watch_dm_and_channel(&h).await;
    h.chat.add_user("c1").add_channel("guild", "lobby");
    h.chat.break_user("c1");

    let report = h.dispatcher.on_target_event(&event()).await;

    assert_eq!(report.unresolved, vec!["c1"]);
    assert_eq!(report.delivered, vec!["c2"]);
    assert!(h.registrar.index().contains("u1", "c1"));
}

#[tokio::test]
async fn channel_resolves_in_event_scope() {
    let h = setup();
    h.registrar
        .add_watch("u1", "c2", NotificationMethod::channel("lobby"))
        .await
        .unwrap();
    h.chat.add_channel("other-guild", "lobby");

    let report = h.dispatcher.on_target_event(&event()).await;

    assert_eq!(report.unresolved, vec!["c2"]);
    assert!(h.chat.calls().contains(&wp_adapters::ChatCall::ResolveChannel {
        scope_id: "guild".to_string(),
        channel_id: "lobby".to_string(),
    }));
}

#[tokio::test]
async fn failed_send_keeps_watch() {
    let h = setup();
    watch_dm_and_channel(&h).await;
    h.chat.add_user("c1").add_channel("guild", "lobby");
    h.chat.reject_sends_to(Destination::channel("guild", "lobby"));

    let report = h.dispatcher.on_target_event(&event()).await;

    assert_eq!(report.delivered, vec!["c1"]);
    assert_eq!(report.failed, vec!["c2"]);
    assert!(h.registrar.index().contains("u1", "c2"));
    assert!(!h.registrar.index().contains("u1", "c1"));
}

#[tokio::test]
async fn delivery_happens_once_per_watch() {
    let h = setup();
    h.registrar
        .add_watch("u1", "c1", NotificationMethod::DirectMessage)
        .await
        .unwrap();
    h.chat.add_user("c1");

    h.dispatcher.on_target_event(&event()).await;
    let second = h.dispatcher.on_target_event(&event()).await;

    assert_eq!(second, DispatchReport::default());
    assert_eq!(h.chat.sent().len(), 1);
}

#[tokio::test]
async fn removal_failure_after_send_never_sends_twice() {
    let h = setup();
    h.registrar
        .add_watch("u1", "c1", NotificationMethod::DirectMessage)
        .await
        .unwrap();
    h.chat.add_user("c1");
    h.store.fail_next(StoreOp::DeleteRequest);

    let report = h.dispatcher.on_target_event(&event()).await;
    assert_eq!(report.delivered, vec!["c1"]);

    let second = h.dispatcher.on_target_event(&event()).await;
    assert_eq!(second, DispatchReport::default());
    assert_eq!(h.chat.sent_to(&Destination::user("c1")).len(), 1);

    // The row is still stored until settled
    assert!(!h.registrar.index().contains("u1", "c1"));
    assert!(h.store.record("u1").is_some());
    assert_eq!(h.registrar.unsettled(), 1);

    assert_eq!(h.registrar.settle().await.unwrap(), 1);
    assert!(h.store.record("u1").is_none());
    assert_eq!(h.registrar.unsettled(), 0);
}

#[tokio::test]
async fn watch_cancelled_during_dispatch_is_skipped() {
    let h = setup();
    watch_dm_and_channel(&h).await;
    h.chat.add_user("c1").add_channel("guild", "lobby");
    h.chat.set_send_delay(Duration::from_millis(50));

    let dispatch = h.dispatcher.spawn(event());

    // c1 is being notified; cancel c2 while that send is in flight
    tokio::time::sleep(Duration::from_millis(10)).await;
    let removed = h.registrar.remove_watch("u1", "c2").await.unwrap();

    let report = dispatch.await.unwrap();
    assert!(removed);
    assert_eq!(report.delivered, vec!["c1"]);
    assert_eq!(report.skipped, vec!["c2"]);
    assert!(h
        .chat
        .sent_to(&Destination::channel("guild", "lobby"))
        .is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn overlapping_dispatches_notify_each_watcher_once() {
    let h = setup();
    for caller in ["c1", "c2", "c3"] {
        h.registrar
            .add_watch("u1", caller, NotificationMethod::DirectMessage)
            .await
            .unwrap();
        h.chat.add_user(caller);
    }
    h.chat.set_send_delay(Duration::from_millis(10));

    let handles: Vec<_> = (0..4).map(|_| h.dispatcher.spawn(event())).collect();
    let mut delivered = 0;
    for handle in handles {
        delivered += handle.await.unwrap().delivered.len();
    }

    assert_eq!(delivered, 3);
    for caller in ["c1", "c2", "c3"] {
        assert_eq!(h.chat.sent_to(&Destination::user(caller)).len(), 1);
    }
    assert!(h.registrar.index().is_empty());
    assert!(h.store.record("u1").is_none());
}

#[tokio::test]
async fn add_during_dispatch_waits_for_next_event() {
    let h = setup();
    h.registrar
        .add_watch("u1", "c1", NotificationMethod::DirectMessage)
        .await
        .unwrap();
    h.chat.add_user("c1").add_user("c2");
    h.chat.set_send_delay(Duration::from_millis(50));

    let dispatch = h.dispatcher.spawn(event());
    tokio::time::sleep(Duration::from_millis(10)).await;
    assert!(h
        .registrar
        .add_watch("u1", "c2", NotificationMethod::DirectMessage)
        .await
        .unwrap());

    let report = dispatch.await.unwrap();
    assert_eq!(report.delivered, vec!["c1"]);
    // c2 was not in the snapshot
    assert_eq!(
        h.registrar
            .watches_for("u1")
            .unwrap()
            .callers()
            .collect::<Vec<_>>(),
        vec!["c2"]
    );
}

#[tokio::test]
async fn without_transport_everything_stays_pending() {
    let h = setup();
    watch_dm_and_channel(&h).await;
    let dispatcher = Dispatcher::new(
        h.registrar.clone(),
        wp_adapters::NoOpChatAdapter::new(),
        NotifyConfig::default(),
    );

    let report = dispatcher.on_target_event(&event()).await;

    assert_eq!(report.unresolved, vec!["c1", "c2"]);
    assert_eq!(h.registrar.watches_for("u1").unwrap().len(), 2);
}

#[tokio::test]
async fn watch_replaced_during_dispatch_waits_for_next_event() {
    let h = setup();
    h.registrar
        .add_watch("u1", "c0", NotificationMethod::DirectMessage)
        .await
        .unwrap();
    h.registrar
        .add_watch("u1", "c2", NotificationMethod::channel("lobby"))
        .await
        .unwrap();
    h.chat
        .add_user("c0")
        .add_user("c2")
        .add_channel("guild", "lobby");
    h.chat.set_send_delay(Duration::from_millis(50));

    let dispatch = h.dispatcher.spawn(event());

    // Queue behind c0's delivery, then swap c2 to a direct message
    tokio::time::sleep(Duration::from_millis(10)).await;
    let guard = h.registrar.lock_target("u1").await;
    assert!(h.registrar.remove_watch_locked(&guard, "c2").await.unwrap());
    let replacement = WatchRequest::direct("c2");
    h.store
        .insert("u1", "c2", std::slice::from_ref(&replacement));
    h.registrar
        .index()
        .put(wp_core::WatchedTarget::new("u1", replacement.clone()));
    drop(guard);

    let report = dispatch.await.unwrap();
    assert_eq!(report.delivered, vec!["c0"]);
    assert_eq!(report.skipped, vec!["c2"]);
    assert!(h
        .chat
        .sent_to(&Destination::channel("guild", "lobby"))
        .is_empty());
    assert_eq!(
        h.registrar.watches_for("u1").unwrap().find("c2"),
        Some(&replacement)
    );

    let report = h.dispatcher.on_target_event(&event()).await;
    assert_eq!(report.delivered, vec!["c2"]);
    assert_eq!(h.chat.sent_to(&Destination::user("c2")).len(), 1);
}
