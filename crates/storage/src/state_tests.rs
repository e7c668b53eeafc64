// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

fn row(id: &str, caller: &str) -> RequestRow {
    RequestRow::new(id, &WatchRequest::direct(caller))
}

fn create(state: &mut MaterializedState, target: &str, caller: &str) {
    state.apply(&Operation::WatchCreate {
        target_id: target.to_string(),
        created_by: caller.to_string(),
        requests: vec![row("row-1", caller)],
    });
}

#[test]
fn apply_watch_create() {
    let mut state = MaterializedState::default();
    create(&mut state, "u1", "c1");

    let record = state.get("u1").unwrap();
    assert_eq!(record.created_by, "c1");
    assert_eq!(record.callers().collect::<Vec<_>>(), vec!["c1"]);
}

#[test]
fn apply_append_then_delete_request() {
    let mut state = MaterializedState::default();
    create(&mut state, "u1", "c1");
    state.apply(&Operation::WatchAppend {
        target_id: "u1".to_string(),
        requests: vec![row("row-2", "c2")],
    });
    state.apply(&Operation::WatchRequestDelete {
        target_id: "u1".to_string(),
        caller_id: "c1".to_string(),
    });

    let record = state.get("u1").unwrap();
    assert_eq!(record.callers().collect::<Vec<_>>(), vec!["c2"]);
    // created_by keeps pointing at the originator
    assert_eq!(record.created_by, "c1");
}

#[test]
fn append_to_missing_aggregate_is_ignored() {
    let mut state = MaterializedState::default();
    state.apply(&Operation::WatchAppend {
        target_id: "u1".to_string(),
        requests: vec![row("row-1", "c1")],
    });
    assert!(state.get("u1").is_none());
}

#[test]
fn apply_watch_delete() {
    let mut state = MaterializedState::default();
    create(&mut state, "u1", "c1");
    state.apply(&Operation::WatchDelete {
        target_id: "u1".to_string(),
    });
    assert!(state.watches.is_empty());
}

#[test]
fn empty_record_has_no_target() {
    let mut state = MaterializedState::default();
    create(&mut state, "u1", "c1");
    state.apply(&Operation::WatchRequestDelete {
        target_id: "u1".to_string(),
        caller_id: "c1".to_string(),
    });

    let record = state.get("u1").unwrap();
    assert!(record.is_empty());
    assert!(record.to_target().is_none());
}

#[test]
fn to_operations_rebuilds_same_state() {
    let mut state = MaterializedState::default();
    create(&mut state, "u2", "c2");
    create(&mut state, "u1", "c1");
    state.apply(&Operation::WatchAppend {
        target_id: "u1".to_string(),
        requests: vec![row("row-3", "c3")],
    });

    let ops = state.to_operations();
    assert_eq!(ops.len(), 2);
    assert_eq!(ops[0].target_id(), "u1");

    let mut rebuilt = MaterializedState::default();
    for op in &ops {
        rebuilt.apply(op);
    }
    assert_eq!(rebuilt.watches, state.watches);
}
