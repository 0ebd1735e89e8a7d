// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]

use super::*;
use serde_json::json;
use yare::parameterized;

#[parameterized(
    get_all = { OpKind::GetAll, "getAll", "todoGetAll" },
    get = { OpKind::Get, "get", "todoGet" },
    create = { OpKind::Create, "create", "todoCreate" },
    update = { OpKind::Update, "update", "todoUpdate" },
    update_all = { OpKind::UpdateAll, "updateAll", "todoUpdateAll" },
    delete = { OpKind::Delete, "delete", "todoDelete" },
)]
fn op_names_for_todo(op: OpKind, action: &str, procedure: &str) {
    assert_eq!(op.action(), action);
    assert_eq!(op.procedure(EntityKind::Todo), procedure);
}

#[test]
fn procedure_uses_entity_prefix() {
    assert_eq!(OpKind::Create.procedure(EntityKind::Subtask), "subtaskCreate");
}

#[parameterized(
    get_all = { OpKind::GetAll, "get-todos", "todos-retrieved", "todos-retrieve-error" },
    get = { OpKind::Get, "get-todo-by-field", "todo-retrieved", "todo-retrieve-error" },
    create = { OpKind::Create, "create-todo", "todo-create-success", "todo-create-error" },
    update = { OpKind::Update, "update-todo", "todo-updated", "todo-update-error" },
    delete = { OpKind::Delete, "delete-todo", "todo-deleted", "todo-delete-error" },
)]
fn cloud_events_for_todo(op: OpKind, request: &str, success: &str, failure: &str) {
    let events = op.cloud_events(EntityKind::Todo).unwrap();
    assert_eq!(events.request, request);
    assert_eq!(events.success, success);
    assert_eq!(events.failure, failure);
}

#[test]
fn update_all_has_no_cloud_events() {
    assert!(OpKind::UpdateAll.cloud_events(EntityKind::Task).is_none());
    assert!(!OpKind::UpdateAll.is_cloud_served());
    assert!(OpKind::Delete.is_cloud_served());
}

#[parameterized(
    create = { OpKind::Create, Some("task-created") },
    update = { OpKind::Update, Some("task-updated") },
    delete = { OpKind::Delete, Some("task-deleted") },
    get_all = { OpKind::GetAll, None },
    update_all = { OpKind::UpdateAll, None },
)]
fn broadcast_event_for_writes(op: OpKind, expected: Option<&str>) {
    assert_eq!(
        op.broadcast_event(EntityKind::Task).as_deref(),
        expected
    );
}

#[test]
fn is_write() {
    assert!(!OpKind::GetAll.is_write());
    assert!(!OpKind::Get.is_write());
    assert!(OpKind::UpdateAll.is_write());
    assert!(OpKind::Delete.is_write());
}

#[test]
fn op_args_skip_absent_fields() {
    let args = OpArgs::new(SyncMetadata::default()).with_id("t1");
    assert_eq!(
        args.to_value(),
        json!({"id": "t1", "syncMetadata": {"isOwner": true, "isPrivate": true}})
    );
}

#[test]
fn op_args_full() {
    let args = OpArgs::new(SyncMetadata::shared(true))
        .with_filter(json!({"done": false}))
        .with_data(json!({"title": "x"}));
    let value = args.to_value();
    assert_eq!(value["filter"], json!({"done": false}));
    assert_eq!(value["data"], json!({"title": "x"}));
    assert_eq!(value["syncMetadata"]["isPrivate"], json!(false));
    assert!(value.get("id").is_none());
}
