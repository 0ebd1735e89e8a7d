// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use super::*;
use crate::sync::test_helpers::RecordingExecutor;
use serde_json::json;
use tm_core::ResponseStatus;
use yare::parameterized;

struct FakeLocal {
    connected: AtomicBool,
    calls: Mutex<Vec<(String, Value)>>,
    reply: Envelope,
}

impl FakeLocal {
    fn new(connected: bool, reply: Envelope) -> Arc<Self> {
        Arc::new(FakeLocal {
            connected: AtomicBool::new(connected),
            calls: Mutex::new(Vec::new()),
            reply,
        })
    }

    fn calls(&self) -> Vec<(String, Value)> {
        self.calls.lock().unwrap().clone()
    }
}

impl LocalBackend for FakeLocal {
    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    fn request<'a>(&'a self, action: &'a str, payload: Value) -> BoxFuture<'a, SyncResult<Envelope>> {
        self.calls
            .lock()
            .unwrap()
            .push((action.to_string(), payload));
        let reply = self.reply.clone();
        Box::pin(async move { Ok(reply) })
    }
}

struct FakeCloud {
    connected: bool,
    calls: Mutex<Vec<(EntityKind, OpKind, OpArgs)>>,
}

impl FakeCloud {
    fn new(connected: bool) -> Arc<Self> {
        Arc::new(FakeCloud {
            connected,
            calls: Mutex::new(Vec::new()),
        })
    }

    fn calls(&self) -> Vec<(EntityKind, OpKind, OpArgs)> {
        self.calls.lock().unwrap().clone()
    }
}

impl CloudBackend for FakeCloud {
    fn is_connected(&self) -> bool {
        self.connected
    }

    fn execute<'a>(
        &'a self,
        entity: EntityKind,
        op: OpKind,
        args: OpArgs,
    ) -> BoxFuture<'a, SyncResult<Envelope>> {
        self.calls.lock().unwrap().push((entity, op, args));
        Box::pin(async { Ok(Envelope::success(json!("cloud"))) })
    }
}

struct Harness {
    local: Arc<FakeLocal>,
    cloud: Arc<FakeCloud>,
    executor: Arc<RecordingExecutor>,
    gateway: SyncGateway,
}

fn harness(local_connected: bool, cloud_connected: bool) -> Harness {
    let local = FakeLocal::new(local_connected, Envelope::success(json!("local")));
    let cloud = FakeCloud::new(cloud_connected);
    let executor = RecordingExecutor::replying(Envelope::success(json!("executor")));
    let gateway = SyncGateway::new(local.clone(), executor.clone()).with_cloud(cloud.clone());
    Harness {
        local,
        cloud,
        executor,
        gateway,
    }
}

fn private() -> Option<SyncMetadata> {
    Some(SyncMetadata::default())
}

fn shared() -> Option<SyncMetadata> {
    Some(SyncMetadata::shared(false))
}

#[parameterized(
    local_wins_private = { true, true, OpKind::Get, true, Route::Local },
    local_wins_shared = { true, true, OpKind::Create, false, Route::Local },
    local_wins_update_all = { true, false, OpKind::UpdateAll, false, Route::Local },
    cloud_for_shared = { false, true, OpKind::Update, false, Route::Cloud },
    executor_for_private = { false, true, OpKind::Delete, true, Route::Executor },
    executor_when_cloud_down = { false, false, OpKind::GetAll, false, Route::Executor },
    update_all_skips_cloud = { false, true, OpKind::UpdateAll, false, Route::Executor },
)]
fn route_selection(local: bool, cloud: bool, op: OpKind, is_private: bool, expected: Route) {
    let meta = SyncMetadata::new(true, is_private);
    assert_eq!(select_route(local, cloud, op, &meta), expected);
}

#[tokio::test]
async fn unsupported_entity_fails_before_any_io() {
    let h = harness(true, true);

    let results = vec![
        h.gateway.get_all::<Value>("project", None, None).await.map(|_| ()),
        h.gateway.get::<Value>("project", "p1", None).await.map(|_| ()),
        h.gateway
            .create::<_, Value>("project", &json!({}), None)
            .await
            .map(|_| ()),
        h.gateway
            .update::<_, Value>("project", "p1", &json!({}), None)
            .await
            .map(|_| ()),
        h.gateway
            .update_all::<_, Value>("project", &json!({}), None)
            .await
            .map(|_| ()),
        h.gateway.delete::<Value>("project", "p1", None).await.map(|_| ()),
    ];

    for result in results {
        assert!(matches!(result, Err(SyncError::UnsupportedEntity { ref name, .. }) if name == "project"));
    }
    assert!(h.local.calls().is_empty());
    assert!(h.cloud.calls().is_empty());
    assert!(h.executor.calls().is_empty());
}

#[tokio::test]
async fn allow_list_restricts_known_entities() {
    let local = FakeLocal::new(true, Envelope::success(Value::Null));
    let executor = RecordingExecutor::replying(Envelope::success(Value::Null));
    let gateway = SyncGateway::new(local.clone(), executor).with_entities(vec![EntityKind::Todo]);

    assert_eq!(gateway.entities(), &[EntityKind::Todo]);
    assert!(gateway.resolve_entity("todos").is_ok());
    let err = gateway.get_all::<Value>("task", None, None).await.unwrap_err();
    assert!(matches!(err, SyncError::UnsupportedEntity { ref name, .. } if name == "task"));
    assert!(local.calls().is_empty());
}

#[test]
fn unsupported_hint_lists_only_allowed_entities() {
    let local = FakeLocal::new(true, Envelope::success(Value::Null));
    let executor = RecordingExecutor::replying(Envelope::success(Value::Null));
    let gateway = SyncGateway::new(local, executor)
        .with_entities(vec![EntityKind::Todo, EntityKind::Subtask]);

    let message = gateway.resolve_entity("task").unwrap_err().to_string();
    assert!(message.contains("unsupported entity: 'task'"));
    assert!(message.ends_with("supported entities are: todo, subtask"));

    let message = gateway.resolve_entity("project").unwrap_err().to_string();
    assert!(message.ends_with("supported entities are: todo, subtask"));
}

#[tokio::test]
async fn local_request_carries_entity_and_args() {
    let h = harness(true, true);

    let data: String = h
        .gateway
        .update("todo", "t1", &json!({"title": "New"}), shared())
        .await
        .unwrap();

    assert_eq!(data, "local");
    let calls = h.local.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].0, "update");
    assert_eq!(
        calls[0].1,
        json!({
            "entity": "todo",
            "id": "t1",
            "data": {"title": "New"},
            "syncMetadata": {"isOwner": false, "isPrivate": false},
        })
    );
    assert!(h.cloud.calls().is_empty());
    assert!(h.executor.calls().is_empty());
}

#[tokio::test]
async fn shared_record_goes_to_cloud_when_local_is_down() {
    let h = harness(false, true);

    let data: String = h.gateway.get_all("tasks", None, shared()).await.unwrap();

    assert_eq!(data, "cloud");
    let calls = h.cloud.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].0, EntityKind::Task);
    assert_eq!(calls[0].1, OpKind::GetAll);
    assert!(!calls[0].2.sync_metadata.is_private);
    assert!(h.local.calls().is_empty());
}

#[tokio::test]
async fn private_record_goes_to_executor_when_local_is_down() {
    let h = harness(false, true);

    let data: String = h.gateway.delete("subtask", "s1", private()).await.unwrap();

    assert_eq!(data, "executor");
    let calls = h.executor.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].0, "subtaskDelete");
    assert_eq!(calls[0].1["id"], "s1");
    assert!(h.cloud.calls().is_empty());
}

#[tokio::test]
async fn missing_metadata_is_treated_as_private() {
    let h = harness(false, true);

    let _: String = h.gateway.get("todo", "t1", None).await.unwrap();

    assert_eq!(h.executor.procedures(), vec!["todoGet".to_string()]);
    assert!(h.cloud.calls().is_empty());
}

#[tokio::test]
async fn update_all_never_reaches_cloud() {
    let h = harness(false, true);

    let _: String = h
        .gateway
        .update_all("todo", &json!({"done": true}), shared())
        .await
        .unwrap();

    assert_eq!(h.executor.procedures(), vec!["todoUpdateAll".to_string()]);
    assert!(h.cloud.calls().is_empty());
}

#[tokio::test]
async fn gateway_without_cloud_uses_executor_for_shared() {
    let local = FakeLocal::new(false, Envelope::success(Value::Null));
    let executor = RecordingExecutor::replying(Envelope::success(json!("executor")));
    let gateway = SyncGateway::new(local, executor.clone());

    assert_eq!(gateway.route_for(OpKind::Create, &SyncMetadata::shared(true)), Route::Executor);
    let data: String = gateway
        .create("todo", &json!({"title": "x"}), shared())
        .await
        .unwrap();
    assert_eq!(data, "executor");
    assert_eq!(executor.calls()[0].1["data"], json!({"title": "x"}));
}

#[test]
fn route_follows_live_connection_state() {
    let h = harness(true, false);
    assert_eq!(h.gateway.route_for(OpKind::Get, &SyncMetadata::default()), Route::Local);

    h.local.connected.store(false, Ordering::SeqCst);
    assert_eq!(h.gateway.route_for(OpKind::Get, &SyncMetadata::default()), Route::Executor);
}

#[tokio::test]
async fn non_success_envelope_is_rejected() {
    let local = FakeLocal::new(
        true,
        Envelope::new(ResponseStatus::Warning, "stale revision", Value::Null),
    );
    let executor = RecordingExecutor::replying(Envelope::success(Value::Null));
    let gateway = SyncGateway::new(local, executor);

    let err = gateway.get::<Value>("todo", "t1", None).await.unwrap_err();
    let SyncError::Rejected { status, message } = err else {
        unreachable!("expected rejection, got {:?}", err);
    };
    assert_eq!(status, ResponseStatus::Warning);
    assert_eq!(message, "stale revision");
}

#[derive(Debug, serde::Deserialize, PartialEq)]
struct Todo {
    id: String,
    title: String,
}

#[tokio::test]
async fn success_data_decodes_into_caller_type() {
    let local = FakeLocal::new(
        true,
        Envelope::success(json!([{"id": "t1", "title": "Write docs", "userId": "u"}])),
    );
    let executor = RecordingExecutor::replying(Envelope::success(Value::Null));
    let gateway = SyncGateway::new(local, executor);

    let todos: Vec<Todo> = gateway.get_all("todo", None, None).await.unwrap();
    assert_eq!(
        todos,
        vec![Todo {
            id: "t1".into(),
            title: "Write docs".into()
        }]
    );

    let err = gateway.get_all::<Vec<u32>>("todo", None, None).await.unwrap_err();
    assert!(matches!(err, SyncError::Json(_)));
}

#[tokio::test]
async fn bulk_sync_prefers_local_backend() {
    let h = harness(true, true);

    h.gateway.export().await.unwrap();
    h.gateway.import().await.unwrap();

    let actions: Vec<String> = h.local.calls().into_iter().map(|(a, _)| a).collect();
    assert_eq!(actions, vec!["export".to_string(), "import".to_string()]);
    assert!(h.executor.calls().is_empty());
}

#[tokio::test]
async fn bulk_sync_falls_back_to_executor() {
    let h = harness(false, true);

    let envelope = h.gateway.import().await.unwrap();
    h.gateway.export().await.unwrap();

    assert_eq!(envelope.data, json!("executor"));
    assert_eq!(
        h.executor.procedures(),
        vec!["syncImport".to_string(), "syncExport".to_string()]
    );
    assert!(h.cloud.calls().is_empty());
}
