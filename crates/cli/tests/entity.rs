// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

mod common;
use common::*;

use serde_json::json;
use tm_ipc::Envelope;

#[test]
fn unsupported_entity_fails_before_routing() {
    let fx = Fixture::offline();
    fx.tm()
        .args(["get", "project", "p1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unsupported entity"));
}

#[test]
fn entity_outside_allow_list_is_unsupported() {
    let fx = Fixture::with_extra("\n[sync]\nentities = [\"todo\"]\n");
    fx.tm()
        .args(["list", "task"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unsupported entity"))
        .stderr(predicate::str::contains("supported entities are: todo\n"));
}

#[test]
fn offline_get_goes_to_executor() {
    let fx = Fixture::offline();
    let server = serve_executor(
        &fx.socket_path(),
        Envelope::success(json!({"id": "t1", "title": "Write docs"})),
        1,
    );

    let output = fx.tm().args(["get", "todo", "t1"]).output().unwrap();
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["title"], "Write docs");

    let calls = server.join().unwrap();
    assert_eq!(calls[0].procedure, "todoGet");
    assert_eq!(calls[0].args["id"], "t1");
    assert_eq!(
        calls[0].args["syncMetadata"],
        json!({"isOwner": true, "isPrivate": true})
    );
}

#[test]
fn shared_flags_reach_the_executor() {
    let fx = Fixture::offline();
    let server = serve_executor(&fx.socket_path(), Envelope::success(json!({"id": "k1"})), 1);

    fx.tm()
        .args(["--shared", "--not-owner", "update", "task", "k1", r#"{"done": true}"#])
        .assert()
        .success();

    let calls = server.join().unwrap();
    assert_eq!(calls[0].procedure, "taskUpdate");
    assert_eq!(calls[0].args["data"], json!({"done": true}));
    assert_eq!(
        calls[0].args["syncMetadata"],
        json!({"isOwner": false, "isPrivate": false})
    );
}

#[test]
fn rejected_envelope_exits_non_zero() {
    let fx = Fixture::offline();
    let server = serve_executor(&fx.socket_path(), Envelope::error("title is required"), 1);

    fx.tm()
        .args(["create", "todo", "{}"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("title is required"));

    server.join().unwrap();
}

#[test]
fn missing_executor_is_an_executor_error() {
    let fx = Fixture::offline();
    fx.tm()
        .args(["delete", "subtask", "s1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("command executor error"));
}
