// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Entity CRUD commands.
//!
//! Records stay opaque JSON on the CLI side; typed callers use the
//! gateway's generic methods directly.

use serde_json::Value;
use tm_core::SyncMetadata;

use crate::error::Result;
use crate::sync::SyncGateway;

pub async fn list(
    gateway: &SyncGateway,
    entity: &str,
    filter: Option<Value>,
    meta: SyncMetadata,
) -> Result<Value> {
    Ok(gateway.get_all(entity, filter, Some(meta)).await?)
}

pub async fn get(gateway: &SyncGateway, entity: &str, id: &str, meta: SyncMetadata) -> Result<Value> {
    Ok(gateway.get(entity, id, Some(meta)).await?)
}

pub async fn create(
    gateway: &SyncGateway,
    entity: &str,
    data: &Value,
    meta: SyncMetadata,
) -> Result<Value> {
    Ok(gateway.create(entity, data, Some(meta)).await?)
}

pub async fn update(
    gateway: &SyncGateway,
    entity: &str,
    id: &str,
    data: &Value,
    meta: SyncMetadata,
) -> Result<Value> {
    Ok(gateway.update(entity, id, data, Some(meta)).await?)
}

pub async fn update_all(
    gateway: &SyncGateway,
    entity: &str,
    data: &Value,
    meta: SyncMetadata,
) -> Result<Value> {
    Ok(gateway.update_all(entity, data, Some(meta)).await?)
}

pub async fn delete(
    gateway: &SyncGateway,
    entity: &str,
    id: &str,
    meta: SyncMetadata,
) -> Result<Value> {
    Ok(gateway.delete(entity, id, Some(meta)).await?)
}

#[cfg(test)]
#[path = "entity_tests.rs"]
mod tests;
