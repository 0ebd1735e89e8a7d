// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Sync Gateway: the single entry point for entity operations.
//!
//! Each call is routed, in order of preference, to:
//! 1. the Local Channel when it is connected,
//! 2. the Cloud Channel for shared records when it is connected and serves
//!    the operation,
//! 3. the Command Executor otherwise.
//!
//! Route selection reads connection state at call time and never caches it.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};
use tm_core::op::{EXPORT_ACTION, EXPORT_PROCEDURE, IMPORT_ACTION, IMPORT_PROCEDURE};
use tm_core::{EntityKind, Envelope, OpArgs, OpKind, SyncMetadata};
use tracing::debug;

use super::cloud::CloudChannel;
use super::error::{entity_names, SyncError, SyncResult};
use super::executor::{BoxFuture, CommandExecutor};
use super::local::LocalChannel;
use super::orchestrator::BulkSync;

/// Where one operation is sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Local,
    Cloud,
    Executor,
}

/// Picks the transport for one operation.
pub fn select_route(
    local_connected: bool,
    cloud_connected: bool,
    op: OpKind,
    meta: &SyncMetadata,
) -> Route {
    if local_connected {
        Route::Local
    } else if !meta.is_private && cloud_connected && op.is_cloud_served() {
        Route::Cloud
    } else {
        Route::Executor
    }
}

/// Local backend as seen by the gateway.
pub trait LocalBackend: Send + Sync {
    fn is_connected(&self) -> bool;
    fn request<'a>(&'a self, action: &'a str, payload: Value) -> BoxFuture<'a, SyncResult<Envelope>>;
}

impl LocalBackend for LocalChannel {
    fn is_connected(&self) -> bool {
        LocalChannel::is_connected(self)
    }

    fn request<'a>(&'a self, action: &'a str, payload: Value) -> BoxFuture<'a, SyncResult<Envelope>> {
        Box::pin(LocalChannel::request(self, action, payload))
    }
}

/// Cloud backend as seen by the gateway.
pub trait CloudBackend: Send + Sync {
    fn is_connected(&self) -> bool;
    fn execute<'a>(
        &'a self,
        entity: EntityKind,
        op: OpKind,
        args: OpArgs,
    ) -> BoxFuture<'a, SyncResult<Envelope>>;
}

impl CloudBackend for CloudChannel {
    fn is_connected(&self) -> bool {
        CloudChannel::is_connected(self)
    }

    fn execute<'a>(
        &'a self,
        entity: EntityKind,
        op: OpKind,
        args: OpArgs,
    ) -> BoxFuture<'a, SyncResult<Envelope>> {
        Box::pin(CloudChannel::execute(self, entity, op, args))
    }
}

/// Routes entity operations to the best available transport.
pub struct SyncGateway {
    local: Arc<dyn LocalBackend>,
    cloud: Option<Arc<dyn CloudBackend>>,
    executor: Arc<dyn CommandExecutor>,
    entities: Vec<EntityKind>,
}

impl SyncGateway {
    /// Creates a gateway with no cloud backend that allows every entity kind.
    pub fn new(local: Arc<dyn LocalBackend>, executor: Arc<dyn CommandExecutor>) -> Self {
        SyncGateway {
            local,
            cloud: None,
            executor,
            entities: EntityKind::ALL.to_vec(),
        }
    }

    pub fn with_cloud(mut self, cloud: Arc<dyn CloudBackend>) -> Self {
        self.cloud = Some(cloud);
        self
    }

    /// Restricts the entity allow-list.
    pub fn with_entities(mut self, entities: Vec<EntityKind>) -> Self {
        self.entities = entities;
        self
    }

    pub fn entities(&self) -> &[EntityKind] {
        &self.entities
    }

    /// Parses an entity name and checks it against the allow-list.
    pub fn resolve_entity(&self, name: &str) -> SyncResult<EntityKind> {
        name.parse::<EntityKind>()
            .ok()
            .filter(|kind| self.entities.contains(kind))
            .ok_or_else(|| SyncError::UnsupportedEntity {
                name: name.to_string(),
                supported: entity_names(&self.entities),
            })
    }

    /// Route the next call for `op` would take right now.
    pub fn route_for(&self, op: OpKind, meta: &SyncMetadata) -> Route {
        let cloud_connected = self.cloud.as_ref().is_some_and(|c| c.is_connected());
        select_route(self.local.is_connected(), cloud_connected, op, meta)
    }

    pub async fn get_all<T: DeserializeOwned>(
        &self,
        entity: &str,
        filter: Option<Value>,
        meta: Option<SyncMetadata>,
    ) -> SyncResult<T> {
        let mut args = OpArgs::new(meta.unwrap_or_default());
        args.filter = filter;
        self.call(entity, OpKind::GetAll, args).await
    }

    pub async fn get<T: DeserializeOwned>(
        &self,
        entity: &str,
        id: &str,
        meta: Option<SyncMetadata>,
    ) -> SyncResult<T> {
        let args = OpArgs::new(meta.unwrap_or_default()).with_id(id);
        self.call(entity, OpKind::Get, args).await
    }

    pub async fn create<D: Serialize, T: DeserializeOwned>(
        &self,
        entity: &str,
        data: &D,
        meta: Option<SyncMetadata>,
    ) -> SyncResult<T> {
        let args = OpArgs::new(meta.unwrap_or_default()).with_data(serde_json::to_value(data)?);
        self.call(entity, OpKind::Create, args).await
    }

    pub async fn update<D: Serialize, T: DeserializeOwned>(
        &self,
        entity: &str,
        id: &str,
        data: &D,
        meta: Option<SyncMetadata>,
    ) -> SyncResult<T> {
        let args = OpArgs::new(meta.unwrap_or_default())
            .with_id(id)
            .with_data(serde_json::to_value(data)?);
        self.call(entity, OpKind::Update, args).await
    }

    pub async fn update_all<D: Serialize, T: DeserializeOwned>(
        &self,
        entity: &str,
        data: &D,
        meta: Option<SyncMetadata>,
    ) -> SyncResult<T> {
        let args = OpArgs::new(meta.unwrap_or_default()).with_data(serde_json::to_value(data)?);
        self.call(entity, OpKind::UpdateAll, args).await
    }

    pub async fn delete<T: DeserializeOwned>(
        &self,
        entity: &str,
        id: &str,
        meta: Option<SyncMetadata>,
    ) -> SyncResult<T> {
        let args = OpArgs::new(meta.unwrap_or_default()).with_id(id);
        self.call(entity, OpKind::Delete, args).await
    }

    async fn call<T: DeserializeOwned>(
        &self,
        entity: &str,
        op: OpKind,
        args: OpArgs,
    ) -> SyncResult<T> {
        let envelope = self.execute(entity, op, args).await?;
        unwrap_envelope(envelope)
    }

    /// Runs one operation and returns the raw envelope.
    ///
    /// Unsupported entities fail before any transport is touched.
    pub async fn execute(&self, entity: &str, op: OpKind, args: OpArgs) -> SyncResult<Envelope> {
        let kind = self.resolve_entity(entity)?;
        let route = self.route_for(op, &args.sync_metadata);
        debug!(entity = %kind, op = %op, ?route, "routing operation");

        match (route, self.cloud.as_ref()) {
            (Route::Local, _) => {
                let mut payload = args.to_value();
                if let Some(obj) = payload.as_object_mut() {
                    obj.insert("entity".to_string(), Value::String(kind.as_str().to_string()));
                }
                self.local.request(op.action(), payload).await
            }
            (Route::Cloud, Some(cloud)) => cloud.execute(kind, op, args).await,
            _ => {
                self.executor
                    .invoke(&op.procedure(kind), args.to_value())
                    .await
            }
        }
    }

    async fn bulk(&self, action: &str, procedure: &str) -> SyncResult<Envelope> {
        if self.local.is_connected() {
            debug!(action, "bulk sync via local backend");
            self.local.request(action, json!({})).await
        } else {
            debug!(procedure, "bulk sync via command executor");
            self.executor.invoke(procedure, json!({})).await
        }
    }
}

impl BulkSync for SyncGateway {
    fn import(&self) -> BoxFuture<'_, SyncResult<Envelope>> {
        Box::pin(self.bulk(IMPORT_ACTION, IMPORT_PROCEDURE))
    }

    fn export(&self) -> BoxFuture<'_, SyncResult<Envelope>> {
        Box::pin(self.bulk(EXPORT_ACTION, EXPORT_PROCEDURE))
    }
}

/// Turns an envelope into typed data, or a [`SyncError::Rejected`].
pub fn unwrap_envelope<T: DeserializeOwned>(envelope: Envelope) -> SyncResult<T> {
    if !envelope.is_success() {
        return Err(SyncError::Rejected {
            status: envelope.status,
            message: envelope.message,
        });
    }
    Ok(envelope.into_data()?)
}

#[cfg(test)]
#[path = "gateway_tests.rs"]
mod tests;
