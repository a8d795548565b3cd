//! Sentinel secret routes: `/v1/sentinel/secrets`.
//!
//! Every handler walks the same gateway sequence: admit the request
//! through the [`RequestGate`] (root-key precheck + `Enter`), check the
//! operator role, parse and validate the body, perform the store
//! operation, then journal exactly one terminal event. Bodies are read
//! raw so that parse failures can be journaled with the proper tag
//! before the rejection is sent.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use silo_core::gateway::RequestGate;
use silo_core::identity::Role;
use silo_core::journal::AuditEvent;
use silo_core::keystone::KEYSTONE_SECRET_NAME;
use silo_core::secret::{SecretFormat, SecretMeta, SecretStored};
use silo_core::store::SecretUpsert;

use crate::error::AppError;
use crate::middleware::PeerContext;
use crate::state::AppState;

// ── Request/response types ───────────────────────────────────────────

/// Body of a delete-secrets request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecretDeleteRequest {
    /// Workload ids whose secrets should be removed.
    pub workload_ids: Vec<String>,
}

/// Body of a put-secrets request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecretPutRequest {
    /// Workload ids the secret is stored under (one record each).
    pub workload_ids: Vec<String>,
    /// Raw secret content.
    pub value: String,
    /// Optional template applied before format checks.
    #[serde(default)]
    pub template: String,
    /// Target output format.
    #[serde(default)]
    pub format: SecretFormat,
    /// Optional validity window lower bound.
    #[serde(default)]
    pub not_before: Option<DateTime<Utc>>,
    /// Optional validity window upper bound.
    #[serde(default)]
    pub expires_after: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    /// Include raw values in the listing.
    #[serde(default)]
    pub reveal: bool,
}

/// One secret in a listing. Raw value only present with `reveal=true`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SecretListItem {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    pub value_transformed: String,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct SecretListResponse {
    pub secrets: Vec<SecretListItem>,
}

// ── Handlers ─────────────────────────────────────────────────────────

/// Delete the secrets named by the request's workload ids.
///
/// Deleting absent names succeeds (idempotent). The reserved keystone
/// secret is skipped so the readiness signal stays monotone.
pub async fn delete_secrets(
    State(state): State<Arc<AppState>>,
    Extension(peer): Extension<PeerContext>,
    body: Bytes,
) -> Result<StatusCode, AppError> {
    let mut gate = RequestGate::open(
        Arc::clone(&state.journal),
        &state.root_key,
        peer.correlation_id,
        "DELETE",
        "/v1/sentinel/secrets",
        peer.identity,
    )
    .await?;

    gate.require_role(&state.matcher, Role::Sentinel).await?;

    let req: SecretDeleteRequest = match parse_body(&body) {
        Ok(req) => req,
        Err(tag) => {
            gate.reject(tag).await;
            return Err(AppError::BadRequest);
        }
    };

    if req.workload_ids.is_empty() {
        gate.reject(AuditEvent::NoWorkloadId).await;
        return Err(AppError::BadRequest);
    }

    debug!(correlation_id = %gate.correlation_id(), ids = ?req.workload_ids, "deleting secrets");

    for workload_id in &req.workload_ids {
        if workload_id == KEYSTONE_SECRET_NAME {
            warn!(
                correlation_id = %gate.correlation_id(),
                "refusing to delete the keystone secret"
            );
            continue;
        }
        if let Err(e) = state.store.delete(workload_id).await {
            gate.reject(AuditEvent::StoreFailure).await;
            return Err(e.into());
        }
    }

    gate.ok().await;
    Ok(StatusCode::OK)
}

/// Create or overwrite one secret per workload id in the request.
pub async fn put_secrets(
    State(state): State<Arc<AppState>>,
    Extension(peer): Extension<PeerContext>,
    body: Bytes,
) -> Result<StatusCode, AppError> {
    let mut gate = RequestGate::open(
        Arc::clone(&state.journal),
        &state.root_key,
        peer.correlation_id,
        "PUT",
        "/v1/sentinel/secrets",
        peer.identity,
    )
    .await?;

    gate.require_role(&state.matcher, Role::Sentinel).await?;

    let req: SecretPutRequest = match parse_body(&body) {
        Ok(req) => req,
        Err(tag) => {
            gate.reject(tag).await;
            return Err(AppError::BadRequest);
        }
    };

    if req.workload_ids.is_empty() {
        gate.reject(AuditEvent::NoWorkloadId).await;
        return Err(AppError::BadRequest);
    }

    if req.value.is_empty() {
        gate.reject(AuditEvent::RequestTypeMismatch).await;
        return Err(AppError::BadRequest);
    }

    for workload_id in &req.workload_ids {
        let result = state
            .store
            .put(SecretUpsert {
                name: workload_id.clone(),
                value: req.value.clone(),
                meta: SecretMeta {
                    template: req.template.clone(),
                    format: req.format,
                    correlation_id: gate.correlation_id().to_owned(),
                },
                not_before: req.not_before,
                expires_after: req.expires_after,
            })
            .await;
        if let Err(e) = result {
            gate.reject(AuditEvent::StoreFailure).await;
            return Err(e.into());
        }
    }

    gate.ok().await;
    Ok(StatusCode::OK)
}

/// List stored secrets, rendered; raw values only with `reveal=true`.
pub async fn list_secrets(
    State(state): State<Arc<AppState>>,
    Extension(peer): Extension<PeerContext>,
    Query(query): Query<ListQuery>,
) -> Result<Json<SecretListResponse>, AppError> {
    let mut gate = RequestGate::open(
        Arc::clone(&state.journal),
        &state.root_key,
        peer.correlation_id,
        "GET",
        "/v1/sentinel/secrets",
        peer.identity,
    )
    .await?;

    gate.require_role(&state.matcher, Role::Sentinel).await?;

    let secrets = match state.store.list(false).await {
        Ok(secrets) => secrets,
        Err(e) => {
            gate.reject(AuditEvent::StoreFailure).await;
            return Err(e.into());
        }
    };
    let items = secrets
        .into_iter()
        .map(|s| list_item(s, query.reveal))
        .collect();

    gate.ok().await;
    Ok(Json(SecretListResponse { secrets: items }))
}

// ── Helpers ──────────────────────────────────────────────────────────

fn list_item(secret: SecretStored, reveal: bool) -> SecretListItem {
    SecretListItem {
        name: secret.name,
        value: reveal.then_some(secret.value),
        value_transformed: secret.value_transformed,
        created: secret.created,
        updated: secret.updated,
    }
}

/// Parse a raw body, classifying the failure for the journal:
/// syntactically broken input is `BrokenBody`, a well-formed document of
/// the wrong shape is `RequestTypeMismatch`.
fn parse_body<T: serde::de::DeserializeOwned>(body: &Bytes) -> Result<T, AuditEvent> {
    serde_json::from_slice(body).map_err(|e| match e.classify() {
        serde_json::error::Category::Data => AuditEvent::RequestTypeMismatch,
        _ => AuditEvent::BrokenBody,
    })
}
