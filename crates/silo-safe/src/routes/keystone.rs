//! Keystone status route: `/v1/sentinel/keystone`.
//!
//! Only Sentinel may ask. The status is derived on demand from the
//! presence of the reserved keystone secret — if it exists, the init
//! flow finished at least once and a restarted Sentinel can skip its
//! init commands.

use std::sync::Arc;

use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::Response;
use axum::Extension;
use serde::Serialize;

use silo_core::gateway::RequestGate;
use silo_core::identity::Role;
use silo_core::journal::AuditEvent;
use silo_core::keystone::KeystoneStatus;

use crate::error::AppError;
use crate::middleware::PeerContext;
use crate::state::AppState;

/// Response body for the keystone status operation.
#[derive(Debug, Serialize)]
pub struct KeystoneStatusResponse {
    pub status: KeystoneStatus,
}

/// Report the keystone bootstrap status to Sentinel.
pub async fn status(
    State(state): State<Arc<AppState>>,
    Extension(peer): Extension<PeerContext>,
) -> Result<Response, AppError> {
    let mut gate = RequestGate::open(
        Arc::clone(&state.journal),
        &state.root_key,
        peer.correlation_id,
        "GET",
        "/v1/sentinel/keystone",
        peer.identity,
    )
    .await?;

    gate.require_role(&state.matcher, Role::Sentinel).await?;

    // The identity matched the sentinel namespace but carries nothing
    // after the prefix — a malformed peer SVID.
    if state.matcher.sentinel_suffix(gate.identity()).is_none() {
        gate.reject(AuditEvent::BadPeerSvid).await;
        return Err(AppError::BadRequest);
    }

    let status = match state.keystone.status().await {
        Ok(status) => status,
        Err(e) => {
            gate.reject(AuditEvent::StoreFailure).await;
            return Err(e.into());
        }
    };
    gate.ok().await;

    // Serialize after the terminal event, mirroring the request order in
    // the journal; a marshalling failure is an infrastructure error.
    let body = serde_json::to_vec(&KeystoneStatusResponse { status })
        .map_err(|e| AppError::Internal(format!("marshalling status response: {e}")))?;

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "application/json")
        .body(body.into())
        .map_err(|e| AppError::Internal(format!("building status response: {e}")))
}
