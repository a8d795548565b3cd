//! Peer context middleware.
//!
//! The mutual-TLS terminator in front of Safe verifies the client
//! certificate and forwards the peer's identity string in a trusted
//! header. This middleware lifts that header — and the correlation id —
//! into a [`PeerContext`] request extension for the handlers. The core
//! trusts only this transport-verified identity, never a body field.

use axum::extract::Request;
use axum::http::HeaderMap;
use axum::middleware::Next;
use axum::response::Response;

/// Header carrying the transport-verified peer identity.
pub const PEER_ID_HEADER: &str = "x-silo-peer-id";

/// Header carrying the caller-supplied correlation id.
pub const CORRELATION_ID_HEADER: &str = "x-silo-correlation-id";

/// Per-request peer context injected into request extensions.
#[derive(Debug, Clone)]
pub struct PeerContext {
    /// Verified peer identity; empty when the terminator sent none, which
    /// downstream resolves to the `Unknown` role.
    pub identity: String,
    /// Correlation id threading the request through journal and logs.
    /// Generated here when the caller supplied none.
    pub correlation_id: String,
}

/// Middleware that builds the [`PeerContext`] for every request.
pub async fn peer_context(mut req: Request, next: Next) -> Response {
    let ctx = PeerContext {
        identity: header_value(req.headers(), PEER_ID_HEADER).unwrap_or_default(),
        correlation_id: header_value(req.headers(), CORRELATION_ID_HEADER)
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string()),
    };
    req.extensions_mut().insert(ctx);
    next.run(req).await
}

fn header_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(ToOwned::to_owned)
}
