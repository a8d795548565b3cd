//! Route table for the Safe server.
//!
//! All operator-facing operations live under `/v1/sentinel` and pass
//! through the peer-context middleware, which lifts the transport-verified
//! identity and the correlation id into request extensions.

pub mod keystone;
pub mod secrets;

use std::sync::Arc;

use axum::routing::get;
use axum::Router;

use crate::middleware::peer_context;
use crate::state::AppState;

/// Build the full application router over the shared state.
pub fn build_router(state: Arc<AppState>) -> Router {
    let sentinel = Router::new()
        .route(
            "/secrets",
            get(secrets::list_secrets)
                .put(secrets::put_secrets)
                .delete(secrets::delete_secrets),
        )
        .route("/keystone", get(keystone::status));

    Router::new()
        .nest("/v1/sentinel", sentinel)
        .layer(axum::middleware::from_fn(peer_context))
        .with_state(state)
}
