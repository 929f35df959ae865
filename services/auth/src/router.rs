use axum::{
    Router,
    routing::{get, post},
};

use bookly_core::health::{healthz, readyz};
use bookly_core::middleware::{propagate_request_id_layer, request_id_layer, trace_layer};

use crate::handlers::{
    otp::issue_otp,
    session::{create_session, delete_session, get_session},
};
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        // Health
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz::<AppState>))
        // One-time passcodes
        .route("/auth/otp", post(issue_otp))
        // Session
        .route(
            "/auth/session",
            post(create_session).get(get_session).delete(delete_session),
        )
        .layer(propagate_request_id_layer())
        .layer(trace_layer())
        .layer(request_id_layer())
        .with_state(state)
}
