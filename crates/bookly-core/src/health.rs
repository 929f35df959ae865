use axum::extract::State;
use axum::http::StatusCode;

/// Dependency probe behind `GET /readyz`.
pub trait ReadinessCheck: Send + Sync {
    /// Returns `Err` with a short reason when a backing dependency is unreachable.
    fn check_ready(&self) -> impl Future<Output = Result<(), String>> + Send;
}

/// Handler for `GET /healthz`. Liveness only.
pub async fn healthz() -> StatusCode {
    StatusCode::OK
}

/// Handler for `GET /readyz`. 503 while any backing dependency is down.
pub async fn readyz<S: ReadinessCheck>(State(state): State<S>) -> StatusCode {
    match state.check_ready().await {
        Ok(()) => StatusCode::OK,
        Err(reason) => {
            tracing::warn!(%reason, "readiness check failed");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}
