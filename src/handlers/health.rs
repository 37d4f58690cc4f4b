use axum::{extract::State, http::StatusCode, Json};
use serde_json::{json, Value};

use crate::services::dashboard::RefreshTrigger;
use crate::AppState;

pub async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "mood-queue",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Ready when today's data can be produced, from the cache or the store.
pub async fn readyz(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    let store = state.dashboard.store_name();
    match state.dashboard.refresh(RefreshTrigger::Probe).await {
        Ok(_) => (
            StatusCode::OK,
            Json(json!({
                "status": "ready",
                "checks": { "store": store, "read": "ok" },
            })),
        ),
        Err(e) => {
            tracing::warn!(error = %e, store, "Readiness check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "status": "not_ready",
                    "checks": { "store": store, "read": "failed" },
                })),
            )
        }
    }
}
