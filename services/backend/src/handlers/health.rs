use axum::{extract::State, Json};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::state::AppState;

pub async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

pub async fn detailed_health(State(state): State<AppState>) -> Json<Value> {
    // A cheap read probe; the nil id is never assigned to a record.
    let storage_healthy = state
        .store
        .users()
        .find_by_id(Uuid::nil())
        .await
        .is_ok();

    Json(json!({
        "status": if storage_healthy { "healthy" } else { "degraded" },
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "components": {
            "storage": if storage_healthy { "healthy" } else { "unhealthy" },
        }
    }))
}
