// ABOUTME: Liveness endpoint for load balancers and uptime checks
// ABOUTME: Reports service version and whether SQLite answers a trivial query

use axum::{extract::State, Json};
use chrono::Utc;
use porchlight_core::SERVICE_NAME;
use serde_json::{json, Value};
use tracing::warn;

use crate::state::AppState;

pub async fn health_check(State(state): State<AppState>) -> Json<Value> {
    let database = match sqlx::query_scalar::<_, i64>("SELECT 1")
        .fetch_one(&state.pool)
        .await
    {
        Ok(_) => "ok",
        Err(e) => {
            warn!("Health check database ping failed: {}", e);
            "unavailable"
        }
    };

    Json(json!({
        "status": if database == "ok" { "healthy" } else { "degraded" },
        "timestamp": Utc::now().timestamp(),
        "version": env!("CARGO_PKG_VERSION"),
        "service": SERVICE_NAME,
        "database": database,
    }))
}
