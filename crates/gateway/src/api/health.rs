use axum::extract::State;
use axum::response::{IntoResponse, Json};

use crate::state::AppState;

/// `GET /` plain-text liveness line.
pub async fn root() -> &'static str {
    "Homework Helper API running"
}

/// `GET /api/health`
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "uptimeSecs": state.started_at.elapsed().as_secs(),
        "users": state.users.count(),
        "questions": state.questions.total(),
        "freeUserLimit": state.ledger.free_limit(),
        "timeZone": state.ledger.time_zone().name(),
    }))
}
