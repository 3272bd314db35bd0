//! Read-only usage endpoints.
//!
//! - `GET /api/user/:id/usage`      usage counter and subscription flag
//! - `GET /api/user/:id/questions`  recent question history
//! - `GET /api/config`              client-facing limits

use axum::extract::{Path, Query, State};
use axum::response::{IntoResponse, Json};
use serde::{Deserialize, Serialize};

use hh_domain::user::Caller;
use hh_ledger::UsageStatus;

use crate::questions::QuestionEntry;
use crate::state::AppState;

const MAX_HISTORY: usize = 100;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// GET /api/user/:id/usage
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Always 200.  Guests, unknown ids and store failures all get the guest
/// defaults so the client can keep rendering.
pub async fn user_usage(State(state): State<AppState>, Path(id): Path<String>) -> Json<UsageStatus> {
    Json(state.ledger.get_status(Caller::from_raw(Some(id.as_str()))))
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// GET /api/user/:id/questions
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    #[serde(default = "default_history_limit")]
    limit: usize,
}

fn default_history_limit() -> usize {
    20
}

pub async fn user_questions(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(q): Query<HistoryQuery>,
) -> Json<Vec<QuestionEntry>> {
    let Caller::User(user_id) = Caller::from_raw(Some(id.as_str())) else {
        return Json(Vec::new());
    };
    let limit = q.limit.min(MAX_HISTORY);
    Json(state.questions.recent_for(&user_id, limit).await)
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// GET /api/config
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ClientConfig {
    free_user_limit: u64,
}

pub async fn client_config(State(state): State<AppState>) -> impl IntoResponse {
    Json(ClientConfig {
        free_user_limit: state.ledger.free_limit(),
    })
}
