//! `POST /api/chat`, the metered question endpoint.
//!
//! Order matters: the free-tier gate runs before the AI call, and usage is
//! only counted once an answer came back.  A failed AI call leaves the
//! caller's counter untouched.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use hh_domain::user::{Caller, UserType};
use hh_ledger::{Admission, QuotaExceeded};

use super::api_error;
use crate::questions::QuestionEntry;
use crate::state::AppState;

const QUOTA_MESSAGE: &str = "Free usage limit reached. Please subscribe to continue.";
const AI_UNAVAILABLE: &str = "AI service temporarily unavailable. Please try again.";

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Request / response shapes
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    #[serde(default)]
    pub question: Option<String>,
    /// Absent, "demo", "guest", malformed or non-string ids all mean guest.
    #[serde(default)]
    pub user_id: Option<Value>,
    /// Reference to an uploaded image; stored with the question as-is.
    #[serde(default)]
    pub image_url: Option<String>,
}

impl ChatRequest {
    pub fn caller(&self) -> Caller {
        match &self.user_id {
            Some(Value::String(raw)) => Caller::from_raw(Some(raw.as_str())),
            _ => Caller::Guest,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatResponse {
    pub answer: String,
    /// Post-increment count; `null` for guests.
    pub usage: Option<u64>,
    pub user_type: UserType,
}

#[derive(Debug, Serialize)]
struct QuotaBody {
    message: &'static str,
    usage: u64,
    limit: u64,
}

fn quota_response(refusal: QuotaExceeded) -> Response {
    (
        StatusCode::FORBIDDEN,
        Json(QuotaBody {
            message: QUOTA_MESSAGE,
            usage: refusal.usage,
            limit: refusal.limit,
        }),
    )
        .into_response()
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// POST /api/chat
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

pub async fn chat(
    State(state): State<AppState>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Response {
    let body = match payload {
        Ok(Json(body)) => body,
        Err(rejection) => {
            tracing::debug!(error = %rejection.body_text(), "rejected chat body");
            return api_error(StatusCode::BAD_REQUEST, "Invalid request body");
        }
    };

    let caller = body.caller();
    // Blank questions are refused, but non-blank ones go out untouched.
    let Some(question) = body.question.filter(|q| !q.trim().is_empty()) else {
        return api_error(StatusCode::BAD_REQUEST, "Question is required");
    };

    let admission = match state.ledger.admit(caller) {
        Ok(a) => a,
        Err(refusal) => {
            tracing::info!(
                usage = refusal.usage,
                limit = refusal.limit,
                "chat refused, free tier exhausted"
            );
            return quota_response(refusal);
        }
    };

    let answer = match state.ai.ask(&question).await {
        Ok(a) => a,
        Err(e) => {
            tracing::error!(backend = state.ai.name(), error = %e, "AI call failed");
            return api_error(StatusCode::INTERNAL_SERVER_ERROR, AI_UNAVAILABLE);
        }
    };

    let user_type = admission.user_type();
    let (user_id, usage) = match &admission {
        Admission::Guest => (None, None),
        Admission::Registered(record) => {
            // If the increment was lost, report what it would have been.
            let usage = state
                .ledger
                .record_consumption(&record.id)
                .unwrap_or(record.usage + 1);
            (Some(record.id), Some(usage))
        }
    };

    state
        .questions
        .append(
            QuestionEntry::new(user_id, question, answer.clone(), state.clock.now())
                .with_image_url(body.image_url),
        )
        .await;

    Json(ChatResponse {
        answer,
        usage,
        user_type,
    })
    .into_response()
}
