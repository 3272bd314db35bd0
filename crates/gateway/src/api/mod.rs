pub mod admin;
pub mod chat;
pub mod guard;
pub mod health;
pub mod profile;
pub mod subscription;
pub mod usage;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{get, post, put};
use axum::Router;

use crate::state::AppState;

/// Build the full API router.
///
/// Client routes are public; they identify callers by the user id they
/// send.  Admin routes are gated per-handler by the [`guard::AdminGuard`]
/// extractor.
pub fn router() -> Router<AppState> {
    Router::new()
        // Liveness
        .route("/", get(health::root))
        .route("/api/health", get(health::health))
        // Chat + usage
        .route("/api/chat", post(chat::chat))
        .route(
            "/api/user/:id",
            get(profile::get_profile).put(profile::update_profile),
        )
        .route("/api/user/:id/usage", get(usage::user_usage))
        .route("/api/user/:id/questions", get(usage::user_questions))
        .route("/api/config", get(usage::client_config))
        // Billing
        .route("/api/subscription/:user_id", get(subscription::get_subscription))
        .route("/api/mpesa/callback", post(subscription::mpesa_callback))
        // Admin
        .route("/api/admin/users", post(admin::create_user))
        .route(
            "/api/admin/users/:id/subscription",
            put(admin::set_subscription),
        )
        .route("/api/admin/users/:id/checkout", post(admin::start_checkout))
}

/// Build a standardized JSON error response: `{ "message": "<message>" }`.
pub(crate) fn api_error(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(serde_json::json!({ "message": message.into() }))).into_response()
}
