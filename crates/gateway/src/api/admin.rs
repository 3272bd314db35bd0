//! Admin account management.
//!
//! These stand in for the registration and payment-initiation flows that
//! live outside the gateway: they create accounts, flip subscriptions and
//! record the checkout id a later provider callback will be matched on.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde::Deserialize;

use hh_domain::error::Error;
use hh_domain::trace::TraceEvent;
use hh_domain::user::{Plan, Subscription, UserId, UserRecord};

use super::api_error;
use super::guard::AdminGuard;
use crate::state::AppState;

fn parse_id(raw: &str) -> Result<UserId, Response> {
    raw.trim()
        .parse()
        .map_err(|_| api_error(StatusCode::NOT_FOUND, "User not found"))
}

fn store_error(e: Error) -> Response {
    match e {
        Error::Conflict(msg) => api_error(StatusCode::CONFLICT, msg),
        Error::UserNotFound(_) => api_error(StatusCode::NOT_FOUND, "User not found"),
        other => {
            tracing::error!(error = %other, "admin store operation failed");
            api_error(StatusCode::INTERNAL_SERVER_ERROR, "Store error")
        }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// POST /api/admin/users
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    #[serde(default)]
    pub name: String,
    pub email: String,
}

pub async fn create_user(
    _guard: AdminGuard,
    State(state): State<AppState>,
    Json(body): Json<CreateUserRequest>,
) -> Response {
    let email = body.email.trim();
    if email.is_empty() || !email.contains('@') {
        return api_error(StatusCode::BAD_REQUEST, "A valid email is required");
    }

    let record = UserRecord::new(body.name.trim(), email, state.clock.now());
    match state.users.insert(record.clone()) {
        Ok(()) => {
            tracing::info!(user_id = %record.id, "user created");
            (StatusCode::CREATED, Json(record)).into_response()
        }
        Err(e) => store_error(e),
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// PUT /api/admin/users/:id/subscription
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Deserialize)]
pub struct SetSubscriptionRequest {
    pub active: bool,
    #[serde(default)]
    pub plan: Option<Plan>,
}

pub async fn set_subscription(
    _guard: AdminGuard,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<SetSubscriptionRequest>,
) -> Response {
    let id = match parse_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    let current = match state.users.get(&id) {
        Ok(Some(user)) => user.subscription,
        Ok(None) => return api_error(StatusCode::NOT_FOUND, "User not found"),
        Err(e) => return store_error(e),
    };

    // Keep the original activation time when an active plan is re-asserted.
    let activated_at = match (body.active, current.active) {
        (true, true) => current.activated_at,
        (true, false) => Some(state.clock.now()),
        (false, _) => None,
    };
    let subscription = Subscription {
        active: body.active,
        plan: body.plan.or(current.plan),
        activated_at,
        checkout_id: current.checkout_id,
        phone: current.phone,
    };

    match state.users.set_subscription(&id, subscription) {
        Ok(Some(user)) => {
            TraceEvent::SubscriptionChanged {
                user_id: user.id.to_string(),
                active: user.subscription.active,
                plan: user.subscription.plan.map(|p| p.as_str().to_owned()),
            }
            .emit();
            Json(user).into_response()
        }
        Ok(None) => api_error(StatusCode::NOT_FOUND, "User not found"),
        Err(e) => store_error(e),
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// POST /api/admin/users/:id/checkout
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequest {
    pub plan: Plan,
    pub checkout_id: String,
    /// Number the payment prompt went to, if known.
    #[serde(default)]
    pub phone: Option<String>,
}

pub async fn start_checkout(
    _guard: AdminGuard,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<CheckoutRequest>,
) -> Response {
    let id = match parse_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    let checkout_id = body.checkout_id.trim();
    if checkout_id.is_empty() {
        return api_error(StatusCode::BAD_REQUEST, "checkoutId is required");
    }

    let phone = body.phone.as_deref().map(str::trim).filter(|p| !p.is_empty());
    match state
        .users
        .set_pending_checkout(&id, body.plan, checkout_id, phone)
    {
        Ok(Some(user)) => {
            tracing::info!(
                user_id = %user.id,
                plan = body.plan.as_str(),
                checkout_id,
                "pending checkout recorded"
            );
            Json(user).into_response()
        }
        Ok(None) => api_error(StatusCode::NOT_FOUND, "User not found"),
        Err(e) => store_error(e),
    }
}
