//! Subscription status and the M-Pesa payment callback.
//!
//! The gateway never decides billing itself.  A user becomes subscribed
//! when the payment provider confirms the checkout recorded for them.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use hh_domain::trace::TraceEvent;
use hh_domain::user::{Plan, UserId};

use crate::state::AppState;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// GET /api/subscription/:user_id
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionView {
    pub active: bool,
    pub plan: Option<Plan>,
    pub activated_at: Option<DateTime<Utc>>,
}

fn subscription_error(status: StatusCode, message: &str) -> Response {
    (
        status,
        Json(serde_json::json!({ "active": false, "message": message })),
    )
        .into_response()
}

pub async fn get_subscription(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Response {
    let Ok(id) = user_id.trim().parse::<UserId>() else {
        return subscription_error(StatusCode::NOT_FOUND, "User not found");
    };

    match state.users.get(&id) {
        Ok(Some(user)) => Json(SubscriptionView {
            active: user.subscription.active,
            plan: user.subscription.plan,
            activated_at: user.subscription.activated_at,
        })
        .into_response(),
        Ok(None) => subscription_error(StatusCode::NOT_FOUND, "User not found"),
        Err(e) => {
            tracing::error!(user_id = %id, error = %e, "subscription lookup failed");
            subscription_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Error fetching subscription",
            )
        }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// POST /api/mpesa/callback
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// STK push result envelope.  Field names follow the provider's payload.
/// Scalars are kept loose: only a numeric `ResultCode` of 0 with a string
/// `CheckoutRequestID` counts as a completed payment.
#[derive(Debug, Default, Deserialize)]
pub struct MpesaCallback {
    #[serde(rename = "Body", default)]
    pub body: Option<CallbackBody>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CallbackBody {
    #[serde(rename = "stkCallback", default)]
    pub stk_callback: Option<StkCallback>,
}

#[derive(Debug, Default, Deserialize)]
pub struct StkCallback {
    #[serde(rename = "ResultCode", default)]
    pub result_code: Option<Value>,
    #[serde(rename = "ResultDesc", default)]
    pub result_desc: Option<Value>,
    #[serde(rename = "CheckoutRequestID", default)]
    pub checkout_request_id: Option<Value>,
}

impl StkCallback {
    pub fn succeeded(&self) -> bool {
        self.result_code.as_ref().and_then(Value::as_i64) == Some(0)
    }

    pub fn checkout_id(&self) -> Option<&str> {
        self.checkout_request_id
            .as_ref()
            .and_then(Value::as_str)
            .filter(|c| !c.is_empty())
    }
}

#[derive(Debug, Serialize)]
struct CallbackAck {
    #[serde(rename = "ResultCode")]
    result_code: u8,
    #[serde(rename = "ResultDesc")]
    result_desc: &'static str,
}

fn ack(status: StatusCode, result_code: u8, result_desc: &'static str) -> Response {
    (
        status,
        Json(CallbackAck {
            result_code,
            result_desc,
        }),
    )
        .into_response()
}

/// Acknowledges every callback, readable or not.  Only a store failure
/// while activating is reported back to the provider.
pub async fn mpesa_callback(
    State(state): State<AppState>,
    payload: Result<Json<MpesaCallback>, JsonRejection>,
) -> Response {
    let payload = match payload {
        Ok(Json(payload)) => payload,
        Err(rejection) => {
            tracing::warn!(error = %rejection.body_text(), "unreadable mpesa callback, ignoring");
            return ack(StatusCode::OK, 0, "Accepted");
        }
    };

    let Some(result) = payload.body.and_then(|b| b.stk_callback) else {
        tracing::warn!("mpesa callback without stkCallback, ignoring");
        return ack(StatusCode::OK, 0, "Accepted");
    };

    if !result.succeeded() {
        tracing::info!(
            result_code = ?result.result_code,
            desc = ?result.result_desc,
            checkout_id = result.checkout_id().unwrap_or(""),
            "payment not completed"
        );
        return ack(StatusCode::OK, 0, "Accepted");
    }

    let Some(checkout_id) = result.checkout_id().map(str::to_owned) else {
        tracing::warn!("successful payment callback without CheckoutRequestID");
        return ack(StatusCode::OK, 0, "Accepted");
    };

    match state
        .users
        .activate_by_checkout(&checkout_id, state.clock.now())
    {
        Ok(Some(user)) => {
            tracing::info!(user_id = %user.id, checkout_id = %checkout_id, "subscription activated");
            TraceEvent::SubscriptionChanged {
                user_id: user.id.to_string(),
                active: true,
                plan: user.subscription.plan.map(|p| p.as_str().to_owned()),
            }
            .emit();
        }
        Ok(None) => {
            tracing::warn!(checkout_id = %checkout_id, "no user holds this checkout id");
        }
        Err(e) => {
            tracing::error!(checkout_id = %checkout_id, error = %e, "failed to activate subscription");
            return ack(
                StatusCode::INTERNAL_SERVER_ERROR,
                1,
                "Error processing callback",
            );
        }
    }

    ack(StatusCode::OK, 0, "Accepted")
}
