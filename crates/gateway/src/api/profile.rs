//! Self-service profile.
//!
//! - `GET /api/user/:id`  name, email and phone
//! - `PUT /api/user/:id`  change name and/or phone

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde::Serialize;

use hh_domain::user::{ProfileUpdate, UserId, UserRecord};

use super::api_error;
use crate::state::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileView {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
}

impl From<UserRecord> for ProfileView {
    fn from(u: UserRecord) -> Self {
        Self {
            id: u.id,
            name: u.name,
            email: u.email,
            phone: u.phone,
        }
    }
}

#[derive(Debug, Serialize)]
struct ProfileUpdated {
    success: bool,
    user: ProfileView,
}

fn not_found() -> Response {
    api_error(StatusCode::NOT_FOUND, "User not found")
}

pub async fn get_profile(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    let Ok(id) = id.trim().parse::<UserId>() else {
        return not_found();
    };

    match state.users.get(&id) {
        Ok(Some(user)) => Json(ProfileView::from(user)).into_response(),
        Ok(None) => {
            tracing::debug!(user_id = %id, "profile lookup for unknown user");
            not_found()
        }
        Err(e) => {
            tracing::error!(user_id = %id, error = %e, "profile lookup failed");
            api_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Error fetching user profile",
            )
        }
    }
}

pub async fn update_profile(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<ProfileUpdate>, JsonRejection>,
) -> Response {
    let Ok(id) = id.trim().parse::<UserId>() else {
        return not_found();
    };
    let Ok(Json(update)) = payload else {
        return api_error(StatusCode::BAD_REQUEST, "Invalid request body");
    };

    match state.users.update_profile(&id, update) {
        Ok(Some(user)) => {
            tracing::info!(user_id = %user.id, "profile updated");
            Json(ProfileUpdated {
                success: true,
                user: user.into(),
            })
            .into_response()
        }
        Ok(None) => not_found(),
        Err(e) => {
            tracing::error!(user_id = %id, error = %e, "profile update failed");
            api_error(StatusCode::INTERNAL_SERVER_ERROR, "Error updating profile")
        }
    }
}
