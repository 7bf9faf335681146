use std::sync::Arc;

use axum::{
    Json,
    extract::{
        OriginalUri, Path, State,
        rejection::{JsonRejection, PathRejection},
    },
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use chrono::Utc;
use shared::{
    models::{ErrorResponse, RegisterUserRequest, User},
    validation::validate_password,
};
use tracing::{info, instrument};

use super::required;
use crate::{
    app_state::AppState,
    auth::password::hash_password,
    http::error::{ApiError, AppResult},
    services::{NewUser, UserRecord},
};

/// Register a new user account.
///
/// Checks run in a fixed order and stop at the first failure: required
/// fields, password policy, user name uniqueness. The uniqueness pre-check
/// is not atomic with the insert; a concurrent duplicate is caught by the
/// table's unique constraint and reported the same way.
#[utoipa::path(
    post,
    path = "/api/users",
    request_body = RegisterUserRequest,
    responses(
        (status = 201, description = "User registered", body = User,
            headers(("Location" = String, description = "Path of the created user"))),
        (status = 400, description = "Missing field, weak password, or user name taken", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "Users"
)]
#[instrument(skip_all)]
pub async fn register_user(
    State(state): State<Arc<AppState>>,
    OriginalUri(uri): OriginalUri,
    payload: Result<Json<RegisterUserRequest>, JsonRejection>,
) -> AppResult<Response> {
    let Json(payload) = payload?;

    let record = create_user(&state, payload).await.inspect_err(|err| {
        metrics::counter!("registration_rejections_total", "reason" => err.code()).increment(1);
    })?;

    metrics::counter!("users_registered_total").increment(1);
    info!(user_id = record.id, user_name = %record.user_name, "user registered");

    let location = location_for(uri.path(), record.id);
    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, location)],
        Json(record.serialize()),
    )
        .into_response())
}

async fn create_user(state: &AppState, payload: RegisterUserRequest) -> AppResult<UserRecord> {
    let user_name = required(payload.user_name.as_deref(), "user_name")?;
    let full_name = required(payload.full_name.as_deref(), "full_name")?;
    let password = required(payload.password.as_deref(), "password")?;

    validate_password(password)?;

    if state.users.has_user_with_user_name(user_name).await? {
        return Err(ApiError::username_taken());
    }

    let new_user = NewUser {
        user_name: user_name.to_owned(),
        full_name: full_name.to_owned(),
        password_hash: hash_password(password)?,
        nickname: payload.nickname.filter(|nickname| !nickname.is_empty()),
        date_created: Utc::now(),
    };

    Ok(state.users.insert_user(new_user).await?)
}

fn location_for(request_path: &str, id: i64) -> String {
    format!("{}/{id}", request_path.trim_end_matches('/'))
}

/// Fetch a single user by id. Requires a bearer token.
#[utoipa::path(
    get,
    path = "/api/users/{id}",
    params(("id" = i64, Path, description = "User id")),
    responses(
        (status = 200, description = "User found", body = User),
        (status = 400, description = "Malformed id", body = ErrorResponse),
        (status = 401, description = "Missing or invalid bearer token", body = ErrorResponse),
        (status = 404, description = "No such user", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Users"
)]
#[instrument(skip_all)]
pub async fn get_user(
    State(state): State<Arc<AppState>>,
    id: Result<Path<i64>, PathRejection>,
) -> AppResult<Json<User>> {
    let Path(id) = id?;

    state
        .users
        .find_by_id(id)
        .await?
        .map(|record| Json(record.serialize()))
        .ok_or_else(|| ApiError::not_found("User not found"))
}
