use std::sync::Arc;

use axum::{
    Extension, Json,
    extract::{State, rejection::JsonRejection},
};
use shared::models::{ErrorResponse, LoginRequest, LoginResponse};
use tracing::{info, instrument};

use super::required;
use crate::{
    app_state::AppState,
    auth::password::{dummy_hash, verify_password},
    http::error::{ApiError, AppResult},
    middleware::auth::AuthenticatedUser,
};

/// Exchange a user name and password for a bearer token.
///
/// An unknown user name and a wrong password produce the same response.
#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Credentials accepted", body = LoginResponse),
        (status = 400, description = "Missing field or bad credentials", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "Auth"
)]
#[instrument(skip_all)]
pub async fn login(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> AppResult<Json<LoginResponse>> {
    let Json(payload) = payload?;

    let result = authenticate(&state, &payload).await;
    let outcome = match &result {
        Ok(_) => "success",
        Err(err) if err.status().is_client_error() => "rejected",
        Err(_) => "error",
    };
    metrics::counter!("login_attempts_total", "outcome" => outcome).increment(1);

    result.map(|auth_token| Json(LoginResponse { auth_token }))
}

async fn authenticate(state: &AppState, payload: &LoginRequest) -> AppResult<String> {
    let user_name = required(payload.user_name.as_deref(), "user_name")?;
    let password = required(payload.password.as_deref(), "password")?;

    let Some(user) = state.users.find_by_user_name(user_name).await? else {
        verify_password(dummy_hash(), password)?;
        return Err(ApiError::invalid_credentials());
    };

    if !verify_password(&user.password, password)? {
        return Err(ApiError::invalid_credentials());
    }

    let token = state.tokens.issue(user.id, &user.user_name)?;
    info!(user_id = user.id, "login succeeded");
    Ok(token)
}

/// Issue a fresh token for the caller of a still-valid one.
#[utoipa::path(
    post,
    path = "/api/auth/refresh",
    responses(
        (status = 200, description = "New token issued", body = LoginResponse),
        (status = 401, description = "Missing or invalid bearer token", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Auth"
)]
#[instrument(skip_all)]
pub async fn refresh(
    State(state): State<Arc<AppState>>,
    Extension(AuthenticatedUser(user)): Extension<AuthenticatedUser>,
) -> AppResult<Json<LoginResponse>> {
    let auth_token = state.tokens.issue(user.id, &user.user_name)?;
    Ok(Json(LoginResponse { auth_token }))
}
