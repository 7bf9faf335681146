//! Bearer-token guard for protected routes.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::{Request, State},
    http::{HeaderMap, header},
    middleware::Next,
    response::Response,
};
use tracing::{debug, instrument};

use crate::{
    app_state::AppState,
    http::error::{ApiError, AppResult},
    middleware::request_context::RequestContext,
    services::UserRecord,
};

/// The account behind a verified bearer token, inserted as a request
/// extension for downstream handlers.
#[derive(Clone, Debug)]
pub struct AuthenticatedUser(pub UserRecord);

/// Requires `Authorization: Bearer <token>` naming an existing user.
///
/// # Errors
/// Returns a 401 [`crate::http::error::ApiError`] for a missing, invalid or
/// orphaned token.
#[instrument(skip_all, fields(path = %req.uri().path()))]
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    mut req: Request<Body>,
    next: Next,
) -> AppResult<Response> {
    let token = bearer_token(req.headers())
        .ok_or_else(|| ApiError::unauthorized("Missing bearer token"))?;

    let claims = state.tokens.verify(token).map_err(|err| {
        debug!(error = %err, "rejecting bearer token");
        ApiError::unauthorized("Unauthorized request")
    })?;

    let user = state
        .users
        .find_by_user_name(&claims.sub)
        .await?
        .filter(|user| user.id == claims.user_id)
        .ok_or_else(|| ApiError::unauthorized("Unauthorized request"))?;

    if let Some(context) = req.extensions_mut().get_mut::<RequestContext>() {
        context.user_id = Some(user.id);
    }
    req.extensions_mut().insert(AuthenticatedUser(user));

    Ok(next.run(req).await)
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers_with(value: &'static str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static(value));
        headers
    }

    #[test]
    fn bearer_token_accepts_any_scheme_case() {
        assert_eq!(bearer_token(&headers_with("Bearer abc")), Some("abc"));
        assert_eq!(bearer_token(&headers_with("bearer  abc ")), Some("abc"));
    }

    #[test]
    fn bearer_token_rejects_other_schemes_and_blank_tokens() {
        assert_eq!(bearer_token(&headers_with("Basic dXNlcjpwdw==")), None);
        assert_eq!(bearer_token(&headers_with("Bearer ")), None);
        assert_eq!(bearer_token(&headers_with("Bearer")), None);
        assert_eq!(bearer_token(&HeaderMap::new()), None);
    }
}
