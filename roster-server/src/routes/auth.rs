use std::sync::Arc;

use crate::{
    app_state::AppState,
    handlers::auth::{login, refresh},
    middleware::auth::require_auth,
};
use axum::{Router, middleware, routing::post};
use tracing::info;

/// Login and token refresh. Refresh requires a valid bearer token.
pub fn create_router_auth(state: &Arc<AppState>) -> Router<Arc<AppState>> {
    info!("Creating auth router");
    Router::new().route("/auth/login", post(login)).route(
        "/auth/refresh",
        post(refresh).route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_auth,
        )),
    )
}
