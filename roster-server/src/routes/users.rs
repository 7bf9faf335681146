use std::sync::Arc;

use crate::{
    app_state::AppState,
    handlers::users::{get_user, register_user},
    middleware::auth::require_auth,
};
use axum::{
    Router, middleware,
    routing::{get, post},
};
use tracing::info;

/// Registration is open; reading a user back requires a bearer token.
pub fn create_router_users(state: &Arc<AppState>) -> Router<Arc<AppState>> {
    info!("Creating users router");
    Router::new().route("/users", post(register_user)).route(
        "/users/{id}",
        get(get_user).route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_auth,
        )),
    )
}
