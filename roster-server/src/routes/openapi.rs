//! Swagger UI and raw OpenAPI document routes.

use std::sync::Arc;

use crate::{app_state::AppState, openapi::ApiDoc};
use axum::{Router, http::StatusCode, response::IntoResponse, routing::get};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Path of the JSON document.
pub const OPENAPI_JSON_PATH: &str = "/openapi/roster.json";
/// Path of the YAML document.
pub const OPENAPI_YAML_PATH: &str = "/openapi/roster.yaml";

async fn openapi_yaml() -> impl IntoResponse {
    match ApiDoc::openapi().to_yaml() {
        Ok(yaml) => (StatusCode::OK, yaml),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("YAML error: {e}"),
        ),
    }
}

/// Swagger UI at `/swagger-ui` plus the raw documents.
pub fn openapi_routes() -> Router<Arc<AppState>> {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url(OPENAPI_JSON_PATH, ApiDoc::openapi()))
        .route(OPENAPI_YAML_PATH, get(openapi_yaml))
}
