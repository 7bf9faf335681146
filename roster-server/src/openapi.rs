//! OpenAPI document for the HTTP API.

#![allow(clippy::needless_for_each)] // Derive macro emits a for_each internally

use shared::models::{ErrorResponse, LoginRequest, LoginResponse, RegisterUserRequest, User};
use utoipa::{
    Modify, OpenApi,
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
};

/// The API description served at the OpenAPI routes and written by `spec`.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Roster API",
        version = "1.0.0",
        description = "User registration and login"
    ),
    paths(
        crate::handlers::users::register_user,
        crate::handlers::users::get_user,
        crate::handlers::auth::login,
        crate::handlers::auth::refresh,
    ),
    components(
        schemas(
            RegisterUserRequest,
            User,
            LoginRequest,
            LoginResponse,
            ErrorResponse,
        )
    ),
    modifiers(&BearerAuth),
    tags(
        (name = "Users", description = "User registration and lookup"),
        (name = "Auth", description = "Authentication-related endpoints")
    )
)]
pub struct ApiDoc;

/// Declares the `bearer_auth` scheme referenced by protected paths.
#[derive(Debug)]
struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}
