/// `/auth` routes.
pub mod auth;
pub mod health;
pub mod openapi;
/// `/users` routes.
pub mod users;
