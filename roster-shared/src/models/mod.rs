/// Login request and response.
pub mod auth;
/// Error envelope.
pub mod errors;
/// User resource and registration payload.
pub mod user;

pub use auth::{LoginRequest, LoginResponse};
pub use errors::ErrorResponse;
pub use user::{RegisterUserRequest, User};
