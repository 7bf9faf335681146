//! Input validation rules shared by the server and its clients.

pub mod password;

pub use password::{PasswordError, validate_password};
