//! Password policy applied before a new account is persisted.
//!
//! Rules are checked in a fixed order and the first failure is returned, so
//! callers always report exactly one message per attempt.

use thiserror::Error;

/// Shortest accepted password, in characters.
pub const MIN_PASSWORD_CHARS: usize = 8;
/// Longest accepted password, in characters.
pub const MAX_PASSWORD_CHARS: usize = 72;

/// Reasons a candidate password is rejected.
///
/// The `Display` text is part of the public API contract and is returned to
/// clients verbatim.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum PasswordError {
    /// Fewer than [`MIN_PASSWORD_CHARS`] characters.
    #[error("Password must be at least 8 characters")]
    TooShort,
    /// More than [`MAX_PASSWORD_CHARS`] characters.
    #[error("Password must be less than 73 characters")]
    TooLong,
    /// Leading or trailing space.
    #[error("Password must not start or end with spaces")]
    SurroundingSpaces,
    /// Missing an upper case, lower case, digit or special character.
    #[error("Password must contain 1 upper case, lower case, number and special character")]
    NotComplex,
}

/// Validates a candidate password.
///
/// # Arguments
/// * `password` - The password to validate
///
/// # Returns
/// `Ok(())` if the password is acceptable, otherwise the first violated rule.
///
/// # Errors
/// Returns a [`PasswordError`] naming the first rule that failed:
/// - length below 8 characters
/// - length above 72 characters
/// - starts or ends with a space
/// - lacks one each of upper case, lower case, digit and special character
pub fn validate_password(password: &str) -> Result<(), PasswordError> {
    let length = password.chars().count();

    if length < MIN_PASSWORD_CHARS {
        return Err(PasswordError::TooShort);
    }

    if length > MAX_PASSWORD_CHARS {
        return Err(PasswordError::TooLong);
    }

    if password.starts_with(' ') || password.ends_with(' ') {
        return Err(PasswordError::SurroundingSpaces);
    }

    if !is_complex(password) {
        return Err(PasswordError::NotComplex);
    }

    Ok(())
}

fn is_complex(password: &str) -> bool {
    let mut upper = false;
    let mut lower = false;
    let mut digit = false;
    let mut special = false;

    for ch in password.chars() {
        if ch.is_uppercase() {
            upper = true;
        } else if ch.is_lowercase() {
            lower = true;
        } else if ch.is_ascii_digit() {
            digit = true;
        } else if !ch.is_alphanumeric() {
            special = true;
        }
    }

    upper && lower && digit && special
}
