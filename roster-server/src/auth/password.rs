//! Argon2id hashing for stored account passwords.

use std::sync::OnceLock;

use argon2::{
    Argon2,
    password_hash::{
        self, PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng,
    },
};
use thiserror::Error;

/// Valid Argon2id PHC string used when `hash_password` cannot run at startup.
const FALLBACK_DUMMY_HASH: &str =
    "$argon2id$v=19$m=19456,t=2,p=1$cm9zdGVyLWR1bW15LXNhbHQ$LXEWQrcmsEQBYnyp+6wy9chTD7GQPMTbAiWHF5IaSIE";

static DUMMY_HASH: OnceLock<String> = OnceLock::new();

/// Hash verified against when a login names an unknown user, so both
/// credential failures cost one Argon2 verify. The result is discarded.
#[must_use]
pub fn dummy_hash() -> &'static str {
    DUMMY_HASH.get_or_init(|| {
        hash_password("roster-unmatched-credential")
            .unwrap_or_else(|_| FALLBACK_DUMMY_HASH.to_owned())
    })
}

#[cfg(test)]
thread_local! {
    static VERIFY_CALLS: std::cell::Cell<usize> = const { std::cell::Cell::new(0) };
}

/// Number of `verify_password` calls made on the current thread.
#[cfg(test)]
pub(crate) fn verify_calls() -> usize {
    VERIFY_CALLS.with(std::cell::Cell::get)
}

/// Failure to produce or parse a password hash.
#[derive(Debug, Error)]
#[error("password hashing failed: {0}")]
pub struct PasswordHashError(String);

/// Hash a password with Argon2id and a random salt, returning the PHC string.
///
/// # Errors
/// Returns [`PasswordHashError`] if the hasher rejects the input.
pub fn hash_password(password: &str) -> Result<String, PasswordHashError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|err| PasswordHashError(err.to_string()))
}

/// Verify a password against an encoded Argon2id hash.
///
/// Returns `Ok(false)` on mismatch.
///
/// # Errors
/// Returns [`PasswordHashError`] if the stored hash cannot be parsed.
pub fn verify_password(hash: &str, candidate: &str) -> Result<bool, PasswordHashError> {
    #[cfg(test)]
    VERIFY_CALLS.with(|calls| calls.set(calls.get() + 1));

    let parsed = PasswordHash::new(hash).map_err(|err| PasswordHashError(err.to_string()))?;
    match Argon2::default().verify_password(candidate.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(password_hash::Error::Password) => Ok(false),
        Err(err) => Err(PasswordHashError(err.to_string())),
    }
}
