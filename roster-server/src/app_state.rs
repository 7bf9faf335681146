use std::{fmt, sync::Arc};

use crate::{auth::token::TokenIssuer, services::UserRepository};

/// Application state shared across all routes.
#[derive(Clone)]
pub struct AppState {
    pub(crate) users: Arc<dyn UserRepository>,
    pub(crate) tokens: Arc<TokenIssuer>,
}

impl AppState {
    /// Bundle a user store and token issuer.
    pub fn new(users: Arc<dyn UserRepository>, tokens: Arc<TokenIssuer>) -> Self {
        Self { users, tokens }
    }
}

impl fmt::Debug for AppState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppState")
            .field("tokens", &self.tokens)
            .finish_non_exhaustive()
    }
}
