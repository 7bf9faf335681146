//! In-memory doubles shared by the unit tests.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::{
    app_state::AppState,
    auth::{password::hash_password, token::TokenIssuer},
    services::{NewUser, RepositoryError, UserRecord, UserRepository},
};

pub const TEST_SECRET: &str = "unit-test-secret";

#[derive(Debug, Default)]
pub struct MemoryUserRepository {
    users: Mutex<Vec<UserRecord>>,
    /// Makes `has_user_with_user_name` answer `false` so the insert path has
    /// to catch the duplicate, as when two registrations race.
    pub skip_precheck: bool,
    pub unavailable: bool,
}

impl MemoryUserRepository {
    pub fn unavailable() -> Self {
        Self {
            unavailable: true,
            ..Self::default()
        }
    }

    pub fn racing() -> Self {
        Self {
            skip_precheck: true,
            ..Self::default()
        }
    }

    pub fn len(&self) -> usize {
        self.users.lock().unwrap().len()
    }

    pub fn stored(&self, user_name: &str) -> Option<UserRecord> {
        self.users
            .lock()
            .unwrap()
            .iter()
            .find(|user| user.user_name == user_name)
            .cloned()
    }

    /// Seed a user with an already hashed password.
    pub fn seed(&self, user_name: &str, password: &str) -> UserRecord {
        let record = UserRecord {
            id: self.next_id(),
            user_name: user_name.to_owned(),
            full_name: format!("{user_name} full"),
            password: hash_password(password).unwrap(),
            nickname: None,
            date_created: chrono::Utc::now(),
        };
        self.users.lock().unwrap().push(record.clone());
        record
    }

    fn next_id(&self) -> i64 {
        i64::try_from(self.users.lock().unwrap().len()).unwrap() + 1
    }

    fn check_available(&self) -> Result<(), RepositoryError> {
        if self.unavailable {
            return Err(RepositoryError::Database(sqlx::Error::PoolTimedOut));
        }
        Ok(())
    }
}

#[async_trait]
impl UserRepository for MemoryUserRepository {
    async fn has_user_with_user_name(&self, user_name: &str) -> Result<bool, RepositoryError> {
        self.check_available()?;
        if self.skip_precheck {
            return Ok(false);
        }
        Ok(self.stored(user_name).is_some())
    }

    async fn insert_user(&self, user: NewUser) -> Result<UserRecord, RepositoryError> {
        self.check_available()?;
        if self.stored(&user.user_name).is_some() {
            return Err(RepositoryError::DuplicateUserName);
        }
        let record = UserRecord {
            id: self.next_id(),
            user_name: user.user_name,
            full_name: user.full_name,
            password: user.password_hash,
            nickname: user.nickname,
            date_created: user.date_created,
        };
        self.users.lock().unwrap().push(record.clone());
        Ok(record)
    }

    async fn find_by_user_name(
        &self,
        user_name: &str,
    ) -> Result<Option<UserRecord>, RepositoryError> {
        self.check_available()?;
        Ok(self.stored(user_name))
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<UserRecord>, RepositoryError> {
        self.check_available()?;
        Ok(self
            .users
            .lock()
            .unwrap()
            .iter()
            .find(|user| user.id == id)
            .cloned())
    }

    async fn ping(&self) -> Result<(), RepositoryError> {
        self.check_available()
    }
}

pub fn token_issuer() -> Arc<TokenIssuer> {
    Arc::new(TokenIssuer::new(TEST_SECRET, 900))
}

pub fn state_with(users: Arc<MemoryUserRepository>) -> Arc<AppState> {
    Arc::new(AppState::new(users, token_issuer()))
}
