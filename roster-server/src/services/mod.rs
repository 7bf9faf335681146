pub mod user_repository;

pub use user_repository::{NewUser, PgUserRepository, RepositoryError, UserRecord, UserRepository};
