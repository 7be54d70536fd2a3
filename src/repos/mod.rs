pub mod error;
pub mod token_repo;
pub mod user_repo;

pub use token_repo::PgTokenStore;
pub use user_repo::PgUserRepository;
