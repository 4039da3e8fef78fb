pub mod error;
pub mod memory;
pub mod user_repo;

pub use error::{RepoError, UniqueField};
pub use memory::InMemoryUserRepo;
pub use user_repo::{NewUser, PgUserRepo, UserChanges, UserRecord, UserRepo};
