pub mod password;
pub mod repo;
pub mod repo_types;

#[cfg(test)]
pub mod memory;

pub use repo::{PgUserStore, StoreError, UserStore};
pub use repo_types::{db_now, NewUser, User};
