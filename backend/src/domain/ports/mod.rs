//! Domain ports and supporting types for the hexagonal boundary.

mod macros;
pub(crate) use macros::define_port_error;

mod password_hasher;
mod repository;
mod resource_repository;
mod user_repository;

#[cfg(test)]
pub use password_hasher::MockPasswordHasher;
pub use password_hasher::{PasswordHashError, PasswordHasher};
pub use repository::{Entity, Mutation, Repository, RepositoryError, UniqueKey};
pub use resource_repository::ResourceRepository;
pub use user_repository::UserRepository;
