//! User specialisation of the repository contract.

use crate::domain::User;

use super::{Repository, RepositoryError};

/// Repository of user accounts with an email uniqueness index.
pub trait UserRepository: Repository<User> {
    /// Fetch a user by exact, case-sensitive email.
    fn find_by_email(&self, email: &str) -> Result<User, RepositoryError> {
        self.get_by_index(User::EMAIL_INDEX, email)
    }
}

impl<T> UserRepository for T where T: Repository<User> {}
