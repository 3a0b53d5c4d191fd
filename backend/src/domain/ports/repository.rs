//! Storage contract shared by every entity repository.
//!
//! A repository owns a primary map from identifier to entity plus zero or more
//! uniqueness indexes. Implementations must keep the indexes synchronised with
//! the primary map inside one critical section: a concurrent reader never sees
//! an entity without its index entries, an index entry without its entity, or
//! both the old and new key of an update.

use std::fmt;
use std::hash::Hash;

use super::define_port_error;

define_port_error! {
    /// Errors raised by repository adapters.
    pub enum RepositoryError {
        /// Nothing is stored under the requested id or index key.
        NotFound { key: String } => "no entity stored under {key}",
        /// A uniqueness index already maps the key to a different entity.
        Conflict { index: String, key: String } => "{index} '{key}' is already taken",
        /// The backing store failed or ran out of identifiers.
        Backend { message: String } => "repository backend failed: {message}",
    }
}

/// One entry an entity contributes to a named uniqueness index.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UniqueKey {
    /// Index name, e.g. `"email"`.
    pub index: &'static str,
    /// Exact key value; comparison is case-sensitive.
    pub value: String,
}

impl UniqueKey {
    /// Build a key for `index`.
    pub fn new(index: &'static str, value: impl Into<String>) -> Self {
        Self {
            index,
            value: value.into(),
        }
    }
}

/// Entity stored in a [`Repository`].
pub trait Entity: Clone + Send + Sync + 'static {
    /// Identifier minted from the repository's monotonic counter.
    type Id: Copy + Ord + Hash + fmt::Debug + fmt::Display + From<u64> + Send + Sync + 'static;

    /// Current identifier.
    fn id(&self) -> Self::Id;

    /// Return the entity carrying `id`.
    fn with_id(self, id: Self::Id) -> Self;

    /// Keys this entity occupies in uniqueness indexes.
    fn unique_keys(&self) -> Vec<UniqueKey>;
}

/// Outcome of a [`Repository::modify`] mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mutation {
    /// Persist the mutated entity.
    Commit,
    /// Leave the stored entity untouched.
    Discard,
}

/// Linearizable create/read/update/delete contract.
///
/// Identifiers are assigned by `create`, increase monotonically, and are never
/// reused after deletion.
pub trait Repository<E: Entity>: Send + Sync {
    /// Assign the next identifier and insert the entity with its index keys.
    ///
    /// Fails with [`RepositoryError::Conflict`] without changing anything when
    /// a unique key is already taken.
    fn create(&self, entity: E) -> Result<E, RepositoryError>;

    /// Fetch an entity by identifier.
    fn get(&self, id: E::Id) -> Result<E, RepositoryError>;

    /// Fetch an entity through a uniqueness index.
    fn get_by_index(&self, index: &str, key: &str) -> Result<E, RepositoryError>;

    /// Replace the stored entity, swapping changed index keys atomically.
    fn update(&self, id: E::Id, entity: E) -> Result<E, RepositoryError>;

    /// Read-modify-write under exclusive access.
    ///
    /// Returns the stored entity after the mutation, or unchanged when the
    /// mutation answers [`Mutation::Discard`].
    fn modify(
        &self,
        id: E::Id,
        mutation: &mut dyn FnMut(&mut E) -> Mutation,
    ) -> Result<E, RepositoryError>;

    /// Remove the entity and its index keys, returning what was removed.
    fn delete(&self, id: E::Id) -> Result<E, RepositoryError>;

    /// Point-in-time snapshot of matching entities ordered by identifier.
    fn list(&self, predicate: &dyn Fn(&E) -> bool) -> Vec<E>;

    /// Number of stored entities.
    fn len(&self) -> usize;

    /// Whether the repository is empty.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn conflict_message_names_index_and_key() {
        let err = RepositoryError::conflict("email", "a@x.com");
        assert_eq!(err.to_string(), "email 'a@x.com' is already taken");
    }

    #[rstest]
    fn not_found_message_names_key() {
        let err = RepositoryError::not_found("user 7");
        assert_eq!(err.to_string(), "no entity stored under user 7");
    }
}
