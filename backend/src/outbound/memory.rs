//! In-process repository adapter backed by a single reader-writer lock.
//!
//! All state (primary map, uniqueness indexes, identifier counter) lives in
//! one struct behind one `parking_lot::RwLock`. Writers hold the exclusive
//! lock for the whole operation, so id assignment, index maintenance, and
//! publication form a single critical section; readers take the shared lock
//! and copy out what they need.

use std::collections::{BTreeMap, HashMap};

use parking_lot::RwLock;
use tracing::debug;

use crate::domain::ports::{Entity, Mutation, Repository, RepositoryError, UniqueKey};

type Index<Id> = HashMap<String, Id>;

struct State<E: Entity> {
    entities: BTreeMap<E::Id, E>,
    indexes: HashMap<&'static str, Index<E::Id>>,
    last_id: u64,
}

impl<E: Entity> State<E> {
    fn new() -> Self {
        Self {
            entities: BTreeMap::new(),
            indexes: HashMap::new(),
            last_id: 0,
        }
    }

    fn holder_of(&self, key: &UniqueKey) -> Option<E::Id> {
        self.indexes
            .get(key.index)
            .and_then(|index| index.get(&key.value))
            .copied()
    }

    /// First key in `keys` already held by an entity other than `owner`.
    fn find_conflict(&self, keys: &[UniqueKey], owner: Option<E::Id>) -> Option<RepositoryError> {
        keys.iter().find_map(|key| match self.holder_of(key) {
            Some(holder) if Some(holder) != owner => Some(RepositoryError::conflict(
                key.index,
                key.value.clone(),
            )),
            _ => None,
        })
    }

    fn next_id(&mut self) -> Result<E::Id, RepositoryError> {
        let next = self
            .last_id
            .checked_add(1)
            .ok_or_else(|| RepositoryError::backend("identifier space exhausted"))?;
        self.last_id = next;
        Ok(E::Id::from(next))
    }

    fn insert_keys(&mut self, keys: Vec<UniqueKey>, id: E::Id) {
        for key in keys {
            self.indexes.entry(key.index).or_default().insert(key.value, id);
        }
    }

    fn remove_keys(&mut self, keys: &[UniqueKey]) {
        for key in keys {
            if let Some(index) = self.indexes.get_mut(key.index) {
                index.remove(&key.value);
            }
        }
    }

    /// Replace the stored entity for `id`, swapping index keys.
    ///
    /// Caller guarantees `id` is present.
    fn replace(&mut self, id: E::Id, entity: E) -> Result<E, RepositoryError> {
        let entity = entity.with_id(id);
        let new_keys = entity.unique_keys();
        if let Some(conflict) = self.find_conflict(&new_keys, Some(id)) {
            return Err(conflict);
        }
        let old_keys = self
            .entities
            .get(&id)
            .map(Entity::unique_keys)
            .unwrap_or_default();
        self.remove_keys(&old_keys);
        self.insert_keys(new_keys, id);
        self.entities.insert(id, entity.clone());
        Ok(entity)
    }
}

/// Linearizable in-memory [`Repository`].
///
/// # Examples
/// ```
/// use chrono::Utc;
/// use gatehouse::domain::ports::Repository;
/// use gatehouse::domain::{DisplayName, Email, PasswordHash, Role, User};
/// use gatehouse::outbound::memory::InMemoryRepository;
///
/// let users = InMemoryRepository::<User>::new("user");
/// let user = User::new(
///     Email::new("a@x.com").unwrap(),
///     DisplayName::new("Ada").unwrap(),
///     PasswordHash::new("$argon2id$stub").unwrap(),
///     Role::User,
///     Utc::now(),
///     None,
/// );
/// let stored = users.create(user).unwrap();
/// assert_eq!(stored.id().get(), 1);
/// assert!(users.get_by_index(User::EMAIL_INDEX, "a@x.com").is_ok());
/// ```
pub struct InMemoryRepository<E: Entity> {
    label: &'static str,
    state: RwLock<State<E>>,
}

impl<E: Entity> InMemoryRepository<E> {
    /// Empty repository; `label` names the entity kind in errors and logs.
    pub fn new(label: &'static str) -> Self {
        Self {
            label,
            state: RwLock::new(State::new()),
        }
    }

    fn not_found(&self, id: E::Id) -> RepositoryError {
        RepositoryError::not_found(format!("{} {id}", self.label))
    }
}

impl<E: Entity> std::fmt::Debug for InMemoryRepository<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryRepository")
            .field("label", &self.label)
            .field("len", &self.len())
            .finish()
    }
}

impl<E: Entity> Repository<E> for InMemoryRepository<E> {
    fn create(&self, entity: E) -> Result<E, RepositoryError> {
        let mut state = self.state.write();
        let keys = entity.unique_keys();
        if let Some(conflict) = state.find_conflict(&keys, None) {
            debug!(entity = self.label, %conflict, "create rejected");
            return Err(conflict);
        }
        let id = state.next_id()?;
        let entity = entity.with_id(id);
        state.insert_keys(keys, id);
        state.entities.insert(id, entity.clone());
        debug!(entity = self.label, %id, "created");
        Ok(entity)
    }

    fn get(&self, id: E::Id) -> Result<E, RepositoryError> {
        self.state
            .read()
            .entities
            .get(&id)
            .cloned()
            .ok_or_else(|| self.not_found(id))
    }

    fn get_by_index(&self, index: &str, key: &str) -> Result<E, RepositoryError> {
        let state = self.state.read();
        state
            .indexes
            .get(index)
            .and_then(|entries| entries.get(key))
            .and_then(|id| state.entities.get(id))
            .cloned()
            .ok_or_else(|| RepositoryError::not_found(format!("{} {index} '{key}'", self.label)))
    }

    fn update(&self, id: E::Id, entity: E) -> Result<E, RepositoryError> {
        let mut state = self.state.write();
        if !state.entities.contains_key(&id) {
            return Err(self.not_found(id));
        }
        let stored = state.replace(id, entity)?;
        debug!(entity = self.label, %id, "updated");
        Ok(stored)
    }

    fn modify(
        &self,
        id: E::Id,
        mutation: &mut dyn FnMut(&mut E) -> Mutation,
    ) -> Result<E, RepositoryError> {
        let mut state = self.state.write();
        let mut draft = state
            .entities
            .get(&id)
            .cloned()
            .ok_or_else(|| self.not_found(id))?;
        match mutation(&mut draft) {
            Mutation::Discard => state.entities.get(&id).cloned().ok_or_else(|| self.not_found(id)),
            Mutation::Commit => {
                let stored = state.replace(id, draft)?;
                debug!(entity = self.label, %id, "modified");
                Ok(stored)
            }
        }
    }

    fn delete(&self, id: E::Id) -> Result<E, RepositoryError> {
        let mut state = self.state.write();
        let removed = state.entities.remove(&id).ok_or_else(|| self.not_found(id))?;
        state.remove_keys(&removed.unique_keys());
        debug!(entity = self.label, %id, "deleted");
        Ok(removed)
    }

    fn list(&self, predicate: &dyn Fn(&E) -> bool) -> Vec<E> {
        self.state
            .read()
            .entities
            .values()
            .filter(|entity| predicate(entity))
            .cloned()
            .collect()
    }

    fn len(&self) -> usize {
        self.state.read().entities.len()
    }
}

#[cfg(test)]
#[path = "memory_tests.rs"]
mod tests;
