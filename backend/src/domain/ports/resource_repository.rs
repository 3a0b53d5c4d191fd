//! Resource specialisation of the repository contract.

use crate::domain::{Resource, UserId};

use super::Repository;

/// Repository of access-controlled resources.
pub trait ResourceRepository: Repository<Resource> {
    /// Snapshot of published resources in id order, optionally limited to
    /// one category and one owner.
    fn list_published(&self, category: Option<&str>, owner: Option<UserId>) -> Vec<Resource> {
        self.list(&|resource: &Resource| {
            resource.is_published()
                && category.is_none_or(|wanted| resource.category() == wanted)
                && owner.is_none_or(|wanted| resource.is_owned_by(wanted))
        })
    }
}

impl<T> ResourceRepository for T where T: Repository<Resource> {}
