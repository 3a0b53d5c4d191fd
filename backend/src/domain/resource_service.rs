//! Access-controlled resource operations.
//!
//! Callers arrive as an optional verified [`Principal`]; anonymous callers
//! act at [`AccessLevel::PUBLIC`]. Every read is projected through the policy
//! engine and every write is authorised before the repository is touched.

use std::sync::Arc;

use mockable::Clock;
use tracing::{info, warn};

use super::policy::{self, MINIMUM_MUTATOR_ROLE};
use super::ports::{Mutation, RepositoryError, ResourceRepository, UserRepository};
use super::resource::{Resource, ResourceDraft, ResourceId, ResourcePatch};
use super::service_errors::map_repository_error;
use super::token::Principal;
use super::user::UserId;
use super::{AccessLevel, Error, ResourceView};

/// Page size used when a listing does not ask for one.
pub const DEFAULT_PAGE_LIMIT: usize = 10;
/// Largest page a listing may request.
pub const MAX_PAGE_LIMIT: usize = 100;

/// Listing filter and keyset cursor.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResourceFilter {
    /// Only list resources in this category.
    pub category: Option<String>,
    /// Only list resources owned by this account.
    pub owner: Option<UserId>,
    /// Exclusive cursor: only list resources with a greater id.
    pub after: Option<ResourceId>,
    /// Page size, defaulting to [`DEFAULT_PAGE_LIMIT`].
    pub limit: Option<usize>,
}

impl ResourceFilter {
    /// Filter on one category.
    pub fn category(category: impl Into<String>) -> Self {
        Self {
            category: Some(category.into()),
            ..Self::default()
        }
    }

    /// Filter on one owner.
    pub fn owner(owner: UserId) -> Self {
        Self {
            owner: Some(owner),
            ..Self::default()
        }
    }

    /// Continue after `cursor` with pages of `limit` entries.
    #[must_use]
    pub fn page(mut self, after: Option<ResourceId>, limit: usize) -> Self {
        self.after = after;
        self.limit = Some(limit);
        self
    }

    fn checked_limit(&self) -> Result<usize, Error> {
        let limit = self.limit.unwrap_or(DEFAULT_PAGE_LIMIT);
        if (1..=MAX_PAGE_LIMIT).contains(&limit) {
            return Ok(limit);
        }
        Err(
            Error::invalid_request(format!("limit must be between 1 and {MAX_PAGE_LIMIT}"))
                .with_detail("field", "limit")
                .with_detail("value", limit)
                .with_detail("code", "invalid_limit"),
        )
    }
}

/// One page of a resource listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourcePage {
    /// Visible resources in id order.
    pub items: Vec<ResourceView>,
    /// Cursor for the next page, absent on the last page.
    pub next_after: Option<ResourceId>,
}

fn caller_level(principal: Option<&Principal>) -> AccessLevel {
    principal.map_or(AccessLevel::PUBLIC, |principal| principal.role().level())
}

fn forbidden(principal: &Principal, id: ResourceId, action: &str) -> Error {
    warn!(user_id = %principal.subject_id(), resource_id = %id, %action, "resource access refused");
    Error::forbidden(format!("not permitted to {action} this resource"))
}

/// Projection of a resource the caller was just allowed to change.
fn project_for(principal: &Principal, resource: &Resource) -> Result<ResourceView, Error> {
    policy::project(resource, principal.role().level())
        .ok_or_else(|| Error::internal("authorised change left resource invisible"))
}

/// Resource service enforcing the access policy.
#[derive(Clone)]
pub struct ResourceService<R, U> {
    resources: Arc<R>,
    users: Arc<U>,
    clock: Arc<dyn Clock>,
}

impl<R, U> ResourceService<R, U> {
    /// Create a service over the resource and user repositories.
    pub fn new(resources: Arc<R>, users: Arc<U>, clock: Arc<dyn Clock>) -> Self {
        Self {
            resources,
            users,
            clock,
        }
    }
}

impl<R, U> ResourceService<R, U>
where
    R: ResourceRepository,
    U: UserRepository,
{
    /// Create a resource owned by the caller.
    ///
    /// The requested level is capped at the caller's own level. The owner
    /// check and the insert are separate repository calls; an owner removed
    /// in between leaves an orphaned resource.
    pub fn create(&self, principal: &Principal, draft: ResourceDraft) -> Result<Resource, Error> {
        let owner = match self.users.get(principal.subject_id()) {
            Ok(user) if user.is_active() => user,
            Ok(_) | Err(RepositoryError::NotFound { .. }) => {
                warn!(user_id = %principal.subject_id(), "resource creation by unknown account");
                return Err(Error::unauthorized("account is not available"));
            }
            Err(err) => return Err(map_repository_error(err)),
        };
        let mut draft = draft;
        draft.required_level = draft.required_level.min(principal.role().level());
        let resource = Resource::new(draft, owner.id(), self.clock.utc());
        let stored = self
            .resources
            .create(resource)
            .map_err(map_repository_error)?;
        info!(
            resource_id = %stored.id(),
            owner = %owner.id(),
            level = %stored.required_level(),
            "resource created"
        );
        Ok(stored)
    }

    /// Fetch one resource projected for the caller.
    ///
    /// Unpublished resources are only visible to their owner and moderators;
    /// everyone else gets `not_found`. Published resources above the caller's
    /// level are `forbidden`.
    pub fn get(&self, principal: Option<&Principal>, id: ResourceId) -> Result<ResourceView, Error> {
        let resource = self.resources.get(id).map_err(map_repository_error)?;
        let privileged = principal.is_some_and(|principal| {
            resource.is_owned_by(principal.subject_id()) || policy::can_moderate(principal.role())
        });
        if !resource.is_published() && !privileged {
            return Err(Error::not_found(format!("resource {id} was not found")));
        }
        let level = caller_level(principal);
        policy::project(&resource, level).ok_or_else(|| {
            warn!(resource_id = %id, caller_level = %level, "resource above caller level");
            Error::forbidden("insufficient access level")
        })
    }

    /// Published resources visible to the caller, in id order, one page at a
    /// time.
    ///
    /// Visibility is applied before the cursor and limit, so a page never
    /// comes back short because of resources the caller cannot see.
    pub fn list(
        &self,
        principal: Option<&Principal>,
        filter: &ResourceFilter,
    ) -> Result<ResourcePage, Error> {
        let limit = filter.checked_limit()?;
        let published = self
            .resources
            .list_published(filter.category.as_deref(), filter.owner);
        let mut items: Vec<ResourceView> =
            policy::filter_visible(&published, caller_level(principal))
                .into_iter()
                .filter(|view| filter.after.is_none_or(|after| view.id() > after))
                .take(limit.saturating_add(1))
                .collect();
        let next_after = if items.len() > limit {
            items.truncate(limit);
            items.last().map(ResourceView::id)
        } else {
            None
        };
        Ok(ResourcePage { items, next_after })
    }

    /// Apply a partial update and return it projected for the caller.
    ///
    /// Owners and callers at or above the mutator role may edit content.
    /// Every caller, owners included, must be able to read the resource at
    /// its current level. Changing the required level or published flag
    /// needs a moderator, and the level is capped at the caller's own.
    pub fn update(
        &self,
        principal: &Principal,
        id: ResourceId,
        patch: &ResourcePatch,
    ) -> Result<ResourceView, Error> {
        let role = principal.role();
        if patch.touches_moderation() && !policy::can_moderate(role) {
            return Err(forbidden(principal, id, "moderate"));
        }
        let mut allowed = true;
        let updated = self
            .resources
            .modify(id, &mut |resource: &mut Resource| {
                let is_owner = resource.is_owned_by(principal.subject_id());
                allowed = policy::can_mutate(role, is_owner, MINIMUM_MUTATOR_ROLE)
                    && policy::can_access(role.level(), resource.required_level());
                if !allowed {
                    return Mutation::Discard;
                }
                resource.apply_content(patch);
                if let Some(level) = patch.required_level {
                    resource.set_required_level(level.min(role.level()));
                }
                if let Some(published) = patch.published {
                    resource.set_published(published);
                }
                Mutation::Commit
            })
            .map_err(map_repository_error)?;
        if !allowed {
            return Err(forbidden(principal, id, "update"));
        }
        info!(resource_id = %id, user_id = %principal.subject_id(), "resource updated");
        project_for(principal, &updated)
    }

    /// Publish or withdraw a resource. Moderators at or above the resource's
    /// level only.
    pub fn set_published(
        &self,
        principal: &Principal,
        id: ResourceId,
        published: bool,
    ) -> Result<ResourceView, Error> {
        let role = principal.role();
        if !policy::can_moderate(role) {
            return Err(forbidden(principal, id, "publish"));
        }
        let mut allowed = true;
        let updated = self
            .resources
            .modify(id, &mut |resource: &mut Resource| {
                allowed = policy::can_access(role.level(), resource.required_level());
                if !allowed {
                    return Mutation::Discard;
                }
                resource.set_published(published);
                Mutation::Commit
            })
            .map_err(map_repository_error)?;
        if !allowed {
            return Err(forbidden(principal, id, "publish"));
        }
        info!(resource_id = %id, published, "resource publication changed");
        project_for(principal, &updated)
    }

    /// Delete a resource. Owners and administrators only.
    ///
    /// Ownership never changes after creation, so checking it before the
    /// delete cannot race with an update.
    pub fn delete(&self, principal: &Principal, id: ResourceId) -> Result<Resource, Error> {
        let resource = self.resources.get(id).map_err(map_repository_error)?;
        let is_owner = resource.is_owned_by(principal.subject_id());
        if !policy::can_delete(principal.role(), is_owner) {
            return Err(forbidden(principal, id, "delete"));
        }
        let removed = self.resources.delete(id).map_err(map_repository_error)?;
        info!(resource_id = %id, user_id = %principal.subject_id(), "resource deleted");
        Ok(removed)
    }
}

#[cfg(test)]
#[path = "resource_service_tests.rs"]
mod tests;
