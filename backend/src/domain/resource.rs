//! Protected resource model.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::policy::AccessLevel;
use super::ports::{Entity, UniqueKey};
use super::user::UserId;

/// Validation errors for resource inputs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceValidationError {
    EmptyTitle,
    TitleTooLong { max: usize },
}

impl fmt::Display for ResourceValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyTitle => write!(f, "title must not be empty"),
            Self::TitleTooLong { max } => write!(f, "title must be at most {max} characters"),
        }
    }
}

impl std::error::Error for ResourceValidationError {}

/// Stable resource identifier assigned by the repository.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceId(u64);

impl ResourceId {
    /// Placeholder carried by resources that have not been stored yet.
    pub const PENDING: Self = Self(0);

    /// Wrap a raw identifier.
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Raw numeric value.
    pub fn get(self) -> u64 {
        self.0
    }
}

impl From<u64> for ResourceId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Maximum title length in characters.
pub const TITLE_MAX: usize = 200;

/// Trimmed, non-empty resource title.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ResourceTitle(String);

impl ResourceTitle {
    /// Validate and construct a title.
    pub fn new(title: impl AsRef<str>) -> Result<Self, ResourceValidationError> {
        let trimmed = title.as_ref().trim();
        if trimmed.is_empty() {
            return Err(ResourceValidationError::EmptyTitle);
        }
        if trimmed.chars().count() > TITLE_MAX {
            return Err(ResourceValidationError::TitleTooLong { max: TITLE_MAX });
        }
        Ok(Self(trimmed.to_owned()))
    }
}

impl AsRef<str> for ResourceTitle {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl From<ResourceTitle> for String {
    fn from(value: ResourceTitle) -> Self {
        value.0
    }
}

impl TryFrom<String> for ResourceTitle {
    type Error = ResourceValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Caller-supplied fields for a new resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceDraft {
    pub title: ResourceTitle,
    pub description: String,
    pub content: String,
    pub category: String,
    pub required_level: AccessLevel,
}

/// Partial update; `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResourcePatch {
    pub title: Option<ResourceTitle>,
    pub description: Option<String>,
    pub content: Option<String>,
    pub category: Option<String>,
    pub required_level: Option<AccessLevel>,
    pub published: Option<bool>,
}

impl ResourcePatch {
    /// Whether the patch touches moderator-only fields.
    pub fn touches_moderation(&self) -> bool {
        self.required_level.is_some() || self.published.is_some()
    }
}

/// Content guarded by a required access level.
///
/// ## Invariants
/// - `required_level` is always within `[0, 3]` (enforced by [`AccessLevel`]).
/// - New resources start unpublished.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Resource {
    id: ResourceId,
    title: ResourceTitle,
    description: String,
    content: String,
    category: String,
    required_level: AccessLevel,
    owner: UserId,
    published: bool,
    created_at: DateTime<Utc>,
}

impl Resource {
    /// Build an unpublished, not yet stored resource.
    pub fn new(draft: ResourceDraft, owner: UserId, now: DateTime<Utc>) -> Self {
        let ResourceDraft {
            title,
            description,
            content,
            category,
            required_level,
        } = draft;
        Self {
            id: ResourceId::PENDING,
            title,
            description,
            content,
            category,
            required_level,
            owner,
            published: false,
            created_at: now,
        }
    }

    /// Stable identifier.
    pub fn id(&self) -> ResourceId {
        self.id
    }

    /// Title.
    pub fn title(&self) -> &ResourceTitle {
        &self.title
    }

    /// Short description shown in public listings.
    pub fn description(&self) -> &str {
        self.description.as_str()
    }

    /// Full body content.
    pub fn content(&self) -> &str {
        self.content.as_str()
    }

    /// Free-form category used for listing filters.
    pub fn category(&self) -> &str {
        self.category.as_str()
    }

    /// Level a caller needs to observe the resource.
    pub fn required_level(&self) -> AccessLevel {
        self.required_level
    }

    /// Creating user.
    pub fn owner(&self) -> UserId {
        self.owner
    }

    /// Whether the resource appears in listings.
    pub fn is_published(&self) -> bool {
        self.published
    }

    /// Creation timestamp.
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Whether `user` created this resource.
    pub fn is_owned_by(&self, user: UserId) -> bool {
        self.owner == user
    }

    /// Apply the content fields of a patch; moderation fields are ignored.
    pub fn apply_content(&mut self, patch: &ResourcePatch) {
        if let Some(title) = &patch.title {
            self.title = title.clone();
        }
        if let Some(description) = &patch.description {
            self.description.clone_from(description);
        }
        if let Some(content) = &patch.content {
            self.content.clone_from(content);
        }
        if let Some(category) = &patch.category {
            self.category.clone_from(category);
        }
    }

    /// Change the required level.
    pub fn set_required_level(&mut self, level: AccessLevel) {
        self.required_level = level;
    }

    /// Publish or withdraw the resource.
    pub fn set_published(&mut self, published: bool) {
        self.published = published;
    }

    /// Reduced projection for callers below the full-view threshold.
    pub fn to_public(&self) -> PublicResource {
        PublicResource {
            id: self.id,
            title: self.title.as_ref().to_owned(),
            description: self.description.clone(),
            category: self.category.clone(),
            created_at: self.created_at,
        }
    }
}

impl Entity for Resource {
    type Id = ResourceId;

    fn id(&self) -> ResourceId {
        self.id
    }

    fn with_id(mut self, id: ResourceId) -> Self {
        self.id = id;
        self
    }

    fn unique_keys(&self) -> Vec<UniqueKey> {
        Vec::new()
    }
}

/// Non-sensitive resource fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicResource {
    /// Stable identifier.
    pub id: ResourceId,
    /// Title.
    pub title: String,
    /// Short description.
    pub description: String,
    /// Category.
    pub category: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}
