//! Role-based access policy.
//!
//! Every access decision routes through this module: roles form a closed set
//! with one ordering, resources carry a required [`AccessLevel`], and the
//! visibility projection decides what a caller may observe. All functions are
//! pure.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::resource::{PublicResource, Resource};

/// Rank derived from a role, compared against a resource's required level.
///
/// ## Invariants
/// - The wrapped value is always within `[0, 3]`; constructors clamp.
///
/// # Examples
/// ```
/// use gatehouse::domain::AccessLevel;
///
/// assert_eq!(AccessLevel::clamped(7), AccessLevel::ADMIN);
/// assert_eq!(AccessLevel::clamped(-2), AccessLevel::PUBLIC);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "i64", into = "u8")]
pub struct AccessLevel(u8);

impl AccessLevel {
    /// Visible to unauthenticated callers.
    pub const PUBLIC: Self = Self(0);
    /// Any registered user.
    pub const USER: Self = Self(1);
    /// Editors and above.
    pub const EDITOR: Self = Self(2);
    /// Administrators only.
    pub const ADMIN: Self = Self(3);

    /// Build a level from an arbitrary integer, clamping into `[0, 3]`.
    pub fn clamped(value: i64) -> Self {
        let bounded = value.clamp(i64::from(Self::PUBLIC.0), i64::from(Self::ADMIN.0));
        // The clamp above keeps the value within u8 range.
        Self(u8::try_from(bounded).unwrap_or(Self::ADMIN.0))
    }

    /// Numeric rank.
    pub fn value(self) -> u8 {
        self.0
    }
}

impl Default for AccessLevel {
    fn default() -> Self {
        Self::PUBLIC
    }
}

impl From<i64> for AccessLevel {
    fn from(value: i64) -> Self {
        Self::clamped(value)
    }
}

impl From<AccessLevel> for u8 {
    fn from(value: AccessLevel) -> Self {
        value.0
    }
}

impl fmt::Display for AccessLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Closed set of recognised roles.
///
/// Parsing is total and case-sensitive: any unrecognised name resolves to
/// [`Role::Public`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Role {
    /// Full administrative control.
    Admin,
    /// May moderate any resource but not delete others' resources.
    Editor,
    /// Regular registered account.
    User,
    /// No recognised role.
    Public,
}

impl Role {
    /// Parse a role name; unknown names map to [`Role::Public`].
    pub fn parse(name: &str) -> Self {
        match name {
            "admin" => Self::Admin,
            "editor" => Self::Editor,
            "user" => Self::User,
            _ => Self::Public,
        }
    }

    /// Canonical wire name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Editor => "editor",
            Self::User => "user",
            Self::Public => "public",
        }
    }

    /// Access level granted by this role.
    pub fn level(self) -> AccessLevel {
        match self {
            Self::Admin => AccessLevel::ADMIN,
            Self::Editor => AccessLevel::EDITOR,
            Self::User => AccessLevel::USER,
            Self::Public => AccessLevel::PUBLIC,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<String> for Role {
    fn from(value: String) -> Self {
        Self::parse(&value)
    }
}

impl From<Role> for String {
    fn from(value: Role) -> Self {
        value.as_str().to_owned()
    }
}

/// Callers at or above this level see full resource bodies.
pub const FULL_VIEW_LEVEL: AccessLevel = AccessLevel::EDITOR;

/// Minimum role allowed to update resources it does not own.
pub const MINIMUM_MUTATOR_ROLE: Role = Role::Editor;

/// Access level for a role name. Total: unknown names yield level 0.
///
/// # Examples
/// ```
/// use gatehouse::domain::{AccessLevel, policy};
///
/// assert_eq!(policy::level_of("editor"), AccessLevel::EDITOR);
/// assert_eq!(policy::level_of("Admin"), AccessLevel::PUBLIC);
/// ```
pub fn level_of(role: &str) -> AccessLevel {
    Role::parse(role).level()
}

/// Whether a caller at `caller` may observe something requiring `required`.
pub fn can_access(caller: AccessLevel, required: AccessLevel) -> bool {
    caller >= required
}

/// Whether a caller may update an entity.
///
/// Ownership alone is sufficient; otherwise the caller's level must reach the
/// minimum mutator role's level.
pub fn can_mutate(caller: Role, is_owner: bool, minimum_mutator: Role) -> bool {
    is_owner || caller.level() >= minimum_mutator.level()
}

/// Whether a caller may delete an entity: the owner or an administrator.
///
/// Stricter than [`can_mutate`]; editors cannot delete what they do not own.
pub fn can_delete(caller: Role, is_owner: bool) -> bool {
    is_owner || caller == Role::Admin
}

/// Whether a caller may change a resource's required level or published flag.
pub fn can_moderate(caller: Role) -> bool {
    caller.level() >= MINIMUM_MUTATOR_ROLE.level()
}

/// What a caller is allowed to see of a resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ResourceView {
    /// Complete resource including body content.
    Full(Resource),
    /// Reduced projection without body content or ownership data.
    Public(PublicResource),
}

impl ResourceView {
    /// Identifier of the underlying resource.
    pub fn id(&self) -> super::ResourceId {
        match self {
            Self::Full(resource) => resource.id(),
            Self::Public(public) => public.id,
        }
    }

    /// Whether this is the full projection.
    pub fn is_full(&self) -> bool {
        matches!(self, Self::Full(_))
    }
}

/// Project a resource for a caller, or `None` when it must stay invisible.
pub fn project(resource: &Resource, caller: AccessLevel) -> Option<ResourceView> {
    if !can_access(caller, resource.required_level()) {
        return None;
    }
    if caller >= FULL_VIEW_LEVEL {
        Some(ResourceView::Full(resource.clone()))
    } else {
        Some(ResourceView::Public(resource.to_public()))
    }
}

/// Drop invisible resources and project the rest for the caller.
pub fn filter_visible<'a, I>(resources: I, caller: AccessLevel) -> Vec<ResourceView>
where
    I: IntoIterator<Item = &'a Resource>,
{
    resources
        .into_iter()
        .filter_map(|resource| project(resource, caller))
        .collect()
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use crate::domain::ports::Entity;
    use crate::domain::resource::{ResourceDraft, ResourceTitle};
    use crate::domain::{ResourceId, UserId};
    use chrono::{TimeZone, Utc};
    use rstest::rstest;

    fn resource(required: AccessLevel) -> Resource {
        let created_at = Utc
            .with_ymd_and_hms(2024, 1, 1, 0, 0, 0)
            .single()
            .expect("valid timestamp");
        let draft = ResourceDraft {
            title: ResourceTitle::new("Quarterly report").expect("valid title"),
            description: "summary".to_owned(),
            content: "secret body".to_owned(),
            category: "reports".to_owned(),
            required_level: required,
        };
        Resource::new(draft, UserId::new(1), created_at).with_id(ResourceId::new(9))
    }

    #[rstest]
    #[case("admin", 3)]
    #[case("editor", 2)]
    #[case("user", 1)]
    #[case("", 0)]
    #[case("ADMIN", 0)]
    #[case("usuario", 0)]
    #[case("root", 0)]
    fn level_of_is_total(#[case] role: &str, #[case] expected: u8) {
        assert_eq!(level_of(role).value(), expected);
    }

    #[rstest]
    #[case(-5, 0)]
    #[case(0, 0)]
    #[case(2, 2)]
    #[case(3, 3)]
    #[case(99, 3)]
    fn access_level_clamps(#[case] raw: i64, #[case] expected: u8) {
        assert_eq!(AccessLevel::clamped(raw).value(), expected);
    }

    #[rstest]
    fn access_level_deserialises_with_clamping() {
        let level: AccessLevel = serde_json::from_str("12").expect("integer decodes");
        assert_eq!(level, AccessLevel::ADMIN);
    }

    #[rstest]
    #[case(AccessLevel::USER, AccessLevel::USER, true)]
    #[case(AccessLevel::USER, AccessLevel::EDITOR, false)]
    #[case(AccessLevel::ADMIN, AccessLevel::PUBLIC, true)]
    fn can_access_compares_levels(
        #[case] caller: AccessLevel,
        #[case] required: AccessLevel,
        #[case] expected: bool,
    ) {
        assert_eq!(can_access(caller, required), expected);
    }

    #[rstest]
    #[case(Role::User, false, false)]
    #[case(Role::User, true, true)]
    #[case(Role::Editor, false, true)]
    #[case(Role::Admin, false, true)]
    #[case(Role::Public, true, true)]
    fn can_mutate_allows_owner_or_mutator_role(
        #[case] caller: Role,
        #[case] is_owner: bool,
        #[case] expected: bool,
    ) {
        assert_eq!(can_mutate(caller, is_owner, MINIMUM_MUTATOR_ROLE), expected);
    }

    #[rstest]
    #[case(Role::Editor, false, false)]
    #[case(Role::Editor, true, true)]
    #[case(Role::User, true, true)]
    #[case(Role::Admin, false, true)]
    fn delete_is_narrower_than_update(
        #[case] caller: Role,
        #[case] is_owner: bool,
        #[case] expected: bool,
    ) {
        assert_eq!(can_delete(caller, is_owner), expected);
    }

    #[rstest]
    fn editor_can_update_but_not_delete_foreign_resources() {
        assert!(can_mutate(Role::Editor, false, MINIMUM_MUTATOR_ROLE));
        assert!(!can_delete(Role::Editor, false));
    }

    #[rstest]
    #[case(AccessLevel::PUBLIC, None)]
    #[case(AccessLevel::USER, None)]
    #[case(AccessLevel::EDITOR, Some(true))]
    #[case(AccessLevel::ADMIN, Some(true))]
    fn projection_hides_resources_above_caller_level(
        #[case] caller: AccessLevel,
        #[case] expected_full: Option<bool>,
    ) {
        let view = project(&resource(AccessLevel::EDITOR), caller);
        assert_eq!(view.map(|view| view.is_full()), expected_full);
    }

    #[rstest]
    fn low_level_callers_receive_public_projection() {
        let view = project(&resource(AccessLevel::PUBLIC), AccessLevel::USER)
            .expect("public resource is visible");
        match view {
            ResourceView::Public(public) => {
                assert_eq!(public.title, "Quarterly report");
                let json = serde_json::to_value(&public).expect("projection serialises");
                assert!(json.get("content").is_none());
            }
            ResourceView::Full(_) => panic!("user level must not see full body"),
        }
    }

    #[rstest]
    fn filter_visible_excludes_rather_than_redacts() {
        let resources = [
            resource(AccessLevel::PUBLIC),
            resource(AccessLevel::EDITOR),
            resource(AccessLevel::ADMIN),
        ];
        assert_eq!(filter_visible(&resources, AccessLevel::USER).len(), 1);
        assert_eq!(filter_visible(&resources, AccessLevel::EDITOR).len(), 2);
        assert_eq!(filter_visible(&resources, AccessLevel::ADMIN).len(), 3);
    }

    #[rstest]
    fn roles_round_trip_through_strings() {
        for role in [Role::Admin, Role::Editor, Role::User] {
            assert_eq!(Role::parse(role.as_str()), role);
        }
        assert_eq!(Role::parse("public").level(), AccessLevel::PUBLIC);
    }
}
