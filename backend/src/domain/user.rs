//! User account model.

use std::fmt;
use std::sync::OnceLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::policy::Role;
use super::ports::{Entity, UniqueKey};

/// Validation errors returned by user value constructors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserValidationError {
    EmptyEmail,
    InvalidEmail,
    EmptyPasswordHash,
    EmptyDisplayName,
    DisplayNameTooLong { max: usize },
}

impl fmt::Display for UserValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyEmail => write!(f, "email must not be empty"),
            Self::InvalidEmail => write!(f, "email must look like local@domain"),
            Self::EmptyPasswordHash => write!(f, "password hash must not be empty"),
            Self::EmptyDisplayName => write!(f, "display name must not be empty"),
            Self::DisplayNameTooLong { max } => {
                write!(f, "display name must be at most {max} characters")
            }
        }
    }
}

impl std::error::Error for UserValidationError {}

/// Stable user identifier assigned by the repository's monotonic counter.
///
/// Assigned identifiers start at 1; [`UserId::PENDING`] marks a user that has
/// not been stored yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(u64);

impl UserId {
    /// Placeholder carried by users that have not been stored yet.
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

impl From<u64> for UserId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Account email address.
///
/// ## Invariants
/// - Surrounding whitespace is trimmed; the remainder must match
///   `local@domain` with no inner whitespace.
/// - Comparison is case-sensitive and exact.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Email(String);

static EMAIL_RE: OnceLock<Regex> = OnceLock::new();

fn email_regex() -> &'static Regex {
    EMAIL_RE.get_or_init(|| {
        let pattern = r"^[^@\s]+@[^@\s]+$";
        Regex::new(pattern).unwrap_or_else(|error| panic!("email regex failed to compile: {error}"))
    })
}

impl Email {
    /// Validate and construct an [`Email`].
    ///
    /// # Examples
    /// ```
    /// use gatehouse::domain::Email;
    ///
    /// let email = Email::new("  a@x.com ").unwrap();
    /// assert_eq!(email.as_ref(), "a@x.com");
    /// assert!(Email::new("not-an-email").is_err());
    /// ```
    pub fn new(email: impl AsRef<str>) -> Result<Self, UserValidationError> {
        let normalized = email.as_ref().trim();
        if normalized.is_empty() {
            return Err(UserValidationError::EmptyEmail);
        }
        if !email_regex().is_match(normalized) {
            return Err(UserValidationError::InvalidEmail);
        }
        Ok(Self(normalized.to_owned()))
    }
}

impl AsRef<str> for Email {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for Email {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_ref())
    }
}

impl From<Email> for String {
    fn from(value: Email) -> Self {
        value.0
    }
}

impl TryFrom<String> for Email {
    type Error = UserValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Longest display name accepted, in characters.
pub const DISPLAY_NAME_MAX_CHARS: usize = 100;

/// Name shown for an account.
///
/// ## Invariants
/// - Surrounding whitespace is trimmed; the remainder is non-empty and at
///   most [`DISPLAY_NAME_MAX_CHARS`] characters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DisplayName(String);

impl DisplayName {
    /// Validate and construct a [`DisplayName`].
    ///
    /// # Examples
    /// ```
    /// use gatehouse::domain::DisplayName;
    ///
    /// let name = DisplayName::new("  Ada Lovelace ").unwrap();
    /// assert_eq!(name.as_ref(), "Ada Lovelace");
    /// assert!(DisplayName::new("   ").is_err());
    /// ```
    pub fn new(name: impl AsRef<str>) -> Result<Self, UserValidationError> {
        let trimmed = name.as_ref().trim();
        if trimmed.is_empty() {
            return Err(UserValidationError::EmptyDisplayName);
        }
        if trimmed.chars().count() > DISPLAY_NAME_MAX_CHARS {
            return Err(UserValidationError::DisplayNameTooLong {
                max: DISPLAY_NAME_MAX_CHARS,
            });
        }
        Ok(Self(trimmed.to_owned()))
    }
}

impl AsRef<str> for DisplayName {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for DisplayName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_ref())
    }
}

impl From<DisplayName> for String {
    fn from(value: DisplayName) -> Self {
        value.0
    }
}

impl TryFrom<String> for DisplayName {
    type Error = UserValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Salted one-way password hash in PHC string format.
#[derive(Clone, PartialEq, Eq)]
pub struct PasswordHash(String);

impl PasswordHash {
    /// Wrap an encoded hash produced by a password hasher.
    pub fn new(encoded: impl Into<String>) -> Result<Self, UserValidationError> {
        let encoded = encoded.into();
        if encoded.trim().is_empty() {
            return Err(UserValidationError::EmptyPasswordHash);
        }
        Ok(Self(encoded))
    }
}

impl AsRef<str> for PasswordHash {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Debug for PasswordHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PasswordHash(..)")
    }
}

/// Registered account.
///
/// ## Invariants
/// - `email` is unique across the user repository.
/// - `activation_token` is only present while `active` is false.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    id: UserId,
    email: Email,
    display_name: DisplayName,
    password_hash: PasswordHash,
    role: Role,
    active: bool,
    created_at: DateTime<Utc>,
    last_access_at: DateTime<Utc>,
    activation_token: Option<String>,
    reset_token: Option<String>,
}

impl User {
    /// Name of the uniqueness index over email addresses.
    pub const EMAIL_INDEX: &'static str = "email";

    /// Build a new, not yet stored account.
    ///
    /// When `activation_token` is provided the account starts inactive.
    pub fn new(
        email: Email,
        display_name: DisplayName,
        password_hash: PasswordHash,
        role: Role,
        now: DateTime<Utc>,
        activation_token: Option<String>,
    ) -> Self {
        Self {
            id: UserId::PENDING,
            email,
            display_name,
            password_hash,
            role,
            active: activation_token.is_none(),
            created_at: now,
            last_access_at: now,
            activation_token,
            reset_token: None,
        }
    }

    /// Stable identifier.
    pub fn id(&self) -> UserId {
        self.id
    }

    /// Unique email address.
    pub fn email(&self) -> &Email {
        &self.email
    }

    /// Name shown for the account.
    pub fn display_name(&self) -> &DisplayName {
        &self.display_name
    }

    /// Stored password hash.
    pub fn password_hash(&self) -> &PasswordHash {
        &self.password_hash
    }

    /// Role used when issuing access tokens.
    pub fn role(&self) -> Role {
        self.role
    }

    /// Whether the account may log in.
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Creation timestamp.
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Timestamp of the last successful login.
    pub fn last_access_at(&self) -> DateTime<Utc> {
        self.last_access_at
    }

    /// Pending activation token, if the account awaits activation.
    pub fn activation_token(&self) -> Option<&str> {
        self.activation_token.as_deref()
    }

    /// Outstanding password reset token.
    pub fn reset_token(&self) -> Option<&str> {
        self.reset_token.as_deref()
    }

    /// Record a successful login.
    pub fn record_access(&mut self, now: DateTime<Utc>) {
        self.last_access_at = now;
    }

    /// Mark the account active and discard the activation token.
    pub fn activate(&mut self) {
        self.active = true;
        self.activation_token = None;
    }

    /// Prevent further logins and token refreshes.
    pub fn deactivate(&mut self) {
        self.active = false;
    }

    /// Replace the password hash, invalidating any pending reset token.
    pub fn set_password_hash(&mut self, password_hash: PasswordHash) {
        self.password_hash = password_hash;
        self.reset_token = None;
    }

    /// Store a freshly generated reset token.
    pub fn set_reset_token(&mut self, token: String) {
        self.reset_token = Some(token);
    }

    /// Change the unique email address.
    pub fn set_email(&mut self, email: Email) {
        self.email = email;
    }

    /// Change the name shown for the account.
    pub fn set_display_name(&mut self, display_name: DisplayName) {
        self.display_name = display_name;
    }

    /// Change the role; takes effect at the next token issuance.
    pub fn set_role(&mut self, role: Role) {
        self.role = role;
    }

    /// Public projection without credentials or tokens.
    pub fn to_public(&self) -> PublicUser {
        PublicUser {
            id: self.id,
            email: self.email.clone(),
            display_name: self.display_name.clone(),
            role: self.role,
            active: self.active,
            created_at: self.created_at,
            last_access_at: self.last_access_at,
        }
    }
}

impl Entity for User {
    type Id = UserId;

    fn id(&self) -> UserId {
        self.id
    }

    fn with_id(mut self, id: UserId) -> Self {
        self.id = id;
        self
    }

    fn unique_keys(&self) -> Vec<UniqueKey> {
        vec![UniqueKey::new(Self::EMAIL_INDEX, self.email.as_ref())]
    }
}

/// Account data safe to return to callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicUser {
    /// Stable identifier.
    pub id: UserId,
    /// Email address.
    pub email: Email,
    /// Name shown for the account.
    pub display_name: DisplayName,
    /// Current role.
    pub role: Role,
    /// Whether the account is active.
    pub active: bool,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last successful login.
    pub last_access_at: DateTime<Utc>,
}
