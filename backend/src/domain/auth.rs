//! Authentication primitives such as login credentials and registrations.
//!
//! Keep inbound payload parsing outside the domain by exposing constructors
//! that validate string inputs before a handler talks to a service.

use std::fmt;

use zeroize::Zeroizing;

use super::user::{DisplayName, Email, UserValidationError};

/// Shortest password accepted when one is chosen or changed.
pub const PASSWORD_MIN_CHARS: usize = 6;

/// Domain error returned when authentication payload values are invalid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthValidationError {
    /// Email was missing or blank once trimmed.
    EmptyEmail,
    /// Email did not look like `local@domain`.
    InvalidEmail,
    /// Password was blank.
    EmptyPassword,
    /// Password was shorter than the policy minimum.
    PasswordTooShort { min: usize },
    /// Display name was blank once trimmed.
    EmptyDisplayName,
    /// Display name exceeded the length limit.
    DisplayNameTooLong { max: usize },
}

impl fmt::Display for AuthValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyEmail => write!(f, "email must not be empty"),
            Self::InvalidEmail => write!(f, "email must look like local@domain"),
            Self::EmptyPassword => write!(f, "password must not be empty"),
            Self::PasswordTooShort { min } => {
                write!(f, "password must contain at least {min} characters")
            }
            Self::EmptyDisplayName => write!(f, "display name must not be empty"),
            Self::DisplayNameTooLong { max } => {
                write!(f, "display name must be at most {max} characters")
            }
        }
    }
}

impl std::error::Error for AuthValidationError {}

impl From<UserValidationError> for AuthValidationError {
    fn from(value: UserValidationError) -> Self {
        match value {
            UserValidationError::EmptyEmail => Self::EmptyEmail,
            UserValidationError::InvalidEmail | UserValidationError::EmptyPasswordHash => {
                Self::InvalidEmail
            }
            UserValidationError::EmptyDisplayName => Self::EmptyDisplayName,
            UserValidationError::DisplayNameTooLong { max } => Self::DisplayNameTooLong { max },
        }
    }
}

/// Validated login credentials used by the account service.
///
/// ## Invariants
/// - `email` is trimmed and must not be empty after trimming.
/// - `password` is required to be non-empty but retains caller-provided
///   whitespace to avoid surprising credential comparisons.
///
/// # Examples
/// ```
/// use gatehouse::domain::LoginCredentials;
///
/// let creds = LoginCredentials::try_from_parts(" a@x.com ", "secret1").unwrap();
/// assert_eq!(creds.email(), "a@x.com");
/// assert_eq!(creds.password(), "secret1");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginCredentials {
    email: String,
    password: Zeroizing<String>,
}

impl LoginCredentials {
    /// Construct credentials from raw email/password inputs.
    pub fn try_from_parts(email: &str, password: &str) -> Result<Self, AuthValidationError> {
        let normalized = email.trim();
        if normalized.is_empty() {
            return Err(AuthValidationError::EmptyEmail);
        }

        if password.is_empty() {
            return Err(AuthValidationError::EmptyPassword);
        }

        Ok(Self {
            email: normalized.to_owned(),
            password: Zeroizing::new(password.to_owned()),
        })
    }

    /// Email string used for the index lookup.
    pub fn email(&self) -> &str {
        self.email.as_str()
    }

    /// Password string provided by the caller.
    pub fn password(&self) -> &str {
        self.password.as_str()
    }
}

/// A password being set, checked against the length policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPassword(Zeroizing<String>);

impl NewPassword {
    /// Validate a password chosen by the caller.
    pub fn new(password: &str) -> Result<Self, AuthValidationError> {
        if password.is_empty() {
            return Err(AuthValidationError::EmptyPassword);
        }
        if password.chars().count() < PASSWORD_MIN_CHARS {
            return Err(AuthValidationError::PasswordTooShort {
                min: PASSWORD_MIN_CHARS,
            });
        }
        Ok(Self(Zeroizing::new(password.to_owned())))
    }

    /// Plaintext, for handing to the hasher only.
    pub fn expose(&self) -> &str {
        self.0.as_str()
    }
}

/// Self-service signup payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
    email: Email,
    password: NewPassword,
    display_name: DisplayName,
}

impl Registration {
    /// Validate raw signup inputs. Every field is required.
    pub fn try_from_parts(
        email: &str,
        password: &str,
        display_name: &str,
    ) -> Result<Self, AuthValidationError> {
        let email = Email::new(email)?;
        let password = NewPassword::new(password)?;
        let display_name = DisplayName::new(display_name)?;
        Ok(Self {
            email,
            password,
            display_name,
        })
    }

    /// Address the account is registered under.
    pub fn email(&self) -> &Email {
        &self.email
    }

    /// Name shown for the new account.
    pub fn display_name(&self) -> &DisplayName {
        &self.display_name
    }

    /// Chosen password.
    pub fn password(&self) -> &NewPassword {
        &self.password
    }
}
