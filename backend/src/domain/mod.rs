//! Domain primitives, policy, and access-controlled services.
//!
//! Purpose: Define strongly typed domain entities and the services an
//! inbound adapter calls. Keep types immutable and document invariants and
//! serialisation contracts (serde) in each type's Rustdoc.
//!
//! Public surface:
//! - Error (alias to `error::Error`) - error payload returned by services.
//! - ErrorCode (alias to `error::ErrorCode`) - stable error identifier.
//! - User, Resource - stored entities.
//! - AccountService, ResourceService - the access-controlled facade.

pub mod auth;
pub mod error;
pub mod policy;
pub mod ports;
pub mod resource;
pub mod token;
pub mod user;

mod account_service;
mod resource_service;
mod service_errors;

pub use self::account_service::{AccountService, Registered, Session};
pub use self::auth::{
    AuthValidationError, LoginCredentials, NewPassword, PASSWORD_MIN_CHARS, Registration,
};
pub use self::error::{Error, ErrorCode, ErrorValidationError};
pub use self::policy::{AccessLevel, ResourceView, Role};
pub use self::resource::{
    PublicResource, Resource, ResourceDraft, ResourceId, ResourcePatch, ResourceTitle,
    ResourceValidationError,
};
pub use self::resource_service::{
    DEFAULT_PAGE_LIMIT, MAX_PAGE_LIMIT, ResourceFilter, ResourcePage, ResourceService,
};
pub use self::token::{Principal, TokenError, TokenPair, TokenService};
pub use self::user::{
    DisplayName, Email, PasswordHash, PublicUser, User, UserId, UserValidationError,
};

/// Convenient API result alias.
///
/// # Examples
/// ```
/// use gatehouse::domain::{ApiResult, Error};
///
/// fn handler() -> ApiResult<()> {
///     Err(Error::forbidden("nope"))
/// }
/// assert!(handler().is_err());
/// ```
pub type ApiResult<T> = Result<T, Error>;
