//! Translation of component errors into the domain [`Error`].
//!
//! Services call these helpers at their boundary so adapters only ever see
//! [`Error`]. Internal failures are logged here and carry a generic message.

use tracing::error;

use super::Error;
use super::auth::AuthValidationError;
use super::ports::{PasswordHashError, RepositoryError};
use super::token::TokenError;

pub(crate) fn map_repository_error(err: RepositoryError) -> Error {
    match err {
        RepositoryError::NotFound { key } => Error::not_found(format!("{key} was not found")),
        RepositoryError::Conflict { index, key } => {
            Error::conflict(format!("{index} '{key}' is already taken"))
                .with_detail("index", index)
        }
        RepositoryError::Backend { message } => {
            error!(%message, "repository backend failure");
            Error::internal("storage failure")
        }
    }
}

pub(crate) fn map_hash_error(err: PasswordHashError) -> Error {
    error!(kind = err.kind(), error = %err, "password hashing failure");
    Error::internal("credential processing failure")
}

pub(crate) fn map_validation_error(err: AuthValidationError) -> Error {
    Error::invalid_request(err.to_string())
}

impl From<TokenError> for Error {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Signing { reason } => {
                error!(%reason, "token signing failure");
                Error::internal("token issuance failure")
            }
            TokenError::Expired => Error::unauthorized("token has expired")
                .with_detail("reason", "expired"),
            TokenError::NotYetValid => Error::unauthorized("token is not valid yet")
                .with_detail("reason", "not_yet_valid"),
            TokenError::Malformed { .. } => Error::unauthorized("token is malformed")
                .with_detail("reason", "malformed"),
            TokenError::SignatureMismatch => Error::unauthorized("token signature is invalid")
                .with_detail("reason", "signature_mismatch"),
        }
    }
}
