//! HTTP rendering of domain errors.
//!
//! Status codes follow the error code. Internal failures are logged and
//! replaced by a generic body; `401` responses carry a bearer challenge that
//! names `invalid_token` when a presented token was rejected.

use actix_web::http::StatusCode;
use actix_web::http::header::WWW_AUTHENTICATE;
use actix_web::{HttpResponse, ResponseError};
use tracing::error;

use crate::domain::{Error, ErrorCode};

/// Result alias for handlers that fail with a domain [`Error`].
pub type ApiResult<T> = Result<T, Error>;

const REDACTED_MESSAGE: &str = "Internal server error";

impl From<ErrorCode> for StatusCode {
    fn from(code: ErrorCode) -> Self {
        match code {
            ErrorCode::InvalidRequest => Self::BAD_REQUEST,
            ErrorCode::Unauthorized => Self::UNAUTHORIZED,
            ErrorCode::Forbidden => Self::FORBIDDEN,
            ErrorCode::NotFound => Self::NOT_FOUND,
            ErrorCode::Conflict => Self::CONFLICT,
            ErrorCode::InternalError => Self::INTERNAL_SERVER_ERROR,
        }
    }
}

fn bearer_challenge(err: &Error) -> &'static str {
    let token_rejected = err
        .details()
        .is_some_and(|details| details.contains_key("reason"));
    if token_rejected {
        r#"Bearer error="invalid_token""#
    } else {
        "Bearer"
    }
}

fn public_body(err: &Error) -> Error {
    match err.code() {
        ErrorCode::InternalError => {
            error!(message = err.message(), "internal error rendered as 500");
            Error::internal(REDACTED_MESSAGE)
        }
        _ => err.clone(),
    }
}

impl ResponseError for Error {
    fn status_code(&self) -> StatusCode {
        self.code().into()
    }

    fn error_response(&self) -> HttpResponse {
        let mut response = HttpResponse::build(self.status_code());
        if self.code() == ErrorCode::Unauthorized {
            response.insert_header((WWW_AUTHENTICATE, bearer_challenge(self)));
        }
        response.json(public_body(self))
    }
}

impl From<actix_web::Error> for Error {
    fn from(err: actix_web::Error) -> Self {
        error!(error = %err, "actix error promoted to domain error");
        Self::internal(REDACTED_MESSAGE)
    }
}
