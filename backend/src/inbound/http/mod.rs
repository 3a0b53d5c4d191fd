//! HTTP inbound adapter.
//!
//! Provides bearer token extraction and the mapping from domain errors to
//! HTTP responses. Routing is left to the embedding application.

pub mod bearer;
pub mod error;

pub use bearer::{BearerPrincipal, bearer_token};
pub use error::ApiResult;
