//! Bearer token extraction.
//!
//! Turns an `Authorization: Bearer <token>` header into a verified
//! [`Principal`] so handlers never parse headers or call the token service
//! themselves. Missing headers, other schemes, and empty tokens are rejected
//! before any repository access.

use std::future::{Ready, ready};
use std::ops::Deref;

use actix_web::dev::Payload;
use actix_web::http::header::{AUTHORIZATION, HeaderMap};
use actix_web::{FromRequest, HttpRequest, web};
use tracing::{error, warn};

use crate::domain::{Error, Principal, TokenService};

const SCHEME: &str = "Bearer";

/// Extract the raw token from an `Authorization` header.
///
/// The scheme is matched case-insensitively; surrounding whitespace around
/// the token is ignored.
///
/// # Examples
/// ```
/// use actix_web::http::header::{AUTHORIZATION, HeaderMap, HeaderValue};
/// use gatehouse::inbound::http::bearer_token;
///
/// let mut headers = HeaderMap::new();
/// headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer abc.def.ghi"));
/// assert_eq!(bearer_token(&headers).unwrap(), "abc.def.ghi");
/// ```
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, Error> {
    let value = headers
        .get(AUTHORIZATION)
        .ok_or_else(|| Error::unauthorized("authorization header is missing"))?;
    let value = value
        .to_str()
        .map_err(|_| Error::unauthorized("authorization header is not valid ASCII"))?;
    let (scheme, token) = value
        .trim()
        .split_once(' ')
        .ok_or_else(|| Error::unauthorized("authorization header must use the Bearer scheme"))?;
    if !scheme.eq_ignore_ascii_case(SCHEME) {
        return Err(Error::unauthorized(
            "authorization header must use the Bearer scheme",
        ));
    }
    let token = token.trim();
    if token.is_empty() {
        return Err(Error::unauthorized("bearer token is empty"));
    }
    Ok(token)
}

/// Verified caller extracted from the bearer header.
///
/// Requires the [`TokenService`] to be registered as `web::Data`.
#[derive(Debug, Clone)]
pub struct BearerPrincipal(Principal);

impl BearerPrincipal {
    /// Take the verified principal.
    pub fn into_inner(self) -> Principal {
        self.0
    }
}

impl Deref for BearerPrincipal {
    type Target = Principal;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

fn authenticate(req: &HttpRequest) -> Result<BearerPrincipal, Error> {
    let token = bearer_token(req.headers())?;
    let Some(tokens) = req.app_data::<web::Data<TokenService>>() else {
        error!("token service missing from application data");
        return Err(Error::internal("token service is not configured"));
    };
    tokens.verify_access(token).map(BearerPrincipal).map_err(|err| {
        warn!(error = %err, path = req.path(), "bearer token rejected");
        Error::from(err)
    })
}

impl FromRequest for BearerPrincipal {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(authenticate(req))
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use std::sync::Arc;

    use actix_web::http::StatusCode;
    use actix_web::http::header::HeaderValue;
    use actix_web::{App, HttpResponse, test as actix_test};
    use rstest::rstest;

    use super::*;
    use crate::domain::token::{DEFAULT_ISSUER, TokenKeys, TokenLifetimes};
    use crate::domain::{Email, ErrorCode, Role, UserId};

    fn headers_with(value: &'static str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static(value));
        headers
    }

    #[rstest]
    #[case("Bearer abc", "abc")]
    #[case("bearer abc", "abc")]
    #[case("Bearer   abc  ", "abc")]
    fn bearer_token_accepts_bearer_scheme(#[case] header: &'static str, #[case] token: &str) {
        assert_eq!(bearer_token(&headers_with(header)).expect("token"), token);
    }

    #[rstest]
    #[case("Basic dXNlcjpwYXNz")]
    #[case("Bearer")]
    #[case("Bearer    ")]
    #[case("Token abc")]
    #[case("")]
    fn bearer_token_rejects_other_values(#[case] header: &'static str) {
        let err = bearer_token(&headers_with(header)).expect_err("rejected");
        assert_eq!(err.code(), ErrorCode::Unauthorized);
    }

    #[rstest]
    fn bearer_token_requires_header() {
        let err = bearer_token(&HeaderMap::new()).expect_err("missing");
        assert_eq!(err.code(), ErrorCode::Unauthorized);
    }

    fn token_service() -> TokenService {
        TokenService::new(
            TokenKeys::generate(),
            TokenLifetimes::default(),
            DEFAULT_ISSUER,
            Arc::new(mockable::DefaultClock),
        )
    }

    async fn whoami(principal: BearerPrincipal) -> HttpResponse {
        HttpResponse::Ok().body(principal.role().as_str())
    }

    #[actix_web::test]
    async fn extractor_yields_verified_principal() {
        let tokens = token_service();
        let email = Email::new("a@x.com").expect("valid email");
        let token = tokens
            .issue(UserId::new(1), &email, Role::Editor)
            .expect("issue");
        let app = actix_test::init_service(
            App::new()
                .app_data(web::Data::new(tokens))
                .route("/me", web::get().to(whoami)),
        )
        .await;

        let req = actix_test::TestRequest::get()
            .uri("/me")
            .insert_header((AUTHORIZATION, format!("Bearer {token}")))
            .to_request();
        let res = actix_test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(actix_test::read_body(res).await, "editor");
    }

    #[actix_web::test]
    async fn extractor_rejects_missing_and_invalid_tokens() {
        let app = actix_test::init_service(
            App::new()
                .app_data(web::Data::new(token_service()))
                .route("/me", web::get().to(whoami)),
        )
        .await;

        let req = actix_test::TestRequest::get().uri("/me").to_request();
        let res = actix_test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

        let req = actix_test::TestRequest::get()
            .uri("/me")
            .insert_header((AUTHORIZATION, "Bearer not.a.token"))
            .to_request();
        let res = actix_test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }

    #[actix_web::test]
    async fn extractor_without_token_service_is_internal_error() {
        let app =
            actix_test::init_service(App::new().route("/me", web::get().to(whoami))).await;
        let req = actix_test::TestRequest::get()
            .uri("/me")
            .insert_header((AUTHORIZATION, "Bearer abc"))
            .to_request();
        let res = actix_test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
