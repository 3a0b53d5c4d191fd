//! Bearer token issuance and verification.
//!
//! Access tokens are short-lived and carry the caller's role; refresh tokens
//! are long-lived, carry no role, and are signed with a separate key so one
//! class can never be replayed as the other. Verification is a pure function
//! of the token, the key, and the injected clock.
//!
//! Refresh tokens are not tracked server-side: a leaked refresh token stays
//! usable until it expires.

mod claims;
mod codec;
mod keys;

use std::sync::Arc;

use chrono::{DateTime, TimeDelta, Utc};
use mockable::Clock;
use serde::Serialize;
use tracing::debug;

use self::claims::{AccessClaims, RefreshClaims};
use super::policy::Role;
use super::user::{Email, UserId};

pub use self::keys::{GENERATED_KEY_LEN, KeyError, SigningKey, TokenKeys};

/// Default issuer claim.
pub const DEFAULT_ISSUER: &str = "gatehouse";

/// Failures raised while issuing or verifying tokens.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    /// Encoding or keying failed while signing.
    #[error("token signing failed: {reason}")]
    Signing { reason: String },
    /// The token's `exp` has been reached.
    #[error("token has expired")]
    Expired,
    /// The token's `nbf` lies in the future.
    #[error("token is not valid yet")]
    NotYetValid,
    /// Structure, encoding, claims, or issuer were wrong.
    #[error("token is malformed: {reason}")]
    Malformed { reason: String },
    /// The signature or declared algorithm did not match.
    #[error("token signature does not match")]
    SignatureMismatch,
}

impl TokenError {
    pub(crate) fn signing(reason: impl Into<String>) -> Self {
        Self::Signing {
            reason: reason.into(),
        }
    }

    pub(crate) fn malformed(reason: impl Into<String>) -> Self {
        Self::Malformed {
            reason: reason.into(),
        }
    }
}

/// Token lifetimes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenLifetimes {
    /// Access token lifetime.
    pub access: TimeDelta,
    /// Refresh token lifetime.
    pub refresh: TimeDelta,
}

impl Default for TokenLifetimes {
    fn default() -> Self {
        Self {
            access: TimeDelta::hours(24),
            refresh: TimeDelta::days(30),
        }
    }
}

/// Verified identity of an access token holder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    subject_id: UserId,
    email: Email,
    role: Role,
    issued_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
}

impl Principal {
    /// Account the token was issued for.
    pub fn subject_id(&self) -> UserId {
        self.subject_id
    }

    /// Email at issuance time.
    pub fn email(&self) -> &Email {
        &self.email
    }

    /// Role at issuance time.
    pub fn role(&self) -> Role {
        self.role
    }

    /// Issue timestamp.
    pub fn issued_at(&self) -> DateTime<Utc> {
        self.issued_at
    }

    /// Expiry timestamp.
    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }
}

/// Identity recovered from a refresh token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshIdentity {
    /// Account the token was issued for.
    pub subject_id: UserId,
    /// Email at issuance time.
    pub email: Email,
    /// Expiry timestamp.
    pub expires_at: DateTime<Utc>,
}

/// Current account data used to mint a fresh pair on refresh.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenSubject {
    pub id: UserId,
    pub email: Email,
    pub role: Role,
}

/// Access and refresh tokens issued together.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    pub access_expires_at: DateTime<Utc>,
    pub refresh_expires_at: DateTime<Utc>,
}

/// Issues and verifies HS256 bearer tokens.
///
/// # Examples
/// ```
/// use std::sync::Arc;
///
/// use gatehouse::domain::token::{TokenKeys, TokenLifetimes, TokenService};
/// use gatehouse::domain::{Email, Role, UserId};
/// use mockable::DefaultClock;
///
/// let service = TokenService::new(
///     TokenKeys::generate(),
///     TokenLifetimes::default(),
///     "gatehouse",
///     Arc::new(DefaultClock),
/// );
/// let email = Email::new("a@x.com").unwrap();
/// let token = service.issue(UserId::new(1), &email, Role::User).unwrap();
/// let principal = service.verify_access(&token).unwrap();
/// assert_eq!(principal.role(), Role::User);
/// assert!(service.verify_refresh(&token).is_err());
/// ```
#[derive(Clone)]
pub struct TokenService {
    keys: TokenKeys,
    lifetimes: TokenLifetimes,
    issuer: String,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for TokenService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenService")
            .field("keys", &self.keys)
            .field("lifetimes", &self.lifetimes)
            .field("issuer", &self.issuer)
            .finish_non_exhaustive()
    }
}

impl TokenService {
    /// Build a service from keys, lifetimes, issuer, and clock.
    pub fn new(
        keys: TokenKeys,
        lifetimes: TokenLifetimes,
        issuer: impl Into<String>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            keys,
            lifetimes,
            issuer: issuer.into(),
            clock,
        }
    }

    /// Configured lifetimes.
    pub fn lifetimes(&self) -> TokenLifetimes {
        self.lifetimes
    }

    /// Configured issuer claim.
    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    /// Issue an access token.
    pub fn issue(&self, subject: UserId, email: &Email, role: Role) -> Result<String, TokenError> {
        self.issue_access_at(subject, email, role, self.clock.utc())
            .map(|(token, _)| token)
    }

    /// Issue a refresh token.
    pub fn issue_refresh(&self, subject: UserId, email: &Email) -> Result<String, TokenError> {
        self.issue_refresh_at(subject, email, self.clock.utc())
            .map(|(token, _)| token)
    }

    /// Issue an access and refresh token stamped with the same instant.
    pub fn issue_pair(
        &self,
        subject: UserId,
        email: &Email,
        role: Role,
    ) -> Result<TokenPair, TokenError> {
        let now = self.clock.utc();
        let (access_token, access_expires_at) = self.issue_access_at(subject, email, role, now)?;
        let (refresh_token, refresh_expires_at) = self.issue_refresh_at(subject, email, now)?;
        Ok(TokenPair {
            access_token,
            refresh_token,
            access_expires_at,
            refresh_expires_at,
        })
    }

    /// Verify an access token and return its principal.
    pub fn verify_access(&self, token: &str) -> Result<Principal, TokenError> {
        let claims: AccessClaims = codec::decode(token, self.keys.access())?;
        let now = self.clock.utc().timestamp();
        if now < claims.nbf {
            return Err(TokenError::NotYetValid);
        }
        check_expiry(now, claims.exp)?;
        if claims.iss != self.issuer {
            debug!(issuer = %claims.iss, "access token from unexpected issuer");
            return Err(TokenError::malformed("unexpected issuer"));
        }

        Ok(Principal {
            subject_id: UserId::new(claims.subject_id),
            email: parse_email(&claims.email)?,
            role: Role::parse(&claims.role),
            issued_at: timestamp(claims.iat)?,
            expires_at: timestamp(claims.exp)?,
        })
    }

    /// Verify a refresh token and return the identity it names.
    pub fn verify_refresh(&self, token: &str) -> Result<RefreshIdentity, TokenError> {
        let claims: RefreshClaims = codec::decode(token, self.keys.refresh())?;
        check_expiry(self.clock.utc().timestamp(), claims.exp)?;
        Ok(RefreshIdentity {
            subject_id: UserId::new(claims.subject_id),
            email: parse_email(&claims.email)?,
            expires_at: timestamp(claims.exp)?,
        })
    }

    /// Verify a refresh token, resolve the account's current state, and
    /// rotate both tokens.
    ///
    /// `resolve` reads the live account so role changes apply immediately;
    /// it should fail when the account is gone or disabled.
    pub fn refresh<F, E>(&self, refresh_token: &str, resolve: F) -> Result<TokenPair, E>
    where
        F: FnOnce(&RefreshIdentity) -> Result<TokenSubject, E>,
        E: From<TokenError>,
    {
        let identity = self.verify_refresh(refresh_token)?;
        let subject = resolve(&identity)?;
        Ok(self.issue_pair(subject.id, &subject.email, subject.role)?)
    }

    fn issue_access_at(
        &self,
        subject: UserId,
        email: &Email,
        role: Role,
        now: DateTime<Utc>,
    ) -> Result<(String, DateTime<Utc>), TokenError> {
        let expires_at = expiry(now, self.lifetimes.access)?;
        let claims = AccessClaims {
            subject_id: subject.get(),
            email: email.to_string(),
            role: role.as_str().to_owned(),
            exp: expires_at.timestamp(),
            iat: now.timestamp(),
            nbf: now.timestamp(),
            iss: self.issuer.clone(),
            sub: email.to_string(),
        };
        Ok((codec::encode(&claims, self.keys.access())?, expires_at))
    }

    fn issue_refresh_at(
        &self,
        subject: UserId,
        email: &Email,
        now: DateTime<Utc>,
    ) -> Result<(String, DateTime<Utc>), TokenError> {
        let expires_at = expiry(now, self.lifetimes.refresh)?;
        let claims = RefreshClaims {
            subject_id: subject.get(),
            email: email.to_string(),
            exp: expires_at.timestamp(),
            iat: now.timestamp(),
        };
        Ok((codec::encode(&claims, self.keys.refresh())?, expires_at))
    }
}

fn expiry(now: DateTime<Utc>, lifetime: TimeDelta) -> Result<DateTime<Utc>, TokenError> {
    now.checked_add_signed(lifetime)
        .ok_or_else(|| TokenError::signing("token lifetime overflows the calendar"))
}

fn check_expiry(now: i64, exp: i64) -> Result<(), TokenError> {
    if now >= exp {
        return Err(TokenError::Expired);
    }
    Ok(())
}

fn parse_email(raw: &str) -> Result<Email, TokenError> {
    Email::new(raw).map_err(|err| TokenError::malformed(format!("email claim: {err}")))
}

fn timestamp(secs: i64) -> Result<DateTime<Utc>, TokenError> {
    DateTime::from_timestamp(secs, 0)
        .ok_or_else(|| TokenError::malformed("timestamp claim out of range"))
}
