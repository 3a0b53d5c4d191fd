//! Account lifecycle and authentication service.
//!
//! Every operation here authenticates through the token service or the
//! password hasher before touching the user repository. Credential failures
//! are indistinguishable to the caller: unknown email, inactive account, and
//! wrong password all produce the same `unauthorized` error.

use std::sync::Arc;

use mockable::Clock;
use rand::Rng;
use rand::distributions::Alphanumeric;
use serde::Serialize;
use tracing::{info, warn};

use super::auth::{LoginCredentials, NewPassword, Registration};
use super::ports::{Mutation, PasswordHasher, RepositoryError, UserRepository};
use super::service_errors::{map_hash_error, map_repository_error, map_validation_error};
use super::token::{Principal, TokenPair, TokenService, TokenSubject};
use super::user::{DisplayName, Email, PasswordHash, PublicUser, User, UserId};
use super::{Error, Role};

/// Length of activation and password reset tokens.
const ONE_TIME_TOKEN_LEN: usize = 32;

const INVALID_CREDENTIALS: &str = "invalid credentials";

/// Authenticated session returned by login and refresh.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub user: PublicUser,
    pub tokens: TokenPair,
}

/// Outcome of a registration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Registered {
    pub user: PublicUser,
    /// Present only when accounts require activation; deliver out of band.
    #[serde(skip)]
    pub activation_token: Option<String>,
}

/// Account service implementing registration, login, and account upkeep.
#[derive(Clone)]
pub struct AccountService<U, H> {
    users: Arc<U>,
    hasher: Arc<H>,
    tokens: Arc<TokenService>,
    clock: Arc<dyn Clock>,
    require_activation: bool,
}

impl<U, H> AccountService<U, H> {
    /// Create a service over the given repository, hasher, and token service.
    pub fn new(
        users: Arc<U>,
        hasher: Arc<H>,
        tokens: Arc<TokenService>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            users,
            hasher,
            tokens,
            clock,
            require_activation: false,
        }
    }

    /// Start self-registered accounts inactive until activated.
    #[must_use]
    pub fn with_activation_required(mut self, required: bool) -> Self {
        self.require_activation = required;
        self
    }
}

fn one_time_token() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(ONE_TIME_TOKEN_LEN)
        .map(char::from)
        .collect()
}

fn require_admin(principal: &Principal) -> Result<(), Error> {
    if principal.role() != Role::Admin {
        warn!(user_id = %principal.subject_id(), "admin operation refused");
        return Err(Error::forbidden("administrator role required"));
    }
    Ok(())
}

fn reject_credentials(email: &str, reason: &str) -> Error {
    warn!(%email, %reason, "login rejected");
    Error::unauthorized(INVALID_CREDENTIALS)
}

impl<U, H> AccountService<U, H>
where
    U: UserRepository,
    H: PasswordHasher,
{
    fn hash(&self, password: &NewPassword) -> Result<PasswordHash, Error> {
        self.hasher.hash(password.expose()).map_err(map_hash_error)
    }

    fn insert(&self, user: User) -> Result<User, Error> {
        self.users.create(user).map_err(map_repository_error)
    }

    fn modify(
        &self,
        id: UserId,
        mutation: &mut dyn FnMut(&mut User) -> Mutation,
    ) -> Result<User, Error> {
        self.users.modify(id, mutation).map_err(map_repository_error)
    }

    /// Register a new account with the `user` role.
    pub fn register(&self, registration: &Registration) -> Result<Registered, Error> {
        let password_hash = self.hash(registration.password())?;
        let activation_token = self.require_activation.then(one_time_token);
        let user = User::new(
            registration.email().clone(),
            registration.display_name().clone(),
            password_hash,
            Role::User,
            self.clock.utc(),
            activation_token.clone(),
        );
        let stored = self.insert(user)?;
        info!(user_id = %stored.id(), active = stored.is_active(), "user registered");
        Ok(Registered {
            user: stored.to_public(),
            activation_token,
        })
    }

    /// Create an active account with any role. Administrators only.
    pub fn create_user(
        &self,
        admin: &Principal,
        registration: &Registration,
        role: Role,
    ) -> Result<PublicUser, Error> {
        require_admin(admin)?;
        let password_hash = self.hash(registration.password())?;
        let user = User::new(
            registration.email().clone(),
            registration.display_name().clone(),
            password_hash,
            role,
            self.clock.utc(),
            None,
        );
        let stored = self.insert(user)?;
        info!(user_id = %stored.id(), %role, created_by = %admin.subject_id(), "user created");
        Ok(stored.to_public())
    }

    /// Check credentials, record the access, and issue a token pair.
    pub fn login(&self, credentials: &LoginCredentials) -> Result<Session, Error> {
        let email = credentials.email();
        let user = match self.users.find_by_email(email) {
            Ok(user) => user,
            Err(RepositoryError::NotFound { .. }) => {
                return Err(reject_credentials(email, "unknown email"));
            }
            Err(err) => return Err(map_repository_error(err)),
        };
        if !user.is_active() {
            return Err(reject_credentials(email, "inactive account"));
        }
        let matches = self
            .hasher
            .verify(user.password_hash(), credentials.password())
            .map_err(map_hash_error)?;
        if !matches {
            return Err(reject_credentials(email, "wrong password"));
        }

        let now = self.clock.utc();
        let user = match self.users.modify(user.id(), &mut |user: &mut User| {
            user.record_access(now);
            Mutation::Commit
        }) {
            Ok(user) => user,
            Err(RepositoryError::NotFound { .. }) => {
                return Err(reject_credentials(email, "account removed during login"));
            }
            Err(err) => return Err(map_repository_error(err)),
        };

        let tokens = self.tokens.issue_pair(user.id(), user.email(), user.role())?;
        info!(user_id = %user.id(), "user logged in");
        Ok(Session {
            user: user.to_public(),
            tokens,
        })
    }

    /// Rotate a refresh token into a new pair using the account's current
    /// role.
    pub fn refresh(&self, refresh_token: &str) -> Result<Session, Error> {
        let mut current = None;
        let tokens = self.tokens.refresh(refresh_token, |identity| {
            let user = match self.users.get(identity.subject_id) {
                Ok(user) => user,
                Err(RepositoryError::NotFound { .. }) => {
                    warn!(user_id = %identity.subject_id, "refresh for missing account");
                    return Err(Error::unauthorized(INVALID_CREDENTIALS));
                }
                Err(err) => return Err(map_repository_error(err)),
            };
            if !user.is_active() {
                warn!(user_id = %identity.subject_id, "refresh for inactive account");
                return Err(Error::unauthorized(INVALID_CREDENTIALS));
            }
            let subject = TokenSubject {
                id: user.id(),
                email: user.email().clone(),
                role: user.role(),
            };
            current = Some(user);
            Ok(subject)
        })?;
        let user = current.ok_or_else(|| Error::internal("refresh resolved no account"))?;
        info!(user_id = %user.id(), "tokens refreshed");
        Ok(Session {
            user: user.to_public(),
            tokens,
        })
    }

    /// Verify an access token. Never reads the repository.
    pub fn authenticate(&self, access_token: &str) -> Result<Principal, Error> {
        self.tokens.verify_access(access_token).map_err(|err| {
            warn!(error = %err, "access token rejected");
            Error::from(err)
        })
    }

    /// Activate an account with the token issued at registration.
    pub fn activate(&self, user_id: UserId, activation_token: &str) -> Result<PublicUser, Error> {
        let mut matched = false;
        let user = self.modify(user_id, &mut |user: &mut User| {
            matched = user.activation_token() == Some(activation_token);
            if matched {
                user.activate();
                Mutation::Commit
            } else {
                Mutation::Discard
            }
        })?;
        if !matched {
            warn!(%user_id, "activation token mismatch");
            return Err(Error::invalid_request("activation token is invalid"));
        }
        info!(%user_id, "user activated");
        Ok(user.to_public())
    }

    /// Change the caller's password after re-checking the current one.
    pub fn change_password(
        &self,
        principal: &Principal,
        current_password: &str,
        new_password: &NewPassword,
    ) -> Result<(), Error> {
        let user_id = principal.subject_id();
        let user = self.users.get(user_id).map_err(map_repository_error)?;
        let verified = self
            .hasher
            .verify(user.password_hash(), current_password)
            .map_err(map_hash_error)?;
        if !verified {
            warn!(%user_id, "password change rejected");
            return Err(Error::unauthorized("current password is incorrect"));
        }

        let replacement = self.hash(new_password)?;
        let expected = user.password_hash().clone();
        let mut stale = false;
        self.modify(user_id, &mut |user: &mut User| {
            stale = user.password_hash() != &expected;
            if stale {
                return Mutation::Discard;
            }
            user.set_password_hash(replacement.clone());
            Mutation::Commit
        })?;
        if stale {
            return Err(Error::conflict("password changed concurrently"));
        }
        info!(%user_id, "password changed");
        Ok(())
    }

    /// Issue a password reset token for an active account.
    ///
    /// Returns `None` for unknown or inactive accounts so callers cannot
    /// probe which emails are registered.
    pub fn request_password_reset(&self, email: &str) -> Result<Option<String>, Error> {
        let user = match self.users.find_by_email(email.trim()) {
            Ok(user) if user.is_active() => user,
            Ok(_) | Err(RepositoryError::NotFound { .. }) => return Ok(None),
            Err(err) => return Err(map_repository_error(err)),
        };
        let token = one_time_token();
        self.modify(user.id(), &mut |user: &mut User| {
            user.set_reset_token(token.clone());
            Mutation::Commit
        })?;
        info!(user_id = %user.id(), "password reset requested");
        Ok(Some(token))
    }

    /// Set a new password using a reset token. The token is single use.
    pub fn reset_password(
        &self,
        email: &str,
        reset_token: &str,
        new_password: &NewPassword,
    ) -> Result<(), Error> {
        let invalid = || Error::unauthorized("reset token is invalid");
        let user = match self.users.find_by_email(email.trim()) {
            Ok(user) => user,
            Err(RepositoryError::NotFound { .. }) => return Err(invalid()),
            Err(err) => return Err(map_repository_error(err)),
        };
        let replacement = self.hash(new_password)?;
        let mut matched = false;
        self.modify(user.id(), &mut |user: &mut User| {
            matched = user.reset_token() == Some(reset_token);
            if !matched {
                return Mutation::Discard;
            }
            user.set_password_hash(replacement.clone());
            Mutation::Commit
        })?;
        if !matched {
            warn!(user_id = %user.id(), "password reset token mismatch");
            return Err(invalid());
        }
        info!(user_id = %user.id(), "password reset");
        Ok(())
    }

    /// Move the caller to a new, unused email address.
    pub fn change_email(&self, principal: &Principal, new_email: &str) -> Result<PublicUser, Error> {
        let email =
            Email::new(new_email).map_err(|err| map_validation_error(err.into()))?;
        let user = self.modify(principal.subject_id(), &mut |user: &mut User| {
            user.set_email(email.clone());
            Mutation::Commit
        })?;
        info!(user_id = %user.id(), "email changed");
        Ok(user.to_public())
    }

    /// Rename the caller's account.
    pub fn change_display_name(
        &self,
        principal: &Principal,
        display_name: &str,
    ) -> Result<PublicUser, Error> {
        let display_name =
            DisplayName::new(display_name).map_err(|err| map_validation_error(err.into()))?;
        let user = self.modify(principal.subject_id(), &mut |user: &mut User| {
            user.set_display_name(display_name.clone());
            Mutation::Commit
        })?;
        info!(user_id = %user.id(), "display name changed");
        Ok(user.to_public())
    }

    /// Change another account's role. Administrators only.
    pub fn assign_role(
        &self,
        admin: &Principal,
        user_id: UserId,
        role: Role,
    ) -> Result<PublicUser, Error> {
        require_admin(admin)?;
        let user = self.modify(user_id, &mut |user: &mut User| {
            user.set_role(role);
            Mutation::Commit
        })?;
        info!(%user_id, %role, assigned_by = %admin.subject_id(), "role assigned");
        Ok(user.to_public())
    }

    /// Disable an account. Administrators only.
    pub fn deactivate(&self, admin: &Principal, user_id: UserId) -> Result<PublicUser, Error> {
        require_admin(admin)?;
        let user = self.modify(user_id, &mut |user: &mut User| {
            user.deactivate();
            Mutation::Commit
        })?;
        info!(%user_id, deactivated_by = %admin.subject_id(), "user deactivated");
        Ok(user.to_public())
    }

    /// The caller's own account.
    pub fn profile(&self, principal: &Principal) -> Result<PublicUser, Error> {
        self.users
            .get(principal.subject_id())
            .map(|user| user.to_public())
            .map_err(map_repository_error)
    }
}

#[cfg(test)]
#[path = "account_service_tests.rs"]
mod tests;
