//! Token settings loaded via OrthoConfig.

use std::sync::Arc;

use chrono::TimeDelta;
use mockable::Clock;
use ortho_config::OrthoConfig;
use serde::Deserialize;

use crate::domain::token::{DEFAULT_ISSUER, TokenKeys, TokenLifetimes, TokenService};

const DEFAULT_ACCESS_TTL_SECS: u64 = 24 * 60 * 60;
const DEFAULT_REFRESH_TTL_SECS: u64 = 30 * 24 * 60 * 60;

/// Configuration values controlling token issuance and registration.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "TOKEN")]
pub struct TokenSettings {
    /// Access token lifetime in seconds.
    pub access_ttl_secs: Option<u64>,
    /// Refresh token lifetime in seconds.
    pub refresh_ttl_secs: Option<u64>,
    /// Issuer claim stamped on access tokens.
    pub issuer: Option<String>,
    /// Start self-registered accounts inactive until activated.
    #[ortho_config(default = false)]
    pub require_activation: bool,
}

fn seconds(secs: u64) -> TimeDelta {
    i64::try_from(secs)
        .ok()
        .and_then(TimeDelta::try_seconds)
        .unwrap_or(TimeDelta::MAX)
}

impl TokenSettings {
    /// Configured access lifetime in seconds, falling back to one day.
    pub fn access_ttl_secs(&self) -> u64 {
        self.access_ttl_secs.unwrap_or(DEFAULT_ACCESS_TTL_SECS)
    }

    /// Configured refresh lifetime in seconds, falling back to thirty days.
    pub fn refresh_ttl_secs(&self) -> u64 {
        self.refresh_ttl_secs.unwrap_or(DEFAULT_REFRESH_TTL_SECS)
    }

    /// Configured issuer, falling back to the crate default.
    pub fn issuer(&self) -> &str {
        self.issuer.as_deref().unwrap_or(DEFAULT_ISSUER)
    }

    /// Lifetimes for the token service.
    pub fn lifetimes(&self) -> TokenLifetimes {
        TokenLifetimes {
            access: seconds(self.access_ttl_secs()),
            refresh: seconds(self.refresh_ttl_secs()),
        }
    }

    /// Token service using these settings.
    pub fn token_service(&self, keys: TokenKeys, clock: Arc<dyn Clock>) -> TokenService {
        TokenService::new(keys, self.lifetimes(), self.issuer(), clock)
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for token settings parsing.

    use super::*;
    use std::ffi::OsString;

    use env_lock::lock_env;
    use rstest::rstest;

    fn load_from_empty_args() -> TokenSettings {
        TokenSettings::load_from_iter([OsString::from("gatehouse")]).expect("config should load")
    }

    #[rstest]
    fn default_values_are_used_when_missing() {
        let _guard = lock_env([
            ("TOKEN_ACCESS_TTL_SECS", None::<String>),
            ("TOKEN_REFRESH_TTL_SECS", None::<String>),
            ("TOKEN_ISSUER", None::<String>),
            ("TOKEN_REQUIRE_ACTIVATION", None::<String>),
        ]);

        let settings = load_from_empty_args();
        assert!(!settings.require_activation);
        assert_eq!(settings.issuer(), DEFAULT_ISSUER);
        assert_eq!(settings.lifetimes(), TokenLifetimes::default());
    }

    #[rstest]
    fn environment_overrides_are_respected() {
        let _guard = lock_env([
            ("TOKEN_ACCESS_TTL_SECS", Some("900".to_owned())),
            ("TOKEN_REFRESH_TTL_SECS", Some("86400".to_owned())),
            ("TOKEN_ISSUER", Some("tutorial-api".to_owned())),
            ("TOKEN_REQUIRE_ACTIVATION", Some("true".to_owned())),
        ]);

        let settings = load_from_empty_args();
        assert!(settings.require_activation);
        assert_eq!(settings.issuer(), "tutorial-api");
        let lifetimes = settings.lifetimes();
        assert_eq!(lifetimes.access, TimeDelta::minutes(15));
        assert_eq!(lifetimes.refresh, TimeDelta::days(1));
    }

    #[rstest]
    fn oversized_lifetimes_saturate() {
        assert_eq!(seconds(u64::MAX), TimeDelta::MAX);
    }
}
