//! Signing key loading and validation.
//!
//! Key material comes from files named by environment variables so secrets
//! stay out of the process environment. Release builds require both files;
//! debug builds fall back to ephemeral random keys with a warning.

use std::path::PathBuf;

use mockable::Env;
use tracing::{info, warn};
use zeroize::Zeroize;

use crate::domain::token::{KeyError, SigningKey, TokenKeys};

pub(crate) const ACCESS_KEY_FILE_ENV: &str = "TOKEN_ACCESS_KEY_FILE";
pub(crate) const REFRESH_KEY_FILE_ENV: &str = "TOKEN_REFRESH_KEY_FILE";
pub(crate) const ALLOW_EPHEMERAL_ENV: &str = "TOKEN_ALLOW_EPHEMERAL";
/// Minimum key length accepted in release builds.
pub const KEY_MIN_LEN: usize = 32;
const BOOL_EXPECTED: &str = "1|0|true|false|yes|no|y|n";

/// Build mode for key configuration validation.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum BuildMode {
    /// Debug builds tolerate missing keys and emit warnings.
    Debug,
    /// Release builds require explicit, valid key files.
    Release,
}

impl BuildMode {
    /// Determine the build mode from `cfg!(debug_assertions)`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use gatehouse::config::BuildMode;
    ///
    /// let mode = BuildMode::from_debug_assertions();
    /// if cfg!(debug_assertions) {
    ///     assert_eq!(mode, BuildMode::Debug);
    /// } else {
    ///     assert_eq!(mode, BuildMode::Release);
    /// }
    /// ```
    #[must_use]
    pub fn from_debug_assertions() -> Self {
        if cfg!(debug_assertions) {
            Self::Debug
        } else {
            Self::Release
        }
    }

    fn is_debug(self) -> bool {
        matches!(self, Self::Debug)
    }
}

/// Errors raised while loading signing keys.
#[derive(thiserror::Error, Debug)]
pub enum KeyConfigError {
    /// A required environment variable is missing.
    #[error("missing required environment variable: {name}")]
    MissingEnv { name: &'static str },
    /// A variable is present but contains an invalid value.
    #[error("invalid value for {name}='{value}'; expected {expected}")]
    InvalidEnv {
        name: &'static str,
        value: String,
        expected: &'static str,
    },
    /// Reading a key file failed.
    #[error("failed to read signing key at {path}: {source}")]
    KeyRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// A key file is too short for release builds.
    #[error("signing key at {path} too short: need >= {min_len} bytes, got {length}")]
    KeyTooShort {
        path: PathBuf,
        length: usize,
        min_len: usize,
    },
    /// Release builds must not allow ephemeral keys.
    #[error("TOKEN_ALLOW_EPHEMERAL must be 0 in release builds")]
    EphemeralNotAllowed,
    /// The keys themselves were rejected.
    #[error(transparent)]
    Keys(#[from] KeyError),
}

/// Load the access and refresh signing keys.
///
/// # Examples
///
/// ```rust
/// use gatehouse::config::{BuildMode, token_keys_from_env};
/// use mockable::MockEnv;
///
/// let mut env = MockEnv::new();
/// env.expect_string().returning(|_| None);
///
/// // Debug builds fall back to random keys.
/// let keys = token_keys_from_env(&env, BuildMode::Debug).unwrap();
/// assert_ne!(keys.access(), keys.refresh());
/// ```
pub fn token_keys_from_env<E: Env>(env: &E, mode: BuildMode) -> Result<TokenKeys, KeyConfigError> {
    let allow_ephemeral = allow_ephemeral_from_env(env, mode)?;
    let access = signing_key_from_env(env, mode, allow_ephemeral, ACCESS_KEY_FILE_ENV)?;
    let refresh = signing_key_from_env(env, mode, allow_ephemeral, REFRESH_KEY_FILE_ENV)?;
    info!(
        access = %access.fingerprint(),
        refresh = %refresh.fingerprint(),
        "token signing keys loaded"
    );
    Ok(TokenKeys::new(access, refresh)?)
}

fn allow_ephemeral_from_env<E: Env>(env: &E, mode: BuildMode) -> Result<bool, KeyConfigError> {
    let Some(value) = env.string(ALLOW_EPHEMERAL_ENV) else {
        return Ok(false);
    };
    match parse_bool(&value) {
        Some(true) if mode.is_debug() => Ok(true),
        Some(true) => Err(KeyConfigError::EphemeralNotAllowed),
        Some(false) => Ok(false),
        None if mode.is_debug() => {
            warn!(value = %value, "invalid TOKEN_ALLOW_EPHEMERAL; defaulting to disabled");
            Ok(false)
        }
        None => Err(KeyConfigError::InvalidEnv {
            name: ALLOW_EPHEMERAL_ENV,
            value,
            expected: BOOL_EXPECTED,
        }),
    }
}

fn ephemeral(name: &'static str, reason: &str) -> SigningKey {
    warn!(variable = name, %reason, "using temporary signing key (dev only)");
    SigningKey::generate()
}

fn signing_key_from_env<E: Env>(
    env: &E,
    mode: BuildMode,
    allow_ephemeral: bool,
    name: &'static str,
) -> Result<SigningKey, KeyConfigError> {
    let tolerant = mode.is_debug() || allow_ephemeral;
    let Some(raw_path) = env.string(name) else {
        if tolerant {
            return Ok(ephemeral(name, "variable not set"));
        }
        return Err(KeyConfigError::MissingEnv { name });
    };
    let path = PathBuf::from(raw_path);

    let mut bytes = match std::fs::read(&path) {
        Ok(bytes) => bytes,
        Err(error) if tolerant => return Ok(ephemeral(name, &error.to_string())),
        Err(error) => {
            return Err(KeyConfigError::KeyRead {
                path,
                source: error,
            });
        }
    };

    let length = bytes.len();
    if length < KEY_MIN_LEN {
        if mode == BuildMode::Release {
            bytes.zeroize();
            return Err(KeyConfigError::KeyTooShort {
                path,
                length,
                min_len: KEY_MIN_LEN,
            });
        }
        warn!(
            path = %path.display(),
            length,
            min_len = KEY_MIN_LEN,
            "signing key shorter than release minimum"
        );
    }
    Ok(SigningKey::new(bytes)?)
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "y" => Some(true),
        "0" | "false" | "no" | "n" => Some(false),
        _ => None,
    }
}
