//! HMAC signing keys for the two token classes.

use std::fmt;

use rand::RngCore;
use rand::rngs::OsRng;
use sha2::{Digest, Sha256};
use zeroize::Zeroizing;

/// Length of generated keys in bytes.
pub const GENERATED_KEY_LEN: usize = 64;

/// Length of the fingerprint in bytes before hex encoding.
const FINGERPRINT_BYTES: usize = 8;

/// Errors raised when assembling signing keys.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum KeyError {
    /// Key material was empty.
    #[error("signing key must not be empty")]
    Empty,
    /// Access and refresh tokens must not share a key.
    #[error("access and refresh signing keys must differ")]
    Identical,
}

/// Secret HMAC key material, wiped from memory on drop.
#[derive(Clone)]
pub struct SigningKey(Zeroizing<Vec<u8>>);

impl SigningKey {
    /// Wrap caller-provided key bytes.
    pub fn new(bytes: Vec<u8>) -> Result<Self, KeyError> {
        let bytes = Zeroizing::new(bytes);
        if bytes.is_empty() {
            return Err(KeyError::Empty);
        }
        Ok(Self(bytes))
    }

    /// Generate a random key from the operating system RNG.
    pub fn generate() -> Self {
        let mut bytes = Zeroizing::new(vec![0_u8; GENERATED_KEY_LEN]);
        OsRng.fill_bytes(bytes.as_mut_slice());
        Self(bytes)
    }

    /// Truncated SHA-256 fingerprint for logs; never exposes the key.
    ///
    /// # Examples
    /// ```
    /// use gatehouse::domain::token::SigningKey;
    ///
    /// let key = SigningKey::new(vec![b'k'; 32]).unwrap();
    /// let fp = key.fingerprint();
    /// assert_eq!(fp.len(), 16);
    /// assert!(fp.chars().all(|c| c.is_ascii_hexdigit()));
    /// ```
    #[must_use]
    pub fn fingerprint(&self) -> String {
        let digest = Sha256::digest(self.0.as_slice());
        hex::encode(&digest[..FINGERPRINT_BYTES])
    }

    pub(crate) fn as_bytes(&self) -> &[u8] {
        self.0.as_slice()
    }
}

impl PartialEq for SigningKey {
    fn eq(&self, other: &Self) -> bool {
        self.0.as_slice() == other.0.as_slice()
    }
}

impl Eq for SigningKey {}

impl fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SigningKey({})", self.fingerprint())
    }
}

/// Key pair: one key per token class.
#[derive(Debug, Clone)]
pub struct TokenKeys {
    access: SigningKey,
    refresh: SigningKey,
}

impl TokenKeys {
    /// Pair an access key with a refresh key; the two must differ.
    pub fn new(access: SigningKey, refresh: SigningKey) -> Result<Self, KeyError> {
        if access == refresh {
            return Err(KeyError::Identical);
        }
        Ok(Self { access, refresh })
    }

    /// Random pair for development and tests.
    pub fn generate() -> Self {
        Self {
            access: SigningKey::generate(),
            refresh: SigningKey::generate(),
        }
    }

    /// Key signing access tokens.
    pub fn access(&self) -> &SigningKey {
        &self.access
    }

    /// Key signing refresh tokens.
    pub fn refresh(&self) -> &SigningKey {
        &self.refresh
    }
}
