//! Runtime configuration for token issuance.
//!
//! Non-secret settings load through OrthoConfig (CLI, environment, files);
//! signing keys load from key files named in the environment.

mod keys;
mod settings;

pub use keys::{BuildMode, KEY_MIN_LEN, KeyConfigError, token_keys_from_env};
pub use settings::TokenSettings;
