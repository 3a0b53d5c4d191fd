//! Compact HS256 JSON Web Token encoding.
//!
//! Tokens are `base64url(header).base64url(claims).base64url(signature)` with
//! unpadded URL-safe base64. Only HS256 is accepted; any other `alg` value,
//! including `none`, fails as a signature mismatch.

use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use hmac::{Hmac, Mac};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use super::TokenError;
use super::keys::SigningKey;

type HmacSha256 = Hmac<Sha256>;

const ALGORITHM: &str = "HS256";
const TOKEN_TYPE: &str = "JWT";

#[derive(Debug, Serialize, Deserialize)]
struct Header {
    alg: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    typ: Option<String>,
}

fn mac_for(key: &SigningKey) -> Result<HmacSha256, TokenError> {
    HmacSha256::new_from_slice(key.as_bytes()).map_err(|err| TokenError::signing(err.to_string()))
}

/// Serialise `claims` and sign them with `key`.
pub(crate) fn encode<C: Serialize>(claims: &C, key: &SigningKey) -> Result<String, TokenError> {
    let header = Header {
        alg: ALGORITHM.to_owned(),
        typ: Some(TOKEN_TYPE.to_owned()),
    };
    let header_json =
        serde_json::to_vec(&header).map_err(|err| TokenError::signing(err.to_string()))?;
    let claims_json =
        serde_json::to_vec(claims).map_err(|err| TokenError::signing(err.to_string()))?;

    let signing_input = format!(
        "{}.{}",
        URL_SAFE_NO_PAD.encode(header_json),
        URL_SAFE_NO_PAD.encode(claims_json)
    );
    let mut mac = mac_for(key)?;
    mac.update(signing_input.as_bytes());
    let signature = mac.finalize().into_bytes();

    Ok(format!("{signing_input}.{}", URL_SAFE_NO_PAD.encode(signature)))
}

/// Check the signature of `token` against `key` and decode its claims.
///
/// Time-based and issuer checks are left to the caller.
pub(crate) fn decode<C: DeserializeOwned>(token: &str, key: &SigningKey) -> Result<C, TokenError> {
    let mut segments = token.split('.');
    let (Some(header_b64), Some(claims_b64), Some(signature_b64), None) = (
        segments.next(),
        segments.next(),
        segments.next(),
        segments.next(),
    ) else {
        return Err(TokenError::malformed("expected three dot-separated segments"));
    };

    let header_json = URL_SAFE_NO_PAD
        .decode(header_b64)
        .map_err(|_| TokenError::malformed("header is not base64url"))?;
    let header: Header = serde_json::from_slice(&header_json)
        .map_err(|_| TokenError::malformed("header is not a JSON object"))?;
    if header.alg != ALGORITHM {
        return Err(TokenError::SignatureMismatch);
    }

    let signature = URL_SAFE_NO_PAD
        .decode(signature_b64)
        .map_err(|_| TokenError::malformed("signature is not base64url"))?;
    let mut mac = mac_for(key)?;
    mac.update(header_b64.as_bytes());
    mac.update(b".");
    mac.update(claims_b64.as_bytes());
    mac.verify_slice(&signature)
        .map_err(|_| TokenError::SignatureMismatch)?;

    let claims_json = URL_SAFE_NO_PAD
        .decode(claims_b64)
        .map_err(|_| TokenError::malformed("claims are not base64url"))?;
    serde_json::from_slice(&claims_json)
        .map_err(|err| TokenError::malformed(format!("claims are invalid: {err}")))
}
