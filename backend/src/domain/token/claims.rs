//! Wire claim sets for access and refresh tokens.

use serde::{Deserialize, Serialize};

/// Claims carried by access tokens. `sub` repeats the email.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct AccessClaims {
    pub subject_id: u64,
    pub email: String,
    pub role: String,
    pub exp: i64,
    pub iat: i64,
    pub nbf: i64,
    pub iss: String,
    pub sub: String,
}

/// Claims carried by refresh tokens; roles are re-read on refresh.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub(crate) struct RefreshClaims {
    pub subject_id: u64,
    pub email: String,
    pub exp: i64,
    pub iat: i64,
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    #[rstest]
    fn access_claims_use_wire_names() {
        let claims = AccessClaims {
            subject_id: 3,
            email: "a@x.com".into(),
            role: "user".into(),
            exp: 20,
            iat: 10,
            nbf: 10,
            iss: "gatehouse".into(),
            sub: "a@x.com".into(),
        };
        assert_eq!(
            serde_json::to_value(&claims).expect("serialise"),
            json!({
                "subjectId": 3,
                "email": "a@x.com",
                "role": "user",
                "exp": 20,
                "iat": 10,
                "nbf": 10,
                "iss": "gatehouse",
                "sub": "a@x.com",
            })
        );
    }

    #[rstest]
    fn refresh_claims_reject_access_payloads() {
        let payload = json!({
            "subjectId": 3,
            "email": "a@x.com",
            "role": "admin",
            "exp": 20,
            "iat": 10,
        });
        assert!(serde_json::from_value::<RefreshClaims>(payload).is_err());
    }
}
