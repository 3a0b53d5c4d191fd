//! Token lifetimes observed through the public API with a controlled clock.

use std::sync::Arc;

use chrono::TimeDelta;
use gatehouse::domain::token::{DEFAULT_ISSUER, TokenKeys, TokenLifetimes, TokenSubject};
use gatehouse::domain::{Email, Role, TokenError, TokenService, UserId};
use gatehouse::test_support::clock::MutableClock;
use rstest::{fixture, rstest};

const START: i64 = 1_700_000_000;
const ACCESS_SECS: i64 = 900;
const REFRESH_SECS: i64 = 3_600;

struct Tokens {
    clock: Arc<MutableClock>,
    service: TokenService,
    email: Email,
}

#[fixture]
fn tokens() -> Tokens {
    let clock = Arc::new(MutableClock::at_timestamp(START));
    let service = TokenService::new(
        TokenKeys::generate(),
        TokenLifetimes {
            access: TimeDelta::seconds(ACCESS_SECS),
            refresh: TimeDelta::seconds(REFRESH_SECS),
        },
        DEFAULT_ISSUER,
        clock.clone(),
    );
    Tokens {
        clock,
        service,
        email: Email::new("a@x.com").expect("valid email"),
    }
}

#[rstest]
#[case(ACCESS_SECS - 1, true)]
#[case(ACCESS_SECS, false)]
#[case(ACCESS_SECS + 1, false)]
fn access_tokens_expire_at_their_deadline(
    tokens: Tokens,
    #[case] elapsed: i64,
    #[case] accepted: bool,
) {
    let token = tokens
        .service
        .issue(UserId::new(7), &tokens.email, Role::User)
        .expect("issue");
    tokens.clock.advance_seconds(elapsed);

    match tokens.service.verify_access(&token) {
        Ok(principal) => {
            assert!(accepted, "token accepted {elapsed}s after issue");
            assert_eq!(principal.subject_id(), UserId::new(7));
            assert_eq!(principal.role(), Role::User);
        }
        Err(err) => {
            assert!(!accepted, "token rejected {elapsed}s after issue: {err}");
            assert_eq!(err, TokenError::Expired);
        }
    }
}

#[rstest]
fn refresh_outlives_access_and_rotates(tokens: Tokens) {
    let pair = tokens
        .service
        .issue_pair(UserId::new(7), &tokens.email, Role::Editor)
        .expect("issue pair");
    assert_eq!(
        pair.refresh_expires_at - pair.access_expires_at,
        TimeDelta::seconds(REFRESH_SECS - ACCESS_SECS)
    );

    tokens.clock.advance_seconds(ACCESS_SECS);
    assert_eq!(
        tokens.service.verify_access(&pair.access_token),
        Err(TokenError::Expired)
    );

    let rotated = tokens
        .service
        .refresh(&pair.refresh_token, |identity| {
            Ok::<_, TokenError>(TokenSubject {
                id: identity.subject_id,
                email: identity.email.clone(),
                role: Role::Admin,
            })
        })
        .expect("refresh");
    let principal = tokens
        .service
        .verify_access(&rotated.access_token)
        .expect("rotated access token");
    assert_eq!(principal.role(), Role::Admin);

    tokens.clock.advance_seconds(REFRESH_SECS - ACCESS_SECS);
    assert_eq!(
        tokens.service.verify_refresh(&pair.refresh_token).map(|_| ()),
        Err(TokenError::Expired)
    );
    assert!(tokens.service.verify_refresh(&rotated.refresh_token).is_ok());
}

#[rstest]
fn tokens_from_other_keys_are_rejected(tokens: Tokens) {
    let foreign = TokenService::new(
        TokenKeys::generate(),
        TokenLifetimes::default(),
        DEFAULT_ISSUER,
        tokens.clock.clone(),
    );
    let token = foreign
        .issue(UserId::new(1), &tokens.email, Role::Admin)
        .expect("issue");
    assert_eq!(
        tokens.service.verify_access(&token),
        Err(TokenError::SignatureMismatch)
    );
}
