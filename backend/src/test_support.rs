//! Test utilities for the gatehouse crate.
//!
//! This module provides shared helpers for both unit tests (in `src/`) and
//! integration tests (in `tests/`). It is only compiled when running tests or
//! with the `test-support` feature.

pub mod clock {
    //! Controllable clock for expiry and timestamp assertions.

    use chrono::{DateTime, Local, TimeDelta, Utc};
    use mockable::Clock;
    use parking_lot::Mutex;

    /// Clock whose current instant is set and advanced by the test.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use chrono::DateTime;
    /// use gatehouse::test_support::clock::MutableClock;
    /// use mockable::Clock;
    ///
    /// let clock = MutableClock::at_timestamp(1_000);
    /// clock.advance_seconds(5);
    /// assert_eq!(clock.utc().timestamp(), 1_005);
    /// ```
    #[derive(Debug)]
    pub struct MutableClock(Mutex<DateTime<Utc>>);

    impl MutableClock {
        pub fn new(now: DateTime<Utc>) -> Self {
            Self(Mutex::new(now))
        }

        /// Start at a Unix timestamp in seconds.
        pub fn at_timestamp(secs: i64) -> Self {
            match DateTime::from_timestamp(secs, 0) {
                Some(now) => Self::new(now),
                None => panic!("timestamp out of range: {secs}"),
            }
        }

        pub fn advance_seconds(&self, seconds: i64) {
            *self.0.lock() += TimeDelta::seconds(seconds);
        }

        pub fn set(&self, now: DateTime<Utc>) {
            *self.0.lock() = now;
        }
    }

    impl Clock for MutableClock {
        fn local(&self) -> DateTime<Local> {
            self.utc().with_timezone(&Local)
        }

        fn utc(&self) -> DateTime<Utc> {
            *self.0.lock()
        }
    }

}

pub mod passwords {
    //! Fast password hasher for tests that do not exercise Argon2.

    use crate::domain::PasswordHash;
    use crate::domain::ports::{PasswordHashError, PasswordHasher};

    const PREFIX: &str = "plain$";

    /// Stores passwords with a fixed prefix instead of hashing them.
    ///
    /// Never use outside tests.
    #[derive(Debug, Clone, Copy, Default)]
    pub struct PlaintextPasswordHasher;

    impl PasswordHasher for PlaintextPasswordHasher {
        fn hash(&self, plaintext: &str) -> Result<PasswordHash, PasswordHashError> {
            PasswordHash::new(format!("{PREFIX}{plaintext}"))
                .map_err(|err| PasswordHashError::hash(err.to_string()))
        }

        fn verify(&self, hash: &PasswordHash, plaintext: &str) -> Result<bool, PasswordHashError> {
            let Some(stored) = hash.as_ref().strip_prefix(PREFIX) else {
                return Err(PasswordHashError::malformed("missing plaintext prefix"));
            };
            Ok(stored == plaintext)
        }
    }
}
