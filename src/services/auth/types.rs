/*
 * Responsibility
 * - auth core の値型 (Fingerprint / TokenRecord / AuthenticatedPrincipal)
 * - DB schema (repos::*Row) からは切り離しておく
 */
use std::fmt;

use chrono::{DateTime, Utc};

use super::fingerprint::FINGERPRINT_LEN;

/// One-way fingerprint of a raw bearer token.
///
/// This is the only key the token store is ever queried with. It can only be
/// built by [`TokenHasher`](super::fingerprint::TokenHasher) or rehydrated from
/// a stored row, so a raw token can't be passed to the store by accident.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Fingerprint(String);

impl Fingerprint {
    pub(crate) fn from_encoded(value: String) -> Self {
        debug_assert_eq!(value.len(), FINGERPRINT_LEN);
        Self(value)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Validation record bound to a fingerprint.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TokenRecord {
    pub fingerprint: Fingerprint,
    pub user_id: i64,
    pub user_agent: String,
    pub created_at: DateTime<Utc>,
    pub last_used_at: DateTime<Utc>,
}

/// Identity resolved from a presented credential.
///
/// Keeps the raw token (not the fingerprint) so the response side can refresh
/// the cookie or revoke the session. `Debug` never prints it.
#[derive(Clone, PartialEq, Eq)]
pub struct AuthenticatedPrincipal {
    pub user_id: i64,
    pub raw_token: String,
}

impl fmt::Debug for AuthenticatedPrincipal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthenticatedPrincipal")
            .field("user_id", &self.user_id)
            .field("raw_token", &"<redacted>")
            .finish()
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub display_name: String,
}

/// Login material for a user. `password_hash` is a PHC string (argon2).
#[derive(Clone)]
pub struct UserCredentials {
    pub user_id: i64,
    pub password_hash: String,
}

impl fmt::Debug for UserCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserCredentials")
            .field("user_id", &self.user_id)
            .finish_non_exhaustive()
    }
}
