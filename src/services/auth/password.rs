//! Password verification for login.
//!
//! Only verification lives here; hashing happens wherever accounts are
//! provisioned. Stored hashes are PHC strings (argon2id).

use std::sync::OnceLock;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PasswordError {
    #[error("invalid password hash format")]
    InvalidHash,

    #[error("password verification failed")]
    Mismatch,
}

/// Verify `password` against a stored PHC hash.
///
/// Parameters (memory/time cost) come from the hash itself.
pub fn verify_password(password: &str, hash: &str) -> Result<(), PasswordError> {
    let parsed = PasswordHash::new(hash).map_err(|_| PasswordError::InvalidHash)?;

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .map_err(|_| PasswordError::Mismatch)
}

/// Burn the same work as a real verification when the account doesn't exist,
/// so login latency doesn't reveal which emails are registered.
pub fn verify_against_dummy(password: &str) {
    if let Some(hash) = dummy_hash() {
        let _ = verify_password(password, hash);
    }
}

/// Build the dummy hash now instead of on the first unknown-email login.
/// Returns whether it is available.
pub fn prepare_dummy_hash() -> bool {
    dummy_hash().is_some()
}

fn dummy_hash() -> Option<&'static str> {
    static DUMMY_HASH: OnceLock<Option<String>> = OnceLock::new();

    DUMMY_HASH
        .get_or_init(|| {
            let salt = SaltString::from_b64(DUMMY_SALT).ok()?;
            Argon2::default()
                .hash_password(b"dummy-password", &salt)
                .ok()
                .map(|h| h.to_string())
        })
        .as_deref()
}

const DUMMY_SALT: &str = "ZHVtbXlzYWx0ZHVtbXlzYWx0";

// Cheap params for tests; verification reads params from the hash.
#[cfg(test)]
pub(crate) fn hash_for_tests(password: &str) -> String {
    use argon2::{Algorithm, Params, Version};

    let salt = SaltString::from_b64("c29tZXNhbHRzb21lc2FsdA").unwrap();
    let params = Params::new(1024, 1, 1, None).unwrap();
    Argon2::new(Algorithm::Argon2id, Version::V0x13, params)
        .hash_password(password.as_bytes(), &salt)
        .unwrap()
        .to_string()
}
