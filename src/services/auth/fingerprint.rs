use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::services::auth::types::Fingerprint;

/// Length of a fingerprint: 32 digest bytes as unpadded base64url.
pub const FINGERPRINT_LEN: usize = 43;

// FIPS 180-2 test vector: SHA-256("abc")
const SELF_TEST_INPUT: &str = "abc";
const SELF_TEST_DIGEST_HEX: &str =
    "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad";

#[derive(Debug, Error)]
pub enum HasherError {
    #[error("token hash self-test failed")]
    SelfTestFailed,
}

/// Turns raw bearer tokens into storable fingerprints.
///
/// sha256(token) -> URL-safe base64 without padding. Deterministic, no state.
#[derive(Clone, Copy, Debug)]
pub struct TokenHasher {
    _checked: (),
}

impl TokenHasher {
    /// Build a hasher after a known-answer check of the digest.
    ///
    /// Called once at startup; an error here means the process must not serve.
    pub fn new() -> Result<Self, HasherError> {
        let digest = Sha256::digest(SELF_TEST_INPUT.as_bytes());
        if hex::encode(digest) != SELF_TEST_DIGEST_HEX {
            return Err(HasherError::SelfTestFailed);
        }

        Ok(Self { _checked: () })
    }

    pub fn fingerprint(&self, raw_token: &str) -> Fingerprint {
        let digest = Sha256::digest(raw_token.as_bytes());
        Fingerprint::from_encoded(URL_SAFE_NO_PAD.encode(digest))
    }
}
