use std::sync::Arc;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::Utc;
use thiserror::Error;
use tracing::{debug, error};

use crate::repos::error::{RepoError, RepoResult};
use crate::services::auth::fingerprint::TokenHasher;
use crate::services::auth::store::TokenStore;
use crate::services::auth::types::TokenRecord;

const TOKEN_BYTES: usize = 32;
const MAX_USER_AGENT_CHARS: usize = 512;

#[derive(Debug, Error)]
pub enum IssueError {
    #[error("os rng unavailable: {0}")]
    Rng(getrandom::Error),

    #[error(transparent)]
    Store(#[from] RepoError),
}

/// Freshly issued token. `raw_token` goes back to the client once and is
/// never stored.
#[derive(Clone)]
pub struct IssuedToken {
    pub raw_token: String,
    pub record: TokenRecord,
}

impl std::fmt::Debug for IssuedToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IssuedToken")
            .field("record", &self.record)
            .finish_non_exhaustive()
    }
}

/// Issues and revokes opaque session tokens.
#[derive(Clone)]
pub struct TokenIssuer {
    hasher: TokenHasher,
    store: Arc<dyn TokenStore>,
}

impl std::fmt::Debug for TokenIssuer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenIssuer").finish_non_exhaustive()
    }
}

impl TokenIssuer {
    pub fn new(hasher: TokenHasher, store: Arc<dyn TokenStore>) -> Self {
        Self { hasher, store }
    }

    /// Issue a new token for `user_id` and persist its record.
    pub async fn issue(&self, user_id: i64, user_agent: &str) -> Result<IssuedToken, IssueError> {
        let raw_token = generate_token()?;
        let now = Utc::now();

        let record = TokenRecord {
            fingerprint: self.hasher.fingerprint(&raw_token),
            user_id,
            user_agent: user_agent.chars().take(MAX_USER_AGENT_CHARS).collect(),
            created_at: now,
            last_used_at: now,
        };

        self.store.insert(&record).await.map_err(|e| {
            error!(user_id, error = %e, "failed to insert token record");
            e
        })?;

        debug!(user_id, "issued session token");

        Ok(IssuedToken { raw_token, record })
    }

    /// Revoke by raw token. Returns `false` when nothing matched.
    pub async fn revoke(&self, raw_token: &str) -> RepoResult<bool> {
        if raw_token.trim().is_empty() {
            return Ok(false);
        }

        let fingerprint = self.hasher.fingerprint(raw_token);
        let removed = self.store.delete(&fingerprint).await?;

        debug!(removed, "revoked session token");
        Ok(removed)
    }

    pub async fn sessions_for(&self, user_id: i64) -> RepoResult<Vec<TokenRecord>> {
        self.store.list_for_user(user_id).await
    }

    pub fn hasher(&self) -> &TokenHasher {
        &self.hasher
    }
}

fn generate_token() -> Result<String, IssueError> {
    // 32 bytes of entropy -> URL-safe base64 without padding.
    let mut bytes = [0u8; TOKEN_BYTES];
    getrandom::fill(&mut bytes).map_err(IssueError::Rng)?;

    Ok(URL_SAFE_NO_PAD.encode(bytes))
}
