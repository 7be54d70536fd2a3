use std::sync::Arc;

use tracing::debug;

use crate::repos::error::RepoResult;
use crate::services::auth::credentials;
use crate::services::auth::fingerprint::TokenHasher;
use crate::services::auth::store::TokenStore;
use crate::services::auth::types::AuthenticatedPrincipal;

/// Resolves presented bearer tokens to principals.
///
/// Stateless per call: every resolution goes to the store, nothing is cached.
/// "Unknown", "expired" and "not presented" all come back as `Ok(None)`; only
/// store faults are errors, and they are returned as-is.
#[derive(Clone)]
pub struct AuthenticationResolver {
    hasher: TokenHasher,
    store: Arc<dyn TokenStore>,
}

impl std::fmt::Debug for AuthenticationResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthenticationResolver").finish_non_exhaustive()
    }
}

impl AuthenticationResolver {
    pub fn new(hasher: TokenHasher, store: Arc<dyn TokenStore>) -> Self {
        Self { hasher, store }
    }

    pub async fn resolve(&self, raw_token: &str) -> RepoResult<Option<AuthenticatedPrincipal>> {
        if raw_token.trim().is_empty() {
            return Ok(None);
        }

        let fingerprint = self.hasher.fingerprint(raw_token);

        let Some(record) = self.store.find_by_fingerprint(&fingerprint).await? else {
            debug!("token not found or inactive");
            return Ok(None);
        };

        debug!(user_id = record.user_id, "token resolved");

        Ok(Some(AuthenticatedPrincipal {
            user_id: record.user_id,
            raw_token: raw_token.to_string(),
        }))
    }

    /// Extract from header/cookie, then resolve.
    pub async fn resolve_request(
        &self,
        authorization_header: Option<&str>,
        cookie_value: Option<&str>,
    ) -> RepoResult<Option<AuthenticatedPrincipal>> {
        match credentials::extract_raw_token(authorization_header, cookie_value) {
            Some(raw) => self.resolve(&raw).await,
            None => Ok(None),
        }
    }
}
