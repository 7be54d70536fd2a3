/*
 * Responsibility
 * - Router に紐づける共有コンテキスト (AppState)
 * - Clone 前提で持つ (内部は Arc/Clone cheap)
 */
use std::sync::Arc;

use crate::services::auth::{AuthenticationResolver, TokenIssuer, UserRepository};

/// How the session cookie is written and read.
#[derive(Clone, Debug)]
pub struct CookieSettings {
    pub name: String,
    pub secure: bool,
}

#[derive(Clone)]
pub struct AppState {
    pub resolver: AuthenticationResolver,
    pub issuer: TokenIssuer,
    pub users: Arc<dyn UserRepository>,
    pub cookie: CookieSettings,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("cookie", &self.cookie)
            .finish_non_exhaustive()
    }
}

impl AppState {
    pub fn new(
        resolver: AuthenticationResolver,
        issuer: TokenIssuer,
        users: Arc<dyn UserRepository>,
        cookie: CookieSettings,
    ) -> Self {
        Self {
            resolver,
            issuer,
            users,
            cookie,
        }
    }
}
