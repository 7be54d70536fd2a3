use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::api::v1::dto::users::UserResponse;

const MAX_EMAIL_LEN: usize = 254;
const MAX_PASSWORD_LEN: usize = 1024;

/// Request body for `POST /auth/login`.
///
/// No `Debug`: the password must not end up in logs.
#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

impl LoginRequest {
    // Shape checks only; credential checks happen in the handler.
    pub fn validate(&self) -> Result<(), &'static str> {
        let email = self.email.trim();
        if email.is_empty() || !email.contains('@') {
            return Err("email is required");
        }
        if email.len() > MAX_EMAIL_LEN {
            return Err("email is too long");
        }
        if self.password.is_empty() {
            return Err("password is required");
        }
        if self.password.len() > MAX_PASSWORD_LEN {
            return Err("password is too long");
        }
        Ok(())
    }
}

#[derive(Serialize)]
pub struct LoginResponse {
    /// Raw session token. Returned only here, once.
    pub token: String,
    /// Always "Bearer"
    pub token_type: &'static str,
    pub user: UserResponse,
}

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub user_agent: String,
    pub created_at: DateTime<Utc>,
    pub last_used_at: DateTime<Utc>,
    /// True for the session the request was made with.
    pub current: bool,
}
