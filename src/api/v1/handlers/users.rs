/*
 * Responsibility
 * - GET /me: 認証済み principal のユーザー情報
 */
use axum::{Json, extract::State};

use crate::api::v1::dto::users::UserResponse;
use crate::api::v1::extractors::AuthCtx;
use crate::error::AppError;
use crate::state::AppState;

pub async fn me(
    State(state): State<AppState>,
    AuthCtx(principal): AuthCtx,
) -> Result<Json<UserResponse>, AppError> {
    // token is still valid but the account is gone: same answer as a bad token
    let user = state
        .users
        .find_by_id(principal.user_id)
        .await?
        .ok_or(AppError::Unauthorized)?;

    Ok(Json(user.into()))
}
