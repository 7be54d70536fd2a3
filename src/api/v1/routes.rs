/*
 * Responsibility
 * - v1 の URL 構造を定義
 * - Bearer/cookie 認証が必要な範囲はここで middleware::auth::access を掛ける
 */
use axum::{
    Router,
    routing::{get, post},
};

use crate::api::v1::handlers::{
    session::{list_sessions, login, logout},
    users::me,
};
use crate::middleware::auth::access;
use crate::state::AppState;

pub fn routes(state: AppState) -> Router<AppState> {
    let public = Router::new().route("/auth/login", post(login));

    let protected = Router::new()
        .route("/auth/logout", post(logout))
        .route("/auth/sessions", get(list_sessions))
        .route("/me", get(me));

    public.merge(access::apply(protected, state))
}
