//! session token 検証 → AuthenticatedPrincipal を extensions に入れる
//!
//! - `Authorization: Bearer <token>` を優先し、無ければ session cookie を使う
//! - 不正な形式 / 未知の token / token 無しはすべて同じ 401
//! - store 障害は 500 (ログに残す)

use axum::{
    Router,
    body::Body,
    extract::State,
    http::{Request, header},
    middleware::{self, Next},
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;

use crate::error::AppError;
use crate::state::AppState;

/// Protect every route of `router` with token authentication.
///
/// `route_layer` so unmatched paths still 404 instead of 401.
pub fn apply(router: Router<AppState>, state: AppState) -> Router<AppState> {
    router.route_layer(middleware::from_fn_with_state(state, access_middleware))
}

async fn access_middleware(
    State(state): State<AppState>,
    jar: CookieJar,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let authorization = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned);
    let cookie = jar.get(&state.cookie.name).map(|c| c.value().to_owned());

    let principal = match state
        .resolver
        .resolve_request(authorization.as_deref(), cookie.as_deref())
        .await
    {
        Ok(Some(principal)) => principal,
        Ok(None) => {
            tracing::debug!(path = %req.uri().path(), "unauthenticated request");
            return Err(AppError::Unauthorized);
        }
        Err(err) => {
            tracing::error!(error = ?err, "token lookup failed");
            return Err(AppError::Internal);
        }
    };

    tracing::debug!(user_id = principal.user_id, "authenticated request");

    // middleware → extractor への受け渡し
    req.extensions_mut().insert(principal);

    Ok(next.run(req).await)
}
