/*
 * Responsibility
 * - login (token 発行) / logout (token 失効) / session 一覧
 * - 未知の email と誤った password は区別しない (どちらも 401)
 */
use axum::{
    Json,
    extract::State,
    http::{HeaderMap, StatusCode, header},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use tracing::{error, info, warn};

use crate::api::v1::dto::session::{LoginRequest, LoginResponse, SessionResponse};
use crate::api::v1::extractors::AuthCtx;
use crate::error::AppError;
use crate::services::auth::password::{self, PasswordError};
use crate::state::{AppState, CookieSettings};

pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    headers: HeaderMap,
    Json(req): Json<LoginRequest>,
) -> Result<(StatusCode, CookieJar, Json<LoginResponse>), AppError> {
    req.validate()
        .map_err(|msg| AppError::InvalidRequest(msg.to_string()))?;

    let creds = state.users.find_credentials_by_email(req.email.trim()).await?;

    let LoginRequest {
        password: presented,
        ..
    } = req;
    let user_id = match creds {
        Some(creds) => {
            let hash = creds.password_hash;
            let verified = tokio::task::spawn_blocking(move || {
                let result = password::verify_password(&presented, &hash);
                // A malformed hash fails before any argon2 work; pay it anyway.
                if matches!(result, Err(PasswordError::InvalidHash)) {
                    password::verify_against_dummy(&presented);
                }
                result
            })
            .await
            .map_err(|e| {
                error!(error = %e, "password verification task failed");
                AppError::Internal
            })?;

            match verified {
                Ok(()) => creds.user_id,
                Err(PasswordError::Mismatch) => return Err(AppError::Unauthorized),
                Err(PasswordError::InvalidHash) => {
                    error!(user_id = creds.user_id, "stored password hash is malformed");
                    return Err(AppError::Unauthorized);
                }
            }
        }
        None => {
            tokio::task::spawn_blocking(move || password::verify_against_dummy(&presented))
                .await
                .map_err(|e| {
                    error!(error = %e, "dummy password verification task failed");
                    AppError::Internal
                })?;
            return Err(AppError::Unauthorized);
        }
    };

    let user = state.users.find_by_id(user_id).await?.ok_or_else(|| {
        warn!(user_id, "user vanished during login");
        AppError::Unauthorized
    })?;

    let user_agent = headers
        .get(header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();

    let issued = state.issuer.issue(user.id, user_agent).await?;

    info!(user_id = user.id, "login succeeded");

    let jar = jar.add(session_cookie(&state.cookie, issued.raw_token.clone()));

    Ok((
        StatusCode::CREATED,
        jar,
        Json(LoginResponse {
            token: issued.raw_token,
            token_type: "Bearer",
            user: user.into(),
        }),
    ))
}

pub async fn logout(
    State(state): State<AppState>,
    jar: CookieJar,
    AuthCtx(principal): AuthCtx,
) -> Result<(StatusCode, CookieJar), AppError> {
    let removed = state.issuer.revoke(&principal.raw_token).await?;
    info!(user_id = principal.user_id, removed, "logout");

    Ok((StatusCode::NO_CONTENT, jar.add(removal_cookie(&state.cookie))))
}

pub async fn list_sessions(
    State(state): State<AppState>,
    AuthCtx(principal): AuthCtx,
) -> Result<Json<Vec<SessionResponse>>, AppError> {
    let current = state.issuer.hasher().fingerprint(&principal.raw_token);

    let sessions = state
        .issuer
        .sessions_for(principal.user_id)
        .await?
        .into_iter()
        .map(|r| SessionResponse {
            current: r.fingerprint == current,
            user_agent: r.user_agent,
            created_at: r.created_at,
            last_used_at: r.last_used_at,
        })
        .collect();

    Ok(Json(sessions))
}

fn session_cookie(settings: &CookieSettings, raw_token: String) -> Cookie<'static> {
    // No Max-Age: lifetime is decided by the token store, not the browser.
    Cookie::build((settings.name.clone(), raw_token))
        .http_only(true)
        .secure(settings.secure)
        .same_site(SameSite::Lax)
        .path("/")
        .build()
}

// Always sent, even when the request authenticated by header only.
fn removal_cookie(settings: &CookieSettings) -> Cookie<'static> {
    let mut cookie = Cookie::build((settings.name.clone(), ""))
        .path("/")
        .build();
    cookie.make_removal();
    cookie
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::Router;
    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use serde_json::{Value, json};
    use tower::ServiceExt;

    use super::*;
    use crate::services::auth::User;
    use crate::services::auth::password::hash_for_tests;
    use crate::services::auth::store::memory::{MemoryTokenStore, MemoryUserRepository};
    use crate::state::testing::memory_state;

    fn app() -> (Router, Arc<MemoryTokenStore>, Arc<MemoryUserRepository>) {
        let (state, tokens, users) = memory_state();
        users.add(
            User {
                id: 42,
                email: "alice@example.com".to_string(),
                display_name: "Alice".to_string(),
            },
            hash_for_tests("hunter2"),
        );

        let router = crate::api::v1::routes(state.clone()).with_state(state);
        (router, tokens, users)
    }

    fn login_req(email: &str, password: &str, user_agent: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/auth/login")
            .header(header::CONTENT_TYPE, "application/json")
            .header(header::USER_AGENT, user_agent)
            .body(Body::from(
                json!({ "email": email, "password": password }).to_string(),
            ))
            .unwrap()
    }

    fn authed(method: &str, uri: &str, token: &str) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header(header::AUTHORIZATION, format!("Bearer {token}"))
            .body(Body::empty())
            .unwrap()
    }

    async fn json_body(res: axum::response::Response) -> Value {
        let bytes = res.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    async fn login_token(app: &Router, user_agent: &str) -> String {
        let res = app
            .clone()
            .oneshot(login_req("alice@example.com", "hunter2", user_agent))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::CREATED);
        json_body(res).await["token"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn login_issues_token_and_cookie() {
        let (app, tokens, _) = app();

        let res = app
            .clone()
            .oneshot(login_req("alice@example.com", "hunter2", "mobile/1.0"))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::CREATED);

        let cookie = res.headers()[header::SET_COOKIE].to_str().unwrap().to_string();
        let body = json_body(res).await;
        let token = body["token"].as_str().unwrap();

        assert_eq!(body["token_type"], "Bearer");
        assert_eq!(body["user"]["id"], 42);
        assert_eq!(token.len(), 43);
        assert!(cookie.starts_with(&format!("sg_token={token}")));
        assert!(cookie.contains("HttpOnly"));
        assert_eq!(tokens.len(), 1);

        let me = app.oneshot(authed("GET", "/me", token)).await.unwrap();
        assert_eq!(me.status(), StatusCode::OK);
        let me = json_body(me).await;
        assert_eq!(me["email"], "alice@example.com");
        assert_eq!(me["display_name"], "Alice");
    }

    #[tokio::test]
    async fn bad_credentials_are_indistinguishable() {
        let (app, tokens, _) = app();

        let wrong_pw = app
            .clone()
            .oneshot(login_req("alice@example.com", "nope", "ua"))
            .await
            .unwrap();
        let unknown = app
            .oneshot(login_req("bob@example.com", "hunter2", "ua"))
            .await
            .unwrap();

        assert_eq!(wrong_pw.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(unknown.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(json_body(wrong_pw).await, json_body(unknown).await);
        assert_eq!(tokens.len(), 0);
    }

    #[tokio::test]
    async fn malformed_stored_hash_is_plain_unauthorized() {
        let (app, tokens, users) = app();
        users.add(
            User {
                id: 7,
                email: "carol@example.com".to_string(),
                display_name: "Carol".to_string(),
            },
            "not-a-phc-string",
        );

        let broken = app
            .clone()
            .oneshot(login_req("carol@example.com", "hunter2", "ua"))
            .await
            .unwrap();
        let unknown = app
            .oneshot(login_req("bob@example.com", "hunter2", "ua"))
            .await
            .unwrap();

        assert_eq!(broken.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(json_body(broken).await, json_body(unknown).await);
        assert_eq!(tokens.len(), 0);
    }

    #[tokio::test]
    async fn malformed_login_is_bad_request() {
        let (app, _, _) = app();

        let res = app.oneshot(login_req("", "hunter2", "ua")).await.unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn logout_revokes_token() {
        let (app, tokens, _) = app();
        let token = login_token(&app, "ua").await;

        let res = app
            .clone()
            .oneshot(authed("POST", "/auth/logout", &token))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::NO_CONTENT);
        assert!(res.headers().contains_key(header::SET_COOKIE));
        assert_eq!(tokens.len(), 0);

        let me = app.oneshot(authed("GET", "/me", &token)).await.unwrap();
        assert_eq!(me.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn sessions_flag_the_current_one() {
        let (app, _, _) = app();
        let phone = login_token(&app, "phone").await;
        login_token(&app, "laptop").await;

        let res = app
            .oneshot(authed("GET", "/auth/sessions", &phone))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);

        let body = json_body(res).await;
        let sessions = body.as_array().unwrap();
        assert_eq!(sessions.len(), 2);

        let current: Vec<_> = sessions.iter().filter(|s| s["current"] == true).collect();
        assert_eq!(current.len(), 1);
        assert_eq!(current[0]["user_agent"], "phone");
    }

    #[tokio::test]
    async fn me_for_deleted_user_is_unauthorized() {
        let (app, _, users) = app();
        let token = login_token(&app, "ua").await;
        users.remove(42);

        let res = app.oneshot(authed("GET", "/me", &token)).await.unwrap();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }
}
