/*
 * Responsibility
 * - users テーブル向け SQLx 操作 (参照のみ; 登録は別サービスの責務)
 * - DB エラーは RepoError で返す
 */
use async_trait::async_trait;
use sqlx::{FromRow, PgPool};

use crate::repos::error::RepoResult;
use crate::services::auth::store::UserRepository;
use crate::services::auth::types::{User, UserCredentials};

#[derive(Clone, Debug)]
pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct UserRow {
    id: i64,
    email: String,
    display_name: String,
}

#[derive(FromRow)]
struct CredentialsRow {
    id: i64,
    password_hash: String,
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn find_by_id(&self, user_id: i64) -> RepoResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, email, display_name
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| User {
            id: r.id,
            email: r.email,
            display_name: r.display_name,
        }))
    }

    async fn find_credentials_by_email(
        &self,
        email: &str,
    ) -> RepoResult<Option<UserCredentials>> {
        // email is stored lower-cased (see migration)
        let row = sqlx::query_as::<_, CredentialsRow>(
            r#"
            SELECT id, password_hash
            FROM users
            WHERE email = lower($1)
            "#,
        )
        .bind(email.trim())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| UserCredentials {
            user_id: r.id,
            password_hash: r.password_hash,
        }))
    }
}
