use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use sqlx::{FromRow, PgPool};

use crate::repos::error::RepoResult;
use crate::services::auth::store::{TokenStore, idle_cutoff};
use crate::services::auth::types::{Fingerprint, TokenRecord};

/// DB access for session token records.
///
/// Notes:
/// - Only the fingerprint is stored, never the raw token.
/// - `idle_timeout`: when set, records unused for longer than this are
///   treated as missing, and `purge_expired` deletes them.
#[derive(Clone, Debug)]
pub struct PgTokenStore {
    pool: PgPool,
    idle_timeout: Option<Duration>,
}

impl PgTokenStore {
    pub fn new(pool: PgPool, idle_timeout: Option<Duration>) -> Self {
        Self { pool, idle_timeout }
    }

    fn cutoff(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        idle_cutoff(now, self.idle_timeout)
    }
}

#[derive(Debug, FromRow)]
struct TokenRow {
    fingerprint: String,
    user_id: i64,
    user_agent: String,
    created_at: DateTime<Utc>,
    last_used_at: DateTime<Utc>,
}

impl From<TokenRow> for TokenRecord {
    fn from(row: TokenRow) -> Self {
        Self {
            fingerprint: Fingerprint::from_encoded(row.fingerprint),
            user_id: row.user_id,
            user_agent: row.user_agent,
            created_at: row.created_at,
            last_used_at: row.last_used_at,
        }
    }
}

#[async_trait]
impl TokenStore for PgTokenStore {
    async fn find_by_fingerprint(
        &self,
        fingerprint: &Fingerprint,
    ) -> RepoResult<Option<TokenRecord>> {
        let now = Utc::now();

        // Lookup and touch in one statement. GREATEST keeps last_used_at
        // from going backwards when app clocks disagree.
        let row = sqlx::query_as::<_, TokenRow>(
            r#"
            UPDATE auth_tokens
            SET last_used_at = GREATEST(last_used_at, $3)
            WHERE fingerprint = $1
                AND ($2::timestamptz IS NULL OR last_used_at > $2)
            RETURNING fingerprint, user_id, user_agent, created_at, last_used_at
            "#,
        )
        .bind(fingerprint.as_str())
        .bind(self.cutoff(now))
        .bind(now)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(TokenRecord::from))
    }

    async fn insert(&self, record: &TokenRecord) -> RepoResult<()> {
        sqlx::query(
            r#"
            INSERT INTO auth_tokens (fingerprint, user_id, user_agent, created_at, last_used_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(record.fingerprint.as_str())
        .bind(record.user_id)
        .bind(&record.user_agent)
        .bind(record.created_at)
        .bind(record.last_used_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn delete(&self, fingerprint: &Fingerprint) -> RepoResult<bool> {
        let done = sqlx::query(
            r#"
            DELETE FROM auth_tokens
            WHERE fingerprint = $1
            "#,
        )
        .bind(fingerprint.as_str())
        .execute(&self.pool)
        .await?;

        Ok(done.rows_affected() > 0)
    }

    async fn list_for_user(&self, user_id: i64) -> RepoResult<Vec<TokenRecord>> {
        let rows = sqlx::query_as::<_, TokenRow>(
            r#"
            SELECT fingerprint, user_id, user_agent, created_at, last_used_at
            FROM auth_tokens
            WHERE user_id = $1
                AND ($2::timestamptz IS NULL OR last_used_at > $2)
            ORDER BY last_used_at DESC
            "#,
        )
        .bind(user_id)
        .bind(self.cutoff(Utc::now()))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(TokenRecord::from).collect())
    }

    async fn purge_expired(&self) -> RepoResult<u64> {
        let Some(cutoff) = self.cutoff(Utc::now()) else {
            return Ok(0);
        };

        let done = sqlx::query(
            r#"
            DELETE FROM auth_tokens
            WHERE last_used_at <= $1
            "#,
        )
        .bind(cutoff)
        .execute(&self.pool)
        .await?;

        Ok(done.rows_affected())
    }
}
