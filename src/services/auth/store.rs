//! Persistence capabilities the auth core depends on.
//!
//! The core only talks to these traits. PostgreSQL implementations live in
//! `repos::{token_repo, user_repo}`; tests use the in-memory fakes below.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};

use crate::repos::error::RepoResult;
use crate::services::auth::types::{Fingerprint, TokenRecord, User, UserCredentials};

/// Token records keyed by fingerprint.
///
/// Implementations decide expiry. A successful `find_by_fingerprint` must also
/// bump `last_used_at`, never moving it backwards.
#[async_trait]
pub trait TokenStore: Send + Sync {
    async fn find_by_fingerprint(&self, fingerprint: &Fingerprint)
    -> RepoResult<Option<TokenRecord>>;

    async fn insert(&self, record: &TokenRecord) -> RepoResult<()>;

    // Returns whether a record was removed.
    async fn delete(&self, fingerprint: &Fingerprint) -> RepoResult<bool>;

    // Most recently used first.
    async fn list_for_user(&self, user_id: i64) -> RepoResult<Vec<TokenRecord>>;

    /// Remove records that the expiry policy already hides. Returns how many
    /// were removed; stores without expiry return 0.
    async fn purge_expired(&self) -> RepoResult<u64>;
}

/// Records last used at or before this instant are expired.
///
/// A record stays live while `last_used_at > cutoff`.
pub fn idle_cutoff(now: DateTime<Utc>, idle_timeout: Option<Duration>) -> Option<DateTime<Utc>> {
    idle_timeout.map(|ttl| now - ttl)
}

#[cfg(test)]
fn is_live(record: &TokenRecord, cutoff: Option<DateTime<Utc>>) -> bool {
    cutoff.is_none_or(|c| record.last_used_at > c)
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_id(&self, user_id: i64) -> RepoResult<Option<User>>;

    async fn find_credentials_by_email(&self, email: &str)
    -> RepoResult<Option<UserCredentials>>;
}

#[cfg(test)]
pub mod memory {
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    use super::*;
    use crate::repos::error::RepoError;

    /// In-memory `TokenStore` with call counting and fault injection.
    ///
    /// Applies the same idle rule as `PgTokenStore` when built with
    /// [`with_idle_timeout`](Self::with_idle_timeout).
    #[derive(Default)]
    pub struct MemoryTokenStore {
        records: Mutex<HashMap<Fingerprint, TokenRecord>>,
        idle_timeout: Option<Duration>,
        lookups: AtomicUsize,
        failing: AtomicBool,
    }

    impl MemoryTokenStore {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_idle_timeout(idle_timeout: Duration) -> Self {
            Self {
                idle_timeout: Some(idle_timeout),
                ..Self::default()
            }
        }

        fn cutoff(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
            idle_cutoff(now, self.idle_timeout)
        }

        pub fn put(&self, record: TokenRecord) {
            self.records
                .lock()
                .unwrap()
                .insert(record.fingerprint.clone(), record);
        }

        pub fn get(&self, fingerprint: &Fingerprint) -> Option<TokenRecord> {
            self.records.lock().unwrap().get(fingerprint).cloned()
        }

        pub fn len(&self) -> usize {
            self.records.lock().unwrap().len()
        }

        pub fn lookups(&self) -> usize {
            self.lookups.load(Ordering::SeqCst)
        }

        pub fn set_failing(&self, failing: bool) {
            self.failing.store(failing, Ordering::SeqCst);
        }

        fn check(&self) -> RepoResult<()> {
            if self.failing.load(Ordering::SeqCst) {
                return Err(RepoError::Db(sqlx::Error::PoolTimedOut));
            }
            Ok(())
        }
    }

    #[async_trait]
    impl TokenStore for MemoryTokenStore {
        async fn find_by_fingerprint(
            &self,
            fingerprint: &Fingerprint,
        ) -> RepoResult<Option<TokenRecord>> {
            self.lookups.fetch_add(1, Ordering::SeqCst);
            self.check()?;

            let now = Utc::now();
            let cutoff = self.cutoff(now);
            let mut records = self.records.lock().unwrap();
            Ok(records
                .get_mut(fingerprint)
                .filter(|record| is_live(record, cutoff))
                .map(|record| {
                    record.last_used_at = record.last_used_at.max(now);
                    record.clone()
                }))
        }

        async fn insert(&self, record: &TokenRecord) -> RepoResult<()> {
            self.check()?;
            self.put(record.clone());
            Ok(())
        }

        async fn delete(&self, fingerprint: &Fingerprint) -> RepoResult<bool> {
            self.check()?;
            Ok(self.records.lock().unwrap().remove(fingerprint).is_some())
        }

        async fn list_for_user(&self, user_id: i64) -> RepoResult<Vec<TokenRecord>> {
            self.check()?;
            let cutoff = self.cutoff(Utc::now());
            let mut out: Vec<_> = self
                .records
                .lock()
                .unwrap()
                .values()
                .filter(|r| r.user_id == user_id && is_live(r, cutoff))
                .cloned()
                .collect();
            out.sort_by(|a, b| b.last_used_at.cmp(&a.last_used_at));
            Ok(out)
        }

        async fn purge_expired(&self) -> RepoResult<u64> {
            self.check()?;
            let Some(cutoff) = self.cutoff(Utc::now()) else {
                return Ok(0);
            };
            let mut records = self.records.lock().unwrap();
            let before = records.len();
            records.retain(|_, r| r.last_used_at > cutoff);
            Ok((before - records.len()) as u64)
        }
    }

    #[derive(Default)]
    pub struct MemoryUserRepository {
        users: Mutex<HashMap<i64, (User, String)>>,
    }

    impl MemoryUserRepository {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn add(&self, user: User, password_hash: impl Into<String>) {
            self.users
                .lock()
                .unwrap()
                .insert(user.id, (user, password_hash.into()));
        }

        pub fn remove(&self, user_id: i64) {
            self.users.lock().unwrap().remove(&user_id);
        }
    }

    #[async_trait]
    impl UserRepository for MemoryUserRepository {
        async fn find_by_id(&self, user_id: i64) -> RepoResult<Option<User>> {
            Ok(self
                .users
                .lock()
                .unwrap()
                .get(&user_id)
                .map(|(u, _)| u.clone()))
        }

        async fn find_credentials_by_email(
            &self,
            email: &str,
        ) -> RepoResult<Option<UserCredentials>> {
            Ok(self
                .users
                .lock()
                .unwrap()
                .values()
                .find(|(u, _)| u.email.eq_ignore_ascii_case(email))
                .map(|(u, hash)| UserCredentials {
                    user_id: u.id,
                    password_hash: hash.clone(),
                }))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::memory::MemoryTokenStore;
    use super::*;
    use crate::services::auth::fingerprint::TokenHasher;

    fn record(hasher: &TokenHasher, raw: &str, user_id: i64, idle: Duration) -> TokenRecord {
        let last_used = Utc::now() - idle;
        TokenRecord {
            fingerprint: hasher.fingerprint(raw),
            user_id,
            user_agent: String::new(),
            created_at: last_used,
            last_used_at: last_used,
        }
    }

    #[test]
    fn cutoff_is_now_minus_timeout() {
        let now = Utc::now();
        assert_eq!(idle_cutoff(now, None), None);
        assert_eq!(
            idle_cutoff(now, Some(Duration::minutes(30))),
            Some(now - Duration::minutes(30))
        );
    }

    #[test]
    fn record_at_the_cutoff_is_expired() {
        let hasher = TokenHasher::new().unwrap();
        let r = record(&hasher, "t", 1, Duration::zero());

        assert!(is_live(&r, None));
        assert!(is_live(&r, Some(r.last_used_at - Duration::seconds(1))));
        assert!(!is_live(&r, Some(r.last_used_at)));
    }

    #[tokio::test]
    async fn purge_removes_only_idle_records() {
        let hasher = TokenHasher::new().unwrap();
        let store = MemoryTokenStore::with_idle_timeout(Duration::minutes(30));
        store.put(record(&hasher, "fresh", 1, Duration::minutes(5)));
        store.put(record(&hasher, "stale", 1, Duration::hours(2)));
        store.put(record(&hasher, "stale-other", 2, Duration::days(3)));

        assert_eq!(store.purge_expired().await.unwrap(), 2);
        assert_eq!(store.len(), 1);
        assert!(store.get(&hasher.fingerprint("fresh")).is_some());

        assert_eq!(store.purge_expired().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn purge_without_timeout_keeps_everything() {
        let hasher = TokenHasher::new().unwrap();
        let store = MemoryTokenStore::new();
        store.put(record(&hasher, "ancient", 1, Duration::days(365)));

        assert_eq!(store.purge_expired().await.unwrap(), 0);
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn idle_records_are_hidden_from_listing() {
        let hasher = TokenHasher::new().unwrap();
        let store = MemoryTokenStore::with_idle_timeout(Duration::minutes(30));
        store.put(record(&hasher, "fresh", 1, Duration::minutes(5)));
        store.put(record(&hasher, "stale", 1, Duration::hours(2)));

        let listed = store.list_for_user(1).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].fingerprint, hasher.fingerprint("fresh"));
    }
}
