//! Typed access to session and refresh records.
//!
//! Layout in the cache:
//!
//! ```text
//! session:{session_id}      -> SessionRecord (JSON)
//! refresh:{sha256(token)}   -> RefreshRecord (JSON)
//! ```
//!
//! Refresh tokens are stored only as digests, so a cache dump does not
//! leak usable tokens.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use common::{AppError, AppResult, SessionCache};
use domain::{RefreshRecord, SessionRecord};

const SESSION_PREFIX: &str = "session:";
const REFRESH_PREFIX: &str = "refresh:";

/// Opaque refresh token handed to clients.
#[derive(Clone, PartialEq, Eq)]
pub struct RefreshToken(String);

impl RefreshToken {
    /// 256 random bits, hex encoded.
    pub fn generate() -> Self {
        let token = format!(
            "{}{}",
            Uuid::new_v4().simple(),
            Uuid::new_v4().simple()
        );
        Self(token)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl std::fmt::Debug for RefreshToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("RefreshToken([REDACTED])")
    }
}

/// A record together with the exact bytes it was read from, for CAS.
#[derive(Debug, Clone)]
pub struct Snapshot<T> {
    pub record: T,
    pub raw: String,
}

/// Session and refresh record storage.
#[derive(Clone)]
pub struct SessionStore {
    cache: Arc<dyn SessionCache>,
}

impl SessionStore {
    pub fn new(cache: Arc<dyn SessionCache>) -> Self {
        Self { cache }
    }

    pub fn session_key(session_id: Uuid) -> String {
        format!("{}{}", SESSION_PREFIX, session_id)
    }

    pub fn refresh_key(token: &str) -> String {
        let digest = Sha256::digest(token.as_bytes());
        format!("{}{}", REFRESH_PREFIX, hex::encode(digest))
    }

    /// Load a session with the raw value needed for a later swap.
    pub async fn load_session(&self, session_id: Uuid) -> AppResult<Option<Snapshot<SessionRecord>>> {
        self.load(&Self::session_key(session_id)).await
    }

    /// Write a brand new session.
    pub async fn create_session(&self, session: &SessionRecord, now: DateTime<Utc>) -> AppResult<()> {
        let stored = self
            .cache
            .set_if_absent(
                &Self::session_key(session.session_id),
                &encode(session)?,
                ttl(session.remaining_ttl_seconds(now)),
            )
            .await?;

        if stored {
            Ok(())
        } else {
            Err(AppError::internal("session id collision"))
        }
    }

    /// Atomically replace a session if nobody else changed it since `current`
    /// was read. Returns false when the swap was lost.
    pub async fn swap_session(
        &self,
        current: &Snapshot<SessionRecord>,
        next: &SessionRecord,
        now: DateTime<Utc>,
    ) -> AppResult<bool> {
        self.cache
            .compare_and_swap(
                &Self::session_key(next.session_id),
                &current.raw,
                &encode(next)?,
                ttl(next.remaining_ttl_seconds(now)),
            )
            .await
    }

    /// Mark a session revoked for the rest of its lifetime. A missing session
    /// is already unusable, so this is a no-op.
    pub async fn revoke_session(&self, session_id: Uuid, now: DateTime<Utc>) -> AppResult<()> {
        let Some(current) = self.load_session(session_id).await? else {
            return Ok(());
        };
        if current.record.revoked {
            return Ok(());
        }

        let revoked = current.record.revoked();
        self.cache
            .put(
                &Self::session_key(session_id),
                &encode(&revoked)?,
                ttl(revoked.remaining_ttl_seconds(now)),
            )
            .await
    }

    pub async fn load_refresh(&self, token: &str) -> AppResult<Option<RefreshRecord>> {
        Ok(self
            .load::<RefreshRecord>(&Self::refresh_key(token))
            .await?
            .map(|s| s.record))
    }

    /// Persist the record for a freshly minted refresh token.
    pub async fn insert_refresh(
        &self,
        token: &RefreshToken,
        record: &RefreshRecord,
        now: DateTime<Utc>,
    ) -> AppResult<()> {
        let stored = self
            .cache
            .set_if_absent(
                &Self::refresh_key(token.as_str()),
                &encode(record)?,
                ttl(record.remaining_ttl_seconds(now)),
            )
            .await?;

        if stored {
            Ok(())
        } else {
            Err(AppError::internal("refresh token collision"))
        }
    }

    /// Mark one refresh token revoked.
    pub async fn revoke_refresh(
        &self,
        token: &str,
        record: &RefreshRecord,
        now: DateTime<Utc>,
    ) -> AppResult<()> {
        let revoked = record.revoked();
        self.cache
            .put(
                &Self::refresh_key(token),
                &encode(&revoked)?,
                ttl(revoked.remaining_ttl_seconds(now)),
            )
            .await
    }

    async fn load<T: DeserializeOwned>(&self, key: &str) -> AppResult<Option<Snapshot<T>>> {
        let Some(raw) = self.cache.get(key).await? else {
            return Ok(None);
        };

        let record = serde_json::from_str(&raw)
            .map_err(|e| AppError::internal(format!("corrupt record at {}: {}", key, e)))?;
        Ok(Some(Snapshot { record, raw }))
    }
}

fn encode<T: Serialize>(record: &T) -> AppResult<String> {
    serde_json::to_string(record).map_err(|e| AppError::internal(e.to_string()))
}

fn ttl(seconds: u64) -> Duration {
    Duration::from_secs(seconds)
}

#[cfg(test)]
mod tests {
    use chrono::Duration as ChronoDuration;
    use common::MemorySessionCache;

    use super::*;

    fn store() -> (Arc<MemorySessionCache>, SessionStore) {
        let cache = Arc::new(MemorySessionCache::new());
        (cache.clone(), SessionStore::new(cache))
    }

    #[test]
    fn test_refresh_token_entropy_and_format() {
        let a = RefreshToken::generate();
        let b = RefreshToken::generate();
        assert_ne!(a, b);
        assert_eq!(a.as_str().len(), 64);
        assert!(a.as_str().chars().all(|c| c.is_ascii_hexdigit()));
        assert!(!format!("{:?}", a).contains(a.as_str()));
    }

    #[test]
    fn test_refresh_key_is_digest_not_token() {
        let token = RefreshToken::generate();
        let key = SessionStore::refresh_key(token.as_str());
        assert!(key.starts_with("refresh:"));
        assert!(!key.contains(token.as_str()));
        assert_eq!(key, SessionStore::refresh_key(token.as_str()));
    }

    #[tokio::test]
    async fn test_create_and_swap_session() {
        let (_, store) = store();
        let now = Utc::now();
        let session = SessionRecord::open(Uuid::new_v4(), now, ChronoDuration::days(7));
        store.create_session(&session, now).await.unwrap();

        let snapshot = store.load_session(session.session_id).await.unwrap().unwrap();
        assert_eq!(snapshot.record, session);

        let next = session.rotated(now, ChronoDuration::days(7));
        assert!(store.swap_session(&snapshot, &next, now).await.unwrap());
        // Stale snapshot loses
        assert!(!store.swap_session(&snapshot, &next, now).await.unwrap());

        let current = store.load_session(session.session_id).await.unwrap().unwrap();
        assert_eq!(current.record.generation, 1);
    }

    #[tokio::test]
    async fn test_revoke_session_is_idempotent() {
        let (_, store) = store();
        let now = Utc::now();
        let session = SessionRecord::open(Uuid::new_v4(), now, ChronoDuration::days(7));
        store.create_session(&session, now).await.unwrap();

        store.revoke_session(session.session_id, now).await.unwrap();
        store.revoke_session(session.session_id, now).await.unwrap();
        store.revoke_session(Uuid::new_v4(), now).await.unwrap();

        let current = store.load_session(session.session_id).await.unwrap().unwrap();
        assert!(current.record.revoked);
    }

    #[tokio::test]
    async fn test_refresh_records_are_stored_by_digest() {
        let (cache, store) = store();
        let now = Utc::now();
        let session = SessionRecord::open(Uuid::new_v4(), now, ChronoDuration::days(7));
        let token = RefreshToken::generate();
        let record = RefreshRecord::for_session(&session, now);

        store.insert_refresh(&token, &record, now).await.unwrap();
        assert_eq!(cache.count_prefix("refresh:"), 1);
        assert_eq!(
            cache.get(&format!("refresh:{}", token.as_str())).await.unwrap(),
            None
        );

        let loaded = store.load_refresh(token.as_str()).await.unwrap().unwrap();
        assert_eq!(loaded, record);

        store.revoke_refresh(token.as_str(), &loaded, now).await.unwrap();
        assert!(store.load_refresh(token.as_str()).await.unwrap().unwrap().revoked);
    }

    #[tokio::test]
    async fn test_corrupt_record_is_internal_error() {
        let (cache, store) = store();
        let id = Uuid::new_v4();
        cache
            .put(&SessionStore::session_key(id), "{not json", Duration::from_secs(60))
            .await
            .unwrap();

        assert!(matches!(
            store.load_session(id).await,
            Err(AppError::Internal(_))
        ));
    }
}
