//! Session cache protocol.
//!
//! Session state must be visible to every service instance at once, so it
//! lives in a network store rather than process memory. The protocol is a
//! small string key/value surface with TTLs plus the two atomic primitives
//! refresh rotation depends on: set-if-absent and compare-and-swap.

use std::time::Duration;

use async_trait::async_trait;

use crate::error::AppResult;

/// Shared key/value store for session records.
///
/// Implementations must not cache results between calls: every read goes to
/// the backing store.
#[async_trait]
pub trait SessionCache: Send + Sync {
    /// Fetch a value, `None` when absent or expired.
    async fn get(&self, key: &str) -> AppResult<Option<String>>;

    /// Store a value with a time-to-live.
    async fn put(&self, key: &str, value: &str, ttl: Duration) -> AppResult<()>;

    /// Remove a key. Removing a missing key is not an error.
    async fn delete(&self, key: &str) -> AppResult<()>;

    /// Store only if the key does not exist. Returns whether it was stored.
    async fn set_if_absent(&self, key: &str, value: &str, ttl: Duration) -> AppResult<bool>;

    /// Replace the value only if it still equals `expected`. Returns whether
    /// the swap happened.
    async fn compare_and_swap(
        &self,
        key: &str,
        expected: &str,
        new: &str,
        ttl: Duration,
    ) -> AppResult<bool>;

    /// Check connectivity.
    async fn ping(&self) -> AppResult<()>;
}

/// TTLs below one second would be rejected by the store.
#[cfg_attr(not(feature = "cache"), allow(dead_code))]
pub(crate) fn ttl_seconds(ttl: Duration) -> u64 {
    ttl.as_secs().max(1)
}

#[cfg(feature = "cache")]
pub use self::redis_cache::RedisSessionCache;

#[cfg(feature = "cache")]
mod redis_cache {
    use std::future::Future;
    use std::time::Duration;

    use async_trait::async_trait;
    use redis::{aio::ConnectionManager, AsyncCommands, Client, RedisError};
    use tracing::{debug, warn};

    use super::{ttl_seconds, SessionCache};
    use crate::error::{AppError, AppResult};

    /// Swap the value only if it still matches.
    ///
    /// KEYS[1] = key
    /// ARGV[1] = expected value
    /// ARGV[2] = new value
    /// ARGV[3] = ttl seconds
    ///
    /// Returns 1 when swapped, 0 otherwise.
    const COMPARE_AND_SWAP_SCRIPT: &str = r#"
        if redis.call('GET', KEYS[1]) == ARGV[1] then
            redis.call('SET', KEYS[1], ARGV[2], 'EX', tonumber(ARGV[3]))
            return 1
        end
        return 0
    "#;

    /// Redis-backed session cache.
    #[derive(Clone)]
    pub struct RedisSessionCache {
        conn: ConnectionManager,
        op_timeout: Duration,
    }

    impl RedisSessionCache {
        /// Connect to Redis.
        pub async fn connect(url: &str, op_timeout: Duration) -> Result<Self, RedisError> {
            debug!("Connecting to Redis session cache");
            let client = Client::open(url)?;
            let conn = ConnectionManager::new(client).await?;
            Ok(Self { conn, op_timeout })
        }

        /// Bound a cache call so a stalled store fails the request instead
        /// of hanging it.
        async fn bounded<T, F>(&self, op: &'static str, fut: F) -> AppResult<T>
        where
            F: Future<Output = Result<T, RedisError>>,
        {
            match tokio::time::timeout(self.op_timeout, fut).await {
                Ok(Ok(value)) => Ok(value),
                Ok(Err(e)) => {
                    warn!(operation = op, error = %e, "Session cache call failed");
                    Err(AppError::Cache(e))
                }
                Err(_) => {
                    warn!(operation = op, "Session cache call timed out");
                    Err(AppError::unavailable(format!("session cache {} timed out", op)))
                }
            }
        }
    }

    #[async_trait]
    impl SessionCache for RedisSessionCache {
        async fn get(&self, key: &str) -> AppResult<Option<String>> {
            let mut conn = self.conn.clone();
            self.bounded("get", async move { conn.get::<_, Option<String>>(key).await })
                .await
        }

        async fn put(&self, key: &str, value: &str, ttl: Duration) -> AppResult<()> {
            let mut conn = self.conn.clone();
            let seconds = ttl_seconds(ttl);
            self.bounded("put", async move {
                conn.set_ex::<_, _, ()>(key, value, seconds).await
            })
            .await
        }

        async fn delete(&self, key: &str) -> AppResult<()> {
            let mut conn = self.conn.clone();
            self.bounded("delete", async move { conn.del::<_, ()>(key).await })
                .await
        }

        async fn set_if_absent(&self, key: &str, value: &str, ttl: Duration) -> AppResult<bool> {
            let mut conn = self.conn.clone();
            let seconds = ttl_seconds(ttl);
            self.bounded("set_if_absent", async move {
                let stored: Option<String> = redis::cmd("SET")
                    .arg(key)
                    .arg(value)
                    .arg("NX")
                    .arg("EX")
                    .arg(seconds)
                    .query_async(&mut conn)
                    .await?;
                Ok(stored.is_some())
            })
            .await
        }

        async fn compare_and_swap(
            &self,
            key: &str,
            expected: &str,
            new: &str,
            ttl: Duration,
        ) -> AppResult<bool> {
            let mut conn = self.conn.clone();
            let seconds = ttl_seconds(ttl);
            self.bounded("compare_and_swap", async move {
                let swapped: i64 = redis::Script::new(COMPARE_AND_SWAP_SCRIPT)
                    .key(key)
                    .arg(expected)
                    .arg(new)
                    .arg(seconds)
                    .invoke_async(&mut conn)
                    .await?;
                Ok(swapped == 1)
            })
            .await
        }

        async fn ping(&self) -> AppResult<()> {
            let mut conn = self.conn.clone();
            self.bounded("ping", async move {
                let _: String = redis::cmd("PING").query_async(&mut conn).await?;
                Ok(())
            })
            .await
        }
    }
}

#[cfg(any(test, feature = "test-utils"))]
pub use self::memory::MemorySessionCache;

#[cfg(any(test, feature = "test-utils"))]
mod memory {
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Mutex;
    use std::time::{Duration, Instant};

    use async_trait::async_trait;

    use super::SessionCache;
    use crate::error::{AppError, AppResult};

    /// In-process stand-in for tests. Never wired into a running service.
    #[derive(Default)]
    pub struct MemorySessionCache {
        entries: Mutex<HashMap<String, (String, Instant)>>,
        offline: AtomicBool,
        failing_writes: Mutex<Option<String>>,
    }

    impl MemorySessionCache {
        pub fn new() -> Self {
            Self::default()
        }

        /// Simulate the store becoming unreachable.
        pub fn set_offline(&self, offline: bool) {
            self.offline.store(offline, Ordering::SeqCst);
        }

        /// Fail writes to keys starting with `prefix` while reads and other
        /// writes keep working. `None` heals the store.
        pub fn fail_writes_to(&self, prefix: Option<&str>) {
            *self
                .failing_writes
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner()) = prefix.map(str::to_string);
        }

        /// Number of live entries whose key starts with `prefix`.
        pub fn count_prefix(&self, prefix: &str) -> usize {
            let now = Instant::now();
            self.lock()
                .iter()
                .filter(|(k, (_, exp))| k.starts_with(prefix) && *exp > now)
                .count()
        }

        fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, (String, Instant)>> {
            self.entries
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner())
        }

        fn check_online(&self) -> AppResult<()> {
            if self.offline.load(Ordering::SeqCst) {
                Err(AppError::unavailable("memory session cache offline"))
            } else {
                Ok(())
            }
        }

        fn check_writable(&self, key: &str) -> AppResult<()> {
            self.check_online()?;
            let failing = self
                .failing_writes
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            match failing.as_deref() {
                Some(prefix) if key.starts_with(prefix) => {
                    Err(AppError::unavailable("memory session cache write failed"))
                }
                _ => Ok(()),
            }
        }

        fn live(
            entries: &HashMap<String, (String, Instant)>,
            key: &str,
        ) -> Option<String> {
            entries
                .get(key)
                .filter(|(_, exp)| *exp > Instant::now())
                .map(|(v, _)| v.clone())
        }
    }

    #[async_trait]
    impl SessionCache for MemorySessionCache {
        async fn get(&self, key: &str) -> AppResult<Option<String>> {
            self.check_online()?;
            Ok(Self::live(&self.lock(), key))
        }

        async fn put(&self, key: &str, value: &str, ttl: Duration) -> AppResult<()> {
            self.check_writable(key)?;
            self.lock()
                .insert(key.to_string(), (value.to_string(), Instant::now() + ttl));
            Ok(())
        }

        async fn delete(&self, key: &str) -> AppResult<()> {
            self.check_writable(key)?;
            self.lock().remove(key);
            Ok(())
        }

        async fn set_if_absent(&self, key: &str, value: &str, ttl: Duration) -> AppResult<bool> {
            self.check_writable(key)?;
            let mut entries = self.lock();
            if Self::live(&entries, key).is_some() {
                return Ok(false);
            }
            entries.insert(key.to_string(), (value.to_string(), Instant::now() + ttl));
            Ok(true)
        }

        async fn compare_and_swap(
            &self,
            key: &str,
            expected: &str,
            new: &str,
            ttl: Duration,
        ) -> AppResult<bool> {
            self.check_writable(key)?;
            let mut entries = self.lock();
            match Self::live(&entries, key) {
                Some(current) if current == expected => {
                    entries.insert(key.to_string(), (new.to_string(), Instant::now() + ttl));
                    Ok(true)
                }
                _ => Ok(false),
            }
        }

        async fn ping(&self) -> AppResult<()> {
            self.check_online()
        }
    }
}
