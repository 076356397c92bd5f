//! Short-lived storage for uploaded documents.
//!
//! A blob lives only as long as the request that staged it. Callers hold a
//! [`StagedBlob`] and release it when done; a guard dropped without release
//! (for example a cancelled request) schedules the eviction itself. Expiry
//! is the backstop, enforced on read and by a periodic sweep.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Blob not found: {0}")]
    NotFound(String),

    #[error("Invalid blob: {0}")]
    Invalid(String),

    #[error("Blob store failure: {0}")]
    Store(String),
}

/// `file:{owner_id}:{unix_millis}-{sequence}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BlobKey(String);

impl BlobKey {
    const PREFIX: &'static str = "file:";

    fn new(owner_id: &str, millis: i64, sequence: u64) -> Self {
        Self(format!("{}{owner_id}:{millis}-{sequence}", Self::PREFIX))
    }

    pub fn parse(raw: &str) -> Option<Self> {
        let rest = raw.strip_prefix(Self::PREFIX)?;
        let (owner, stamp) = rest.rsplit_once(':')?;
        let (millis, sequence) = stamp.split_once('-')?;
        if owner.is_empty() || millis.parse::<i64>().is_err() || sequence.parse::<u64>().is_err() {
            return None;
        }
        Some(Self(raw.to_string()))
    }

    pub fn owner_id(&self) -> &str {
        let rest = &self.0[Self::PREFIX.len()..];
        rest.rsplit_once(':').map_or(rest, |(owner, _)| owner)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BlobKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Backing storage with per-entry expiry.
#[async_trait]
pub trait BlobStore: Send + Sync {
    async fn put(&self, key: &str, bytes: Vec<u8>, ttl: Duration) -> Result<(), CacheError>;

    /// `None` when absent or expired.
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError>;

    async fn remove(&self, key: &str) -> Result<(), CacheError>;

    /// Drop expired entries, returning how many were removed.
    async fn purge_expired(&self) -> Result<usize, CacheError>;
}

struct Entry {
    bytes: Vec<u8>,
    expires_at: Instant,
}

/// Process-local [`BlobStore`].
#[derive(Default)]
pub struct MemoryBlobStore {
    entries: Mutex<HashMap<String, Entry>>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Entries currently held, expired or not.
    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn put(&self, key: &str, bytes: Vec<u8>, ttl: Duration) -> Result<(), CacheError> {
        let entry = Entry {
            bytes,
            expires_at: Instant::now() + ttl,
        };
        self.entries.lock().await.insert(key.to_string(), entry);
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        let mut entries = self.entries.lock().await;
        match entries.get(key) {
            Some(entry) if entry.expires_at > Instant::now() => Ok(Some(entry.bytes.clone())),
            Some(_) => {
                entries.remove(key);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn remove(&self, key: &str) -> Result<(), CacheError> {
        self.entries.lock().await.remove(key);
        Ok(())
    }

    async fn purge_expired(&self) -> Result<usize, CacheError> {
        let now = Instant::now();
        let mut entries = self.entries.lock().await;
        let before = entries.len();
        entries.retain(|_, entry| entry.expires_at > now);
        Ok(before - entries.len())
    }
}

/// Keyed, TTL-bounded staging area for uploaded bytes.
#[derive(Clone)]
pub struct TemporaryBlobCache {
    store: Arc<dyn BlobStore>,
    sequence: Arc<AtomicU64>,
}

impl TemporaryBlobCache {
    pub fn new(store: Arc<dyn BlobStore>) -> Self {
        Self {
            store,
            sequence: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryBlobStore::new()))
    }

    pub async fn store(
        &self,
        owner_id: &str,
        bytes: Vec<u8>,
        ttl: Duration,
    ) -> Result<BlobKey, CacheError> {
        if owner_id.trim().is_empty() {
            return Err(CacheError::Invalid("owner id must not be empty".into()));
        }
        if bytes.is_empty() {
            return Err(CacheError::Invalid("blob must not be empty".into()));
        }
        if ttl.is_zero() {
            return Err(CacheError::Invalid("ttl must be positive".into()));
        }

        let sequence = self.sequence.fetch_add(1, Ordering::Relaxed);
        let key = BlobKey::new(owner_id, chrono::Utc::now().timestamp_millis(), sequence);
        let size = bytes.len();
        self.store.put(key.as_str(), bytes, ttl).await?;

        debug!(%key, size, ttl_secs = ttl.as_secs(), "Blob stored");
        Ok(key)
    }

    pub async fn fetch(&self, key: &BlobKey) -> Result<Vec<u8>, CacheError> {
        self.store
            .get(key.as_str())
            .await?
            .ok_or_else(|| CacheError::NotFound(key.to_string()))
    }

    /// Idempotent. Storage failures are logged, never returned.
    pub async fn evict(&self, key: &BlobKey) {
        match self.store.remove(key.as_str()).await {
            Ok(()) => debug!(%key, "Blob evicted"),
            Err(e) => warn!(%key, error = %e, "Failed to evict blob, leaving it to expire"),
        }
    }

    /// Store and wrap the key in a guard that guarantees eviction.
    pub async fn stage(
        &self,
        owner_id: &str,
        bytes: Vec<u8>,
        ttl: Duration,
    ) -> Result<StagedBlob, CacheError> {
        let key = self.store(owner_id, bytes, ttl).await?;
        Ok(StagedBlob {
            cache: self.clone(),
            key,
            released: false,
        })
    }

    /// Periodically purge expired entries.
    pub fn spawn_sweeper(&self, every: Duration) -> JoinHandle<()> {
        let store = Arc::clone(&self.store);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            loop {
                ticker.tick().await;
                match store.purge_expired().await {
                    Ok(0) => {}
                    Ok(purged) => debug!(purged, "Expired blobs swept"),
                    Err(e) => warn!(error = %e, "Blob sweep failed"),
                }
            }
        })
    }
}

/// A stored blob that is evicted when released or dropped.
pub struct StagedBlob {
    cache: TemporaryBlobCache,
    key: BlobKey,
    released: bool,
}

impl StagedBlob {
    pub fn key(&self) -> &BlobKey {
        &self.key
    }

    pub async fn fetch(&self) -> Result<Vec<u8>, CacheError> {
        self.cache.fetch(&self.key).await
    }

    pub async fn release(mut self) {
        self.cache.evict(&self.key).await;
        self.released = true;
    }
}

impl Drop for StagedBlob {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                let cache = self.cache.clone();
                let key = self.key.clone();
                handle.spawn(async move { cache.evict(&key).await });
            }
            Err(_) => warn!(key = %self.key, "No runtime to evict staged blob, leaving it to expire"),
        }
    }
}
