use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::repository::RepositoryError;

#[derive(Debug, Clone)]
struct CachedCode {
    code: String,
    expires_at: Instant,
    failed_attempts: u32,
}

/// Outcome of checking a submitted code against the cache
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodeCheck {
    /// No live code under the key
    Missing,
    /// Wrong code; the entry is kept while attempts remain
    Mismatch,
    /// Wrong code and the attempt limit was reached, so the entry is gone
    Exhausted,
    /// The submitted code matches
    Matched,
}

/// Expiring key/value store for verification codes
///
/// Clones share the same underlying map.
#[derive(Debug, Clone, Default)]
pub struct CodeCache {
    entries: Arc<Mutex<HashMap<String, CachedCode>>>,
}

impl CodeCache {
    /// Create an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `code` under `key`, replacing any previous value and its
    /// failed attempts. Expired entries are swept on the way.
    pub async fn put(&self, key: &str, code: &str, ttl: Duration) -> Result<(), RepositoryError> {
        let now = Instant::now();
        let expires_at = now
            .checked_add(ttl)
            .ok_or_else(|| RepositoryError::Invalid(format!("code lifetime out of range: {:?}", ttl)))?;

        let mut entries = self.entries.lock()?;
        entries.retain(|_, entry| entry.expires_at > now);
        entries.insert(
            key.to_string(),
            CachedCode {
                code: code.to_string(),
                expires_at,
                failed_attempts: 0,
            },
        );
        debug!("Cached code under {} for {}s", key, ttl.as_secs());
        Ok(())
    }

    /// Read the code under `key`. Expired entries are evicted and read as absent.
    pub async fn get(&self, key: &str) -> Result<Option<String>, RepositoryError> {
        let mut entries = self.entries.lock()?;
        match entries.get(key) {
            Some(entry) if entry.expires_at > Instant::now() => Ok(Some(entry.code.clone())),
            Some(_) => {
                entries.remove(key);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    /// Compare `code` with the entry under `key`
    ///
    /// A mismatch counts against the entry, which is dropped once
    /// `max_attempts` wrong codes have been submitted.
    pub async fn verify(&self, key: &str, code: &str, max_attempts: u32) -> Result<CodeCheck, RepositoryError> {
        let mut entries = self.entries.lock()?;
        let Some(entry) = entries.get_mut(key) else {
            return Ok(CodeCheck::Missing);
        };
        if entry.expires_at <= Instant::now() {
            entries.remove(key);
            return Ok(CodeCheck::Missing);
        }

        if entry.code == code {
            return Ok(CodeCheck::Matched);
        }

        entry.failed_attempts += 1;
        if entry.failed_attempts >= max_attempts {
            entries.remove(key);
            warn!("Dropped code under {} after {} wrong attempts", key, max_attempts);
            return Ok(CodeCheck::Exhausted);
        }
        Ok(CodeCheck::Mismatch)
    }

    /// Drop the code under `key`, if any
    pub async fn remove(&self, key: &str) -> Result<(), RepositoryError> {
        let mut entries = self.entries.lock()?;
        entries.remove(key);
        Ok(())
    }

    /// Number of entries currently held, expired ones included
    pub fn len(&self) -> usize {
        self.entries.lock().map(|entries| entries.len()).unwrap_or(0)
    }

    /// `true` when no entries are held
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_put_get_remove() {
        let cache = CodeCache::new();
        cache.put("verify:email:data:a@b.com", "123456", Duration::from_secs(60)).await.unwrap();

        assert_eq!(
            cache.get("verify:email:data:a@b.com").await.unwrap().as_deref(),
            Some("123456")
        );

        cache.remove("verify:email:data:a@b.com").await.unwrap();
        assert!(cache.get("verify:email:data:a@b.com").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_put_overwrites() {
        let cache = CodeCache::new();
        cache.put("k", "111111", Duration::from_secs(60)).await.unwrap();
        cache.put("k", "222222", Duration::from_secs(60)).await.unwrap();
        assert_eq!(cache.get("k").await.unwrap().as_deref(), Some("222222"));
    }

    #[tokio::test]
    async fn test_expired_entry_reads_as_absent() {
        let cache = CodeCache::new();
        cache.put("k", "123456", Duration::ZERO).await.unwrap();
        assert!(cache.get("k").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_put_sweeps_expired_entries() {
        let cache = CodeCache::new();
        cache.put("verify:phone:data:13800000000", "111111", Duration::ZERO).await.unwrap();
        cache.put("verify:email:data:old@b.com", "222222", Duration::ZERO).await.unwrap();
        assert_eq!(cache.len(), 1);

        cache.put("verify:email:data:new@b.com", "333333", Duration::from_secs(60)).await.unwrap();
        assert_eq!(cache.len(), 1);
        assert_eq!(
            cache.get("verify:email:data:new@b.com").await.unwrap().as_deref(),
            Some("333333")
        );
    }

    #[tokio::test]
    async fn test_out_of_range_lifetime_is_an_error() {
        let cache = CodeCache::new();
        assert!(cache.put("k", "123456", Duration::MAX).await.is_err());
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn test_verify_drops_code_after_too_many_wrong_attempts() {
        let cache = CodeCache::new();
        cache.put("k", "000777", Duration::from_secs(60)).await.unwrap();

        for _ in 0..4 {
            assert_eq!(cache.verify("k", "123456", 5).await.unwrap(), CodeCheck::Mismatch);
        }
        assert_eq!(cache.verify("k", "000777", 5).await.unwrap(), CodeCheck::Matched);
        assert_eq!(cache.verify("k", "123456", 5).await.unwrap(), CodeCheck::Exhausted);

        assert_eq!(cache.verify("k", "000777", 5).await.unwrap(), CodeCheck::Missing);
        assert!(cache.get("k").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_new_code_resets_attempts() {
        let cache = CodeCache::new();
        cache.put("k", "111111", Duration::from_secs(60)).await.unwrap();
        assert_eq!(cache.verify("k", "999999", 2).await.unwrap(), CodeCheck::Mismatch);

        cache.put("k", "222222", Duration::from_secs(60)).await.unwrap();
        assert_eq!(cache.verify("k", "999999", 2).await.unwrap(), CodeCheck::Mismatch);
        assert_eq!(cache.verify("k", "222222", 2).await.unwrap(), CodeCheck::Matched);
    }

    #[tokio::test]
    async fn test_clones_share_state() {
        let cache = CodeCache::new();
        let other = cache.clone();
        cache.put("k", "654321", Duration::from_secs(60)).await.unwrap();
        assert_eq!(other.get("k").await.unwrap().as_deref(), Some("654321"));
    }
}
