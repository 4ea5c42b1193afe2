use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::SystemTime;

use tracing::{debug, info, warn};

type RevokedMap = HashMap<String, (SystemTime, SystemTime)>;

/// Revocation list for issued tokens
///
/// Maps a token id (`jti`) to its natural expiry and the time it was revoked.
/// Entries past their expiry can be dropped since the token would be
/// rejected anyway. Clones share the same list.
///
/// The list has a size cap. When full, expired entries are pruned first and
/// then the oldest revocations.
#[derive(Debug, Clone)]
pub struct TokenBlacklist {
    revoked_tokens: Arc<Mutex<RevokedMap>>,
    max_size: usize,
}

impl Default for TokenBlacklist {
    fn default() -> Self {
        Self::new()
    }
}

impl TokenBlacklist {
    /// Create a list holding up to 10,000 entries
    pub fn new() -> Self {
        Self::with_max_size(10_000)
    }

    /// Create a list with a custom size cap
    pub fn with_max_size(max_size: usize) -> Self {
        Self {
            revoked_tokens: Arc::new(Mutex::new(HashMap::new())),
            max_size: max_size.max(1),
        }
    }

    // A poisoned lock still holds a usable map
    fn tokens(&self) -> MutexGuard<'_, RevokedMap> {
        self.revoked_tokens.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Revoke `token_id` until `expiration`
    pub fn revoke_token(&self, token_id: &str, expiration: SystemTime) {
        let revocation_time = SystemTime::now();
        let mut tokens = self.tokens();

        if tokens.len() >= self.max_size {
            warn!("Token blacklist reached max size ({}), performing cleanup", self.max_size);
            Self::cleanup_expired(&mut tokens);

            if tokens.len() >= self.max_size {
                Self::remove_oldest_entries(&mut tokens, (self.max_size / 2).max(1));
            }
        }

        tokens.insert(token_id.to_string(), (expiration, revocation_time));
        info!("Token revoked: {}", token_id);
    }

    /// Whether `token_id` has been revoked
    pub fn is_revoked(&self, token_id: &str) -> bool {
        self.tokens().contains_key(token_id)
    }

    /// Number of entries in the list
    pub fn size(&self) -> usize {
        self.tokens().len()
    }

    /// Remove expired entries, returning how many were dropped
    pub fn cleanup_expired_tokens(&self) -> usize {
        let mut tokens = self.tokens();
        Self::cleanup_expired(&mut tokens)
    }

    fn cleanup_expired(tokens: &mut RevokedMap) -> usize {
        let now = SystemTime::now();
        let before_count = tokens.len();

        tokens.retain(|_, (expiration, _)| *expiration > now);

        let removed = before_count - tokens.len();
        if removed > 0 {
            debug!("Removed {} expired tokens from blacklist", removed);
        }
        removed
    }

    fn remove_oldest_entries(tokens: &mut RevokedMap, count: usize) {
        let mut by_age: Vec<(String, SystemTime)> = tokens
            .iter()
            .map(|(id, (_, revoked_at))| (id.clone(), *revoked_at))
            .collect();
        by_age.sort_by(|a, b| a.1.cmp(&b.1));

        for (id, _) in by_age.into_iter().take(count) {
            tokens.remove(&id);
        }

        debug!("Removed {} oldest entries from token blacklist", count);
    }
}
