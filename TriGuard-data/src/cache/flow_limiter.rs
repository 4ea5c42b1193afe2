use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use tracing::debug;

/// Per-key cooldown limiter
///
/// A key may pass once per cooldown window. Calls made while the key is
/// still blocked do not extend the window. Each key gets its own
/// single-cell governor limiter so that a window can be handed back with
/// [`FlowLimiter::release`]. A zero cooldown admits everything.
#[derive(Clone)]
pub struct FlowLimiter {
    quota: Option<Quota>,
    windows: Arc<DashMap<String, DefaultDirectRateLimiter>>,
}

impl FlowLimiter {
    /// Create a limiter with no blocked keys
    pub fn new(cooldown: Duration) -> Self {
        Self {
            quota: Quota::with_period(cooldown),
            windows: Arc::new(DashMap::new()),
        }
    }

    /// Returns `true` and starts a new window when `key` is not blocked,
    /// `false` otherwise.
    pub fn try_acquire(&self, key: &str) -> bool {
        let Some(quota) = self.quota else {
            return true;
        };

        let admitted = self
            .windows
            .entry(key.to_string())
            .or_insert_with(|| RateLimiter::direct(quota))
            .check()
            .is_ok();

        if !admitted {
            debug!("Request limited for key {}", key);
        }
        admitted
    }

    /// Give the current window of `key` back, so its next call passes
    pub fn release(&self, key: &str) {
        if self.windows.remove(key).is_some() {
            debug!("Released limit window for key {}", key);
        }
    }

    /// Forget keys whose window has elapsed; returns how many were dropped
    pub fn prune(&self) -> usize {
        let before = self.windows.len();
        // A passing check means the window is over; the key is dropped either way
        self.windows.retain(|_, window| window.check().is_err());
        before - self.windows.len()
    }

    /// Number of keys currently tracked
    pub fn len(&self) -> usize {
        self.windows.len()
    }

    /// `true` when no keys are tracked
    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }
}

impl std::fmt::Debug for FlowLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FlowLimiter")
            .field("quota", &self.quota)
            .field("keys", &self.windows.len())
            .finish()
    }
}
