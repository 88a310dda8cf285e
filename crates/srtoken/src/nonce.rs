//! Nonce cache for replay detection
//!
//! The cache is the only shared mutable state in the crate. [`NonceCache::check_and_insert`]
//! must be atomic per nonce: of two concurrent calls with the same nonce exactly
//! one returns `true`.

use std::sync::atomic::{AtomicUsize, Ordering};

use dashmap::{DashMap, mapref::entry::Entry};
use tracing::{debug, warn};

use crate::{Result, config::NonceCacheConfig, errors::TokenError};

/// Store of nonces already accepted
pub trait NonceCache: Send + Sync + std::fmt::Debug {
    /// Record `nonce` until `expires_at` if it has not been seen
    ///
    /// Returns `Ok(true)` when the nonce was fresh and is now recorded,
    /// `Ok(false)` when it was already present.
    ///
    /// # Errors
    /// Implementations that cannot record the nonce must fail rather than report
    /// it as fresh.
    fn check_and_insert(&self, nonce: &str, expires_at: u64, now: u64) -> Result<bool>;

    /// Drop entries whose token has expired, returning how many were removed
    fn purge_expired(&self, now: u64) -> usize;

    /// Number of recorded nonces
    fn len(&self) -> usize;

    /// Whether the cache is empty
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// In-memory nonce cache backed by a sharded concurrent map
///
/// Each nonce is kept until the expiry of the token that carried it; after that
/// the token itself is rejected as expired, so the entry is no longer needed.
///
/// `max_entries` is a hard bound: a slot is reserved in `live` before the entry
/// is written, so concurrent inserts of distinct nonces cannot overshoot it.
#[derive(Debug)]
pub struct MemoryNonceCache {
    entries: DashMap<String, u64>,
    live: AtomicUsize,
    max_entries: usize,
}

impl MemoryNonceCache {
    /// Create a cache with default capacity
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(NonceCacheConfig::default())
    }

    /// Create a cache from configuration
    #[must_use]
    pub fn with_config(config: NonceCacheConfig) -> Self {
        Self {
            entries: DashMap::new(),
            live: AtomicUsize::new(0),
            max_entries: config.max_entries,
        }
    }

    /// Configured capacity
    #[must_use]
    pub fn max_entries(&self) -> usize {
        self.max_entries
    }
}

impl Default for MemoryNonceCache {
    fn default() -> Self {
        Self::new()
    }
}

impl NonceCache for MemoryNonceCache {
    fn check_and_insert(&self, nonce: &str, expires_at: u64, now: u64) -> Result<bool> {
        // Purging needs every shard, so it runs before the entry lock is taken
        if self.live.load(Ordering::Acquire) >= self.max_entries {
            self.purge_expired(now);
        }

        match self.entries.entry(nonce.to_string()) {
            Entry::Occupied(_) => Ok(false),
            Entry::Vacant(slot) => {
                if self.live.fetch_add(1, Ordering::AcqRel) >= self.max_entries {
                    self.live.fetch_sub(1, Ordering::AcqRel);
                    warn!(
                        max_entries = self.max_entries,
                        "Nonce cache full, refusing to record nonce"
                    );
                    return Err(TokenError::Internal {
                        reason: "nonce cache full".to_string(),
                    });
                }
                slot.insert(expires_at);
                Ok(true)
            }
        }
    }

    fn purge_expired(&self, now: u64) -> usize {
        let mut purged = 0;
        self.entries.retain(|_, expires_at| {
            let live = *expires_at > now;
            if !live {
                purged += 1;
            }
            live
        });
        self.live.fetch_sub(purged, Ordering::AcqRel);
        if purged > 0 {
            debug!(purged, "Purged expired nonces");
        }
        purged
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}
