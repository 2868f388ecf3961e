use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;
use tokio::time::Instant;

use crate::models::TopList;

struct CacheEntry {
    list: Arc<TopList>,
    expires_at: Instant,
}

impl CacheEntry {
    fn new(list: Arc<TopList>, ttl: Duration) -> Self {
        Self {
            list,
            expires_at: Instant::now() + ttl,
        }
    }

    fn live(&self) -> Option<&Arc<TopList>> {
        (Instant::now() < self.expires_at).then_some(&self.list)
    }
}

/// The most recently built list of top stories, valid until its TTL runs out.
///
/// There is a single slot. Writers replace it whole, readers get a shared
/// handle to the published list and never see it change.
#[derive(Default)]
pub struct StoriesCache {
    slot: RwLock<Option<CacheEntry>>,
}

impl StoriesCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached list, unless nothing was stored yet or the entry expired.
    pub fn get(&self) -> Option<Arc<TopList>> {
        // The slot is only ever replaced whole, so a poisoned lock still holds a usable entry
        let slot = self.slot.read().unwrap_or_else(PoisonError::into_inner);
        slot.as_ref().and_then(CacheEntry::live).cloned()
    }

    pub fn set(&self, list: Arc<TopList>, ttl: Duration) {
        *self.slot.write().unwrap_or_else(PoisonError::into_inner) = Some(CacheEntry::new(list, ttl));
    }

    /// Stores `list` only if the slot holds nothing live, and returns whichever
    /// list is live afterwards. A live entry was published after this list's
    /// build started, so it is the newer one.
    pub fn set_if_cold(&self, list: Arc<TopList>, ttl: Duration) -> Arc<TopList> {
        let mut slot = self.slot.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(current) = slot.as_ref().and_then(CacheEntry::live) {
            return Arc::clone(current);
        }
        *slot = Some(CacheEntry::new(Arc::clone(&list), ttl));
        list
    }

    pub fn is_warm(&self) -> bool {
        self.get().is_some()
    }
}
