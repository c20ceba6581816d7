// src/checker/cache.rs
// =============================================================================
// Remembers the outcome of every URL checked by one checker.
//
// Each key maps to a tokio OnceCell. The first caller for a key runs the
// network check inside get_or_init(); anyone else asking for the same key
// while that check is running waits on the same cell instead of starting a
// second request. Once filled, a cell is never cleared during a run.
//
// The outer std Mutex only guards the map itself (looking up or inserting a
// cell), so checks for different URLs never wait on each other.
// =============================================================================

use crate::config::RequestMethod;
use crate::link::CheckOutcome;
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::OnceCell;
use url::Url;

type CacheKey = (RequestMethod, String);

#[derive(Clone, Default)]
pub struct UrlCache {
    entries: Arc<Mutex<HashMap<CacheKey, Arc<OnceCell<CheckOutcome>>>>>,
}

impl UrlCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached outcome for `url`, running `check` only if no
    /// other caller has resolved (or is resolving) the same key.
    pub async fn resolve<F, Fut>(&self, method: RequestMethod, url: &Url, check: F) -> CheckOutcome
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = CheckOutcome>,
    {
        let cell = {
            let mut entries = self.lock();
            Arc::clone(entries.entry(cache_key(method, url)).or_default())
        };

        if cell.initialized() {
            log::debug!("cache hit for {}", url);
        }

        cell.get_or_init(check).await.clone()
    }

    /// Returns a finished outcome without waiting or checking.
    pub fn get(&self, method: RequestMethod, url: &Url) -> Option<CheckOutcome> {
        self.lock()
            .get(&cache_key(method, url))
            .and_then(|cell| cell.get().cloned())
    }

    pub fn len(&self) -> usize {
        self.lock().values().filter(|cell| cell.initialized()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<CacheKey, Arc<OnceCell<CheckOutcome>>>> {
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

// Url::parse already lower-cases scheme and host and drops default ports;
// the fragment never reaches the server, so it is not part of the key
fn cache_key(method: RequestMethod, url: &Url) -> CacheKey {
    let mut url = url.clone();
    url.set_fragment(None);
    (method, url.into())
}
