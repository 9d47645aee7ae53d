//! Render result caching keyed by markup digest

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use sha2::{Digest, Sha256};

use crate::render::RenderResult;

type Key = [u8; 32];

/// Bounded cache of render results
///
/// Rendering is a pure function of the markup, so failures are cached as
/// readily as successes. The oldest entry is evicted once `capacity` is
/// reached.
#[derive(Debug)]
pub struct RenderCache {
    capacity: usize,
    state: Mutex<CacheState>,
}

#[derive(Debug, Default)]
struct CacheState {
    entries: HashMap<Key, RenderResult>,
    order: VecDeque<Key>,
}

impl RenderCache {
    pub fn new(capacity: usize) -> Self {
        RenderCache {
            capacity: capacity.max(1),
            state: Mutex::new(CacheState::default()),
        }
    }

    fn key(markup: &str) -> Key {
        let digest = Sha256::digest(markup.as_bytes());
        let mut key = [0u8; 32];
        key.copy_from_slice(&digest);
        key
    }

    /// Look up the result for `markup`
    pub fn get(&self, markup: &str) -> Option<RenderResult> {
        let state = self.state.lock().ok()?;
        state.entries.get(&Self::key(markup)).cloned()
    }

    /// Store the result for `markup`, evicting the oldest entry when full
    pub fn insert(&self, markup: &str, result: RenderResult) {
        let Ok(mut state) = self.state.lock() else {
            return;
        };
        let key = Self::key(markup);
        if state.entries.insert(key, result).is_none() {
            state.order.push_back(key);
        }
        while state.order.len() > self.capacity {
            if let Some(oldest) = state.order.pop_front() {
                state.entries.remove(&oldest);
            }
        }
    }

    /// Drop every cached result
    pub fn clear(&self) {
        if let Ok(mut state) = self.state.lock() {
            state.entries.clear();
            state.order.clear();
        }
    }

    pub fn len(&self) -> usize {
        self.state.lock().map(|s| s.entries.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::{RenderError, RenderedOutput};

    #[test]
    fn test_cache_roundtrip() {
        let cache = RenderCache::new(4);
        assert!(cache.get("<mjml></mjml>").is_none());

        cache.insert("<mjml></mjml>", Ok(RenderedOutput::empty()));
        assert_eq!(cache.get("<mjml></mjml>"), Some(Ok(RenderedOutput::empty())));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_cache_evicts_oldest() {
        let cache = RenderCache::new(2);
        cache.insert("a", Err(RenderError::new("a")));
        cache.insert("b", Err(RenderError::new("b")));
        cache.insert("c", Err(RenderError::new("c")));

        assert_eq!(cache.len(), 2);
        assert!(cache.get("a").is_none());
        assert!(cache.get("b").is_some());
        assert!(cache.get("c").is_some());
    }

    #[test]
    fn test_reinsert_does_not_grow() {
        let cache = RenderCache::new(2);
        cache.insert("a", Err(RenderError::new("first")));
        cache.insert("a", Err(RenderError::new("second")));
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get("a"), Some(Err(RenderError::new("second"))));

        cache.clear();
        assert!(cache.is_empty());
    }
}
