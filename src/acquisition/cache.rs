//! Optional memoisation of successful acquisitions.
//!
//! ## LRU eviction
//!
//! [`LruResourceCache`] keeps at most `capacity` resources. When full, the
//! least recently read or written URL is evicted. Failures are never cached.

use crate::models::Resource;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

/// Storage consulted by the acquisition service before running the chain.
pub trait ResourceCache: Send + Sync {
    fn get(&self, url: &str) -> Option<Resource>;
    fn put(&self, url: &str, resource: Resource);
}

#[derive(Debug, Default)]
struct LruState {
    entries: HashMap<String, Resource>,
    /// Least recently used at the front.
    order: VecDeque<String>,
}

impl LruState {
    fn touch(&mut self, url: &str) {
        if let Some(pos) = self.order.iter().position(|u| u == url) {
            if let Some(key) = self.order.remove(pos) {
                self.order.push_back(key);
            }
        }
    }
}

/// Bounded in-memory cache with least-recently-used eviction.
#[derive(Debug)]
pub struct LruResourceCache {
    capacity: usize,
    state: Mutex<LruState>,
}

impl LruResourceCache {
    /// `capacity` is clamped to at least one entry.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            state: Mutex::new(LruState::default()),
        }
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.state.lock().map(|s| s.entries.len()).unwrap_or(0)
    }
}

impl ResourceCache for LruResourceCache {
    fn get(&self, url: &str) -> Option<Resource> {
        let mut state = self.state.lock().ok()?;
        let hit = state.entries.get(url).cloned();
        if hit.is_some() {
            state.touch(url);
        }
        hit
    }

    fn put(&self, url: &str, resource: Resource) {
        let Ok(mut state) = self.state.lock() else {
            return;
        };

        if state.entries.insert(url.to_string(), resource).is_some() {
            state.touch(url);
            return;
        }

        state.order.push_back(url.to_string());
        while state.order.len() > self.capacity {
            if let Some(evicted) = state.order.pop_front() {
                state.entries.remove(&evicted);
            }
        }
    }
}
