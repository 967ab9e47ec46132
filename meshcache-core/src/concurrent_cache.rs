//  Copyright 2024 MrCroxx
//
//  Licensed under the Apache License, Version 2.0 (the "License");
//  you may not use this file except in compliance with the License.
//  You may obtain a copy of the License at
//
//  http://www.apache.org/licenses/LICENSE-2.0
//
//  Unless required by applicable law or agreed to in writing, software
//  distributed under the License is distributed on an "AS IS" BASIS,
//  WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
//  See the License for the specific language governing permissions and
//  limitations under the License.

use std::sync::Arc;

use meshcache_common::Measurable;
use parking_lot::Mutex;

use crate::lru::{CacheEventListener, Lru};

/// A mutex-guarded `Lru`, safe to share across tasks.
///
/// The inner `Lru` is constructed lazily on first `add`: a cache that has
/// never been written to holds no allocated storage, which keeps declaring a
/// `Group` before first use cheap. A plain `Mutex` (not a `RwLock`) is used
/// because `get` mutates recency order, so there is no genuinely read-only path.
pub struct ConcurrentCache<V> {
    max_bytes: usize,
    listener: Option<Arc<dyn CacheEventListener<V>>>,
    inner: Mutex<Option<Lru<V>>>,
}

impl<V> ConcurrentCache<V> {
    pub fn new(max_bytes: usize) -> Self {
        Self { max_bytes, listener: None, inner: Mutex::new(None) }
    }

    pub fn with_listener(max_bytes: usize, listener: Arc<dyn CacheEventListener<V>>) -> Self {
        Self { max_bytes, listener: Some(listener), inner: Mutex::new(None) }
    }

    /// Returns a clone of the cached value on hit, without allocating the
    /// inner `Lru` if it has never been populated.
    pub fn get(&self, key: &str) -> Option<V>
    where
        V: Clone,
    {
        let mut guard = self.inner.lock();
        guard.as_mut()?.get(key).cloned()
    }

    pub fn add(&self, key: impl Into<String>, value: V)
    where
        V: Measurable,
    {
        let mut guard = self.inner.lock();
        let lru = guard.get_or_insert_with(|| match &self.listener {
            Some(listener) => Lru::with_listener(self.max_bytes, listener.clone()),
            None => Lru::new(self.max_bytes),
        });
        lru.add(key, value);
    }

    /// Number of entries currently resident; zero (and non-allocating) if
    /// nothing has ever been added.
    pub fn len(&self) -> usize {
        self.inner.lock().as_ref().map_or(0, Lru::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
