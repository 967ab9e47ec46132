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

//! A single-threaded, byte-budgeted LRU cache.
//!
//! The recency order is a doubly-linked list realized as an arena
//! (`Vec<Option<Node<V>>>` plus a free list) addressed by `index: HashMap<key,
//! slot>`, so promotion and eviction are O(1) without raw pointers.

use std::collections::HashMap;
use std::sync::Arc;

use meshcache_common::Measurable;

/// Receives a callback for every entry the LRU evicts.
///
/// Called synchronously from the `add`/`remove_oldest` call that caused the
/// eviction. A panicking listener propagates — the LRU performs no rollback.
pub trait CacheEventListener<V>: Send + Sync + 'static {
    fn on_evict(&self, key: &str, value: &V);
}

/// A listener that does nothing, for callers that don't need eviction notifications.
#[derive(Debug, Default)]
pub struct DefaultCacheEventListener;

impl<V> CacheEventListener<V> for DefaultCacheEventListener {
    fn on_evict(&self, _key: &str, _value: &V) {}
}

struct Node<V> {
    key: String,
    value: V,
    prev: Option<usize>,
    next: Option<usize>,
}

/// Non-thread-safe, byte-budgeted LRU cache. See `ConcurrentCache` for a
/// mutex-guarded wrapper safe to share across tasks.
pub struct Lru<V> {
    max_bytes: usize,
    used_bytes: usize,
    nodes: Vec<Option<Node<V>>>,
    free: Vec<usize>,
    index: HashMap<String, usize>,
    front: Option<usize>,
    back: Option<usize>,
    listener: Option<Arc<dyn CacheEventListener<V>>>,
}

impl<V> Lru<V> {
    /// `max_bytes == 0` disables byte-budget eviction.
    pub fn new(max_bytes: usize) -> Self {
        Self {
            max_bytes,
            used_bytes: 0,
            nodes: Vec::new(),
            free: Vec::new(),
            index: HashMap::new(),
            front: None,
            back: None,
            listener: None,
        }
    }

    pub fn with_listener(max_bytes: usize, listener: Arc<dyn CacheEventListener<V>>) -> Self {
        let mut lru = Self::new(max_bytes);
        lru.listener = Some(listener);
        lru
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn used_bytes(&self) -> usize {
        self.used_bytes
    }

    pub fn max_bytes(&self) -> usize {
        self.max_bytes
    }

    pub fn contains(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    /// Looks up `key`, promoting it to the front of the recency order on hit.
    pub fn get(&mut self, key: &str) -> Option<&V> {
        let idx = *self.index.get(key)?;
        self.detach(idx);
        self.push_front(idx);
        Some(&self.nodes[idx].as_ref().unwrap().value)
    }

    /// Inserts or updates `key`, then evicts from the tail while over budget.
    pub fn add(&mut self, key: impl Into<String>, value: V)
    where
        V: Measurable,
    {
        let key = key.into();
        if let Some(&idx) = self.index.get(&key) {
            let node = self.nodes[idx].as_mut().unwrap();
            let old_len = node.value.len();
            let new_len = value.len();
            node.value = value;
            if new_len >= old_len {
                self.used_bytes += new_len - old_len;
            } else {
                self.used_bytes -= old_len - new_len;
            }
            self.detach(idx);
            self.push_front(idx);
        } else {
            let weight = key.len() + value.len();
            let idx = self.alloc(key.clone(), value);
            self.index.insert(key, idx);
            self.push_front(idx);
            self.used_bytes += weight;
        }

        while self.max_bytes != 0 && self.used_bytes > self.max_bytes {
            if !self.remove_oldest() {
                break;
            }
        }
    }

    /// Removes the least-recently-used entry, firing the eviction listener.
    /// Returns whether an entry was removed (false on an empty cache).
    pub fn remove_oldest(&mut self) -> bool
    where
        V: Measurable,
    {
        let Some(idx) = self.back else {
            return false;
        };
        self.detach(idx);
        let node = self.nodes[idx].take().expect("back index always populated");
        self.free.push(idx);
        self.index.remove(&node.key);
        let weight = node.key.len() + node.value.len();
        self.used_bytes -= weight;
        if let Some(listener) = &self.listener {
            listener.on_evict(&node.key, &node.value);
        }
        true
    }

    fn alloc(&mut self, key: String, value: V) -> usize {
        let node = Node { key, value, prev: None, next: None };
        if let Some(idx) = self.free.pop() {
            self.nodes[idx] = Some(node);
            idx
        } else {
            self.nodes.push(Some(node));
            self.nodes.len() - 1
        }
    }

    fn detach(&mut self, idx: usize) {
        let (prev, next) = {
            let node = self.nodes[idx].as_ref().unwrap();
            (node.prev, node.next)
        };
        match prev {
            Some(p) => self.nodes[p].as_mut().unwrap().next = next,
            None => self.front = next,
        }
        match next {
            Some(n) => self.nodes[n].as_mut().unwrap().prev = prev,
            None => self.back = prev,
        }
    }

    fn push_front(&mut self, idx: usize) {
        let old_front = self.front;
        {
            let node = self.nodes[idx].as_mut().unwrap();
            node.prev = None;
            node.next = old_front;
        }
        match old_front {
            Some(f) => self.nodes[f].as_mut().unwrap().prev = Some(idx),
            None => self.back = Some(idx),
        }
        self.front = Some(idx);
    }
}
