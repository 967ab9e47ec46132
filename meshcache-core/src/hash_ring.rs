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

//! A consistent-hash ring with virtual nodes.
//!
//! Membership changes (`add`/`remove`) are rare; lookups (`get`) are hot. The
//! ring is held behind an `ArcSwap` so readers take a snapshot `Arc` once per
//! call and never block on a writer — a concurrent `get` never observes a
//! half-built ring.

use std::collections::BTreeMap;
use std::sync::Arc;

use arc_swap::ArcSwap;

/// Hashes an opaque byte string to a point on the 2^32 ring.
pub type HashFn = Arc<dyn Fn(&[u8]) -> u32 + Send + Sync>;

fn crc32(data: &[u8]) -> u32 {
    crc32fast::hash(data)
}

struct Snapshot {
    /// Point -> owner, ordered ascending by point. A `BTreeMap` keeps the
    /// ring sorted for free and gives collisions their policy for free too:
    /// inserting a point that already exists simply overwrites the owner, so
    /// the later write always wins.
    owner_by_point: BTreeMap<u32, String>,
}

impl Snapshot {
    fn empty() -> Self {
        Self { owner_by_point: BTreeMap::new() }
    }
}

pub struct HashRing {
    replicas: usize,
    hash_fn: HashFn,
    snapshot: ArcSwap<Snapshot>,
}

impl HashRing {
    pub fn new(replicas: usize) -> Self {
        Self::with_hash_fn(replicas, Arc::new(crc32))
    }

    pub fn with_hash_fn(replicas: usize, hash_fn: HashFn) -> Self {
        assert!(replicas > 0, "replicas must be positive");
        Self { replicas, hash_fn, snapshot: ArcSwap::from_pointee(Snapshot::empty()) }
    }

    /// Adds virtual nodes for every name in `nodes`. Builds the whole point
    /// table once per call rather than per-node: membership change is rare,
    /// so cloning the map once here is cheaper than synchronizing per-insert.
    pub fn add(&self, nodes: impl IntoIterator<Item = impl Into<String>>) {
        let current = self.snapshot.load();
        let mut owner_by_point = current.owner_by_point.clone();

        for node in nodes {
            let node = node.into();
            for i in 0..self.replicas {
                let h = (self.hash_fn)(format!("{i}{node}").as_bytes());
                // Collision policy: later writes win, so a plain insert
                // (which overwrites any existing owner at this point) is
                // exactly the policy, with no stable-sort tie-breaking needed.
                owner_by_point.insert(h, node.clone());
            }
        }
        self.snapshot.store(Arc::new(Snapshot { owner_by_point }));
    }

    /// Drops every virtual node owned by `node`. A no-op if `node` is unknown.
    pub fn remove(&self, node: &str) {
        let current = self.snapshot.load();
        let owner_by_point: BTreeMap<u32, String> =
            current.owner_by_point.iter().filter(|(_, o)| o.as_str() != node).map(|(p, o)| (*p, o.clone())).collect();
        self.snapshot.store(Arc::new(Snapshot { owner_by_point }));
    }

    /// Returns the owner of `key` under the current ring, or `None` if the
    /// ring has no nodes.
    pub fn get(&self, key: &[u8]) -> Option<String> {
        let snapshot = self.snapshot.load();
        if snapshot.owner_by_point.is_empty() {
            return None;
        }
        let h = (self.hash_fn)(key);
        let owner = match snapshot.owner_by_point.range(h..).next() {
            Some((_, owner)) => owner,
            // Past the last point: wrap around to the ring's first point.
            None => snapshot.owner_by_point.values().next().expect("checked non-empty above"),
        };
        Some(owner.clone())
    }
}
