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

//! `Group`: the read-through cache namespace that composes the bounded LRU,
//! the single-flight coalescer, and (optionally) a peer picker around a
//! user-supplied loader.

use std::collections::HashMap;
use std::sync::{Arc, LazyLock, OnceLock, RwLock};
use std::time::Instant;

use meshcache_common::{ByteView, Error, SharedError};

use crate::concurrent_cache::ConcurrentCache;
use crate::loader::Loader;
use crate::metrics::{EvictionMetricsListener, GroupMetrics};
use crate::peer::{PeerGetter, PeerPicker};
use crate::single_flight::SingleFlight;

/// Process-wide `name -> Group` registry. Mutated only by [`new_group`];
/// reads (`get_group`) never block behind other reads.
static REGISTRY: LazyLock<RwLock<HashMap<String, Arc<Group>>>> =
    LazyLock::new(|| RwLock::new(HashMap::new()));

/// A cache namespace: a byte-bounded LRU fed by a user loader, with
/// concurrent misses for the same key coalesced into a single load.
pub struct Group {
    name: String,
    loader: Arc<dyn Loader>,
    cache: ConcurrentCache<ByteView>,
    picker: OnceLock<Arc<dyn PeerPicker>>,
    flight: SingleFlight<ByteView>,
    metrics: GroupMetrics,
}

/// Typed configuration for [`new_group_with_config`], for callers (such as
/// `meshcache-cli`) that build it up from CLI flags rather than passing
/// positional arguments.
#[derive(Debug, Clone)]
pub struct GroupConfig {
    pub name: String,
    pub max_bytes: usize,
}

impl GroupConfig {
    pub fn new(name: impl Into<String>, max_bytes: usize) -> Self {
        Self { name: name.into(), max_bytes }
    }
}

/// Creates and registers a new [`Group`].
///
/// This is a fatal, fail-fast programming error if `name` is already
/// registered — groups are not meant to be redefined at runtime.
pub fn new_group(name: impl Into<String>, max_bytes: usize, loader: Arc<dyn Loader>) -> Arc<Group> {
    let name = name.into();
    let metrics = GroupMetrics::new(name.clone());
    let cache = ConcurrentCache::with_listener(
        max_bytes,
        Arc::new(EvictionMetricsListener::new(metrics.clone())),
    );
    let group = Arc::new(Group {
        loader,
        cache,
        picker: OnceLock::new(),
        flight: SingleFlight::new(),
        metrics,
        name: name.clone(),
    });

    let mut registry = REGISTRY.write().expect("group registry poisoned");
    if registry.contains_key(&name) {
        panic!("meshcache: group {name:?} already registered");
    }
    registry.insert(name, group.clone());
    group
}

/// Equivalent to [`new_group`], taking a [`GroupConfig`].
pub fn new_group_with_config(config: GroupConfig, loader: Arc<dyn Loader>) -> Arc<Group> {
    new_group(config.name, config.max_bytes, loader)
}

/// Looks up a previously-registered group by name.
pub fn get_group(name: &str) -> Option<Arc<Group>> {
    REGISTRY.read().expect("group registry poisoned").get(name).cloned()
}

impl Group {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Installs the peer picker used to route misses to remote owners.
    ///
    /// Fatal if called a second time: a `Group`'s topology view is meant to
    /// be wired up once, at startup.
    pub fn register_peer_picker(&self, picker: Arc<dyn PeerPicker>) {
        if self.picker.set(picker).is_err() {
            panic!("meshcache: RegisterPeerPicker called more than once on group {:?}", self.name);
        }
    }

    /// Reads `key`, consulting the local cache first and falling through to
    /// a coalesced load (possibly via a remote peer) on miss.
    pub async fn get(self: &Arc<Self>, key: &str) -> Result<ByteView, SharedError> {
        if key.is_empty() {
            return Err(SharedError::new(Error::invalid_argument("key is required")));
        }

        if let Some(view) = self.cache.get(key) {
            tracing::trace!(group = %self.name, key, "cache hit");
            self.metrics.record_local_hit();
            return Ok(view);
        }
        self.metrics.record_local_miss();

        let this = self.clone();
        let owned_key = key.to_string();
        let metrics = self.metrics.clone();
        self.flight
            .run_with(
                key,
                move || {
                    let this = this.clone();
                    async move { this.load(&owned_key).await }
                },
                move || metrics.record_singleflight_coalesced(),
            )
            .await
    }

    /// Routes a coalesced miss: remote peer first if one owns the key and a
    /// picker is installed, otherwise (or on peer failure) the local loader.
    async fn load(&self, key: &str) -> Result<ByteView, Error> {
        if let Some(picker) = self.picker.get() {
            if let Some(peer) = picker.pick(key) {
                match peer.get(&self.name, key).await {
                    Ok(bytes) => {
                        self.metrics.record_peer_fetch(true);
                        // Remote population is intentionally skipped: the
                        // owning peer is authoritative for this key, and
                        // caching it here too would duplicate it across the
                        // cluster without bound.
                        return Ok(ByteView::new(bytes));
                    }
                    Err(err) => {
                        tracing::warn!(group = %self.name, key, error = %err, "peer fetch failed, falling back to local loader");
                        self.metrics.record_peer_fetch(false);
                    }
                }
            }
        }
        self.get_locally(key).await
    }

    async fn get_locally(&self, key: &str) -> Result<ByteView, Error> {
        let start = Instant::now();
        match self.loader.load(key).await {
            Ok(bytes) => {
                self.metrics.record_loader_invocation(start.elapsed());
                let view = ByteView::new(bytes);
                self.cache.add(key.to_string(), view.clone());
                Ok(view)
            }
            Err(err) => {
                self.metrics.record_loader_failure();
                Err(err)
            }
        }
    }
}
