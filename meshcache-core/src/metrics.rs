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

//! Per-group counters, recorded through the `metrics` facade so whichever
//! exporter the binary installs (Prometheus, statsd, ...) picks them up.
//! Installing a recorder is the binary's job; this crate only emits.

use std::time::Duration;

use metrics::{counter, histogram};

/// Emits the counters a `Group` produces while serving reads. Cheap to
/// clone — it's just the group's name, used as a label on every series.
#[derive(Debug, Clone)]
pub struct GroupMetrics {
    group: String,
}

impl GroupMetrics {
    pub fn new(group: impl Into<String>) -> Self {
        Self { group: group.into() }
    }

    pub fn record_local_hit(&self) {
        counter!("meshcache_cache_hits_total", "group" => self.group.clone()).increment(1);
    }

    pub fn record_local_miss(&self) {
        counter!("meshcache_cache_misses_total", "group" => self.group.clone()).increment(1);
    }

    pub fn record_cache_eviction(&self) {
        counter!("meshcache_cache_evictions_total", "group" => self.group.clone()).increment(1);
    }

    pub fn record_singleflight_coalesced(&self) {
        counter!("meshcache_singleflight_coalesced_total", "group" => self.group.clone()).increment(1);
    }

    pub fn record_peer_fetch(&self, success: bool) {
        let outcome = if success { "ok" } else { "error" };
        counter!("meshcache_peer_fetches_total", "group" => self.group.clone(), "outcome" => outcome)
            .increment(1);
    }

    pub fn record_loader_invocation(&self, elapsed: Duration) {
        counter!("meshcache_loader_invocations_total", "group" => self.group.clone()).increment(1);
        histogram!("meshcache_loader_duration_seconds", "group" => self.group.clone())
            .record(elapsed.as_secs_f64());
    }

    pub fn record_loader_failure(&self) {
        counter!("meshcache_loader_failures_total", "group" => self.group.clone()).increment(1);
    }
}

/// Adapts [`GroupMetrics`] into an [`crate::lru::CacheEventListener`] so
/// every LRU eviction is also a counted metric, without the LRU itself
/// knowing metrics exist.
pub struct EvictionMetricsListener {
    metrics: GroupMetrics,
}

impl EvictionMetricsListener {
    pub fn new(metrics: GroupMetrics) -> Self {
        Self { metrics }
    }
}

impl<V> crate::lru::CacheEventListener<V> for EvictionMetricsListener {
    fn on_evict(&self, _key: &str, _value: &V) {
        self.metrics.record_cache_eviction();
    }
}
