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

//! The core of meshcache: a bounded LRU, a consistent-hash ring, a
//! single-flight coalescer, and the `Group` façade that composes them into
//! a distributed read-through cache.

pub mod concurrent_cache;
pub mod group;
pub mod hash_ring;
pub mod loader;
pub mod lru;
pub mod metrics;
pub mod peer;
pub mod single_flight;

pub use concurrent_cache::ConcurrentCache;
pub use group::{get_group, new_group, new_group_with_config, Group, GroupConfig};
pub use hash_ring::{HashFn, HashRing};
pub use loader::{Loader, LoaderFn};
pub use lru::{CacheEventListener, DefaultCacheEventListener, Lru};
pub use metrics::GroupMetrics;
pub use peer::{PeerGetter, PeerPicker};
pub use single_flight::SingleFlight;
