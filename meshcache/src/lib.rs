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

//! meshcache: a distributed, in-memory, read-through cache.
//!
//! This crate is a thin facade re-exporting `meshcache-common` (the shared
//! value/error types), `meshcache-core` (the LRU, hash ring, single-flight
//! coalescer and `Group`), and `meshcache-transport` (the HTTP peer
//! realization) under one name.

pub mod prelude;

pub use meshcache_common::{ByteView, Error, ErrorKind, Measurable, SharedError};
pub use meshcache_core::{
    get_group, new_group, new_group_with_config, CacheEventListener, ConcurrentCache,
    DefaultCacheEventListener, Group, GroupConfig, GroupMetrics, HashFn, HashRing, Loader, LoaderFn,
    Lru, PeerGetter, PeerPicker, SingleFlight,
};
pub use meshcache_transport::{
    router, router_with_base_path, HttpPeerGetter, HttpPool, HttpPoolConfig, Request, Response,
    DEFAULT_BASE_PATH, DEFAULT_REPLICAS,
};

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    #[tokio::test]
    async fn facade_exposes_a_working_read_through_path() {
        let group = new_group(
            "facade-smoke-test",
            1024,
            Arc::new(LoaderFn::new(|key: &str| {
                let key = key.to_string();
                async move { Ok(key.into_bytes()) }
            })),
        );
        let value = group.get("hello").await.unwrap();
        assert_eq!(value.as_string(), "hello");
    }
}
