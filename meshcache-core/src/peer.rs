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

//! The boundary between a [`crate::Group`] and whatever transport reaches
//! other nodes in the cluster. Neither trait is implemented by this crate —
//! `meshcache-transport` provides the HTTP realization.

use std::sync::Arc;

use async_trait::async_trait;
use meshcache_common::Error;

/// Locates the peer that owns a key under the cluster's current membership.
pub trait PeerPicker: Send + Sync + 'static {
    /// Returns the remote peer owning `key`, or `None` if the local node owns it.
    fn pick(&self, key: &str) -> Option<Arc<dyn PeerGetter>>;
}

/// Fetches a single `(group, key)` pair from one remote peer.
#[async_trait]
pub trait PeerGetter: Send + Sync + 'static {
    async fn get(&self, group: &str, key: &str) -> Result<Vec<u8>, Error>;
}
