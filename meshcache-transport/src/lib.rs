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

//! The out-of-core HTTP transport: the wire envelope, the client-side
//! `HttpPool` (`PeerPicker` + `PeerGetter`), and the server-side router that
//! answers peer fetches out of the process-wide group registry.

pub mod envelope;
pub mod http_pool;
pub mod server;

pub use envelope::{Request, Response};
pub use http_pool::{HttpPeerGetter, HttpPool, HttpPoolConfig, DEFAULT_BASE_PATH, DEFAULT_REPLICAS};
pub use server::{router, router_with_base_path};
