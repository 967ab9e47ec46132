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

//! End-to-end checks of the HTTP peer transport against a real, bound
//! `axum` server (no `tower::ServiceExt::oneshot` shortcuts) — a peer
//! fetch travels over an actual loopback socket and back.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use meshcache_common::ErrorKind;
use meshcache_core::{new_group, LoaderFn, PeerPicker};
use meshcache_transport::HttpPool;

fn unique_name(prefix: &str) -> String {
    static COUNTER: AtomicUsize = AtomicUsize::new(0);
    format!("{prefix}-{}", COUNTER.fetch_add(1, Ordering::SeqCst))
}

async fn spawn_server() -> std::net::SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, meshcache_transport::router()).await.unwrap();
    });
    addr
}

#[tokio::test]
async fn peer_getter_round_trips_over_a_real_socket() {
    let addr = spawn_server().await;
    let name = unique_name("http-roundtrip");

    let invocations = Arc::new(AtomicUsize::new(0));
    let counted = invocations.clone();
    new_group(
        name.clone(),
        1024,
        Arc::new(LoaderFn::new(move |key: &str| {
            let invocations = counted.clone();
            let key = key.to_string();
            async move {
                invocations.fetch_add(1, Ordering::SeqCst);
                Ok(key.into_bytes())
            }
        })),
    );

    // "this" is a different address than the bound server, so the ring's
    // only other member (the server) is always picked as the remote owner.
    let pool = HttpPool::with_options("http://127.0.0.1:1", "/_meshcache/", 10);
    pool.set(vec![format!("http://{addr}")]);

    let peer = pool.pick("any-key").expect("a single-peer ring always picks the peer");
    let bytes = peer.get(&name, "hello").await.unwrap();
    assert_eq!(bytes, b"hello".to_vec());

    // A second fetch for the same key hits the server's own `Group`, which
    // coalesces/caches locally — the loader on the server side runs once.
    let _ = peer.get(&name, "hello").await.unwrap();
    assert_eq!(invocations.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn unreachable_peer_surfaces_as_peer_failure() {
    // "this" is deliberately not among the members, so `pick` always
    // returns one of them regardless of which one a given key hashes to.
    let pool = HttpPool::with_options("http://127.0.0.1:9", "/_meshcache/", 10);
    // Ports 1 and 2 are reserved, always-closed loopback ports: connection refused.
    pool.set(vec!["http://127.0.0.1:1".to_string(), "http://127.0.0.1:2".to_string()]);

    let peer = pool.pick("any-key").expect("ring has members");
    let err = peer.get("whatever-group", "whatever-key").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::PeerFailure);
}

#[tokio::test]
async fn fetching_an_unknown_group_surfaces_as_peer_failure() {
    let addr = spawn_server().await;
    let pool = HttpPool::with_options("http://127.0.0.1:1", "/_meshcache/", 10);
    pool.set(vec![format!("http://{addr}")]);

    let peer = pool.pick("any-key").expect("a single-peer ring always picks the peer");
    let err = peer.get("no-such-group-registered", "key").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::PeerFailure);
}
