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

//! The peer-facing HTTP server: `GET <base-path><group>/<key>`.
//!
//! Groups are looked up in the process-wide registry
//! (`meshcache_core::get_group`), so this router needs no application state
//! of its own — any group `NewGroup`'d anywhere in the process is reachable.

use axum::extract::Path;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use meshcache_core::get_group;

use crate::envelope::Response as WireResponse;
use crate::http_pool::DEFAULT_BASE_PATH;

/// Builds a router mounted at the default base path (`/_meshcache/`).
pub fn router() -> Router {
    router_with_base_path(DEFAULT_BASE_PATH)
}

/// Builds a router mounted at `base_path`.
pub fn router_with_base_path(base_path: &str) -> Router {
    let base = base_path.trim_end_matches('/');
    Router::new().route(&format!("{base}/*rest"), get(handle))
}

async fn handle(Path(rest): Path<String>) -> axum::response::Response {
    let mut parts = rest.splitn(2, '/');
    let (Some(group_name), Some(key)) = (parts.next(), parts.next()) else {
        return (StatusCode::BAD_REQUEST, "bad request: expected <group>/<key>".to_string()).into_response();
    };
    if group_name.is_empty() || key.is_empty() {
        return (StatusCode::BAD_REQUEST, "bad request: expected <group>/<key>".to_string()).into_response();
    }

    tracing::debug!(group = group_name, key, "serving peer fetch");

    let Some(group) = get_group(group_name) else {
        return (StatusCode::NOT_FOUND, format!("no such group: {group_name}")).into_response();
    };

    match group.get(key).await {
        Ok(view) => {
            let wire = WireResponse { value: view.as_bytes() };
            match wire.encode() {
                Ok(bytes) => ([(header::CONTENT_TYPE, "application/octet-stream")], bytes).into_response(),
                Err(err) => (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()).into_response(),
            }
        }
        Err(err) => (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()).into_response(),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::Request;
    use meshcache_core::{new_group, LoaderFn};
    use tower::ServiceExt;

    use super::*;

    fn unique_name(prefix: &str) -> String {
        use std::sync::atomic::{AtomicUsize, Ordering};
        static COUNTER: AtomicUsize = AtomicUsize::new(0);
        format!("{prefix}-{}", COUNTER.fetch_add(1, Ordering::SeqCst))
    }

    #[tokio::test]
    async fn serves_a_known_key_as_a_bincode_envelope() {
        let name = unique_name("server-known-group");
        new_group(
            name.clone(),
            1024,
            Arc::new(LoaderFn::new(|key: &str| {
                let key = key.to_string();
                async move { Ok(key.into_bytes()) }
            })),
        );

        let app = router();
        let uri = format!("/_meshcache/{name}/hello");
        let response =
            app.oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap()).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let decoded = WireResponse::decode(&bytes).unwrap();
        assert_eq!(decoded.value, b"hello".to_vec());
    }

    #[tokio::test]
    async fn unknown_group_is_404() {
        let app = router();
        let response = app
            .oneshot(Request::builder().uri("/_meshcache/no-such-group/key").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn missing_key_segment_is_400() {
        let app = router();
        let response = app
            .oneshot(Request::builder().uri("/_meshcache/justgroup").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn loader_failure_is_500() {
        let name = unique_name("server-loader-failure");
        new_group(
            name.clone(),
            1024,
            Arc::new(LoaderFn::new(|_: &str| async {
                Err(meshcache_common::Error::loader_failure("backing store down"))
            })),
        );

        let app = router();
        let uri = format!("/_meshcache/{name}/missing");
        let response =
            app.oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap()).await.unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
