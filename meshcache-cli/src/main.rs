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

//! Demo multi-node deployment: three cache-server processes (one per
//! `--port`) shard a tiny in-memory "backing store" via consistent hashing,
//! and one of them optionally also runs a user-facing API server. Start
//! three instances against the same `--peers` set, e.g.:
//!
//! ```text
//! meshcache-cli serve --port 8001 --peers http://127.0.0.1:8001,http://127.0.0.1:8002,http://127.0.0.1:8003 &
//! meshcache-cli serve --port 8002 --peers http://127.0.0.1:8001,http://127.0.0.1:8002,http://127.0.0.1:8003 &
//! meshcache-cli serve --port 8003 --peers http://127.0.0.1:8001,http://127.0.0.1:8002,http://127.0.0.1:8003 --api &
//! curl 'http://localhost:9999/api?key=Tom'
//! ```

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use meshcache::{new_group, Error, Group, HttpPool, LoaderFn};

const API_ADDR: &str = "127.0.0.1:9999";

#[derive(Parser, Debug)]
#[command(about = "Run one node of a demo meshcache cluster")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start one cache-server node of the demo cluster.
    Serve {
        /// Which port this process serves its peer-to-peer HTTP API on.
        #[arg(long, default_value_t = 8001)]
        port: u16,

        /// Comma-separated base URLs of every node in the cluster, this
        /// node's own URL included (e.g. `http://127.0.0.1:8001,http://127.0.0.1:8002`).
        #[arg(long, value_delimiter = ',', default_value = "http://127.0.0.1:8001,http://127.0.0.1:8002,http://127.0.0.1:8003")]
        peers: Vec<String>,

        /// Also start the user-facing API server on 127.0.0.1:9999.
        #[arg(long)]
        api: bool,
    },
}

fn backing_store() -> HashMap<&'static str, &'static str> {
    HashMap::from([("Tom", "630"), ("Jack", "589"), ("Sam", "567")])
}

fn create_group() -> Arc<Group> {
    let db = backing_store();
    new_group(
        "scores",
        2 << 10,
        Arc::new(LoaderFn::new(move |key: &str| {
            let db = db.clone();
            let key = key.to_string();
            async move {
                tracing::info!(key, "loading from backing store");
                db.get(key.as_str())
                    .map(|v| v.as_bytes().to_vec())
                    .ok_or_else(|| Error::loader_failure(format!("{key} not found")))
            }
        })),
    )
}

async fn start_cache_server(addr: SocketAddr, peers: Vec<String>, group: Arc<Group>) -> anyhow::Result<()> {
    let pool = Arc::new(HttpPool::new(format!("http://{addr}")));
    pool.set(peers);
    group.register_peer_picker(pool);

    tracing::info!(%addr, "meshcache peer server listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, meshcache::router()).await?;
    Ok(())
}

async fn start_api_server(addr: SocketAddr, group: Arc<Group>) -> anyhow::Result<()> {
    use axum::extract::{Query, State};
    use axum::http::{header, StatusCode};
    use axum::response::IntoResponse;
    use axum::routing::get;
    use axum::Router;

    async fn handle(
        State(group): State<Arc<Group>>,
        Query(params): Query<HashMap<String, String>>,
    ) -> axum::response::Response {
        let Some(key) = params.get("key") else {
            return (StatusCode::BAD_REQUEST, "missing `key` query parameter".to_string()).into_response();
        };
        match group.get(key).await {
            Ok(view) => {
                ([(header::CONTENT_TYPE, "application/octet-stream")], view.as_bytes()).into_response()
            }
            Err(err) => (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()).into_response(),
        }
    }

    let app = Router::new().route("/api", get(handle)).with_state(group);
    tracing::info!(%addr, "meshcache api server listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let Cli { command } = Cli::parse();
    match command {
        Command::Serve { port, peers, api } => {
            let group = create_group();
            let self_addr: SocketAddr = ([127, 0, 0, 1], port).into();

            if api {
                let api_addr: SocketAddr = API_ADDR.parse()?;
                let api_group = group.clone();
                tokio::spawn(async move {
                    if let Err(err) = start_api_server(api_addr, api_group).await {
                        tracing::error!(%err, "api server exited");
                    }
                });
            }

            start_cache_server(self_addr, peers, group).await
        }
    }
}
