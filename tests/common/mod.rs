//! In-process Elasticsearch stand-in for integration tests.
//!
//! Serves a fixed three-hit corpus. A few magic query strings trigger
//! failure responses:
//! - `q=boom` answers 500;
//! - `q=broken` answers 200 with a hit lacking `_source`.

#![allow(dead_code)]

use std::collections::HashMap;
use std::net::TcpListener;
use std::thread;

use axum::extract::{Path, Query};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{json, Value};

pub const INDEX: &str = "books";

/// Handle to a running mock server.
pub struct MockElastic {
    pub port: u16,
}

impl MockElastic {
    /// Bind an ephemeral port and serve the mock router on a background
    /// thread with its own runtime. The listener is bound before this
    /// returns, so requests can be sent immediately.
    pub fn spawn() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind ephemeral TCP listener");
        listener
            .set_nonblocking(true)
            .expect("set listener non-blocking");
        let port = listener.local_addr().expect("local_addr").port();

        thread::spawn(move || {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .expect("mock runtime");
            runtime.block_on(async move {
                let listener =
                    tokio::net::TcpListener::from_std(listener).expect("tokio listener");
                axum::serve(listener, router()).await.expect("serve mock");
            });
        });

        Self { port }
    }

    pub fn config(&self, index: Option<&str>) -> dualsearch::backend::ElasticConfig {
        dualsearch::backend::ElasticConfig {
            scheme: "http".to_string(),
            host: "127.0.0.1".to_string(),
            port: self.port,
            index: index.map(str::to_string),
        }
    }
}

fn router() -> Router {
    Router::new()
        .route("/_search", get(search))
        .route("/:index/_search", get(search))
        .route("/:index/_doc/:id", get(document))
}

fn corpus() -> Vec<Value> {
    vec![
        json!({
            "_index": INDEX,
            "_id": "2701",
            "_score": 9.1,
            "_source": {
                "title": "Moby Dick; Or, The Whale",
                "authors": ["Melville, Herman, 1819-1891"]
            }
        }),
        json!({
            "_index": INDEX,
            "_id": "15",
            "_score": 4.2,
            "_source": {
                "title": "Moby-Dick",
                "authors": ["Melville, Herman, 1819-1891"]
            }
        }),
        json!({
            "_index": INDEX,
            "_id": "11231",
            "_score": 1.3,
            "_source": {
                "title": "Bartleby, the Scrivener: A Story of Wall-Street",
                "authors": ["Melville, Herman, 1819-1891"]
            }
        }),
    ]
}

async fn search(Query(params): Query<HashMap<String, String>>) -> Response {
    match params.get("q").map(String::as_str) {
        Some("boom") => (StatusCode::INTERNAL_SERVER_ERROR, "shard failure").into_response(),
        Some("broken") => Json(json!({
            "hits": { "hits": [ { "_id": "1", "_score": 1.0 } ] }
        }))
        .into_response(),
        _ => Json(json!({
            "took": 3,
            "timed_out": false,
            "hits": {
                "total": { "value": 3, "relation": "eq" },
                "hits": corpus()
            }
        }))
        .into_response(),
    }
}

async fn document(Path((index, id)): Path<(String, String)>) -> Response {
    let found = corpus().into_iter().find(|hit| hit["_id"] == id.as_str());
    match found {
        Some(hit) => Json(json!({
            "_index": index,
            "_id": id,
            "found": true,
            "_source": hit["_source"].clone()
        }))
        .into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(json!({ "_index": index, "_id": id, "found": false })),
        )
            .into_response(),
    }
}
