use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{RawQuery, State},
    http::StatusCode,
    routing::get,
};
use serde_json::{Value, json};
use tokio::{net::TcpListener, sync::Notify};

/// Holds a search titled `slow` until the test releases it.
#[derive(Default)]
pub struct Gate {
    pub arrived: Notify,
    pub release: Notify,
}

pub struct Upstream {
    pub base_url: String,
    pub gate: Arc<Gate>,
}

async fn manga(State(gate): State<Arc<Gate>>, RawQuery(query): RawQuery) -> Json<Value> {
    let query = query.unwrap_or_default();
    if query.split('&').any(|pair| pair == "title=slow") {
        gate.arrived.notify_one();
        gate.release.notified().await;
    }

    Json(json!({ "data": [{ "id": "manga-1" }], "total": 1 }))
}

async fn echo(RawQuery(query): RawQuery) -> Json<Value> {
    Json(json!({ "query": query.unwrap_or_default() }))
}

async fn missing() -> (StatusCode, Json<Value>) {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "result": "error", "errors": [{ "status": 404 }] })),
    )
}

pub async fn spawn_upstream() -> Upstream {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = listener.local_addr().unwrap();
    let gate = Arc::new(Gate::default());

    let app = Router::new()
        .route("/manga", get(manga))
        .route("/echo", get(echo))
        .route("/missing", get(missing))
        .with_state(gate.clone());

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    Upstream {
        base_url: format!("http://{}", address),
        gate,
    }
}
