//! Demo workload: the thing rampd scales.
//!
//! A trivial HTTP service with a request-counting root route and a
//! health endpoint. It has no bearing on scaling logic — the simulator
//! only creates and terminates instances of it.
//!
//!   GET /         — instance name and request count
//!   GET /healthz  — 200 once the server is up
//!
//! Listens on `PORT` (default 3000); `INSTANCE_NAME` is injected by the
//! simulator at creation time.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use axum::Router;
use axum::extract::State;
use axum::routing::get;
use serde_json::json;

struct AppState {
    instance: String,
    requests: AtomicU64,
}

async fn root(State(state): State<Arc<AppState>>) -> axum::Json<serde_json::Value> {
    let count = state.requests.fetch_add(1, Ordering::Relaxed) + 1;
    axum::Json(json!({
        "instance": state.instance,
        "requests": count,
    }))
}

async fn healthz() -> &'static str {
    "ok"
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt().init();

    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(3000);
    let instance =
        std::env::var("INSTANCE_NAME").unwrap_or_else(|_| "demo-app".to_string());

    let state = Arc::new(AppState {
        instance,
        requests: AtomicU64::new(0),
    });

    let app = Router::new()
        .route("/", get(root))
        .route("/healthz", get(healthz))
        .with_state(state);

    let addr = format!("0.0.0.0:{port}");
    tracing::info!(%addr, "demo app listening");
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("bind demo app listener");
    axum::serve(listener, app).await.expect("serve demo app");
}
