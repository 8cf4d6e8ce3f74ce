//! Web UI and HTTP API
//!
//! One page with a single query box, backed by a JSON endpoint that always
//! answers 200 with display text. Errors travel in-band as `Error: ...`.

use axum::{
    extract::{rejection::JsonRejection, State},
    response::Html,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{error, info};

use crate::handler::{QueryHandler, ERROR_PREFIX};
use crate::Result;

/// =============================
/// Request / Response Models
/// =============================

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct QueryRequest {
    #[serde(default)]
    pub query: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct QueryResponse {
    pub output: String,
    pub timestamp: String,
}

/// =============================
/// API State
/// =============================

#[derive(Clone)]
pub struct ApiState {
    pub handler: Arc<QueryHandler>,
}

/// =============================
/// Page
/// =============================

const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>Stock Price AI Assistant</title>
<style>
  body { font-family: system-ui, sans-serif; max-width: 720px; margin: 3rem auto; padding: 0 1rem; }
  label { display: block; font-weight: 600; margin: 1rem 0 .4rem; }
  textarea { width: 100%; box-sizing: border-box; font: inherit; padding: .6rem; }
  button { margin-top: .8rem; padding: .5rem 1.4rem; font: inherit; cursor: pointer; }
</style>
</head>
<body>
<h1>Stock Price AI Assistant</h1>
<p>Ask me about any stock price and I'll fetch the latest information for you!</p>
<form id="ask">
  <label for="query">Ask about any stock price</label>
  <textarea id="query" name="query" rows="2" placeholder="What is Apple's current stock price?"></textarea>
  <button type="submit">Submit</button>
</form>
<label for="output">Stock Information</label>
<textarea id="output" rows="6" readonly></textarea>
<script>
  document.getElementById("ask").addEventListener("submit", async (event) => {
    event.preventDefault();
    const output = document.getElementById("output");
    output.value = "...";
    try {
      const res = await fetch("/api/query", {
        method: "POST",
        headers: { "Content-Type": "application/json" },
        body: JSON.stringify({ query: document.getElementById("query").value }),
      });
      const body = await res.json();
      output.value = body.output;
    } catch (err) {
      output.value = "Error: " + err;
    }
  });
</script>
</body>
</html>
"#;

async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

/// =============================
/// Health Endpoint
/// =============================

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

/// =============================
/// Query Endpoint
/// =============================

async fn query_handler(
    State(state): State<ApiState>,
    payload: std::result::Result<Json<QueryRequest>, JsonRejection>,
) -> Json<QueryResponse> {
    let output = match payload {
        Ok(Json(req)) => state.handler.handle(&req.query).await,
        Err(rejection) => {
            let error_msg = format!("Error processing query: {}", rejection.body_text());
            error!(status = %rejection.status(), "{}", error_msg);
            format!("{}{}", ERROR_PREFIX, error_msg)
        }
    };

    Json(QueryResponse {
        output,
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}

/// =============================
/// Router
/// =============================

pub fn create_router(handler: Arc<QueryHandler>) -> Router {
    let state = ApiState { handler };

    Router::new()
        .route("/", get(index))
        .route("/health", get(health))
        .route("/api/query", post(query_handler))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// =============================
/// Server Startup
/// =============================

pub async fn start_server(handler: Arc<QueryHandler>, port: u16) -> Result<()> {
    let router = create_router(handler);

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port)).await?;

    info!("Web UI listening on http://0.0.0.0:{}", port);
    info!("Local: http://127.0.0.1:{}", port);

    axum::serve(listener, router).await?;

    Ok(())
}
