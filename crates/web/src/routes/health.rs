use axum::routing::get;
use axum::{Json, Router};
use serde_json::{json, Value};

use crate::WebState;

pub(crate) fn routes() -> Router<WebState> {
    Router::new().route("/health", get(health))
}

async fn health() -> Json<Value> {
    Json(json!({ "message": "Server is running", "status": "OK" }))
}
