use std::sync::Arc;

use axum::{Extension, response::Json};
use serde_json::{Value, json};
use tokio::sync::Mutex;

use crate::types::PkceToken;

/// Reports whether the running `auth` flow still waits for Spotify's redirect.
pub async fn health(Extension(state): Extension<Arc<Mutex<Option<PkceToken>>>>) -> Json<Value> {
    let authorized = state
        .lock()
        .await
        .as_ref()
        .is_some_and(|pkce| pkce.token.is_some());

    Json(json!({
        "status": "ok",
        "service": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
        "awaiting_callback": !authorized,
    }))
}
