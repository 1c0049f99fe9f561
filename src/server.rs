use axum::{Extension, Router, routing::get};
use std::{io, net::SocketAddr, str::FromStr, sync::Arc};
use tokio::sync::Mutex;

use crate::{api, config::Settings, types::PkceToken};

/// Serves `/health` and the OAuth `/callback` until the task is aborted.
pub async fn start_api_server(
    state: Arc<Mutex<Option<PkceToken>>>,
    settings: Arc<Settings>,
) -> io::Result<()> {
    let addr = SocketAddr::from_str(&settings.server_address).map_err(|e| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("invalid server address {}: {}", settings.server_address, e),
        )
    })?;

    let app = Router::new()
        .route("/health", get(api::health))
        .route("/callback", get(api::callback))
        .layer(Extension(state))
        .layer(Extension(settings));

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await
}
