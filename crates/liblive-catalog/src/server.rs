// SPDX-License-Identifier: MIT OR Apache-2.0

//! http endpoints for reading and replacing the catalog.

use std::{net::SocketAddr, sync::Arc};

use axum::{
    Router,
    extract::State,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};

use crate::{Catalog, CatalogStore, Result};

/// lets shared caches hold the catalog for a few minutes.
pub const CACHE_CONTROL_VALUE: &str = "s-maxage=300";

#[derive(Clone)]
pub struct ServerState {
    store: Arc<dyn CatalogStore>,
}

impl ServerState {
    pub fn new(store: Arc<dyn CatalogStore>) -> Self {
        Self { store }
    }
}

pub fn create_router(state: ServerState) -> Router {
    Router::new()
        .route("/api/get-versions", get(get_versions))
        .route("/api/update-versions", post(update_versions))
        .with_state(state)
}

/// serves the catalog until the process is stopped.
pub async fn serve(addr: SocketAddr, store: Arc<dyn CatalogStore>) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    log::info!("**server:** listening on {}", listener.local_addr()?);

    axum::serve(listener, create_router(ServerState::new(store))).await?;
    Ok(())
}

/// [`serve`] on a fresh multi-threaded runtime.
pub fn serve_blocking(addr: SocketAddr, store: Arc<dyn CatalogStore>) -> Result<()> {
    tokio::runtime::Runtime::new()?.block_on(serve(addr, store))
}

async fn get_versions(State(state): State<ServerState>) -> Response {
    let store = Arc::clone(&state.store);
    let catalog = tokio::task::spawn_blocking(move || store.read())
        .await
        .unwrap_or_else(|e| {
            log::error!("**server:** catalog read task failed: {e}");
            Catalog::seed()
        });

    (
        [
            (header::CONTENT_TYPE, "application/json"),
            (header::CACHE_CONTROL, CACHE_CONTROL_VALUE),
        ],
        catalog.to_json(),
    )
        .into_response()
}

async fn update_versions(State(state): State<ServerState>, body: String) -> Response {
    let catalog = match Catalog::from_json_str(&body) {
        Ok(catalog) => catalog,
        Err(e) => {
            log::debug!("**server:** rejected catalog update: {e}");
            return (StatusCode::BAD_REQUEST, "Bad data").into_response();
        }
    };

    let store = Arc::clone(&state.store);
    match tokio::task::spawn_blocking(move || store.write(&catalog)).await {
        Ok(Ok(())) => (StatusCode::OK, "Updated").into_response(),
        Ok(Err(e)) => {
            log::error!("**server:** failed to store catalog: {e}");
            (StatusCode::INTERNAL_SERVER_ERROR, "Storage error").into_response()
        }
        Err(e) => {
            log::error!("**server:** catalog write task failed: {e}");
            (StatusCode::INTERNAL_SERVER_ERROR, "Storage error").into_response()
        }
    }
}
