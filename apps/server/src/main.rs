// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Facemark Server - storage for mesh face labels and annotations.
//!
//! The labeling client keeps all selection state in memory and hands its
//! persistence work to this server. Every save overwrites the whole document.
//!
//! # Endpoints
//!
//! - `GET /api/v1/health` - Health check
//! - `POST /save_label/{mesh}` - Overwrite a mesh's label file
//! - `GET /load_label/{mesh}` - Label file for a mesh (falls back to `label.json`)
//! - `POST /save_label` - Overwrite the shared `label.json` (bare label array)
//! - `GET /load_annotations` - Annotation document (`{}` when none)
//! - `POST /save_annotations` - Overwrite the annotation document
//! - `POST /upload_annotation_image` - Upload an image (multipart `image`)
//! - `POST /delete_annotation_image` - Delete an uploaded image
//! - `GET /static/...` - Uploaded images and other static assets

use anyhow::Context;
use std::net::SocketAddr;
use std::sync::Arc;

mod config;
mod error;
mod routes;
mod services;

use config::Config;
use services::Storage;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub storage: Arc<Storage>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| "info,tower_http=debug,facemark_server=debug".into()),
        )
        .pretty()
        .init();

    let config = Config::from_env();
    if config.upload_url_prefix().is_none() {
        anyhow::bail!(
            "UPLOAD_DIR {} must be inside STATIC_DIR {} so uploaded images can be served",
            config.upload_dir.display(),
            config.static_dir.display()
        );
    }

    tracing::info!(
        port = config.port,
        data_dir = %config.data_dir.display(),
        upload_dir = %config.upload_dir.display(),
        max_upload_size_mb = config.max_upload_size_mb,
        "Starting Facemark Server"
    );

    let storage = Arc::new(Storage::new(&config.data_dir, &config.upload_dir).await);
    let state = AppState {
        config: Arc::new(config.clone()),
        storage,
    };

    let app = routes::build_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}
