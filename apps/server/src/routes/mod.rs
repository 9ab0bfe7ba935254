// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! HTTP routes.

pub mod annotations;
pub mod health;
pub mod labels;

use std::time::Duration;

use axum::{
    extract::DefaultBodyLimit,
    http::HeaderValue,
    routing::{get, post},
    Router,
};
use tower_http::{
    compression::CompressionLayer,
    cors::{AllowOrigin, Any, CorsLayer},
    services::ServeDir,
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::Config;
use crate::AppState;

/// Build the application router with its middleware stack.
pub fn build_router(state: AppState) -> Router {
    let config = state.config.clone();

    Router::new()
        // API information and health
        .route("/api/v1", get(health::info))
        .route("/api/v1/health", get(health::check))
        // Label files
        .route("/save_label/:mesh", post(labels::save_label))
        .route("/load_label/:mesh", get(labels::load_label))
        .route("/save_label", post(labels::save_shared_label))
        // Annotations
        .route("/load_annotations", get(annotations::load_annotations))
        .route("/save_annotations", post(annotations::save_annotations))
        .route(
            "/upload_annotation_image",
            post(annotations::upload_annotation_image),
        )
        .route(
            "/delete_annotation_image",
            post(annotations::delete_annotation_image),
        )
        // Uploaded images and other static assets
        .nest_service("/static", ServeDir::new(&config.static_dir))
        // Middleware
        .layer(DefaultBodyLimit::max(config.max_upload_size_mb * 1024 * 1024))
        .layer(CompressionLayer::new())
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.request_timeout_secs,
        )))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(&config))
        .with_state(state)
}

fn cors_layer(config: &Config) -> CorsLayer {
    if config.cors_origins.iter().any(|o| o == "*") {
        return CorsLayer::permissive();
    }
    let origins: Vec<HeaderValue> = config
        .cors_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(Any)
        .allow_headers(Any)
}
