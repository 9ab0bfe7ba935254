// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Health check endpoint.

use axum::Json;
use serde::Serialize;

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub service: &'static str,
}

/// API information response.
#[derive(Debug, Serialize)]
pub struct ApiInfoResponse {
    pub service: &'static str,
    pub version: &'static str,
    pub description: &'static str,
    pub endpoints: Vec<EndpointInfo>,
}

/// Endpoint information.
#[derive(Debug, Serialize)]
pub struct EndpointInfo {
    pub method: &'static str,
    pub path: &'static str,
    pub description: &'static str,
}

/// GET /api/v1/health - Health check endpoint.
pub async fn check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        service: "facemark-server",
    })
}

/// GET /api/v1 - API information endpoint.
pub async fn info() -> Json<ApiInfoResponse> {
    let endpoint = |method: &'static str, path: &'static str, description: &'static str| EndpointInfo {
        method,
        path,
        description,
    };
    Json(ApiInfoResponse {
        service: "facemark-server",
        version: env!("CARGO_PKG_VERSION"),
        description: "Storage for mesh face labels, annotations and annotation images",
        endpoints: vec![
            endpoint("GET", "/api/v1/health", "Health check endpoint"),
            endpoint("POST", "/save_label/{mesh}", "Overwrite a mesh's label file"),
            endpoint("GET", "/load_label/{mesh}", "Label file for a mesh"),
            endpoint("POST", "/save_label", "Overwrite the shared label file"),
            endpoint("GET", "/load_annotations", "Annotation document"),
            endpoint("POST", "/save_annotations", "Overwrite the annotation document"),
            endpoint("POST", "/upload_annotation_image", "Upload an annotation image"),
            endpoint("POST", "/delete_annotation_image", "Delete an annotation image"),
        ],
    })
}
