// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Annotation document and annotation image endpoints.

use axum::{
    extract::{Multipart, State},
    http::header,
    response::IntoResponse,
    Json,
};
use facemark_core::{annotations_to_json, AnnotationTable};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::ApiError;
use crate::AppState;

/// GET /load_annotations - The annotation document, `{}` when none exists.
pub async fn load_annotations(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let data = state
        .storage
        .load_annotations()
        .await?
        .unwrap_or_else(|| b"{}".to_vec());
    Ok(([(header::CONTENT_TYPE, "application/json")], data))
}

/// POST /save_annotations - Overwrite the annotation document.
///
/// `{}` is a valid table: it is what the client sends once the last
/// annotated label is gone.
pub async fn save_annotations(
    State(state): State<AppState>,
    Json(document): Json<Value>,
) -> Result<Json<Value>, ApiError> {
    if document.is_null() {
        return Err(ApiError::EmptyPayload("annotation data"));
    }
    let table: AnnotationTable =
        serde_json::from_value(document).map_err(|e| ApiError::InvalidPayload {
            what: "annotation data",
            message: e.to_string(),
        })?;
    let json = annotations_to_json(&table).map_err(|e| ApiError::Internal(e.to_string()))?;
    state.storage.save_annotations(json.as_bytes()).await?;

    tracing::info!(annotations = table.len(), "Annotation data saved");
    Ok(Json(json!({ "message": "Annotation data saved successfully" })))
}

/// POST /upload_annotation_image - Store the multipart `image` field.
pub async fn upload_annotation_image(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<Value>, ApiError> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some("image") {
            continue;
        }
        let filename = field.file_name().unwrap_or_default().to_string();
        if filename.is_empty() {
            return Err(ApiError::MissingFile);
        }
        let prefix = state.config.upload_url_prefix().ok_or_else(|| {
            ApiError::Internal("upload directory is not served under /static".into())
        })?;
        let data = field.bytes().await?;
        let stored = state.storage.save_image(&filename, &data).await?;
        return Ok(Json(json!({
            "message": "Image uploaded successfully",
            "url": format!("{prefix}/{stored}"),
        })));
    }
    Err(ApiError::MissingFile)
}

/// Body of a delete request.
#[derive(Debug, Deserialize)]
pub struct DeleteImageRequest {
    pub filename: String,
}

/// POST /delete_annotation_image - Remove a stored image.
pub async fn delete_annotation_image(
    State(state): State<AppState>,
    Json(request): Json<DeleteImageRequest>,
) -> Result<Json<Value>, ApiError> {
    if state.storage.delete_image(&request.filename).await? {
        Ok(Json(json!({
            "message": format!("File {} deleted successfully", request.filename)
        })))
    } else {
        Err(ApiError::NotFound("File not found".into()))
    }
}
