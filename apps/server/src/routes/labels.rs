// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Label file endpoints.

use axum::{
    extract::{Path, State},
    http::header,
    response::IntoResponse,
    Json,
};
use facemark_core::LabelFile;
use serde_json::{json, Value};

use crate::error::ApiError;
use crate::AppState;

/// POST /save_label/{mesh} - Overwrite the label file for a mesh.
///
/// Accepts the combined `{labels, markedFeatures}` object or the older bare
/// array of label records, and stores it in the shape it was sent.
pub async fn save_label(
    State(state): State<AppState>,
    Path(mesh): Path<String>,
    Json(document): Json<Value>,
) -> Result<Json<Value>, ApiError> {
    if is_empty_document(&document) {
        return Err(ApiError::EmptyPayload("label data"));
    }
    let file = LabelFile::from_value(document.clone()).map_err(|e| ApiError::InvalidPayload {
        what: "label data",
        message: e.to_string(),
    })?;

    let bytes = serde_json::to_vec_pretty(&document)?;
    let name = state.storage.save_labels(&mesh, &bytes).await?;

    tracing::info!(
        mesh = %name,
        labels = file.labels.len(),
        faces = file.labels.iter().map(|l| l.faces.len()).sum::<usize>(),
        markers = file.marked_features.len(),
        "Label data saved"
    );
    Ok(Json(json!({
        "message": format!("Label data saved successfully for mesh {mesh}")
    })))
}

/// POST /save_label - Overwrite the shared `label.json` with a bare array of
/// label records. Older clients save here without naming a mesh.
pub async fn save_shared_label(
    State(state): State<AppState>,
    Json(document): Json<Value>,
) -> Result<Json<Value>, ApiError> {
    if is_empty_document(&document) {
        return Err(ApiError::EmptyPayload("label data"));
    }
    if !document.is_array() {
        return Err(ApiError::InvalidPayload {
            what: "label data",
            message: "expected an array of label records".into(),
        });
    }
    let file = LabelFile::from_value(document.clone()).map_err(|e| ApiError::InvalidPayload {
        what: "label data",
        message: e.to_string(),
    })?;

    let bytes = serde_json::to_vec_pretty(&document)?;
    state.storage.save_shared_labels(&bytes).await?;

    tracing::info!(labels = file.labels.len(), "Shared label data saved");
    Ok(Json(json!({ "message": "Label data saved successfully" })))
}

/// GET /load_label/{mesh} - The mesh's label file, else the shared one.
pub async fn load_label(
    State(state): State<AppState>,
    Path(mesh): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    match state.storage.load_labels(&mesh).await? {
        Some(data) => Ok(([(header::CONTENT_TYPE, "application/json")], data)),
        None => Err(ApiError::NotFound("No label file found".into())),
    }
}

/// `null`, `[]` and `{}` carry nothing to save.
pub(crate) fn is_empty_document(document: &Value) -> bool {
    match document {
        Value::Null => true,
        Value::Array(items) => items.is_empty(),
        Value::Object(fields) => fields.is_empty(),
        _ => false,
    }
}
