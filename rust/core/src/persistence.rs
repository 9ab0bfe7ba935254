// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Persistence shapes and the outgoing request queue.
//!
//! The engine never performs I/O itself. Operations that need something saved
//! or deleted enqueue a [`PersistenceRequest`]; the host drains the queue,
//! executes the requests against whatever store it talks to, and reports each
//! result back with [`PersistenceQueue::complete`]. In-memory state stays the
//! source of truth regardless of the outcome.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::annotation::AnnotationTable;
use crate::error::{Error, Result};
use crate::keys::FaceIndex;

/// Base name used when no mesh filename is known.
pub const DEFAULT_BASE_NAME: &str = "default";

/// One label and the faces it owns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelRecord {
    pub label: String,
    #[serde(default)]
    pub faces: Vec<FaceIndex>,
}

/// Point in mesh-local (pivot) coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl From<nalgebra::Point3<f64>> for Position {
    fn from(p: nalgebra::Point3<f64>) -> Self {
        Self {
            x: p.x,
            y: p.y,
            z: p.z,
        }
    }
}

impl From<Position> for nalgebra::Point3<f64> {
    fn from(p: Position) -> Self {
        nalgebra::Point3::new(p.x, p.y, p.z)
    }
}

/// A marked feature as written to the label file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarkedFeatureRecord {
    pub label: String,
    pub position: Position,
}

/// Labels plus marked features, saved under a per-mesh base name.
///
/// Older label files are a bare array of [`LabelRecord`]; [`LabelFile::from_json`]
/// accepts both and yields an empty marker list for the bare form.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LabelFile {
    pub labels: Vec<LabelRecord>,
    pub marked_features: Vec<MarkedFeatureRecord>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum LabelFileRepr {
    Legacy(Vec<LabelRecord>),
    Combined {
        #[serde(default)]
        labels: Option<Vec<LabelRecord>>,
        #[serde(default, rename = "markedFeatures")]
        marked_features: Option<Vec<MarkedFeatureRecord>>,
    },
}

impl<'de> Deserialize<'de> for LabelFile {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        Ok(match LabelFileRepr::deserialize(deserializer)? {
            LabelFileRepr::Legacy(labels) => LabelFile {
                labels,
                marked_features: Vec::new(),
            },
            LabelFileRepr::Combined {
                labels,
                marked_features,
            } => LabelFile {
                labels: labels.unwrap_or_default(),
                marked_features: marked_features.unwrap_or_default(),
            },
        })
    }
}

impl LabelFile {
    /// Parses either the combined object or the legacy bare array.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| Error::Serialization(e.to_string()))
    }

    /// Parses an already-decoded JSON document.
    pub fn from_value(value: serde_json::Value) -> Result<Self> {
        serde_json::from_value(value).map_err(|e| Error::Serialization(e.to_string()))
    }

    /// Serializes to the combined, pretty-printed form.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| Error::Serialization(e.to_string()))
    }
}

/// Parses an annotation document (`{ label: record }`).
pub fn annotations_from_json(json: &str) -> Result<AnnotationTable> {
    serde_json::from_str(json).map_err(|e| Error::Serialization(e.to_string()))
}

/// Serializes an annotation table, pretty-printed.
pub fn annotations_to_json(table: &AnnotationTable) -> Result<String> {
    serde_json::to_string_pretty(table).map_err(|e| Error::Serialization(e.to_string()))
}

/// Derives the label-file base name from a mesh filename or URL: the last
/// path segment without its extension, or `"default"` when nothing is left.
pub fn base_name_from(source: &str) -> String {
    let file = source
        .rsplit(|c| c == '/' || c == '\\')
        .next()
        .unwrap_or(source);
    let file = file.split(['?', '#']).next().unwrap_or(file);
    let stem = match file.rfind('.') {
        Some(dot) if dot > 0 => &file[..dot],
        _ => file,
    };
    if stem.is_empty() {
        DEFAULT_BASE_NAME.to_string()
    } else {
        stem.to_string()
    }
}

/// Work the host must perform against the external store.
#[derive(Debug, Clone, PartialEq)]
pub enum PersistenceRequest {
    /// Overwrite the label file for `base_name`.
    SaveLabels { base_name: String, file: LabelFile },
    /// Overwrite the annotation document.
    SaveAnnotations(AnnotationTable),
    /// Delete an uploaded annotation image.
    DeleteImage { filename: String },
}

impl PersistenceRequest {
    /// Short name used in log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            PersistenceRequest::SaveLabels { .. } => "save_labels",
            PersistenceRequest::SaveAnnotations(_) => "save_annotations",
            PersistenceRequest::DeleteImage { .. } => "delete_image",
        }
    }
}

/// Identifier handed back to the host with each drained request.
pub type RequestId = u64;

/// FIFO of outgoing persistence requests plus the ones awaiting a result.
#[derive(Debug, Default)]
pub struct PersistenceQueue {
    next_id: RequestId,
    pending: Vec<(RequestId, PersistenceRequest)>,
    in_flight: FxHashMap<RequestId, &'static str>,
}

impl PersistenceQueue {
    /// Creates an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a request and returns its id.
    pub fn enqueue(&mut self, request: PersistenceRequest) -> RequestId {
        let id = self.next_id;
        self.next_id += 1;
        tracing::debug!(id, kind = request.kind(), "Queued persistence request");
        self.pending.push((id, request));
        id
    }

    /// Requests not yet handed to the host.
    pub fn pending(&self) -> &[(RequestId, PersistenceRequest)] {
        &self.pending
    }

    /// Number of drained requests without a reported result.
    pub fn in_flight_count(&self) -> usize {
        self.in_flight.len()
    }

    /// Hands every pending request to the host, in enqueue order.
    pub fn drain(&mut self) -> Vec<(RequestId, PersistenceRequest)> {
        let drained = std::mem::take(&mut self.pending);
        for (id, request) in &drained {
            self.in_flight.insert(*id, request.kind());
        }
        drained
    }

    /// Records the outcome of a drained request.
    ///
    /// Returns the failure as an [`Error::Persistence`] so the caller can
    /// surface it; success and unknown ids return `Ok`.
    pub fn complete(
        &mut self,
        id: RequestId,
        outcome: std::result::Result<(), String>,
    ) -> Result<()> {
        let Some(kind) = self.in_flight.remove(&id) else {
            tracing::debug!(id, "Result reported for unknown persistence request");
            return Ok(());
        };
        match outcome {
            Ok(()) => {
                tracing::debug!(id, kind, "Persistence request succeeded");
                Ok(())
            }
            Err(message) => {
                tracing::warn!(id, kind, error = %message, "Persistence request failed");
                Err(Error::Persistence { id, message })
            }
        }
    }
}
