// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for label store operations.

use crate::keys::MarkerKey;

/// Result type alias for label store operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Broad classes of failure, used by callers to decide how to surface an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Operator mistake: shown to the operator, nothing was mutated.
    UserInput,
    /// An external store rejected a save, load or delete.
    Persistence,
    /// The derived face index disagreed with the label entries.
    Consistency,
    /// A persisted document could not be encoded or decoded.
    Serialization,
}

/// Errors that can occur during label store operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The label text was empty after trimming.
    #[error("please enter a label")]
    EmptyLabel,

    /// An assignment was attempted with no faces selected.
    #[error("no faces selected to label")]
    NoFacesSelected,

    /// A save was requested while the store holds no labels.
    #[error("no labels to save")]
    NothingToSave,

    /// No entry, annotation or face claim exists for the label.
    #[error("label not found: {0}")]
    LabelNotFound(String),

    /// The marker key does not reference a live marked feature.
    #[error("marked feature not found: {0:?}")]
    MarkerNotFound(MarkerKey),

    /// The face index diverged from the label entries.
    #[error("labeled-faces index is inconsistent: {0}")]
    ConsistencyViolation(String),

    /// A persistence request completed with a failure.
    #[error("persistence request {id} failed: {message}")]
    Persistence { id: u64, message: String },

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl Error {
    /// Returns the error's class.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::EmptyLabel
            | Error::NoFacesSelected
            | Error::NothingToSave
            | Error::LabelNotFound(_)
            | Error::MarkerNotFound(_) => ErrorCategory::UserInput,
            Error::ConsistencyViolation(_) => ErrorCategory::Consistency,
            Error::Persistence { .. } => ErrorCategory::Persistence,
            Error::Serialization(_) => ErrorCategory::Serialization,
        }
    }

    /// Returns `true` for errors caused by operator input.
    pub fn is_user_input(&self) -> bool {
        self.category() == ErrorCategory::UserInput
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}
