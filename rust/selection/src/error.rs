// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use thiserror::Error;

/// Result type for selection operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while capturing or resolving a selection
#[derive(Error, Debug)]
pub enum Error {
    #[error("select at least 3 points to form a polygon (got {0})")]
    TooFewPoints(usize),

    #[error("Invalid mesh: {0}")]
    InvalidMesh(String),

    #[error("Camera matrix is not invertible")]
    DegenerateCamera,

    #[error("{operation} is not allowed while {state}")]
    InvalidState {
        operation: &'static str,
        state: &'static str,
    },

    #[error(transparent)]
    Store(#[from] facemark_core::Error),
}

impl Error {
    /// Returns `true` for errors the operator caused and should be told about.
    pub fn is_user_input(&self) -> bool {
        match self {
            Error::TooFewPoints(_) | Error::InvalidState { .. } => true,
            Error::Store(err) => err.is_user_input(),
            Error::InvalidMesh(_) | Error::DegenerateCamera => false,
        }
    }
}
