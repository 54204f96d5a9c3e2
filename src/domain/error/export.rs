// SPDX-License-Identifier: MPL-2.0
//! Export errors.

use thiserror::Error;

/// Why an export did not produce a file.
///
/// Every variant is recoverable: the session stays open and the export can
/// be retried.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExportError {
    /// The bitmap could not be encoded in the requested format.
    #[error("failed to encode image: {0}")]
    EncodeFailed(String),

    /// The encoded bytes could not be written durably.
    #[error("failed to write image: {0}")]
    WriteFailed(String),

    /// Another export for this session has not finished yet.
    #[error("an export is already in progress")]
    AlreadyInProgress,
}

impl From<std::io::Error> for ExportError {
    fn from(err: std::io::Error) -> Self {
        Self::WriteFailed(err.to_string())
    }
}
