// SPDX-License-Identifier: MPL-2.0
//! Image loading errors.

use thiserror::Error;

/// Why an image could not be loaded.
///
/// Loads are recoverable: the user may retry. Every variant carries enough
/// context to build a message for the user.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoadError {
    /// The URL string could not be parsed.
    #[error("bad url string: {0}")]
    InvalidUrl(String),

    /// The request failed, stalled past a timeout, or sent a body over the
    /// size limit.
    #[error("request failed: {0}")]
    Transport(String),

    /// The server answered with something other than 200.
    #[error("bad response {status} - {url}")]
    BadStatus { status: u16, url: String },

    /// The response had an empty body.
    #[error("unable to retrieve response data from {0}")]
    NoData(String),

    /// The bytes are not a decodable image.
    #[error("unable to convert data to image: {0}")]
    Undecodable(String),

    /// Reading a local file failed.
    #[error("failed to read image file: {0}")]
    Io(String),
}

impl From<std::io::Error> for LoadError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}
