// SPDX-License-Identifier: MPL-2.0
//! Crop errors.

use thiserror::Error;

/// Why a crop region could not be applied.
///
/// Both variants mean the user should adjust the selection; retrying the
/// same region gives the same result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CropError {
    /// The region has zero width, zero height or zero area.
    #[error("crop region has zero area")]
    DegenerateRegion,

    /// The region does not overlap the source image at all.
    #[error("crop region lies entirely outside the image")]
    OutOfBounds,
}
