// SPDX-License-Identifier: MPL-2.0
//! Test utilities for float comparisons and other common test helpers.
//!
//! This module re-exports the `approx` crate's assertion macros for float comparison,
//! which properly handle floating-point precision issues that `assert_eq!` cannot.

// Re-export approx macros for convenient use in tests
pub use approx::assert_abs_diff_eq;

use crate::editor::compose::SYSTEM_FONT_CANDIDATES;

/// Returns the bytes of the first installed system font, if any.
///
/// Text rendering tests skip themselves when this is `None`.
pub fn system_font() -> Option<Vec<u8>> {
    SYSTEM_FONT_CANDIDATES
        .iter()
        .find_map(|(_, path)| std::fs::read(path).ok())
}
