// SPDX-License-Identifier: MPL-2.0
//! Editing newtypes.
//!
//! This module provides type-safe wrappers for overlay and crop values,
//! ensuring they are always within valid ranges.

// =============================================================================
// Stroke Width Bounds
// =============================================================================

/// Freehand stroke width bounds, in image pixels.
pub mod stroke_bounds {
    /// Thinnest stroke.
    pub const MIN: f32 = 1.0;
    /// Thickest stroke.
    pub const MAX: f32 = 100.0;
    /// Default stroke width.
    pub const DEFAULT: f32 = 5.0;
}

// =============================================================================
// StrokeWidth
// =============================================================================

/// Freehand stroke width in image pixels, clamped to 1–100.
///
/// # Example
///
/// ```
/// use photo_editor::domain::editing::StrokeWidth;
///
/// assert_eq!(StrokeWidth::new(0.0).value(), 1.0);
/// assert_eq!(StrokeWidth::new(12.5).value(), 12.5);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StrokeWidth(f32);

impl StrokeWidth {
    /// Creates a new stroke width, clamping the value to the valid range.
    /// Non-finite input falls back to the default.
    #[must_use]
    pub fn new(width: f32) -> Self {
        if !width.is_finite() {
            return Self::default();
        }
        Self(width.clamp(stroke_bounds::MIN, stroke_bounds::MAX))
    }

    #[must_use]
    pub fn value(self) -> f32 {
        self.0
    }

    /// Half the width, the radius of a single-point dot.
    #[must_use]
    pub fn radius(self) -> f32 {
        self.0 / 2.0
    }
}

impl Default for StrokeWidth {
    fn default() -> Self {
        Self(stroke_bounds::DEFAULT)
    }
}

// =============================================================================
// Font Size
// =============================================================================

/// Text size bounds, in image pixels.
pub mod font_bounds {
    pub const MIN: f32 = 6.0;
    pub const MAX: f32 = 512.0;
    pub const DEFAULT: f32 = 30.0;
}

/// Font size (pixel height of one em), clamped to 6–512.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FontSize(f32);

impl FontSize {
    #[must_use]
    pub fn new(size: f32) -> Self {
        if !size.is_finite() {
            return Self::default();
        }
        Self(size.clamp(font_bounds::MIN, font_bounds::MAX))
    }

    #[must_use]
    pub fn value(self) -> f32 {
        self.0
    }
}

impl Default for FontSize {
    fn default() -> Self {
        Self(font_bounds::DEFAULT)
    }
}

// =============================================================================
// Scale Factor
// =============================================================================

/// Bounds shared by sticker scale and free-form crop zoom.
pub mod scale_bounds {
    pub const MIN: f32 = 0.1;
    pub const MAX: f32 = 10.0;
    pub const DEFAULT: f32 = 1.0;
}

/// A multiplicative scale factor, clamped to 0.1–10.
///
/// Used for sticker size and for the zoom part of the free-form crop
/// transform. A factor of `1.0` means native size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScaleFactor(f32);

impl ScaleFactor {
    #[must_use]
    pub fn new(factor: f32) -> Self {
        if !factor.is_finite() {
            return Self::default();
        }
        Self(factor.clamp(scale_bounds::MIN, scale_bounds::MAX))
    }

    #[must_use]
    pub fn value(self) -> f32 {
        self.0
    }

    /// Multiplies the factor, clamping the result.
    #[must_use]
    pub fn times(self, factor: f32) -> Self {
        Self::new(self.0 * factor)
    }

    #[must_use]
    pub fn is_min(self) -> bool {
        self.0 <= scale_bounds::MIN
    }

    #[must_use]
    pub fn is_max(self) -> bool {
        self.0 >= scale_bounds::MAX
    }
}

impl Default for ScaleFactor {
    fn default() -> Self {
        Self(scale_bounds::DEFAULT)
    }
}

// =============================================================================
// Tests
// =============================================================================
