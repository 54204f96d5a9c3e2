// SPDX-License-Identifier: MPL-2.0
//! Immutable pixel grids and colors.
//!
//! A [`Bitmap`] is never mutated after construction. Every crop, composite or
//! decode produces a new value, and clones share the pixel buffer, so handing
//! a snapshot to a background worker costs one reference-count increment.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Bytes per RGBA pixel.
pub const BYTES_PER_PIXEL: usize = 4;

// =============================================================================
// Color
// =============================================================================

/// A straight-alpha RGBA color.
///
/// Serialized as a `#RRGGBB` or `#RRGGBBAA` hex string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const BLACK: Self = Self::rgb(0, 0, 0);
    pub const WHITE: Self = Self::rgb(255, 255, 255);
    pub const TRANSPARENT: Self = Self::rgba(0, 0, 0, 0);

    #[must_use]
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    #[must_use]
    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Returns the color as `[r, g, b, a]`.
    #[must_use]
    pub const fn to_array(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }

    /// Returns the same color with its alpha multiplied by `opacity` (0.0–1.0).
    #[must_use]
    pub fn with_opacity(self, opacity: f32) -> Self {
        let alpha = (f32::from(self.a) * opacity.clamp(0.0, 1.0)).round() as u8;
        Self { a: alpha, ..self }
    }

    #[must_use]
    pub fn is_opaque(self) -> bool {
        self.a == u8::MAX
    }
}

/// Error returned when parsing a `#RRGGBB` or `#RRGGBBAA` string fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseColorError(pub String);

impl fmt::Display for ParseColorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid color '{}': expected #RRGGBB or #RRGGBBAA", self.0)
    }
}

impl std::error::Error for ParseColorError {}

impl FromStr for Color {
    type Err = ParseColorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseColorError(s.to_string());
        let hex = s.trim().strip_prefix('#').ok_or_else(err)?;
        if !hex.is_ascii() || !(hex.len() == 6 || hex.len() == 8) {
            return Err(err());
        }
        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).map_err(|_| err());
        let alpha = if hex.len() == 8 { channel(6)? } else { u8::MAX };
        Ok(Self::rgba(channel(0)?, channel(2)?, channel(4)?, alpha))
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)?;
        if !self.is_opaque() {
            write!(f, "{:02x}", self.a)?;
        }
        Ok(())
    }
}

impl TryFrom<String> for Color {
    type Error = ParseColorError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Color> for String {
    fn from(color: Color) -> Self {
        color.to_string()
    }
}

// =============================================================================
// Bitmap
// =============================================================================

/// An immutable RGBA8 pixel grid (straight alpha, row-major).
///
/// # Example
///
/// ```
/// use photo_editor::domain::{Bitmap, Color};
///
/// let bitmap = Bitmap::filled(4, 2, Color::WHITE);
/// let snapshot = bitmap.clone(); // shares the pixel buffer
///
/// assert_eq!(snapshot.dimensions(), (4, 2));
/// assert_eq!(bitmap.pixel(3, 1), Some(Color::WHITE));
/// assert_eq!(bitmap.pixel(4, 0), None);
/// ```
#[derive(Clone)]
pub struct Bitmap {
    width: u32,
    height: u32,
    rgba: Arc<Vec<u8>>,
}

impl Bitmap {
    /// Creates a bitmap from owned RGBA bytes.
    ///
    /// Returns `None` if the buffer length doesn't match `width * height * 4`.
    #[must_use]
    pub fn try_from_rgba(width: u32, height: u32, rgba: Vec<u8>) -> Option<Self> {
        if rgba.len() != expected_len(width, height) {
            return None;
        }
        Some(Self {
            width,
            height,
            rgba: Arc::new(rgba),
        })
    }

    /// Creates a bitmap from owned RGBA bytes.
    ///
    /// # Panics
    ///
    /// Panics if the pixel data length doesn't match `width * height * 4`.
    #[must_use]
    pub fn from_rgba(width: u32, height: u32, rgba: Vec<u8>) -> Self {
        let len = rgba.len();
        Self::try_from_rgba(width, height, rgba).unwrap_or_else(|| {
            panic!(
                "RGBA data length mismatch: expected {}, got {len}",
                expected_len(width, height)
            )
        })
    }

    /// Creates a bitmap where every pixel has the same color.
    #[must_use]
    pub fn filled(width: u32, height: u32, color: Color) -> Self {
        let pixel = color.to_array();
        let mut rgba = Vec::with_capacity(expected_len(width, height));
        for _ in 0..(width as usize) * (height as usize) {
            rgba.extend_from_slice(&pixel);
        }
        Self {
            width,
            height,
            rgba: Arc::new(rgba),
        }
    }

    /// Creates a bitmap by evaluating `f(x, y)` for every pixel.
    #[must_use]
    pub fn from_fn(width: u32, height: u32, mut f: impl FnMut(u32, u32) -> Color) -> Self {
        let mut rgba = Vec::with_capacity(expected_len(width, height));
        for y in 0..height {
            for x in 0..width {
                rgba.extend_from_slice(&f(x, y).to_array());
            }
        }
        Self {
            width,
            height,
            rgba: Arc::new(rgba),
        }
    }

    #[must_use]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[must_use]
    pub fn height(&self) -> u32 {
        self.height
    }

    #[must_use]
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Returns `true` if the bitmap has no pixels.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Returns the RGBA bytes, row-major.
    #[must_use]
    pub fn rgba_bytes(&self) -> &[u8] {
        &self.rgba
    }

    /// Returns the color at `(x, y)`, or `None` outside the grid.
    #[must_use]
    pub fn pixel(&self, x: u32, y: u32) -> Option<Color> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let offset = ((y as usize) * (self.width as usize) + x as usize) * BYTES_PER_PIXEL;
        let px = &self.rgba[offset..offset + BYTES_PER_PIXEL];
        Some(Color::rgba(px[0], px[1], px[2], px[3]))
    }

    /// Returns one row of RGBA bytes.
    #[must_use]
    pub fn row(&self, y: u32) -> Option<&[u8]> {
        if y >= self.height {
            return None;
        }
        let stride = self.width as usize * BYTES_PER_PIXEL;
        let start = y as usize * stride;
        Some(&self.rgba[start..start + stride])
    }

    /// Returns `true` if both bitmaps share the same pixel buffer.
    #[must_use]
    pub fn shares_pixels_with(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.rgba, &other.rgba)
    }

    /// Consumes the bitmap and returns its RGBA bytes, copying only if shared.
    #[must_use]
    pub fn into_rgba(self) -> Vec<u8> {
        Arc::try_unwrap(self.rgba).unwrap_or_else(|shared| (*shared).clone())
    }
}

impl fmt::Debug for Bitmap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bitmap")
            .field("width", &self.width)
            .field("height", &self.height)
            .finish_non_exhaustive()
    }
}

impl PartialEq for Bitmap {
    fn eq(&self, other: &Self) -> bool {
        self.width == other.width && self.height == other.height && self.rgba == other.rgba
    }
}

impl Eq for Bitmap {}

fn expected_len(width: u32, height: u32) -> usize {
    (width as usize) * (height as usize) * BYTES_PER_PIXEL
}
