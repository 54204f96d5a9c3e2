// SPDX-License-Identifier: MPL-2.0
//! Conversions between [`Bitmap`] and the `image` / `tiny-skia` buffers.
//!
//! `Bitmap` stores straight alpha; `tiny_skia::Pixmap` stores premultiplied
//! alpha. Opaque pixels survive a round trip unchanged.

use crate::domain::Bitmap;
use image_rs::{DynamicImage, RgbaImage};
use tiny_skia::{ColorU8, Pixmap};

/// Copies a bitmap into an `image` RGBA buffer.
#[must_use]
pub fn to_rgba_image(bitmap: &Bitmap) -> RgbaImage {
    let (width, height) = bitmap.dimensions();
    RgbaImage::from_raw(width, height, bitmap.rgba_bytes().to_vec())
        .unwrap_or_else(|| RgbaImage::new(width, height))
}

/// Takes ownership of an `image` RGBA buffer.
#[must_use]
pub fn from_rgba_image(image: RgbaImage) -> Bitmap {
    let (width, height) = image.dimensions();
    Bitmap::from_rgba(width, height, image.into_raw())
}

/// Converts any decoded image to an RGBA8 bitmap.
#[must_use]
pub fn from_dynamic(image: DynamicImage) -> Bitmap {
    from_rgba_image(image.into_rgba8())
}

/// Premultiplies a bitmap into a new pixmap.
///
/// Returns `None` for zero-sized bitmaps, which tiny-skia cannot represent.
#[must_use]
pub fn to_pixmap(bitmap: &Bitmap) -> Option<Pixmap> {
    let mut pixmap = Pixmap::new(bitmap.width(), bitmap.height())?;
    for (dst, src) in pixmap
        .pixels_mut()
        .iter_mut()
        .zip(bitmap.rgba_bytes().chunks_exact(4))
    {
        *dst = ColorU8::from_rgba(src[0], src[1], src[2], src[3]).premultiply();
    }
    Some(pixmap)
}

/// Demultiplies a pixmap into a new bitmap.
#[must_use]
pub fn from_pixmap(pixmap: &Pixmap) -> Bitmap {
    let mut rgba = Vec::with_capacity(pixmap.pixels().len() * 4);
    for px in pixmap.pixels() {
        let c = px.demultiply();
        rgba.extend_from_slice(&[c.red(), c.green(), c.blue(), c.alpha()]);
    }
    Bitmap::from_rgba(pixmap.width(), pixmap.height(), rgba)
}
