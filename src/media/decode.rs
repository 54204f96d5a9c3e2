// SPDX-License-Identifier: MPL-2.0
//! Image decoding from files and byte buffers (PNG, JPEG, GIF, WebP, SVG...).

use crate::domain::error::LoadError;
use crate::domain::Bitmap;
use crate::media::convert;
use image_rs::{DynamicImage, ImageDecoder, ImageReader};
use resvg::usvg;
use std::fs;
use std::io::Cursor;
use std::path::Path;

/// Longest body excerpt quoted in an error message.
const MAX_QUOTED_BODY: usize = 200;

/// Loads an image file into a bitmap, honoring its EXIF orientation.
///
/// SVG files are rasterized at their intrinsic size.
///
/// # Errors
///
/// Returns [`LoadError::Io`] if the file cannot be read and
/// [`LoadError::Undecodable`] if its content is not an image.
pub fn load_image<P: AsRef<Path>>(path: P) -> Result<Bitmap, LoadError> {
    let path = path.as_ref();
    let bytes = fs::read(path)?;
    let is_svg = path
        .extension()
        .and_then(|s| s.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("svg"));

    if is_svg {
        rasterize_svg(&bytes)
    } else {
        decode_bytes(&bytes, None)
    }
}

/// Decodes an in-memory image.
///
/// `content_type` is the MIME type reported by the source, if any. It selects
/// the SVG rasterizer and, for `text/*` or JSON bodies, lets the error quote
/// the body so the user sees what the server actually sent.
///
/// # Errors
///
/// Returns [`LoadError::Undecodable`] when the bytes are not an image.
pub fn decode_bytes(bytes: &[u8], content_type: Option<&str>) -> Result<Bitmap, LoadError> {
    let mime = content_type.map(str::to_ascii_lowercase).unwrap_or_default();
    if mime.starts_with("image/svg") || looks_like_svg(bytes) {
        return rasterize_svg(bytes);
    }

    decode_raster(bytes).map_err(|reason| {
        if is_textual(&mime) {
            let body = String::from_utf8_lossy(bytes);
            let excerpt: String = body.chars().take(MAX_QUOTED_BODY).collect();
            LoadError::Undecodable(format!("{} bytes of {mime}: {excerpt}", bytes.len()))
        } else if mime.is_empty() {
            LoadError::Undecodable(format!("{} bytes: {reason}", bytes.len()))
        } else {
            LoadError::Undecodable(format!("{} bytes of {mime}: {reason}", bytes.len()))
        }
    })
}

fn decode_raster(bytes: &[u8]) -> Result<Bitmap, String> {
    let mut decoder = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| e.to_string())?
        .into_decoder()
        .map_err(|e| e.to_string())?;
    // A broken EXIF block shouldn't make a decodable image unusable.
    let orientation = decoder.orientation().ok();
    let mut image = DynamicImage::from_decoder(decoder).map_err(|e| e.to_string())?;
    if let Some(orientation) = orientation {
        image.apply_orientation(orientation);
    }
    Ok(convert::from_dynamic(image))
}

fn rasterize_svg(bytes: &[u8]) -> Result<Bitmap, LoadError> {
    let tree = usvg::Tree::from_data(bytes, &usvg::Options::default())
        .map_err(|e| LoadError::Undecodable(format!("invalid svg: {e}")))?;

    let size = tree.size().to_int_size();
    let mut pixmap = tiny_skia::Pixmap::new(size.width(), size.height())
        .ok_or_else(|| LoadError::Undecodable("svg has empty dimensions".into()))?;

    resvg::render(&tree, tiny_skia::Transform::default(), &mut pixmap.as_mut());

    Ok(convert::from_pixmap(&pixmap))
}

fn looks_like_svg(bytes: &[u8]) -> bool {
    let head = &bytes[..bytes.len().min(256)];
    let text = String::from_utf8_lossy(head);
    let text = text.trim_start_matches('\u{feff}').trim_start();
    text.starts_with("<svg") || (text.starts_with("<?xml") && text.contains("<svg"))
}

fn is_textual(mime: &str) -> bool {
    mime.starts_with("text/") || mime.contains("json")
}
