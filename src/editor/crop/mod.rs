// SPDX-License-Identifier: MPL-2.0
//! Crop engine: rectangular and free-form ("magic") crops.
//!
//! [`crop`] is the pure operation. [`CropSession`] wraps it with the
//! interactive selection a host drives while the crop tool is open:
//! a [`RectSelection`] with resize handles, or a [`FreeformSelection`]
//! with four independent corners and a pan/zoom/rotate transform.

mod freeform;
mod rect;

pub use freeform::{Corner, FreeformSelection};
pub use rect::{CropRatio, HandlePosition, RectSelection};

use crate::domain::error::CropError;
use crate::domain::geometry::{polygon_area, polygon_contains};
use crate::domain::{Affine, Bitmap, Color, PixelRect, Point};

/// Upper bound on free-form output size. Larger results are sampled down
/// uniformly so that a high zoom can't allocate gigabytes.
pub const MAX_OUTPUT_PIXELS: u64 = 50_000_000;

/// Area (in square pixels) below which a quadrilateral counts as degenerate.
const MIN_QUAD_AREA: f32 = 1e-3;

/// A region of the source image to keep.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CropRegion {
    /// Axis-aligned rectangle in source pixels.
    Rect(PixelRect),
    /// Free-form quadrilateral plus a transform applied to the source.
    Quad(QuadRegion),
}

/// A free-form crop.
///
/// `corners` are in source coordinates, in drag-handle order (top-left,
/// top-right, bottom-right, bottom-left). `transform` maps source
/// coordinates to the transformed image that gets sampled.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuadRegion {
    pub corners: [Point; 4],
    pub transform: Affine,
    /// Leave pixels outside the transformed quadrilateral transparent
    /// instead of filling the whole bounding box.
    pub mask_outside: bool,
}

impl QuadRegion {
    /// The full, untransformed source image.
    #[must_use]
    pub fn full(width: u32, height: u32) -> Self {
        let (w, h) = (width as f32, height as f32);
        Self {
            corners: [
                Point::new(0.0, 0.0),
                Point::new(w, 0.0),
                Point::new(w, h),
                Point::new(0.0, h),
            ],
            transform: Affine::IDENTITY,
            mask_outside: false,
        }
    }
}

/// Result of closing the crop tool.
///
/// `Cancelled` is distinct from a crop that happens to keep the whole image,
/// so the host can tell "user aborted" from "nothing changed".
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CropOutcome {
    Cropped(Bitmap),
    Cancelled,
}

/// Applies `region` to `source` and returns the cropped bitmap.
///
/// # Errors
///
/// - [`CropError::DegenerateRegion`] if the region has zero width, height or
///   area, or its transform cannot be inverted
/// - [`CropError::OutOfBounds`] if the region doesn't overlap the source
pub fn crop(source: &Bitmap, region: &CropRegion) -> Result<Bitmap, CropError> {
    let result = match region {
        CropRegion::Rect(rect) => crop_rect(source, rect),
        CropRegion::Quad(quad) => crop_quad(source, quad),
    };
    match &result {
        Ok(bitmap) => log::debug!(
            "Cropped {}x{} to {}x{}",
            source.width(),
            source.height(),
            bitmap.width(),
            bitmap.height()
        ),
        Err(err) => log::debug!("Crop rejected: {err}"),
    }
    result
}

fn crop_rect(source: &Bitmap, rect: &PixelRect) -> Result<Bitmap, CropError> {
    if rect.is_empty() {
        return Err(CropError::DegenerateRegion);
    }
    let clipped = rect
        .intersect(&PixelRect::full(source.width(), source.height()))
        .ok_or(CropError::OutOfBounds)?;

    // Intersection with the image keeps both offsets non-negative.
    let left = clipped.x as usize * 4;
    let row_len = clipped.width as usize * 4;
    let mut rgba = Vec::with_capacity(row_len * clipped.height as usize);
    for y in clipped.y..clipped.bottom() {
        if let Some(row) = source.row(y as u32) {
            rgba.extend_from_slice(&row[left..left + row_len]);
        }
    }
    Bitmap::try_from_rgba(clipped.width, clipped.height, rgba).ok_or(CropError::OutOfBounds)
}

fn crop_quad(source: &Bitmap, quad: &QuadRegion) -> Result<Bitmap, CropError> {
    if !quad.corners.iter().all(|p| p.is_finite()) {
        return Err(CropError::DegenerateRegion);
    }
    if polygon_area(&quad.corners).abs() < MIN_QUAD_AREA {
        return Err(CropError::DegenerateRegion);
    }
    let inverse = quad.transform.invert().ok_or(CropError::DegenerateRegion)?;

    let (w, h) = (source.width() as f32, source.height() as f32);
    let (min, max) = bounds(&quad.corners);
    if max.x <= 0.0 || max.y <= 0.0 || min.x >= w || min.y >= h {
        return Err(CropError::OutOfBounds);
    }

    let clamped = quad.corners.map(|p| p.clamp_to(w, h));
    if polygon_area(&clamped).abs() < MIN_QUAD_AREA {
        return Err(CropError::DegenerateRegion);
    }

    let transformed = clamped.map(|p| quad.transform.apply(p));
    let (min, max) = bounds(&transformed);
    let (left, top) = (snap(min.x).floor(), snap(min.y).floor());
    let span_w = (snap(max.x).ceil() - left).max(0.0);
    let span_h = (snap(max.y).ceil() - top).max(0.0);
    if span_w < 1.0 || span_h < 1.0 || !span_w.is_finite() || !span_h.is_finite() {
        return Err(CropError::DegenerateRegion);
    }

    let pixels = f64::from(span_w) * f64::from(span_h);
    let step = if pixels > MAX_OUTPUT_PIXELS as f64 {
        (pixels / MAX_OUTPUT_PIXELS as f64).sqrt() as f32
    } else {
        1.0
    };
    let out_w = ((span_w / step).floor() as u32).max(1);
    let out_h = ((span_h / step).floor() as u32).max(1);

    Ok(Bitmap::from_fn(out_w, out_h, |x, y| {
        let target = Point::new(
            left + (x as f32 + 0.5) * step,
            top + (y as f32 + 0.5) * step,
        );
        if quad.mask_outside && !polygon_contains(&transformed, target) {
            return Color::TRANSPARENT;
        }
        let src = inverse.apply(target);
        bilinear_sample(source, src.x - 0.5, src.y - 0.5)
    }))
}

/// Rounds values within rounding noise of a whole pixel, so that a
/// quarter turn doesn't grow the output by one pixel.
fn snap(v: f32) -> f32 {
    let rounded = v.round();
    if (v - rounded).abs() < 1e-3 {
        rounded
    } else {
        v
    }
}

fn bounds(points: &[Point]) -> (Point, Point) {
    points.iter().fold(
        (
            Point::new(f32::INFINITY, f32::INFINITY),
            Point::new(f32::NEG_INFINITY, f32::NEG_INFINITY),
        ),
        |(min, max), p| {
            (
                Point::new(min.x.min(p.x), min.y.min(p.y)),
                Point::new(max.x.max(p.x), max.y.max(p.y)),
            )
        },
    )
}

/// Bilinear sample at pixel-grid coordinates (pixel `(i, j)` is at `(i, j)`).
///
/// Interpolates in premultiplied space so transparent neighbours don't
/// bleed their color. Samples outside the image are transparent.
fn bilinear_sample(img: &Bitmap, x: f32, y: f32) -> Color {
    let x0 = x.floor();
    let y0 = y.floor();
    let fx = x - x0;
    let fy = y - y0;
    let (x0, y0) = (x0 as i64, y0 as i64);

    let sample = |sx: i64, sy: i64| -> [f32; 4] {
        let (Ok(sx), Ok(sy)) = (u32::try_from(sx), u32::try_from(sy)) else {
            return [0.0; 4];
        };
        match img.pixel(sx, sy) {
            Some(c) => {
                let a = f32::from(c.a);
                [f32::from(c.r) * a, f32::from(c.g) * a, f32::from(c.b) * a, a]
            }
            None => [0.0; 4],
        }
    };

    let weights = [
        ((1.0 - fx) * (1.0 - fy), sample(x0, y0)),
        (fx * (1.0 - fy), sample(x0 + 1, y0)),
        ((1.0 - fx) * fy, sample(x0, y0 + 1)),
        (fx * fy, sample(x0 + 1, y0 + 1)),
    ];

    let mut acc = [0.0f32; 4];
    for (weight, px) in weights {
        if weight == 0.0 {
            continue;
        }
        for (a, v) in acc.iter_mut().zip(px) {
            *a += weight * v;
        }
    }

    let alpha = acc[3];
    if alpha <= 0.0 {
        return Color::TRANSPARENT;
    }
    let channel = |v: f32| (v / alpha).round().clamp(0.0, 255.0) as u8;
    Color::rgba(
        channel(acc[0]),
        channel(acc[1]),
        channel(acc[2]),
        alpha.round().clamp(0.0, 255.0) as u8,
    )
}

// =============================================================================
// CropSession
// =============================================================================

/// Which crop tool to open.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CropMode {
    Rect,
    Freeform,
}

/// The live selection of an open crop tool.
#[derive(Debug, Clone, PartialEq)]
pub enum CropSelection {
    Rect(RectSelection),
    Freeform(FreeformSelection),
}

/// An open crop tool: a snapshot of the base image and the user's selection.
///
/// Nothing here touches the editing session's base image. The session
/// replaces its base only when [`apply`](Self::apply) succeeds.
#[derive(Debug, Clone)]
pub struct CropSession {
    source: Bitmap,
    selection: CropSelection,
}

impl CropSession {
    #[must_use]
    pub fn new(source: Bitmap, mode: CropMode) -> Self {
        let (width, height) = source.dimensions();
        let selection = match mode {
            CropMode::Rect => CropSelection::Rect(RectSelection::new(width, height)),
            CropMode::Freeform => CropSelection::Freeform(FreeformSelection::new(width, height)),
        };
        Self { source, selection }
    }

    #[must_use]
    pub fn source(&self) -> &Bitmap {
        &self.source
    }

    #[must_use]
    pub fn mode(&self) -> CropMode {
        match self.selection {
            CropSelection::Rect(_) => CropMode::Rect,
            CropSelection::Freeform(_) => CropMode::Freeform,
        }
    }

    #[must_use]
    pub fn selection(&self) -> &CropSelection {
        &self.selection
    }

    /// The rectangle selection, if this is a rectangular crop.
    pub fn rect_mut(&mut self) -> Option<&mut RectSelection> {
        match &mut self.selection {
            CropSelection::Rect(rect) => Some(rect),
            CropSelection::Freeform(_) => None,
        }
    }

    /// The free-form selection, if this is a magic crop.
    pub fn freeform_mut(&mut self) -> Option<&mut FreeformSelection> {
        match &mut self.selection {
            CropSelection::Freeform(freeform) => Some(freeform),
            CropSelection::Rect(_) => None,
        }
    }

    /// Restores the selection to the full, untransformed source image.
    pub fn reset(&mut self) {
        match &mut self.selection {
            CropSelection::Rect(rect) => rect.reset(),
            CropSelection::Freeform(freeform) => freeform.reset(),
        }
    }

    /// The region the current selection describes.
    #[must_use]
    pub fn region(&self) -> CropRegion {
        match &self.selection {
            CropSelection::Rect(rect) => rect.region(),
            CropSelection::Freeform(freeform) => freeform.region(),
        }
    }

    /// Crops the source snapshot with the current selection.
    ///
    /// # Errors
    ///
    /// See [`crop`].
    pub fn apply(&self) -> Result<Bitmap, CropError> {
        crop(&self.source, &self.region())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gradient(width: u32, height: u32) -> Bitmap {
        Bitmap::from_fn(width, height, |x, y| {
            Color::rgb((x % 256) as u8, (y % 256) as u8, ((x + y) % 256) as u8)
        })
    }

    #[test]
    fn rect_crop_keeps_exact_size_and_offset() {
        let source = gradient(400, 300);
        let out = crop(&source, &CropRegion::Rect(PixelRect::new(50, 50, 200, 150)))
            .expect("valid crop");
        assert_eq!(out.dimensions(), (200, 150));
        assert_eq!(out.pixel(0, 0), source.pixel(50, 50));
        assert_eq!(out.pixel(199, 149), source.pixel(249, 199));
    }

    #[test]
    fn rect_crop_clips_to_source() {
        let source = gradient(100, 80);
        let out = crop(&source, &CropRegion::Rect(PixelRect::new(90, -10, 50, 30)))
            .expect("partially inside");
        assert_eq!(out.dimensions(), (10, 20));
        assert_eq!(out.pixel(0, 0), source.pixel(90, 0));
    }

    #[test]
    fn zero_area_rect_is_degenerate() {
        let source = gradient(10, 10);
        for rect in [PixelRect::new(2, 2, 0, 5), PixelRect::new(2, 2, 5, 0)] {
            assert_eq!(
                crop(&source, &CropRegion::Rect(rect)),
                Err(CropError::DegenerateRegion)
            );
        }
    }

    #[test]
    fn rect_outside_is_out_of_bounds() {
        let source = gradient(10, 10);
        let rect = PixelRect::new(10, 0, 5, 5);
        assert_eq!(
            crop(&source, &CropRegion::Rect(rect)),
            Err(CropError::OutOfBounds)
        );
    }

    #[test]
    fn full_quad_with_identity_reproduces_source() {
        let source = gradient(31, 17);
        let out = crop(&source, &CropRegion::Quad(QuadRegion::full(31, 17))).expect("full quad");
        assert_eq!(out, source);
    }

    #[test]
    fn quad_with_translation_shifts_samples() {
        let source = gradient(20, 20);
        let quad = QuadRegion {
            transform: Affine::translate(5.0, 3.0),
            ..QuadRegion::full(20, 20)
        };
        let out = crop(&source, &CropRegion::Quad(quad)).expect("translated quad");
        // The bounding box moves with the image, so the content is unchanged.
        assert_eq!(out, source);
    }

    #[test]
    fn quad_rotated_quarter_turn_swaps_dimensions() {
        let source = gradient(40, 20);
        let quad = QuadRegion {
            transform: Affine::about(Point::new(20.0, 10.0), 1.0, 90.0, Point::ORIGIN),
            ..QuadRegion::full(40, 20)
        };
        let out = crop(&source, &CropRegion::Quad(quad)).expect("rotated quad");
        assert_eq!(out.dimensions(), (20, 40));
        // Top-left of the source ends up at the top-right after a clockwise turn.
        assert_eq!(out.pixel(19, 0), source.pixel(0, 0));
    }

    #[test]
    fn quad_corners_are_clamped_to_source() {
        let source = gradient(10, 10);
        let quad = QuadRegion {
            corners: [
                Point::new(-5.0, -5.0),
                Point::new(15.0, -5.0),
                Point::new(15.0, 15.0),
                Point::new(-5.0, 15.0),
            ],
            ..QuadRegion::full(10, 10)
        };
        let out = crop(&source, &CropRegion::Quad(quad)).expect("clamped quad");
        assert_eq!(out, source);
    }

    #[test]
    fn collinear_quad_is_degenerate() {
        let source = gradient(10, 10);
        let quad = QuadRegion {
            corners: [
                Point::new(1.0, 1.0),
                Point::new(5.0, 5.0),
                Point::new(7.0, 7.0),
                Point::new(9.0, 9.0),
            ],
            ..QuadRegion::full(10, 10)
        };
        assert_eq!(
            crop(&source, &CropRegion::Quad(quad)),
            Err(CropError::DegenerateRegion)
        );
    }

    #[test]
    fn singular_transform_is_degenerate() {
        let source = gradient(10, 10);
        let quad = QuadRegion {
            transform: Affine::scale(0.0, 0.0),
            ..QuadRegion::full(10, 10)
        };
        assert_eq!(
            crop(&source, &CropRegion::Quad(quad)),
            Err(CropError::DegenerateRegion)
        );
    }

    #[test]
    fn quad_outside_is_out_of_bounds() {
        let source = gradient(10, 10);
        let quad = QuadRegion {
            corners: [
                Point::new(20.0, 20.0),
                Point::new(30.0, 20.0),
                Point::new(30.0, 30.0),
                Point::new(20.0, 30.0),
            ],
            ..QuadRegion::full(10, 10)
        };
        assert_eq!(
            crop(&source, &CropRegion::Quad(quad)),
            Err(CropError::OutOfBounds)
        );
    }

    #[test]
    fn masked_quad_clears_pixels_outside_the_shape() {
        let source = Bitmap::filled(20, 20, Color::WHITE);
        let quad = QuadRegion {
            corners: [
                Point::new(10.0, 0.0),
                Point::new(20.0, 10.0),
                Point::new(10.0, 20.0),
                Point::new(0.0, 10.0),
            ],
            transform: Affine::IDENTITY,
            mask_outside: true,
        };
        let out = crop(&source, &CropRegion::Quad(quad)).expect("diamond");
        assert_eq!(out.dimensions(), (20, 20));
        assert_eq!(out.pixel(0, 0), Some(Color::TRANSPARENT));
        assert_eq!(out.pixel(10, 10), Some(Color::WHITE));
    }

    #[test]
    fn zoomed_quad_scales_output() {
        let source = gradient(100, 100);
        let quad = QuadRegion {
            transform: Affine::scale(10.0, 10.0),
            ..QuadRegion::full(100, 100)
        };
        let out = crop(&source, &CropRegion::Quad(quad)).expect("zoomed");
        assert!(u64::from(out.width()) * u64::from(out.height()) <= MAX_OUTPUT_PIXELS);
        assert_eq!(out.dimensions(), (1000, 1000));
    }

    #[test]
    fn session_reset_restores_full_region() {
        let source = gradient(64, 48);
        let mut session = CropSession::new(source.clone(), CropMode::Freeform);
        if let Some(freeform) = session.freeform_mut() {
            freeform.move_corner(Corner::TopLeft, Point::new(10.0, 10.0));
            freeform.rotate_by(15.0);
        }
        assert_ne!(session.region(), CropRegion::Quad(QuadRegion::full(64, 48)));

        session.reset();
        assert_eq!(session.region(), CropRegion::Quad(QuadRegion::full(64, 48)));
        assert_eq!(session.apply().expect("full crop"), source);
    }

    #[test]
    fn session_mode_accessors_match() {
        let mut session = CropSession::new(gradient(8, 8), CropMode::Rect);
        assert_eq!(session.mode(), CropMode::Rect);
        assert!(session.rect_mut().is_some());
        assert!(session.freeform_mut().is_none());
    }
}
