// SPDX-License-Identifier: MPL-2.0
//! Free-form ("magic") crop selection.
//!
//! Four corner handles move independently. Pan, zoom and rotation form one
//! transform about the image center that is applied to the source before
//! sampling.

use super::{CropRegion, QuadRegion};
use crate::domain::editing::ScaleFactor;
use crate::domain::{Affine, Point};

/// One corner handle of the quadrilateral.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Corner {
    TopLeft,
    TopRight,
    BottomRight,
    BottomLeft,
}

impl Corner {
    pub const ALL: [Self; 4] = [
        Self::TopLeft,
        Self::TopRight,
        Self::BottomRight,
        Self::BottomLeft,
    ];

    fn index(self) -> usize {
        match self {
            Self::TopLeft => 0,
            Self::TopRight => 1,
            Self::BottomRight => 2,
            Self::BottomLeft => 3,
        }
    }
}

/// Quadrilateral selection plus a pan/zoom/rotate transform.
#[derive(Debug, Clone, PartialEq)]
pub struct FreeformSelection {
    width: f32,
    height: f32,
    corners: [Point; 4],
    pan: Point,
    zoom: ScaleFactor,
    rotation_deg: f32,
    dragging: Option<Corner>,
}

impl FreeformSelection {
    #[must_use]
    pub fn new(image_width: u32, image_height: u32) -> Self {
        let (width, height) = (image_width as f32, image_height as f32);
        Self {
            width,
            height,
            corners: image_corners(width, height),
            pan: Point::ORIGIN,
            zoom: ScaleFactor::default(),
            rotation_deg: 0.0,
            dragging: None,
        }
    }

    #[must_use]
    pub fn corners(&self) -> [Point; 4] {
        self.corners
    }

    #[must_use]
    pub fn corner(&self, corner: Corner) -> Point {
        self.corners[corner.index()]
    }

    #[must_use]
    pub fn zoom(&self) -> ScaleFactor {
        self.zoom
    }

    #[must_use]
    pub fn rotation_deg(&self) -> f32 {
        self.rotation_deg
    }

    #[must_use]
    pub fn pan(&self) -> Point {
        self.pan
    }

    /// Returns `true` when the selection is the full, untransformed image.
    #[must_use]
    pub fn is_reset(&self) -> bool {
        self.corners == image_corners(self.width, self.height)
            && self.pan == Point::ORIGIN
            && self.rotation_deg == 0.0
            && self.zoom == ScaleFactor::default()
    }

    /// Moves one corner, clamped to the image.
    pub fn move_corner(&mut self, corner: Corner, to: Point) {
        if !to.is_finite() {
            return;
        }
        self.corners[corner.index()] = to.clamp_to(self.width, self.height);
    }

    /// Returns the corner handle nearest to `point`, if within `tolerance`.
    #[must_use]
    pub fn corner_at(&self, point: Point, tolerance: f32) -> Option<Corner> {
        Corner::ALL
            .into_iter()
            .map(|c| {
                let p = self.corner(c);
                (c, (p.x - point.x).hypot(p.y - point.y))
            })
            .filter(|(_, distance)| *distance <= tolerance)
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(c, _)| c)
    }

    /// Starts dragging the corner under `cursor`, if any.
    pub fn begin_drag(&mut self, cursor: Point, tolerance: f32) {
        self.dragging = self.corner_at(cursor, tolerance);
    }

    pub fn drag_to(&mut self, cursor: Point) {
        if let Some(corner) = self.dragging {
            self.move_corner(corner, cursor);
        }
    }

    pub fn end_drag(&mut self) {
        self.dragging = None;
    }

    #[must_use]
    pub fn is_dragging(&self) -> bool {
        self.dragging.is_some()
    }

    pub fn pan_by(&mut self, dx: f32, dy: f32) {
        if dx.is_finite() && dy.is_finite() {
            self.pan = self.pan.offset(dx, dy);
        }
    }

    /// Multiplies the zoom, clamped to the [`ScaleFactor`] bounds.
    pub fn zoom_by(&mut self, factor: f32) {
        self.zoom = self.zoom.times(factor);
    }

    /// Rotates clockwise by `degrees`, normalized to `[0, 360)`.
    pub fn rotate_by(&mut self, degrees: f32) {
        if degrees.is_finite() {
            self.rotation_deg = (self.rotation_deg + degrees).rem_euclid(360.0);
        }
    }

    /// The transform applied to the source before sampling.
    #[must_use]
    pub fn transform(&self) -> Affine {
        if self.pan == Point::ORIGIN
            && self.rotation_deg == 0.0
            && self.zoom == ScaleFactor::default()
        {
            return Affine::IDENTITY;
        }
        let center = Point::new(self.width / 2.0, self.height / 2.0);
        Affine::about(center, self.zoom.value(), self.rotation_deg, self.pan)
    }

    /// Puts the handles back on the image corners and drops the transform.
    pub fn reset(&mut self) {
        self.corners = image_corners(self.width, self.height);
        self.pan = Point::ORIGIN;
        self.zoom = ScaleFactor::default();
        self.rotation_deg = 0.0;
        self.dragging = None;
    }

    #[must_use]
    pub fn region(&self) -> CropRegion {
        CropRegion::Quad(QuadRegion {
            corners: self.corners,
            transform: self.transform(),
            mask_outside: false,
        })
    }
}

fn image_corners(width: f32, height: f32) -> [Point; 4] {
    [
        Point::new(0.0, 0.0),
        Point::new(width, 0.0),
        Point::new(width, height),
        Point::new(0.0, height),
    ]
}
