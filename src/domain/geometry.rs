// SPDX-License-Identifier: MPL-2.0
//! Geometry primitives in image-pixel coordinates.
//!
//! The origin is the top-left corner of the image, `x` grows right and `y`
//! grows down. Rotation angles are in degrees, clockwise on screen.

/// A point in image coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const ORIGIN: Self = Self::new(0.0, 0.0);

    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    #[must_use]
    pub fn offset(self, dx: f32, dy: f32) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }

    /// Clamps the point into `[0, width] x [0, height]`.
    #[must_use]
    pub fn clamp_to(self, width: f32, height: f32) -> Self {
        Self::new(self.x.clamp(0.0, width), self.y.clamp(0.0, height))
    }

    #[must_use]
    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// An axis-aligned rectangle in whole pixels.
///
/// The origin is signed so that a selection dragged past the top-left edge
/// can still be represented (and clipped) rather than wrapping around.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct PixelRect {
    pub x: i64,
    pub y: i64,
    pub width: u32,
    pub height: u32,
}

impl PixelRect {
    #[must_use]
    pub const fn new(x: i64, y: i64, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// The rectangle covering a whole `width x height` image.
    #[must_use]
    pub const fn full(width: u32, height: u32) -> Self {
        Self::new(0, 0, width, height)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    #[must_use]
    pub fn right(&self) -> i64 {
        self.x + i64::from(self.width)
    }

    #[must_use]
    pub fn bottom(&self) -> i64 {
        self.y + i64::from(self.height)
    }

    /// Returns the overlap of two rectangles, or `None` if they don't overlap.
    #[must_use]
    pub fn intersect(&self, other: &Self) -> Option<Self> {
        let left = self.x.max(other.x);
        let top = self.y.max(other.y);
        let right = self.right().min(other.right());
        let bottom = self.bottom().min(other.bottom());
        if right <= left || bottom <= top {
            return None;
        }
        Some(Self::new(
            left,
            top,
            u32::try_from(right - left).ok()?,
            u32::try_from(bottom - top).ok()?,
        ))
    }
}

// =============================================================================
// Affine
// =============================================================================

/// A 2-D affine transform.
///
/// Maps `(x, y)` to `(a*x + c*y + tx, b*x + d*y + ty)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Affine {
    pub a: f32,
    pub b: f32,
    pub c: f32,
    pub d: f32,
    pub tx: f32,
    pub ty: f32,
}

impl Default for Affine {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Affine {
    pub const IDENTITY: Self = Self {
        a: 1.0,
        b: 0.0,
        c: 0.0,
        d: 1.0,
        tx: 0.0,
        ty: 0.0,
    };

    #[must_use]
    pub const fn translate(tx: f32, ty: f32) -> Self {
        Self {
            tx,
            ty,
            ..Self::IDENTITY
        }
    }

    #[must_use]
    pub const fn scale(sx: f32, sy: f32) -> Self {
        Self {
            a: sx,
            d: sy,
            ..Self::IDENTITY
        }
    }

    /// Clockwise rotation (in screen space, where `y` points down).
    #[must_use]
    pub fn rotate(degrees: f32) -> Self {
        let (sin, cos) = degrees.to_radians().sin_cos();
        Self {
            a: cos,
            b: sin,
            c: -sin,
            d: cos,
            tx: 0.0,
            ty: 0.0,
        }
    }

    /// Returns the transform that applies `self` first, then `next`.
    #[must_use]
    pub fn then(self, next: Self) -> Self {
        Self {
            a: next.a * self.a + next.c * self.b,
            b: next.b * self.a + next.d * self.b,
            c: next.a * self.c + next.c * self.d,
            d: next.b * self.c + next.d * self.d,
            tx: next.a * self.tx + next.c * self.ty + next.tx,
            ty: next.b * self.tx + next.d * self.ty + next.ty,
        }
    }

    /// Rotation by `degrees` and uniform `scale` about `pivot`, followed by
    /// a translation of `pan`.
    #[must_use]
    pub fn about(pivot: Point, scale: f32, degrees: f32, pan: Point) -> Self {
        Self::translate(-pivot.x, -pivot.y)
            .then(Self::scale(scale, scale))
            .then(Self::rotate(degrees))
            .then(Self::translate(pivot.x + pan.x, pivot.y + pan.y))
    }

    #[must_use]
    pub fn determinant(&self) -> f32 {
        self.a * self.d - self.b * self.c
    }

    /// Returns the inverse transform, or `None` if the matrix is singular.
    #[must_use]
    pub fn invert(&self) -> Option<Self> {
        let det = self.determinant();
        if det.abs() < 1e-8 || !det.is_finite() {
            return None;
        }
        let inv = 1.0 / det;
        Some(Self {
            a: self.d * inv,
            b: -self.b * inv,
            c: -self.c * inv,
            d: self.a * inv,
            tx: (self.c * self.ty - self.d * self.tx) * inv,
            ty: (self.b * self.tx - self.a * self.ty) * inv,
        })
    }

    #[must_use]
    pub fn apply(&self, p: Point) -> Point {
        Point::new(
            self.a * p.x + self.c * p.y + self.tx,
            self.b * p.x + self.d * p.y + self.ty,
        )
    }

    #[must_use]
    pub fn is_identity(&self) -> bool {
        *self == Self::IDENTITY
    }
}

/// Signed area of a polygon (shoelace formula). Positive for clockwise
/// winding in screen space.
#[must_use]
pub fn polygon_area(points: &[Point]) -> f32 {
    if points.len() < 3 {
        return 0.0;
    }
    let mut twice_area = 0.0;
    for (i, p) in points.iter().enumerate() {
        let q = points[(i + 1) % points.len()];
        twice_area += p.x * q.y - q.x * p.y;
    }
    twice_area / 2.0
}

/// Returns `true` if `p` lies inside the polygon (even-odd rule).
#[must_use]
pub fn polygon_contains(points: &[Point], p: Point) -> bool {
    let mut inside = false;
    let n = points.len();
    for i in 0..n {
        let a = points[i];
        let b = points[(i + n - 1) % n];
        if (a.y > p.y) != (b.y > p.y) {
            let cross_x = (b.x - a.x) * (p.y - a.y) / (b.y - a.y) + a.x;
            if p.x < cross_x {
                inside = !inside;
            }
        }
    }
    inside
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::assert_abs_diff_eq;

    #[test]
    fn intersect_clips_to_overlap() {
        let image = PixelRect::full(100, 80);
        let rect = PixelRect::new(-10, 70, 30, 30);
        assert_eq!(rect.intersect(&image), Some(PixelRect::new(0, 70, 20, 10)));
    }

    #[test]
    fn intersect_of_disjoint_rects_is_none() {
        let image = PixelRect::full(100, 80);
        assert_eq!(PixelRect::new(100, 0, 5, 5).intersect(&image), None);
        assert_eq!(PixelRect::new(-5, -5, 5, 5).intersect(&image), None);
    }

    #[test]
    fn rotate_quarter_turn_is_clockwise_on_screen() {
        let p = Affine::rotate(90.0).apply(Point::new(1.0, 0.0));
        assert_abs_diff_eq!(p.x, 0.0, epsilon = 1e-6);
        assert_abs_diff_eq!(p.y, 1.0, epsilon = 1e-6);
    }

    #[test]
    fn then_applies_left_to_right() {
        let t = Affine::scale(2.0, 2.0).then(Affine::translate(5.0, 0.0));
        assert_eq!(t.apply(Point::new(1.0, 1.0)), Point::new(7.0, 2.0));
    }

    #[test]
    fn invert_round_trips() {
        let t = Affine::about(Point::new(50.0, 40.0), 1.5, 30.0, Point::new(3.0, -2.0));
        let inv = t.invert().expect("invertible");
        let p = Point::new(12.0, 34.0);
        let back = inv.apply(t.apply(p));
        assert_abs_diff_eq!(back.x, p.x, epsilon = 1e-3);
        assert_abs_diff_eq!(back.y, p.y, epsilon = 1e-3);
    }

    #[test]
    fn singular_transform_has_no_inverse() {
        assert!(Affine::scale(0.0, 1.0).invert().is_none());
    }

    #[test]
    fn about_keeps_pivot_fixed_without_pan() {
        let pivot = Point::new(20.0, 10.0);
        let moved = Affine::about(pivot, 3.0, 45.0, Point::ORIGIN).apply(pivot);
        assert_abs_diff_eq!(moved.x, pivot.x, epsilon = 1e-4);
        assert_abs_diff_eq!(moved.y, pivot.y, epsilon = 1e-4);
    }

    #[test]
    fn polygon_area_and_containment() {
        let square = [
            Point::new(0.0, 0.0),
            Point::new(10.0, 0.0),
            Point::new(10.0, 10.0),
            Point::new(0.0, 10.0),
        ];
        assert_abs_diff_eq!(polygon_area(&square).abs(), 100.0);
        assert!(polygon_contains(&square, Point::new(5.0, 5.0)));
        assert!(!polygon_contains(&square, Point::new(15.0, 5.0)));

        let collinear = [Point::new(0.0, 0.0), Point::new(5.0, 5.0), Point::new(9.0, 9.0)];
        assert_abs_diff_eq!(polygon_area(&collinear), 0.0);
    }
}
