// SPDX-License-Identifier: MPL-2.0
//! Rectangular crop selection with resize handles.

use super::CropRegion;
use crate::domain::{PixelRect, Point};

/// Smallest selection edge, in source pixels (or the image edge if smaller).
pub const MIN_SELECTION_SIZE: f32 = 10.0;

/// Crop aspect ratio constraints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CropRatio {
    #[default]
    Free,
    Square,        // 1:1
    Landscape,     // 16:9
    Portrait,      // 9:16
    Photo,         // 4:3
    PhotoPortrait, // 3:4
}

impl CropRatio {
    /// Width divided by height, or `None` when unconstrained.
    #[must_use]
    pub fn aspect(self) -> Option<f32> {
        match self {
            CropRatio::Free => None,
            CropRatio::Square => Some(1.0),
            CropRatio::Landscape => Some(16.0 / 9.0),
            CropRatio::Portrait => Some(9.0 / 16.0),
            CropRatio::Photo => Some(4.0 / 3.0),
            CropRatio::PhotoPortrait => Some(3.0 / 4.0),
        }
    }
}

/// Position of a resize handle on the crop rectangle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandlePosition {
    TopLeft,
    Top,
    TopRight,
    Right,
    BottomRight,
    Bottom,
    BottomLeft,
    Left,
}

impl HandlePosition {
    pub const ALL: [Self; 8] = [
        Self::TopLeft,
        Self::Top,
        Self::TopRight,
        Self::Right,
        Self::BottomRight,
        Self::Bottom,
        Self::BottomLeft,
        Self::Left,
    ];

    fn moves_left(self) -> bool {
        matches!(self, Self::TopLeft | Self::Left | Self::BottomLeft)
    }

    fn moves_right(self) -> bool {
        matches!(self, Self::TopRight | Self::Right | Self::BottomRight)
    }

    fn moves_top(self) -> bool {
        matches!(self, Self::TopLeft | Self::Top | Self::TopRight)
    }

    fn moves_bottom(self) -> bool {
        matches!(self, Self::BottomLeft | Self::Bottom | Self::BottomRight)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Rect {
    x: f32,
    y: f32,
    width: f32,
    height: f32,
}

impl Rect {
    fn right(&self) -> f32 {
        self.x + self.width
    }

    fn bottom(&self) -> f32 {
        self.y + self.height
    }

    fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    fn handle_point(&self, handle: HandlePosition) -> Point {
        let cx = self.x + self.width / 2.0;
        let cy = self.y + self.height / 2.0;
        match handle {
            HandlePosition::TopLeft => Point::new(self.x, self.y),
            HandlePosition::Top => Point::new(cx, self.y),
            HandlePosition::TopRight => Point::new(self.right(), self.y),
            HandlePosition::Right => Point::new(self.right(), cy),
            HandlePosition::BottomRight => Point::new(self.right(), self.bottom()),
            HandlePosition::Bottom => Point::new(cx, self.bottom()),
            HandlePosition::BottomLeft => Point::new(self.x, self.bottom()),
            HandlePosition::Left => Point::new(self.x, cy),
        }
    }

    fn contains(&self, p: Point) -> bool {
        p.x >= self.x && p.x <= self.right() && p.y >= self.y && p.y <= self.bottom()
    }
}

/// Crop drag state for the interactive overlay.
#[derive(Debug, Clone, Copy, PartialEq)]
enum DragState {
    None,
    /// Dragging the entire rectangle.
    Moving { start_cursor: Point, start_rect: Rect },
    /// Dragging a resize handle.
    Resizing {
        handle: HandlePosition,
        start_cursor: Point,
        start_rect: Rect,
    },
}

/// An axis-aligned crop selection in source-image coordinates.
///
/// Starts at the full image. Every mutation clamps the rectangle to the
/// image and keeps it at least [`MIN_SELECTION_SIZE`] wide and high, so
/// malformed pointer input can never produce an invalid selection.
#[derive(Debug, Clone, PartialEq)]
pub struct RectSelection {
    image_width: f32,
    image_height: f32,
    rect: Rect,
    ratio: CropRatio,
    drag: DragState,
}

impl RectSelection {
    #[must_use]
    pub fn new(image_width: u32, image_height: u32) -> Self {
        let (w, h) = (image_width as f32, image_height as f32);
        Self {
            image_width: w,
            image_height: h,
            rect: Rect {
                x: 0.0,
                y: 0.0,
                width: w,
                height: h,
            },
            ratio: CropRatio::Free,
            drag: DragState::None,
        }
    }

    /// Returns `(x, y, width, height)` in source pixels.
    #[must_use]
    pub fn bounds(&self) -> (f32, f32, f32, f32) {
        (self.rect.x, self.rect.y, self.rect.width, self.rect.height)
    }

    #[must_use]
    pub fn ratio(&self) -> CropRatio {
        self.ratio
    }

    #[must_use]
    pub fn is_dragging(&self) -> bool {
        self.drag != DragState::None
    }

    /// The selection rounded to whole pixels.
    #[must_use]
    pub fn region(&self) -> CropRegion {
        let left = self.rect.x.round();
        let top = self.rect.y.round();
        let right = self.rect.right().round();
        let bottom = self.rect.bottom().round();
        CropRegion::Rect(PixelRect::new(
            left as i64,
            top as i64,
            (right - left).max(0.0) as u32,
            (bottom - top).max(0.0) as u32,
        ))
    }

    /// Sets the selection directly, clamping it into the image.
    pub fn set_bounds(&mut self, x: f32, y: f32, width: f32, height: f32) {
        if ![x, y, width, height].iter().all(|v| v.is_finite()) {
            return;
        }
        let width = clamp(width, self.min_width(), self.image_width);
        let height = clamp(height, self.min_height(), self.image_height);
        self.rect = Rect {
            x: clamp(x, 0.0, self.image_width - width),
            y: clamp(y, 0.0, self.image_height - height),
            width,
            height,
        };
        if let Some(aspect) = self.ratio.aspect() {
            self.fit_aspect_centered(aspect);
        }
    }

    /// Locks (or unlocks) the aspect ratio.
    ///
    /// A locked ratio shrinks the selection to the largest rectangle of that
    /// ratio that fits inside it, keeping its center.
    pub fn set_ratio(&mut self, ratio: CropRatio) {
        self.ratio = ratio;
        if let Some(aspect) = ratio.aspect() {
            self.fit_aspect_centered(aspect);
        }
    }

    /// Returns the handle within `tolerance` pixels of `point`, if any.
    #[must_use]
    pub fn handle_at(&self, point: Point, tolerance: f32) -> Option<HandlePosition> {
        HandlePosition::ALL.into_iter().find(|&handle| {
            let p = self.rect.handle_point(handle);
            (p.x - point.x).abs() <= tolerance && (p.y - point.y).abs() <= tolerance
        })
    }

    /// Starts a pointer drag: on a handle resizes, inside the rectangle
    /// moves it, anywhere else does nothing.
    pub fn begin_drag(&mut self, cursor: Point, tolerance: f32) {
        if !cursor.is_finite() {
            return;
        }
        if let Some(handle) = self.handle_at(cursor, tolerance) {
            self.drag = DragState::Resizing {
                handle,
                start_cursor: cursor,
                start_rect: self.rect,
            };
        } else if self.rect.contains(cursor) {
            self.drag = DragState::Moving {
                start_cursor: cursor,
                start_rect: self.rect,
            };
        }
    }

    /// Continues the current drag with the cursor at `cursor`.
    pub fn drag_to(&mut self, cursor: Point) {
        if !cursor.is_finite() {
            return;
        }
        match self.drag {
            DragState::None => {}
            DragState::Moving {
                start_cursor,
                start_rect,
            } => {
                let dx = cursor.x - start_cursor.x;
                let dy = cursor.y - start_cursor.y;
                self.rect = Rect {
                    x: clamp(start_rect.x + dx, 0.0, self.image_width - start_rect.width),
                    y: clamp(start_rect.y + dy, 0.0, self.image_height - start_rect.height),
                    ..start_rect
                };
            }
            DragState::Resizing {
                handle,
                start_cursor,
                start_rect,
            } => {
                let dx = cursor.x - start_cursor.x;
                let dy = cursor.y - start_cursor.y;
                self.rect = self.resize(start_rect, handle, dx, dy);
            }
        }
    }

    pub fn end_drag(&mut self) {
        self.drag = DragState::None;
    }

    /// Returns the selection to the full image and drops any ratio lock.
    pub fn reset(&mut self) {
        self.rect = Rect {
            x: 0.0,
            y: 0.0,
            width: self.image_width,
            height: self.image_height,
        };
        self.ratio = CropRatio::Free;
        self.drag = DragState::None;
    }

    fn min_width(&self) -> f32 {
        MIN_SELECTION_SIZE.min(self.image_width)
    }

    fn min_height(&self) -> f32 {
        MIN_SELECTION_SIZE.min(self.image_height)
    }

    fn resize(&self, start: Rect, handle: HandlePosition, dx: f32, dy: f32) -> Rect {
        let (min_w, min_h) = (self.min_width(), self.min_height());
        let mut left = start.x;
        let mut top = start.y;
        let mut right = start.right();
        let mut bottom = start.bottom();

        if handle.moves_left() {
            left = clamp(left + dx, 0.0, right - min_w);
        }
        if handle.moves_right() {
            right = clamp(right + dx, left + min_w, self.image_width);
        }
        if handle.moves_top() {
            top = clamp(top + dy, 0.0, bottom - min_h);
        }
        if handle.moves_bottom() {
            bottom = clamp(bottom + dy, top + min_h, self.image_height);
        }

        let free = Rect {
            x: left,
            y: top,
            width: right - left,
            height: bottom - top,
        };
        match self.ratio.aspect() {
            Some(aspect) => self.constrain(free, start, handle, aspect),
            None => free,
        }
    }

    /// Forces `rect` to `aspect`, anchored on the edge or corner opposite
    /// the dragged handle.
    fn constrain(&self, rect: Rect, start: Rect, handle: HandlePosition, aspect: f32) -> Rect {
        let horizontal = handle.moves_left() || handle.moves_right();
        let vertical = handle.moves_top() || handle.moves_bottom();

        // Corners follow the width; edges follow the dragged dimension.
        let (mut width, mut height) = if horizontal {
            (rect.width, rect.width / aspect)
        } else {
            (rect.height * aspect, rect.height)
        };

        // Room available from the anchor towards the drag direction.
        let anchor_x = if handle.moves_left() { start.right() } else { start.x };
        let anchor_y = if handle.moves_top() { start.bottom() } else { start.y };
        let max_w = if !horizontal {
            self.image_width
        } else if handle.moves_left() {
            anchor_x
        } else {
            self.image_width - anchor_x
        };
        let max_h = if !vertical {
            self.image_height
        } else if handle.moves_top() {
            anchor_y
        } else {
            self.image_height - anchor_y
        };

        let shrink = (max_w / width).min(max_h / height).min(1.0);
        width *= shrink;
        height *= shrink;

        let x = if handle.moves_left() {
            anchor_x - width
        } else if handle.moves_right() {
            anchor_x
        } else {
            start.center().x - width / 2.0
        };
        let y = if handle.moves_top() {
            anchor_y - height
        } else if handle.moves_bottom() {
            anchor_y
        } else {
            start.center().y - height / 2.0
        };

        Rect {
            x: clamp(x, 0.0, (self.image_width - width).max(0.0)),
            y: clamp(y, 0.0, (self.image_height - height).max(0.0)),
            width,
            height,
        }
    }

    fn fit_aspect_centered(&mut self, aspect: f32) {
        let center = self.rect.center();
        let (mut width, mut height) = (self.rect.width, self.rect.width / aspect);
        if height > self.rect.height {
            height = self.rect.height;
            width = height * aspect;
        }
        self.rect = Rect {
            x: clamp(center.x - width / 2.0, 0.0, (self.image_width - width).max(0.0)),
            y: clamp(center.y - height / 2.0, 0.0, (self.image_height - height).max(0.0)),
            width,
            height,
        };
    }
}

/// Clamp that tolerates `lo > hi` from rounding noise (favours `hi`).
fn clamp(v: f32, lo: f32, hi: f32) -> f32 {
    v.max(lo).min(hi)
}
