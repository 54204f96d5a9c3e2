// SPDX-License-Identifier: MPL-2.0
//! Overlay stack: strokes, text and stickers painted above the base image.
//!
//! Insertion order is paint order. Mutations addressed to an id that no
//! longer exists are silent no-ops; overlay editing is best-effort and must
//! never abort a session.

use crate::domain::editing::{FontSize, ScaleFactor, StrokeWidth};
use crate::domain::{Bitmap, Color, Point};
use std::fmt;
use std::sync::Arc;

/// Opaque overlay identifier, unique within one stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementId(u64);

impl ElementId {
    /// Placeholder id for a stroke still being drawn; never handed out by a
    /// stack.
    pub(crate) const LIVE: Self = Self(u64::MAX);

    #[must_use]
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

// =============================================================================
// Element kinds
// =============================================================================

/// A sealed freehand stroke. Points are shared, so cloning is cheap.
#[derive(Debug, Clone, PartialEq)]
pub struct Stroke {
    pub points: Arc<[Point]>,
    pub color: Color,
    pub width: StrokeWidth,
}

/// A block of text, possibly several lines, centered on `position`.
#[derive(Debug, Clone, PartialEq)]
pub struct TextBlock {
    pub text: String,
    /// Registered font family; `None` uses the compositor's default font.
    pub font_family: Option<String>,
    pub size: FontSize,
    pub color: Color,
    pub position: Point,
    /// Clockwise rotation about `position`, in degrees.
    pub rotation_deg: f32,
    /// Draw a faint drop shadow under the glyphs.
    pub shadow: bool,
}

impl TextBlock {
    /// Creates a block with the default font, size and a white color.
    #[must_use]
    pub fn new(text: impl Into<String>, position: Point) -> Self {
        Self {
            text: text.into(),
            font_family: None,
            size: FontSize::default(),
            color: Color::WHITE,
            position,
            rotation_deg: 0.0,
            shadow: true,
        }
    }
}

/// An image pasted on top of the base, centered on `position`.
#[derive(Debug, Clone, PartialEq)]
pub struct Sticker {
    pub bitmap: Bitmap,
    pub position: Point,
    pub scale: ScaleFactor,
    /// Clockwise rotation about `position`, in degrees.
    pub rotation_deg: f32,
}

impl Sticker {
    #[must_use]
    pub fn new(bitmap: Bitmap, position: Point) -> Self {
        Self {
            bitmap,
            position,
            scale: ScaleFactor::default(),
            rotation_deg: 0.0,
        }
    }
}

/// What an overlay element draws.
#[derive(Debug, Clone, PartialEq)]
pub enum OverlayKind {
    Stroke(Stroke),
    Text(TextBlock),
    Sticker(Sticker),
}

impl OverlayKind {
    /// The point that [`OverlayStack::move_to`] places: a stroke's first
    /// point, a text block's anchor, a sticker's center.
    #[must_use]
    pub fn anchor(&self) -> Point {
        match self {
            OverlayKind::Stroke(stroke) => stroke.points.first().copied().unwrap_or_default(),
            OverlayKind::Text(text) => text.position,
            OverlayKind::Sticker(sticker) => sticker.position,
        }
    }

    fn translate(&mut self, dx: f32, dy: f32) {
        match self {
            OverlayKind::Stroke(stroke) => {
                stroke.points = stroke.points.iter().map(|p| p.offset(dx, dy)).collect();
            }
            OverlayKind::Text(text) => text.position = text.position.offset(dx, dy),
            OverlayKind::Sticker(sticker) => sticker.position = sticker.position.offset(dx, dy),
        }
    }
}

/// One entry of the stack.
#[derive(Debug, Clone, PartialEq)]
pub struct OverlayElement {
    pub id: ElementId,
    /// Paint order; higher paints later.
    pub z_index: u64,
    pub kind: OverlayKind,
}

// =============================================================================
// OverlayStack
// =============================================================================

/// Ordered overlay elements of one editing session.
#[derive(Debug, Clone, Default)]
pub struct OverlayStack {
    elements: Vec<OverlayElement>,
    next_id: u64,
    next_z: u64,
}

impl OverlayStack {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an element on top of the stack and returns its id.
    pub fn add(&mut self, kind: OverlayKind) -> ElementId {
        let id = ElementId(self.next_id);
        self.next_id += 1;
        let z_index = self.next_z;
        self.next_z += 1;
        self.elements.push(OverlayElement { id, z_index, kind });
        id
    }

    /// Moves an element so its anchor lands on `position`.
    ///
    /// Unknown ids and non-finite positions are ignored.
    pub fn move_to(&mut self, id: ElementId, position: Point) {
        if !position.is_finite() {
            return;
        }
        if let Some(element) = self.get_mut(id) {
            let anchor = element.kind.anchor();
            element
                .kind
                .translate(position.x - anchor.x, position.y - anchor.y);
        }
    }

    /// Scales a sticker or text block by `factor`. Ignored for strokes and
    /// unknown ids.
    pub fn scale_by(&mut self, id: ElementId, factor: f32) {
        let Some(element) = self.get_mut(id) else {
            return;
        };
        match &mut element.kind {
            OverlayKind::Sticker(sticker) => sticker.scale = sticker.scale.times(factor),
            OverlayKind::Text(text) if factor.is_finite() => {
                text.size = FontSize::new(text.size.value() * factor);
            }
            _ => {}
        }
    }

    /// Rotates a sticker or text block clockwise. Ignored for strokes and
    /// unknown ids.
    pub fn rotate_by(&mut self, id: ElementId, degrees: f32) {
        if !degrees.is_finite() {
            return;
        }
        let Some(element) = self.get_mut(id) else {
            return;
        };
        match &mut element.kind {
            OverlayKind::Sticker(sticker) => {
                sticker.rotation_deg = (sticker.rotation_deg + degrees).rem_euclid(360.0);
            }
            OverlayKind::Text(text) => {
                text.rotation_deg = (text.rotation_deg + degrees).rem_euclid(360.0);
            }
            OverlayKind::Stroke(_) => {}
        }
    }

    /// Replaces the text of a text block. Ignored for other kinds.
    pub fn set_text(&mut self, id: ElementId, text: &str) {
        if let Some(OverlayElement {
            kind: OverlayKind::Text(block),
            ..
        }) = self.get_mut(id)
        {
            text.clone_into(&mut block.text);
        }
    }

    /// Removes an element, returning it if it existed.
    pub fn remove(&mut self, id: ElementId) -> Option<OverlayElement> {
        let index = self.elements.iter().position(|e| e.id == id)?;
        Some(self.elements.remove(index))
    }

    /// Removes every element. Ids are not reused afterwards.
    pub fn clear(&mut self) {
        self.elements.clear();
    }

    #[must_use]
    pub fn get(&self, id: ElementId) -> Option<&OverlayElement> {
        self.elements.iter().find(|e| e.id == id)
    }

    fn get_mut(&mut self, id: ElementId) -> Option<&mut OverlayElement> {
        self.elements.iter_mut().find(|e| e.id == id)
    }

    #[must_use]
    pub fn contains(&self, id: ElementId) -> bool {
        self.get(id).is_some()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Elements bottom to top.
    #[must_use]
    pub fn elements_in_paint_order(&self) -> &[OverlayElement] {
        &self.elements
    }
}

// =============================================================================
// LiveStroke
// =============================================================================

/// A stroke being drawn while the pointer is down.
#[derive(Debug, Clone, PartialEq)]
pub struct LiveStroke {
    points: Vec<Point>,
    color: Color,
    width: StrokeWidth,
}

impl LiveStroke {
    #[must_use]
    pub fn begin(start: Point, color: Color, width: StrokeWidth) -> Self {
        let mut stroke = Self {
            points: Vec::new(),
            color,
            width,
        };
        stroke.extend(start);
        stroke
    }

    /// Appends a point. Non-finite points and repeats of the last point are
    /// dropped.
    pub fn extend(&mut self, point: Point) {
        if !point.is_finite() || self.points.last() == Some(&point) {
            return;
        }
        self.points.push(point);
    }

    #[must_use]
    pub fn points(&self) -> &[Point] {
        &self.points
    }

    /// Freezes the stroke. A stroke without any point yields `None`.
    #[must_use]
    pub fn seal(self) -> Option<Stroke> {
        if self.points.is_empty() {
            return None;
        }
        Some(Stroke {
            points: self.points.into(),
            color: self.color,
            width: self.width,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> OverlayKind {
        OverlayKind::Text(TextBlock::new(s, Point::new(10.0, 10.0)))
    }

    fn sticker() -> OverlayKind {
        OverlayKind::Sticker(Sticker::new(
            Bitmap::filled(2, 2, Color::BLACK),
            Point::new(5.0, 5.0),
        ))
    }

    fn ids(stack: &OverlayStack) -> Vec<ElementId> {
        stack.elements_in_paint_order().iter().map(|e| e.id).collect()
    }

    #[test]
    fn add_assigns_increasing_ids_and_z() {
        let mut stack = OverlayStack::new();
        let a = stack.add(text("a"));
        let b = stack.add(sticker());
        assert_ne!(a, b);
        let z: Vec<_> = stack
            .elements_in_paint_order()
            .iter()
            .map(|e| e.z_index)
            .collect();
        assert_eq!(z, vec![0, 1]);
        assert_eq!(ids(&stack), vec![a, b]);
    }

    #[test]
    fn ids_are_not_reused_after_clear() {
        let mut stack = OverlayStack::new();
        let a = stack.add(text("a"));
        stack.clear();
        let b = stack.add(text("b"));
        assert_ne!(a, b);
        assert!(stack.get(b).is_some_and(|e| e.z_index > 0));
    }

    #[test]
    fn remove_drops_only_that_element() {
        let mut stack = OverlayStack::new();
        let a = stack.add(text("a"));
        let b = stack.add(text("b"));
        let c = stack.add(text("c"));

        assert!(stack.remove(b).is_some());
        assert_eq!(ids(&stack), vec![a, c]);
        assert!(!stack.contains(b));
    }

    #[test]
    fn removing_unknown_id_is_a_no_op() {
        let mut stack = OverlayStack::new();
        let a = stack.add(text("a"));
        stack.remove(a);
        assert!(stack.remove(a).is_none());
        assert!(stack.is_empty());
    }

    #[test]
    fn move_unknown_id_is_a_no_op() {
        let mut stack = OverlayStack::new();
        let a = stack.add(text("a"));
        let before = stack.elements_in_paint_order().to_vec();
        stack.move_to(ElementId(999), Point::new(1.0, 1.0));
        assert_eq!(stack.elements_in_paint_order(), before.as_slice());
        assert!(stack.contains(a));
    }

    #[test]
    fn move_translates_stroke_by_its_first_point() {
        let mut stack = OverlayStack::new();
        let mut live = LiveStroke::begin(Point::new(1.0, 1.0), Color::BLACK, StrokeWidth::default());
        live.extend(Point::new(3.0, 2.0));
        let id = stack.add(OverlayKind::Stroke(live.seal().expect("has points")));

        stack.move_to(id, Point::new(11.0, 21.0));

        let Some(OverlayElement {
            kind: OverlayKind::Stroke(stroke),
            ..
        }) = stack.get(id)
        else {
            panic!("stroke missing");
        };
        assert_eq!(
            &*stroke.points,
            &[Point::new(11.0, 21.0), Point::new(13.0, 22.0)]
        );
    }

    #[test]
    fn move_ignores_non_finite_position() {
        let mut stack = OverlayStack::new();
        let id = stack.add(sticker());
        stack.move_to(id, Point::new(f32::NAN, 0.0));
        assert_eq!(stack.get(id).map(|e| e.kind.anchor()), Some(Point::new(5.0, 5.0)));
    }

    #[test]
    fn scale_and_rotate_apply_to_stickers() {
        let mut stack = OverlayStack::new();
        let id = stack.add(sticker());
        stack.scale_by(id, 2.0);
        stack.rotate_by(id, -90.0);
        let Some(OverlayElement {
            kind: OverlayKind::Sticker(s),
            ..
        }) = stack.get(id)
        else {
            panic!("sticker missing");
        };
        assert!((s.scale.value() - 2.0).abs() < f32::EPSILON);
        assert!((s.rotation_deg - 270.0).abs() < f32::EPSILON);
    }

    #[test]
    fn set_text_only_touches_text_blocks() {
        let mut stack = OverlayStack::new();
        let t = stack.add(text("old"));
        let s = stack.add(sticker());
        stack.set_text(t, "new");
        stack.set_text(s, "ignored");
        assert!(matches!(
            stack.get(t).map(|e| &e.kind),
            Some(OverlayKind::Text(block)) if block.text == "new"
        ));
        assert!(matches!(stack.get(s).map(|e| &e.kind), Some(OverlayKind::Sticker(_))));
    }

    #[test]
    fn live_stroke_drops_repeats_and_nan() {
        let mut live = LiveStroke::begin(Point::new(0.0, 0.0), Color::BLACK, StrokeWidth::new(3.0));
        live.extend(Point::new(0.0, 0.0));
        live.extend(Point::new(f32::NAN, 1.0));
        live.extend(Point::new(1.0, 1.0));
        assert_eq!(live.points().len(), 2);
    }

    #[test]
    fn live_stroke_from_nan_start_seals_to_none() {
        let live = LiveStroke::begin(Point::new(f32::NAN, 0.0), Color::BLACK, StrokeWidth::default());
        assert!(live.seal().is_none());
    }
}
