// SPDX-License-Identifier: MPL-2.0
//! Text overlay rasterization.
//!
//! Lines are laid out with kerning and centered horizontally; the whole
//! block is centered vertically on its anchor. Glyph coverage is
//! accumulated into one buffer and then tinted, so the drop shadow reuses
//! the same glyph shapes.

use super::draw_layer;
use crate::domain::{Affine, Color, Point};
use crate::editor::overlay::TextBlock;
use ab_glyph::{point, Font, FontArc, Glyph, OutlinedGlyph, PxScale, ScaleFont};
use tiny_skia::{ColorU8, Pixmap};

/// Transparent margin around the glyph bounds.
const PADDING: i32 = 2;

/// Layers beyond this side length are not rasterized.
const MAX_LAYER_SIDE: u32 = 16_384;

/// Black at 20% opacity.
pub const SHADOW_COLOR: Color = Color::rgba(0, 0, 0, 51);

/// Shadow displacement on the canvas, in pixels.
pub const SHADOW_OFFSET: Point = Point::new(1.0, 0.0);

/// Anti-aliased glyph coverage of one text block.
struct Coverage {
    width: u32,
    height: u32,
    data: Vec<f32>,
    /// Point of the layer that lands on the block's anchor.
    anchor: Point,
}

impl Coverage {
    fn tint(&self, color: Color) -> Option<Pixmap> {
        let mut pixmap = Pixmap::new(self.width, self.height)?;
        for (dst, &c) in pixmap.pixels_mut().iter_mut().zip(&self.data) {
            let alpha = (c * f32::from(color.a)).round().clamp(0.0, 255.0) as u8;
            *dst = ColorU8::from_rgba(color.r, color.g, color.b, alpha).premultiply();
        }
        Some(pixmap)
    }
}

/// Paints `block` onto `canvas`. Returns `false` when nothing was drawn,
/// e.g. for whitespace-only text.
pub(super) fn draw_text(canvas: &mut Pixmap, font: &FontArc, block: &TextBlock) -> bool {
    let Some(coverage) = rasterize(font, block) else {
        return false;
    };

    let place = Affine::translate(-coverage.anchor.x, -coverage.anchor.y)
        .then(Affine::rotate(block.rotation_deg))
        .then(Affine::translate(block.position.x, block.position.y));

    if block.shadow {
        if let Some(shadow) = coverage.tint(SHADOW_COLOR) {
            let offset = place.then(Affine::translate(SHADOW_OFFSET.x, SHADOW_OFFSET.y));
            draw_layer(canvas, &shadow, offset);
        }
    }

    match coverage.tint(block.color) {
        Some(layer) => {
            draw_layer(canvas, &layer, place);
            true
        }
        None => false,
    }
}

/// Lays out every line and returns positioned glyphs plus the block height.
fn layout(font: &FontArc, text: &str, size: f32) -> (Vec<Glyph>, f32) {
    let scale = PxScale::from(size);
    let scaled = font.as_scaled(scale);
    let line_height = scaled.height() + scaled.line_gap();

    let mut glyphs = Vec::new();
    let mut line_count = 0usize;
    for (index, line) in text.split('\n').enumerate() {
        line_count += 1;
        let line = line.trim_end_matches('\r');
        let baseline = scaled.ascent() + index as f32 * line_height;

        let mut caret = -line_width(font, line, scale) / 2.0;
        let mut previous = None;
        for c in line.chars().filter(|c| !c.is_control()) {
            let id = scaled.glyph_id(c);
            if let Some(prev) = previous {
                caret += scaled.kern(prev, id);
            }
            glyphs.push(id.with_scale_and_position(scale, point(caret, baseline)));
            caret += scaled.h_advance(id);
            previous = Some(id);
        }
    }

    let block_height = line_count as f32 * line_height - scaled.line_gap();
    (glyphs, block_height)
}

fn line_width(font: &FontArc, line: &str, scale: PxScale) -> f32 {
    let scaled = font.as_scaled(scale);
    let mut width = 0.0;
    let mut previous = None;
    for c in line.chars().filter(|c| !c.is_control()) {
        let id = scaled.glyph_id(c);
        if let Some(prev) = previous {
            width += scaled.kern(prev, id);
        }
        width += scaled.h_advance(id);
        previous = Some(id);
    }
    width
}

fn rasterize(font: &FontArc, block: &TextBlock) -> Option<Coverage> {
    let (glyphs, block_height) = layout(font, &block.text, block.size.value());
    let outlines: Vec<OutlinedGlyph> = glyphs
        .into_iter()
        .filter_map(|g| font.outline_glyph(g))
        .collect();

    let first = outlines.first()?.px_bounds();
    let (mut min_x, mut min_y, mut max_x, mut max_y) =
        (first.min.x, first.min.y, first.max.x, first.max.y);
    for outline in &outlines[1..] {
        let b = outline.px_bounds();
        min_x = min_x.min(b.min.x);
        min_y = min_y.min(b.min.y);
        max_x = max_x.max(b.max.x);
        max_y = max_y.max(b.max.y);
    }
    let (min_x, min_y) = (min_x.floor() as i32, min_y.floor() as i32);

    let width = (max_x.ceil() as i32 - min_x + 2 * PADDING).max(1) as u32;
    let height = (max_y.ceil() as i32 - min_y + 2 * PADDING).max(1) as u32;
    if width > MAX_LAYER_SIDE || height > MAX_LAYER_SIDE {
        log::warn!("Text layer {width}x{height} is too large; skipping");
        return None;
    }

    let mut data = vec![0.0f32; width as usize * height as usize];
    for outline in &outlines {
        let b = outline.px_bounds();
        let ox = b.min.x as i32 - min_x + PADDING;
        let oy = b.min.y as i32 - min_y + PADDING;
        outline.draw(|gx, gy, c| {
            let x = ox + gx as i32;
            let y = oy + gy as i32;
            if x < 0 || y < 0 || x >= width as i32 || y >= height as i32 {
                return;
            }
            let cell = &mut data[y as usize * width as usize + x as usize];
            *cell = (*cell + c).min(1.0);
        });
    }

    Some(Coverage {
        width,
        height,
        data,
        anchor: Point::new(
            (PADDING - min_x) as f32,
            block_height / 2.0 + (PADDING - min_y) as f32,
        ),
    })
}
