// SPDX-License-Identifier: MPL-2.0
//! Flattens a base bitmap and its overlays into one bitmap.
//!
//! Composition is pure: the same base, overlays and fonts always produce
//! the same pixels, and the inputs are never modified.

mod fonts;
mod text;

pub use fonts::{FontBook, FontError, SYSTEM_FONT_CANDIDATES};
pub use text::{SHADOW_COLOR, SHADOW_OFFSET};

use crate::config::{FontEntry, TextConfig};
use crate::domain::{Affine, Bitmap, Color};
use crate::editor::overlay::{OverlayElement, OverlayKind, Sticker, Stroke};
use crate::media::convert;
use tiny_skia::{
    BlendMode, FillRule, FilterQuality, LineCap, LineJoin, Paint, PathBuilder, Pixmap,
    PixmapPaint, Transform,
};

/// Renders overlays with a fixed set of fonts.
#[derive(Debug, Clone, Default)]
pub struct Compositor {
    fonts: FontBook,
}

impl Compositor {
    #[must_use]
    pub fn new(fonts: FontBook) -> Self {
        Self { fonts }
    }

    /// Registers the fonts listed in the `[text]` settings.
    #[must_use]
    pub fn from_config(text: &TextConfig) -> Self {
        Self::from_fonts(&text.fonts, text.default_font.as_deref())
    }

    /// Registers `entries` and makes `default_font` the fallback family.
    ///
    /// Unreadable font files are logged and skipped. When none is usable,
    /// a well-known system font is tried.
    #[must_use]
    pub fn from_fonts(entries: &[FontEntry], default_font: Option<&str>) -> Self {
        let mut fonts = FontBook::new();
        for entry in entries {
            if let Err(err) = fonts.register_file(entry.family.clone(), &entry.path) {
                log::warn!("Skipping font '{}': {err}", entry.family);
            }
        }
        if let Some(family) = default_font {
            if !fonts.set_default(family) {
                log::warn!("Default font '{family}' is not registered");
            }
        }
        if fonts.is_empty() {
            match fonts.with_system_default() {
                Some(family) => log::debug!("Using system font '{family}'"),
                None => log::warn!("No fonts available; text overlays will not be drawn"),
            }
        }
        Self { fonts }
    }

    #[must_use]
    pub fn fonts(&self) -> &FontBook {
        &self.fonts
    }

    pub fn fonts_mut(&mut self) -> &mut FontBook {
        &mut self.fonts
    }

    /// Paints `overlays` over `base` in ascending `z_index` order.
    ///
    /// With no overlays the result shares `base`'s pixels.
    #[must_use]
    pub fn compose(&self, base: &Bitmap, overlays: &[OverlayElement]) -> Bitmap {
        if overlays.is_empty() {
            return base.clone();
        }
        let Some(mut canvas) = convert::to_pixmap(base) else {
            return base.clone();
        };

        let mut ordered: Vec<&OverlayElement> = overlays.iter().collect();
        ordered.sort_by_key(|element| element.z_index);

        for element in ordered {
            match &element.kind {
                OverlayKind::Stroke(stroke) => draw_stroke(&mut canvas, stroke),
                OverlayKind::Sticker(sticker) => draw_sticker(&mut canvas, sticker),
                OverlayKind::Text(block) => {
                    match self.fonts.resolve(block.font_family.as_deref()) {
                        Some(font) => {
                            text::draw_text(&mut canvas, font, block);
                        }
                        None => {
                            log::warn!("No font available for text overlay {}; skipping", element.id);
                        }
                    }
                }
            }
        }

        convert::from_pixmap(&canvas)
    }

    /// Like [`Self::compose`], then flattens the result onto a solid
    /// `background` so transparent areas take its color.
    #[must_use]
    pub fn compose_with_background(
        &self,
        base: &Bitmap,
        overlays: &[OverlayElement],
        background: Option<Color>,
    ) -> Bitmap {
        let composed = self.compose(base, overlays);
        match background {
            Some(color) => flatten_onto(&composed, color),
            None => composed,
        }
    }
}

fn flatten_onto(bitmap: &Bitmap, color: Color) -> Bitmap {
    let (Some(layer), Some(mut canvas)) = (
        convert::to_pixmap(bitmap),
        Pixmap::new(bitmap.width(), bitmap.height()),
    ) else {
        return bitmap.clone();
    };
    canvas.fill(tiny_skia::Color::from_rgba8(color.r, color.g, color.b, color.a));
    canvas.draw_pixmap(
        0,
        0,
        layer.as_ref(),
        &PixmapPaint::default(),
        Transform::identity(),
        None,
    );
    convert::from_pixmap(&canvas)
}

fn to_transform(affine: Affine) -> Transform {
    Transform::from_row(affine.a, affine.b, affine.c, affine.d, affine.tx, affine.ty)
}

/// Draws a premultiplied layer through `place`, which maps layer
/// coordinates to canvas coordinates.
fn draw_layer(canvas: &mut Pixmap, layer: &Pixmap, place: Affine) {
    let paint = PixmapPaint {
        opacity: 1.0,
        blend_mode: BlendMode::SourceOver,
        quality: FilterQuality::Bilinear,
    };
    canvas.draw_pixmap(0, 0, layer.as_ref(), &paint, to_transform(place), None);
}

fn draw_stroke(canvas: &mut Pixmap, stroke: &Stroke) {
    let mut paint = Paint::default();
    let c = stroke.color;
    paint.set_color_rgba8(c.r, c.g, c.b, c.a);
    paint.anti_alias = true;

    match &*stroke.points {
        [] => {}
        // A tap leaves a dot as wide as the brush.
        [dot] => {
            if let Some(path) = PathBuilder::from_circle(dot.x, dot.y, stroke.width.radius()) {
                canvas.fill_path(&path, &paint, FillRule::Winding, Transform::identity(), None);
            }
        }
        [first, rest @ ..] => {
            let mut builder = PathBuilder::new();
            builder.move_to(first.x, first.y);
            for p in rest {
                builder.line_to(p.x, p.y);
            }
            let Some(path) = builder.finish() else {
                return;
            };
            let style = tiny_skia::Stroke {
                width: stroke.width.value(),
                line_cap: LineCap::Round,
                line_join: LineJoin::Round,
                ..tiny_skia::Stroke::default()
            };
            canvas.stroke_path(&path, &paint, &style, Transform::identity(), None);
        }
    }
}

fn draw_sticker(canvas: &mut Pixmap, sticker: &Sticker) {
    let Some(layer) = convert::to_pixmap(&sticker.bitmap) else {
        return;
    };
    let (w, h) = (layer.width() as f32, layer.height() as f32);
    let s = sticker.scale.value();
    let place = Affine::translate(-w / 2.0, -h / 2.0)
        .then(Affine::scale(s, s))
        .then(Affine::rotate(sticker.rotation_deg))
        .then(Affine::translate(sticker.position.x, sticker.position.y));
    draw_layer(canvas, &layer, place);
}
