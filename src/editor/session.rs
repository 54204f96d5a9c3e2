// SPDX-License-Identifier: MPL-2.0
//! One editing interaction, from opening the editor to its terminal state.
//!
//! ```text
//! Idle ──start_crop──▶ Cropping ──finish_crop / cancel_crop──▶ Idle
//! Idle ──begin_stroke / begin_text──▶ DrawingOrTyping ──end_*──▶ Idle
//! Idle ──finish──▶ Exporting ──ok──▶ Closed
//!                      └──────err──▶ Idle
//! Idle ──cancel──▶ CancelledClosed
//! ```
//!
//! Only a completed export closes a session; dismissing the editor does not.
//! The host learns the outcome from `finish()` and, optionally, from a
//! [`SessionEvent`] channel.

use crate::app::paths;
use crate::config::{Config, FontEntry};
use crate::domain::editing::{FontSize, HiddenControls, StrokeWidth};
use crate::domain::error::{CropError, ExportError};
use crate::domain::{Bitmap, Color, Point};
use crate::editor::compose::Compositor;
use crate::editor::crop::{CropMode, CropOutcome, CropSession};
use crate::editor::overlay::{
    ElementId, LiveStroke, OverlayElement, OverlayKind, OverlayStack, Sticker, TextBlock,
};
use crate::media::export::{export_path, ExportFormat, Exporter, PendingExport};
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::sync::mpsc::UnboundedSender;
use uuid::Uuid;

// =============================================================================
// State, events, errors
// =============================================================================

/// Where a session is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionState {
    Idle,
    Cropping,
    DrawingOrTyping,
    Exporting,
    /// Terminal: the composite was written.
    Closed,
    /// Terminal: the user cancelled, nothing was written.
    CancelledClosed,
}

impl SessionState {
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Closed | Self::CancelledClosed)
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Cropping => "cropping",
            Self::DrawingOrTyping => "drawing or typing",
            Self::Exporting => "exporting",
            Self::Closed => "closed",
            Self::CancelledClosed => "cancelled",
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Terminal outcome delivered on the optional event channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    Finished { path: PathBuf },
    Cancelled,
}

/// Why a session entry point refused or failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error(transparent)]
    Crop(#[from] CropError),

    #[error(transparent)]
    Export(#[from] ExportError),

    /// The entry point is not valid in the current state.
    #[error("not allowed while {state}")]
    Busy { state: SessionState },

    /// The session already reached a terminal state.
    #[error("editing session is closed")]
    Closed,
}

/// The flattened image and where it was written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompositeResult {
    pub bitmap: Bitmap,
    pub path: PathBuf,
}

// =============================================================================
// SessionConfig
// =============================================================================

/// Settings fixed at session creation.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionConfig {
    /// Controls the host hides. Carried for presentation only.
    pub hidden_controls: HiddenControls,
    pub export_format: ExportFormat,
    /// Base directory of session working directories.
    pub working_dir: Option<PathBuf>,
    pub draw_color: Color,
    pub stroke_width: StrokeWidth,
    pub text_color: Color,
    pub font_size: FontSize,
    pub text_shadow: bool,
    pub default_font: Option<String>,
    /// Font files registered with the session's compositor.
    pub fonts: Vec<FontEntry>,
    pub background: Option<Color>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self::from(&Config::default())
    }
}

impl From<&Config> for SessionConfig {
    fn from(config: &Config) -> Self {
        Self {
            hidden_controls: config.controls.hidden.clone(),
            export_format: config.export.format,
            working_dir: config.export.working_dir.clone(),
            draw_color: config.draw.color,
            stroke_width: StrokeWidth::new(config.draw.stroke_width),
            text_color: config.text.color,
            font_size: FontSize::new(config.text.font_size),
            text_shadow: config.text.shadow,
            default_font: config.text.default_font.clone(),
            fonts: config.text.fonts.clone(),
            background: config.export.background,
        }
    }
}

// =============================================================================
// EditingSession
// =============================================================================

/// Base image, overlays and interaction state of one open editor.
///
/// Entry points take `&mut self`, so one session is never mutated
/// concurrently; the host serializes gestures through its event loop.
#[derive(Debug)]
pub struct EditingSession {
    id: Uuid,
    working_dir: PathBuf,
    config: SessionConfig,
    base: Bitmap,
    overlays: OverlayStack,
    state: SessionState,
    crop: Option<CropSession>,
    live_stroke: Option<LiveStroke>,
    typing: Option<ElementId>,
    compositor: Compositor,
    exporter: Exporter,
    events: Option<UnboundedSender<SessionEvent>>,
}

impl EditingSession {
    /// Opens a session on `base`, rendering text with the fonts named in
    /// `config` (or a system font when none is usable).
    #[must_use]
    pub fn new(base: Bitmap, config: SessionConfig) -> Self {
        let id = Uuid::new_v4();
        let working_dir = paths::session_dir(config.working_dir.as_deref(), id);
        log::debug!(
            "Session {id} opened on {}x{} image, working dir {}",
            base.width(),
            base.height(),
            working_dir.display()
        );
        let compositor = Compositor::from_fonts(&config.fonts, config.default_font.as_deref());
        Self {
            id,
            working_dir,
            config,
            base,
            overlays: OverlayStack::new(),
            state: SessionState::Idle,
            crop: None,
            live_stroke: None,
            typing: None,
            compositor,
            exporter: Exporter::new(),
            events: None,
        }
    }

    /// Replaces the configured fonts with `compositor` for previews and
    /// export.
    #[must_use]
    pub fn with_compositor(mut self, compositor: Compositor) -> Self {
        self.compositor = compositor;
        self
    }

    /// Delivers terminal outcomes on `events`.
    #[must_use]
    pub fn with_events(mut self, events: UnboundedSender<SessionEvent>) -> Self {
        self.events = Some(events);
        self
    }

    #[must_use]
    pub fn id(&self) -> Uuid {
        self.id
    }

    #[must_use]
    pub fn state(&self) -> SessionState {
        self.state
    }

    #[must_use]
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    #[must_use]
    pub fn hidden_controls(&self) -> &HiddenControls {
        &self.config.hidden_controls
    }

    #[must_use]
    pub fn working_dir(&self) -> &Path {
        &self.working_dir
    }

    /// The file a successful [`finish`](Self::finish) writes.
    #[must_use]
    pub fn export_path(&self) -> PathBuf {
        export_path(&self.working_dir, self.config.export_format)
    }

    /// The committed base image.
    #[must_use]
    pub fn base(&self) -> &Bitmap {
        &self.base
    }

    #[must_use]
    pub fn overlays(&self) -> &OverlayStack {
        &self.overlays
    }

    /// Another handle on this session's export slot.
    #[must_use]
    pub fn exporter(&self) -> Exporter {
        self.exporter.clone()
    }

    fn ensure_open(&self) -> Result<(), SessionError> {
        if self.state.is_terminal() {
            Err(SessionError::Closed)
        } else {
            Ok(())
        }
    }

    fn ensure_state(&self, expected: SessionState) -> Result<(), SessionError> {
        self.ensure_open()?;
        if self.state == expected {
            Ok(())
        } else {
            Err(SessionError::Busy { state: self.state })
        }
    }

    /// Overlay edits are allowed while idle or while a tool is active.
    fn ensure_editable(&self) -> Result<(), SessionError> {
        self.ensure_open()?;
        match self.state {
            SessionState::Idle | SessionState::DrawingOrTyping => Ok(()),
            state => Err(SessionError::Busy { state }),
        }
    }

    fn transition(&mut self, next: SessionState) {
        if self.state != next {
            log::debug!("Session {}: {} -> {}", self.id, self.state, next);
            self.state = next;
        }
    }

    // -------------------------------------------------------------------------
    // Crop
    // -------------------------------------------------------------------------

    /// Opens the crop engine on a snapshot of the committed base.
    ///
    /// # Errors
    ///
    /// [`SessionError::Busy`] unless idle, [`SessionError::Closed`] after a
    /// terminal state.
    pub fn start_crop(&mut self, mode: CropMode) -> Result<&mut CropSession, SessionError> {
        self.ensure_state(SessionState::Idle)?;
        self.transition(SessionState::Cropping);
        Ok(self.crop.insert(CropSession::new(self.base.clone(), mode)))
    }

    /// The active crop interaction.
    ///
    /// # Errors
    ///
    /// [`SessionError::Busy`] unless cropping.
    pub fn crop_session_mut(&mut self) -> Result<&mut CropSession, SessionError> {
        self.ensure_state(SessionState::Cropping)?;
        self.crop
            .as_mut()
            .ok_or(SessionError::Busy { state: self.state })
    }

    /// Applies the crop and commits the result as the new base.
    ///
    /// On a crop error the session stays in `Cropping` so the user can fix
    /// the selection.
    ///
    /// # Errors
    ///
    /// [`SessionError::Crop`] for a degenerate or out-of-bounds selection,
    /// [`SessionError::Busy`] unless cropping.
    pub fn finish_crop(&mut self) -> Result<CropOutcome, SessionError> {
        let cropped = self.crop_session_mut()?.apply()?;
        self.crop = None;
        self.base = cropped.clone();
        self.transition(SessionState::Idle);
        Ok(CropOutcome::Cropped(cropped))
    }

    /// Dismisses the crop engine without touching the base.
    ///
    /// # Errors
    ///
    /// [`SessionError::Busy`] unless cropping.
    pub fn cancel_crop(&mut self) -> Result<CropOutcome, SessionError> {
        self.ensure_state(SessionState::Cropping)?;
        self.crop = None;
        self.transition(SessionState::Idle);
        Ok(CropOutcome::Cancelled)
    }

    // -------------------------------------------------------------------------
    // Overlays
    // -------------------------------------------------------------------------

    /// Adds an element on top of the stack.
    ///
    /// # Errors
    ///
    /// [`SessionError::Busy`] while cropping or exporting.
    pub fn add_overlay(&mut self, kind: OverlayKind) -> Result<ElementId, SessionError> {
        self.ensure_editable()?;
        Ok(self.overlays.add(kind))
    }

    /// Adds a text block styled with the session's text defaults.
    ///
    /// # Errors
    ///
    /// Same as [`add_overlay`](Self::add_overlay).
    pub fn add_text(&mut self, text: &str, position: Point) -> Result<ElementId, SessionError> {
        let block = self.styled_text(text, position);
        self.add_overlay(OverlayKind::Text(block))
    }

    /// Adds a sticker centered on `position` at native size.
    ///
    /// # Errors
    ///
    /// Same as [`add_overlay`](Self::add_overlay).
    pub fn add_sticker(&mut self, bitmap: Bitmap, position: Point) -> Result<ElementId, SessionError> {
        self.add_overlay(OverlayKind::Sticker(Sticker::new(bitmap, position)))
    }

    /// Moves an element; unknown ids are ignored.
    ///
    /// # Errors
    ///
    /// Same as [`add_overlay`](Self::add_overlay).
    pub fn move_overlay(&mut self, id: ElementId, position: Point) -> Result<(), SessionError> {
        self.ensure_editable()?;
        self.overlays.move_to(id, position);
        Ok(())
    }

    /// Scales a sticker or text block; other ids are ignored.
    ///
    /// # Errors
    ///
    /// Same as [`add_overlay`](Self::add_overlay).
    pub fn scale_overlay(&mut self, id: ElementId, factor: f32) -> Result<(), SessionError> {
        self.ensure_editable()?;
        self.overlays.scale_by(id, factor);
        Ok(())
    }

    /// Rotates a sticker or text block clockwise; other ids are ignored.
    ///
    /// # Errors
    ///
    /// Same as [`add_overlay`](Self::add_overlay).
    pub fn rotate_overlay(&mut self, id: ElementId, degrees: f32) -> Result<(), SessionError> {
        self.ensure_editable()?;
        self.overlays.rotate_by(id, degrees);
        Ok(())
    }

    /// Removes an element, returning it if it existed.
    ///
    /// # Errors
    ///
    /// Same as [`add_overlay`](Self::add_overlay).
    pub fn remove_overlay(&mut self, id: ElementId) -> Result<Option<OverlayElement>, SessionError> {
        self.ensure_editable()?;
        if self.typing == Some(id) {
            self.typing = None;
            self.transition(SessionState::Idle);
        }
        Ok(self.overlays.remove(id))
    }

    /// Drops every overlay and any stroke in progress. The committed base is
    /// kept, so the preview shows it unchanged.
    ///
    /// # Errors
    ///
    /// Same as [`add_overlay`](Self::add_overlay).
    pub fn clear_all(&mut self) -> Result<(), SessionError> {
        self.ensure_editable()?;
        self.overlays.clear();
        self.live_stroke = None;
        self.typing = None;
        self.transition(SessionState::Idle);
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Drawing
    // -------------------------------------------------------------------------

    /// Brush color for strokes begun after this call.
    ///
    /// # Errors
    ///
    /// [`SessionError::Closed`] after a terminal state.
    pub fn set_draw_color(&mut self, color: Color) -> Result<(), SessionError> {
        self.ensure_open()?;
        self.config.draw_color = color;
        Ok(())
    }

    /// Brush width for strokes begun after this call.
    ///
    /// # Errors
    ///
    /// [`SessionError::Closed`] after a terminal state.
    pub fn set_stroke_width(&mut self, width: StrokeWidth) -> Result<(), SessionError> {
        self.ensure_open()?;
        self.config.stroke_width = width;
        Ok(())
    }

    /// Pointer down: starts a live stroke.
    ///
    /// # Errors
    ///
    /// [`SessionError::Busy`] unless idle.
    pub fn begin_stroke(&mut self, start: Point) -> Result<(), SessionError> {
        self.ensure_state(SessionState::Idle)?;
        self.live_stroke = Some(LiveStroke::begin(
            start,
            self.config.draw_color,
            self.config.stroke_width,
        ));
        self.transition(SessionState::DrawingOrTyping);
        Ok(())
    }

    /// Pointer move. Ignored when no stroke is live.
    ///
    /// # Errors
    ///
    /// [`SessionError::Closed`] after a terminal state.
    pub fn extend_stroke(&mut self, point: Point) -> Result<(), SessionError> {
        self.ensure_open()?;
        if let Some(stroke) = self.live_stroke.as_mut() {
            stroke.extend(point);
        }
        Ok(())
    }

    /// Pointer up: seals the live stroke into the stack.
    ///
    /// Returns `None` when no stroke was live or it had no usable point.
    ///
    /// # Errors
    ///
    /// [`SessionError::Closed`] after a terminal state.
    pub fn end_stroke(&mut self) -> Result<Option<ElementId>, SessionError> {
        self.ensure_open()?;
        let Some(live) = self.live_stroke.take() else {
            return Ok(None);
        };
        let id = live
            .seal()
            .map(|stroke| self.overlays.add(OverlayKind::Stroke(stroke)));
        if self.typing.is_none() {
            self.transition(SessionState::Idle);
        }
        Ok(id)
    }

    // -------------------------------------------------------------------------
    // Typing
    // -------------------------------------------------------------------------

    fn styled_text(&self, text: &str, position: Point) -> TextBlock {
        TextBlock {
            font_family: self.config.default_font.clone(),
            size: self.config.font_size,
            color: self.config.text_color,
            shadow: self.config.text_shadow,
            ..TextBlock::new(text, position)
        }
    }

    /// Starts editing a new, empty text block at `position`.
    ///
    /// # Errors
    ///
    /// [`SessionError::Busy`] unless idle.
    pub fn begin_text(&mut self, position: Point) -> Result<ElementId, SessionError> {
        self.ensure_state(SessionState::Idle)?;
        let block = self.styled_text("", position);
        let id = self.overlays.add(OverlayKind::Text(block));
        self.typing = Some(id);
        self.transition(SessionState::DrawingOrTyping);
        Ok(id)
    }

    /// Replaces the text of the block being edited. Ignored when not typing.
    ///
    /// # Errors
    ///
    /// [`SessionError::Closed`] after a terminal state.
    pub fn update_text(&mut self, text: &str) -> Result<(), SessionError> {
        self.ensure_open()?;
        if let Some(id) = self.typing {
            self.overlays.set_text(id, text);
        }
        Ok(())
    }

    /// Stops editing. A block left blank is discarded and `None` returned.
    ///
    /// # Errors
    ///
    /// [`SessionError::Closed`] after a terminal state.
    pub fn end_text(&mut self) -> Result<Option<ElementId>, SessionError> {
        self.ensure_open()?;
        let Some(id) = self.typing.take() else {
            return Ok(None);
        };
        let blank = matches!(
            self.overlays.get(id).map(|e| &e.kind),
            Some(OverlayKind::Text(block)) if block.text.trim().is_empty()
        );
        if self.live_stroke.is_none() {
            self.transition(SessionState::Idle);
        }
        if blank {
            self.overlays.remove(id);
            return Ok(None);
        }
        Ok(Some(id))
    }

    // -------------------------------------------------------------------------
    // Output
    // -------------------------------------------------------------------------

    /// The committed base with every overlay, plus the stroke in progress.
    #[must_use]
    pub fn preview(&self) -> Bitmap {
        let committed = self.overlays.elements_in_paint_order();
        let live = self
            .live_stroke
            .clone()
            .and_then(LiveStroke::seal)
            .map(|stroke| OverlayElement {
                id: ElementId::LIVE,
                z_index: u64::MAX,
                kind: OverlayKind::Stroke(stroke),
            });
        match live {
            Some(live) => {
                let mut elements = committed.to_vec();
                elements.push(live);
                self.compositor.compose(&self.base, &elements)
            }
            None => self.compositor.compose(&self.base, committed),
        }
    }

    fn composite(&self) -> Bitmap {
        self.compositor.compose_with_background(
            &self.base,
            self.overlays.elements_in_paint_order(),
            self.config.background,
        )
    }

    /// Writes the current composite to the export path without closing the
    /// session, like a "save a copy" button.
    ///
    /// # Errors
    ///
    /// [`SessionError::Export`] with `AlreadyInProgress` while another
    /// export runs, [`SessionError::Closed`] after a terminal state.
    pub fn save_copy(&self) -> Result<PendingExport, SessionError> {
        self.ensure_open()?;
        Ok(self.exporter.export(self.composite(), self.export_path())?)
    }

    /// Seals any tool in use, flattens the session and exports it.
    ///
    /// Resolves only once the file is durably written; the session is then
    /// `Closed`. On failure, or if this future is dropped early, the session
    /// returns to `Idle` and `finish` can be retried.
    ///
    /// # Errors
    ///
    /// [`SessionError::Export`] if encoding or writing fails or another
    /// export is in flight, [`SessionError::Busy`] while cropping,
    /// [`SessionError::Closed`] after a terminal state.
    pub async fn finish(&mut self) -> Result<CompositeResult, SessionError> {
        self.ensure_open()?;
        if self.state == SessionState::DrawingOrTyping {
            self.end_stroke()?;
            self.end_text()?;
        }
        self.ensure_state(SessionState::Idle)?;

        let composite = self.composite();
        let pending = self.exporter.export(composite.clone(), self.export_path())?;
        log::debug!("Session {}: {} -> exporting", self.id, self.state);

        let phase = PhaseGuard::enter(&mut self.state, SessionState::Exporting);
        match pending.await {
            Ok(path) => {
                phase.settle(SessionState::Closed);
                log::debug!("Session {} closed with {}", self.id, path.display());
                self.emit(SessionEvent::Finished { path: path.clone() });
                Ok(CompositeResult {
                    bitmap: composite,
                    path,
                })
            }
            Err(err) => {
                drop(phase);
                log::warn!("Session {} export failed: {err}", self.id);
                Err(err.into())
            }
        }
    }

    /// Closes the session without writing anything.
    ///
    /// # Errors
    ///
    /// [`SessionError::Closed`] after a terminal state.
    pub fn cancel(&mut self) -> Result<(), SessionError> {
        self.ensure_open()?;
        self.crop = None;
        self.live_stroke = None;
        self.typing = None;
        self.transition(SessionState::CancelledClosed);
        self.emit(SessionEvent::Cancelled);
        Ok(())
    }

    fn emit(&self, event: SessionEvent) {
        if let Some(events) = &self.events {
            if events.send(event).is_err() {
                log::debug!("Session {}: event receiver dropped", self.id);
            }
        }
    }
}

/// Holds a session in a transient state; restores `Idle` on drop unless
/// settled into another state.
struct PhaseGuard<'a> {
    state: &'a mut SessionState,
    on_drop: SessionState,
}

impl<'a> PhaseGuard<'a> {
    fn enter(state: &'a mut SessionState, phase: SessionState) -> Self {
        *state = phase;
        Self {
            state,
            on_drop: SessionState::Idle,
        }
    }

    fn settle(mut self, next: SessionState) {
        self.on_drop = next;
    }
}

impl Drop for PhaseGuard<'_> {
    fn drop(&mut self) {
        *self.state = self.on_drop;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn base() -> Bitmap {
        Bitmap::from_fn(40, 30, |x, y| Color::rgb(x as u8, y as u8, 100))
    }

    fn session_in(dir: &Path) -> EditingSession {
        let config = SessionConfig {
            working_dir: Some(dir.to_path_buf()),
            ..SessionConfig::default()
        };
        EditingSession::new(base(), config)
    }

    #[test]
    fn config_conversion_clamps_values() {
        let mut config = Config::default();
        config.draw.stroke_width = 1000.0;
        config.text.font_size = f32::NAN;
        let session_config = SessionConfig::from(&config);
        assert_eq!(session_config.stroke_width.value(), 100.0);
        assert_eq!(session_config.font_size, FontSize::default());
    }

    #[test]
    fn working_dir_is_per_session() {
        let dir = tempdir().expect("temp dir");
        let a = session_in(dir.path());
        let b = session_in(dir.path());
        assert_ne!(a.working_dir(), b.working_dir());
        assert_eq!(a.export_path(), a.working_dir().join("copy.png"));
    }

    #[test]
    fn finish_crop_replaces_base() {
        let dir = tempdir().expect("temp dir");
        let mut session = session_in(dir.path());
        let crop = session.start_crop(CropMode::Rect).expect("idle");
        crop.rect_mut()
            .expect("rect mode")
            .set_bounds(10.0, 5.0, 20.0, 15.0);
        assert_eq!(session.state(), SessionState::Cropping);

        let outcome = session.finish_crop().expect("valid crop");
        assert!(matches!(outcome, CropOutcome::Cropped(ref b) if b.dimensions() == (20, 15)));
        assert_eq!(session.base().dimensions(), (20, 15));
        assert_eq!(session.base().pixel(0, 0), Some(Color::rgb(10, 5, 100)));
        assert_eq!(session.state(), SessionState::Idle);
    }

    #[test]
    fn cancel_crop_signals_and_keeps_base() {
        let dir = tempdir().expect("temp dir");
        let mut session = session_in(dir.path());
        session.start_crop(CropMode::Freeform).expect("idle");
        assert_eq!(session.cancel_crop(), Ok(CropOutcome::Cancelled));
        assert_eq!(session.base(), &base());
        assert_eq!(session.state(), SessionState::Idle);
    }

    #[test]
    fn overlay_edits_are_refused_while_cropping() {
        let dir = tempdir().expect("temp dir");
        let mut session = session_in(dir.path());
        session.start_crop(CropMode::Rect).expect("idle");
        assert_eq!(
            session.add_text("hi", Point::ORIGIN),
            Err(SessionError::Busy {
                state: SessionState::Cropping
            })
        );
    }

    #[test]
    fn stroke_lifecycle_adds_one_element() {
        let dir = tempdir().expect("temp dir");
        let mut session = session_in(dir.path());
        session.set_draw_color(Color::rgb(255, 0, 0)).expect("open");
        session.begin_stroke(Point::new(1.0, 1.0)).expect("idle");
        assert_eq!(session.state(), SessionState::DrawingOrTyping);
        session.extend_stroke(Point::new(20.0, 20.0)).expect("open");

        let id = session.end_stroke().expect("open").expect("sealed");
        assert_eq!(session.state(), SessionState::Idle);
        assert!(matches!(
            session.overlays().get(id).map(|e| &e.kind),
            Some(OverlayKind::Stroke(s)) if s.color == Color::rgb(255, 0, 0)
        ));
    }

    #[test]
    fn preview_includes_live_stroke() {
        let dir = tempdir().expect("temp dir");
        let mut session = session_in(dir.path());
        session.set_stroke_width(StrokeWidth::new(6.0)).expect("open");
        session.begin_stroke(Point::new(5.0, 15.0)).expect("idle");
        session.extend_stroke(Point::new(35.0, 15.0)).expect("open");
        assert_eq!(session.preview().pixel(20, 15), Some(Color::BLACK));
        assert!(session.overlays().is_empty());
    }

    #[test]
    fn blank_text_is_discarded() {
        let dir = tempdir().expect("temp dir");
        let mut session = session_in(dir.path());
        session.begin_text(Point::new(10.0, 10.0)).expect("idle");
        session.update_text("   ").expect("open");
        assert_eq!(session.end_text(), Ok(None));
        assert!(session.overlays().is_empty());

        let id = session.begin_text(Point::new(10.0, 10.0)).expect("idle");
        session.update_text("Hello").expect("open");
        assert_eq!(session.end_text(), Ok(Some(id)));
        assert_eq!(session.overlays().len(), 1);
    }

    #[test]
    fn clear_all_drops_overlays_and_live_stroke() {
        let dir = tempdir().expect("temp dir");
        let mut session = session_in(dir.path());
        session.add_text("a", Point::new(5.0, 5.0)).expect("idle");
        session
            .add_sticker(Bitmap::filled(2, 2, Color::WHITE), Point::new(5.0, 5.0))
            .expect("idle");
        session.begin_stroke(Point::new(1.0, 1.0)).expect("idle");

        session.clear_all().expect("editable");
        assert!(session.overlays().is_empty());
        assert_eq!(session.state(), SessionState::Idle);
        assert_eq!(session.preview(), base());
    }

    #[test]
    fn cancel_is_terminal_and_writes_nothing() {
        let dir = tempdir().expect("temp dir");
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        let mut session = session_in(dir.path()).with_events(tx);
        session.add_text("a", Point::new(5.0, 5.0)).expect("idle");

        session.cancel().expect("open");
        assert_eq!(session.state(), SessionState::CancelledClosed);
        assert_eq!(rx.try_recv(), Ok(SessionEvent::Cancelled));
        assert!(!session.working_dir().exists());
        assert_eq!(session.cancel(), Err(SessionError::Closed));
        assert_eq!(
            session.add_text("b", Point::ORIGIN),
            Err(SessionError::Closed)
        );
    }

    #[tokio::test]
    async fn finish_writes_and_closes() {
        let dir = tempdir().expect("temp dir");
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        let mut session = session_in(dir.path()).with_events(tx);
        session.begin_stroke(Point::new(2.0, 2.0)).expect("idle");
        session.extend_stroke(Point::new(30.0, 20.0)).expect("open");

        let result = session.finish().await.expect("export succeeds");
        assert!(result.path.exists());
        assert_eq!(result.path, session.export_path());
        assert_eq!(result.bitmap.dimensions(), (40, 30));
        assert_eq!(session.overlays().len(), 1);
        assert_eq!(session.state(), SessionState::Closed);
        assert_eq!(rx.try_recv(), Ok(SessionEvent::Finished { path: result.path }));
        assert!(matches!(session.finish().await, Err(SessionError::Closed)));
    }

    #[tokio::test]
    async fn finish_is_refused_while_cropping() {
        let dir = tempdir().expect("temp dir");
        let mut session = session_in(dir.path());
        session.start_crop(CropMode::Rect).expect("idle");
        assert_eq!(
            session.finish().await,
            Err(SessionError::Busy {
                state: SessionState::Cropping
            })
        );
        assert_eq!(session.state(), SessionState::Cropping);
    }

    #[tokio::test]
    async fn session_from_config_renders_text() {
        if crate::test_utils::system_font().is_none() {
            return;
        }
        let dir = tempdir().expect("temp dir");
        let mut settings = Config::default();
        settings.export.working_dir = Some(dir.path().to_path_buf());
        let base = Bitmap::filled(120, 60, Color::BLACK);
        let mut session = EditingSession::new(base.clone(), SessionConfig::from(&settings));

        session
            .add_text("Hello", Point::new(60.0, 30.0))
            .expect("idle");
        let result = session.finish().await.expect("export succeeds");
        assert_ne!(result.bitmap, base);
    }

    #[test]
    fn configured_font_reaches_the_compositor() {
        let Some(data) = crate::test_utils::system_font() else {
            return;
        };
        let dir = tempdir().expect("temp dir");
        let font_path = dir.path().join("brand.ttf");
        std::fs::write(&font_path, data).expect("write font");

        let mut settings = Config::default();
        settings.text.fonts.push(FontEntry {
            family: "Brand".to_string(),
            path: font_path,
        });
        settings.text.default_font = Some("Brand".to_string());
        let session = EditingSession::new(base(), SessionConfig::from(&settings));
        assert!(session.compositor.fonts().contains("Brand"));
    }
}
