// SPDX-License-Identifier: MPL-2.0
//! The crop/compose pipeline.
//!
//! - [`crop`]: rectangular and free-form crop tools and the crop engine
//! - [`overlay`]: strokes, text and stickers above the base image
//! - [`compose`]: flattening base and overlays into one bitmap
//! - [`session`]: the editing session state machine tying them together

pub mod compose;
pub mod crop;
pub mod overlay;
pub mod session;

pub use compose::{Compositor, FontBook};
pub use crop::{crop, CropMode, CropOutcome, CropRegion, CropSession, QuadRegion};
pub use overlay::{
    ElementId, LiveStroke, OverlayElement, OverlayKind, OverlayStack, Sticker, Stroke, TextBlock,
};
pub use session::{
    CompositeResult, EditingSession, SessionConfig, SessionError, SessionEvent, SessionState,
};
