// SPDX-License-Identifier: MPL-2.0
//! Editing domain types.
//!
//! This module provides pure domain types for editing operations:
//! - [`StrokeWidth`]: Freehand stroke width
//! - [`FontSize`]: Text overlay size
//! - [`ScaleFactor`]: Sticker scale and free-form crop zoom
//! - [`ControlKind`] / [`HiddenControls`]: Host-configurable toolbar controls

pub mod controls;
pub mod newtypes;

pub use controls::{ControlKind, HiddenControls};
pub use newtypes::{font_bounds, scale_bounds, stroke_bounds, FontSize, ScaleFactor, StrokeWidth};
