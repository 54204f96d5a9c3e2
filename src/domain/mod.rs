// SPDX-License-Identifier: MPL-2.0
//! Domain layer - pure value types for the crop/compose pipeline.
//!
//! Nothing in here performs I/O. The only external crates are `serde`
//! (derives for configuration) and `thiserror` (error derives).
//!
//! # Modules
//!
//! - [`bitmap`]: Immutable pixel grids ([`Bitmap`]) and [`Color`]
//! - [`geometry`]: [`Point`], [`PixelRect`] and [`Affine`] transforms
//! - [`editing`]: Clamped editing values ([`StrokeWidth`](editing::StrokeWidth),
//!   [`FontSize`](editing::FontSize), [`ScaleFactor`](editing::ScaleFactor))
//!   and host-configurable [`ControlKind`](editing::ControlKind)s
//! - [`error`]: [`CropError`](error::CropError), [`ExportError`](error::ExportError),
//!   [`LoadError`](error::LoadError)

pub mod bitmap;
pub mod editing;
pub mod error;
pub mod geometry;

pub use bitmap::{Bitmap, Color};
pub use geometry::{Affine, PixelRect, Point};
