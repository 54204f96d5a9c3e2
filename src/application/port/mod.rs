// SPDX-License-Identifier: MPL-2.0
//! Port definitions (traits) for dependency inversion.
//!
//! These traits use only domain types, so the editor stays independent of
//! the concrete adapters in `infrastructure`.
//!
//! # Available Ports
//!
//! - [`loader`]: Fetching an image by URL

pub mod loader;

pub use loader::ImageLoader;
