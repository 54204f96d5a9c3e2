// SPDX-License-Identifier: MPL-2.0
//! `photo_editor` is the headless core of a photo editor: crop a bitmap
//! (axis-aligned or free-form quadrilateral), annotate it with strokes, text
//! and stickers, and export the flattened result to a session working
//! directory.
//!
//! The crate has no UI. A host drives an [`editor::EditingSession`] from its
//! own event loop and renders [`editor::EditingSession::preview`].

#![doc(html_root_url = "https://docs.rs/photo_editor/0.1.0")]

pub mod app;
pub mod application;
pub mod config;
pub mod domain;
pub mod editor;
pub mod error;
pub mod infrastructure;
pub mod media;

#[cfg(test)]
pub(crate) mod test_utils;
