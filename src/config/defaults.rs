// SPDX-License-Identifier: MPL-2.0
//! Centralized default values for all configuration constants.
//!
//! This module serves as the single source of truth for default values
//! used across the application. Clamp bounds for strokes, text and scale
//! live next to their newtypes in `domain::editing` and are re-exported here.
//!
//! # Categories
//!
//! - **Drawing**: Brush color and width
//! - **Text**: Text color, size and shadow
//! - **Crop**: Handle hit tolerance
//! - **Network**: Remote image loading

use crate::domain::Color;
use std::time::Duration;

pub use crate::domain::editing::{font_bounds, scale_bounds, stroke_bounds};

// ==========================================================================
// Drawing Defaults
// ==========================================================================

/// Default brush color.
pub const DEFAULT_DRAW_COLOR: Color = Color::BLACK;

/// Default brush width in image pixels.
pub const DEFAULT_STROKE_WIDTH: f32 = stroke_bounds::DEFAULT;

// ==========================================================================
// Text Defaults
// ==========================================================================

/// Default text color.
pub const DEFAULT_TEXT_COLOR: Color = Color::WHITE;

/// Default text size in image pixels.
pub const DEFAULT_FONT_SIZE: f32 = font_bounds::DEFAULT;

/// Whether new text blocks get a drop shadow.
pub const DEFAULT_TEXT_SHADOW: bool = true;

// ==========================================================================
// Crop Defaults
// ==========================================================================

/// Distance in pixels within which a pointer grabs a crop handle.
pub const DEFAULT_HANDLE_TOLERANCE: f32 = 12.0;

// ==========================================================================
// Network Defaults
// ==========================================================================

/// Redirects followed before a remote load gives up.
pub const MAX_HTTP_REDIRECTS: usize = 10;

/// User agent sent with remote image requests.
pub const HTTP_USER_AGENT: &str = concat!("PhotoEditor/", env!("CARGO_PKG_VERSION"));

/// Time allowed to establish a connection to an image host.
pub const DEFAULT_HTTP_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Longest silence tolerated between reads of a response.
pub const DEFAULT_HTTP_READ_TIMEOUT: Duration = Duration::from_secs(30);

/// Largest response body accepted for a remote image (64 MiB).
pub const MAX_HTTP_BODY_BYTES: u64 = 64 * 1024 * 1024;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drawing_defaults_are_within_bounds() {
        assert!((stroke_bounds::MIN..=stroke_bounds::MAX).contains(&DEFAULT_STROKE_WIDTH));
        assert!((font_bounds::MIN..=font_bounds::MAX).contains(&DEFAULT_FONT_SIZE));
    }

    #[test]
    fn network_limits_are_bounded() {
        assert!(!DEFAULT_HTTP_CONNECT_TIMEOUT.is_zero());
        assert!(DEFAULT_HTTP_CONNECT_TIMEOUT <= DEFAULT_HTTP_READ_TIMEOUT);
        assert!(MAX_HTTP_BODY_BYTES >= 1024 * 1024);
    }

    #[test]
    fn user_agent_names_the_app() {
        assert!(HTTP_USER_AGENT.starts_with("PhotoEditor/"));
    }
}
