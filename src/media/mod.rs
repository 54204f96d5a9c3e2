// SPDX-License-Identifier: MPL-2.0
//! Pixel I/O: decoding images into bitmaps and exporting composites.

pub mod convert;
pub mod decode;
pub mod export;

pub use decode::{decode_bytes, load_image};
pub use export::{export_path, ExportFormat, Exporter, PendingExport};

/// Supported media extensions
pub mod extensions {
    /// Image file extensions the decoder accepts.
    pub const IMAGE_EXTENSIONS: &[&str] = &[
        "jpg", "jpeg", "png", "gif", "tiff", "tif", "webp", "bmp", "ico", "svg",
    ];

    /// Checks if a path has a decodable image extension.
    #[must_use]
    pub fn is_image_path<P: AsRef<std::path::Path>>(path: P) -> bool {
        path.as_ref()
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| IMAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
    }
}
