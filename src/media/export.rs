// SPDX-License-Identifier: MPL-2.0
//! Encoding and durable writing of the flattened composite.
//!
//! Each session exports to one fixed file, `<working-dir>/copy.<ext>`, which
//! later exports overwrite. Encoding happens at maximum quality:
//! best-compression PNG, quality-100 JPEG or lossless WebP.
//!
//! Writes go to a sibling `.tmp` file that is flushed with `sync_all` and
//! then renamed over the destination, so a crash never leaves a truncated
//! export behind and a completed export is on disk before it is reported.

use crate::domain::error::ExportError;
use crate::domain::Bitmap;
use crate::media::convert;
use futures_util::future::{BoxFuture, FutureExt};
use image_rs::codecs::jpeg::JpegEncoder;
use image_rs::codecs::png::{CompressionType, FilterType, PngEncoder};
use image_rs::codecs::webp::WebPEncoder;
use image_rs::{DynamicImage, ExtendedColorType, ImageEncoder};
use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::fs::{self, File};
use std::future::Future;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll};

/// File stem of every export.
pub const EXPORT_STEM: &str = "copy";

/// Highest JPEG quality the encoder accepts.
const JPEG_MAX_QUALITY: u8 = 100;

/// Supported export formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    /// PNG format (lossless, keeps transparency).
    #[default]
    Png,
    /// JPEG format (lossy, alpha is dropped).
    Jpeg,
    /// WebP format (lossless, keeps transparency).
    WebP,
}

impl ExportFormat {
    /// Returns the file extension for this format.
    #[must_use]
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Png => "png",
            ExportFormat::Jpeg => "jpg",
            ExportFormat::WebP => "webp",
        }
    }

    /// Returns the MIME type for this format.
    #[must_use]
    pub fn mime_type(&self) -> &'static str {
        match self {
            ExportFormat::Png => "image/png",
            ExportFormat::Jpeg => "image/jpeg",
            ExportFormat::WebP => "image/webp",
        }
    }

    /// Returns all supported formats.
    #[must_use]
    pub fn all() -> &'static [ExportFormat] {
        &[ExportFormat::Png, ExportFormat::Jpeg, ExportFormat::WebP]
    }

    /// Detects format from file extension.
    #[must_use]
    pub fn from_extension(ext: &str) -> Option<ExportFormat> {
        match ext.to_lowercase().as_str() {
            "png" => Some(ExportFormat::Png),
            "jpg" | "jpeg" => Some(ExportFormat::Jpeg),
            "webp" => Some(ExportFormat::WebP),
            _ => None,
        }
    }

    /// Detects format from file path extension.
    pub fn from_path(path: &Path) -> Option<ExportFormat> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(Self::from_extension)
    }
}

/// Returns the deterministic export path inside a session working directory.
#[must_use]
pub fn export_path(working_dir: &Path, format: ExportFormat) -> PathBuf {
    working_dir.join(format!("{EXPORT_STEM}.{}", format.extension()))
}

/// Encodes a bitmap at maximum quality.
///
/// # Errors
///
/// Returns [`ExportError::EncodeFailed`] for empty bitmaps or encoder failures.
pub fn encode(bitmap: &Bitmap, format: ExportFormat) -> Result<Vec<u8>, ExportError> {
    if bitmap.is_empty() {
        return Err(ExportError::EncodeFailed(format!(
            "cannot encode a {}x{} image",
            bitmap.width(),
            bitmap.height()
        )));
    }

    let (width, height) = bitmap.dimensions();
    let mut bytes = Vec::new();
    let result = match format {
        ExportFormat::Png => PngEncoder::new_with_quality(
            &mut bytes,
            CompressionType::Best,
            FilterType::Adaptive,
        )
        .write_image(bitmap.rgba_bytes(), width, height, ExtendedColorType::Rgba8),
        ExportFormat::Jpeg => {
            // JPEG has no alpha channel.
            let rgb = DynamicImage::ImageRgba8(convert::to_rgba_image(bitmap)).to_rgb8();
            JpegEncoder::new_with_quality(&mut bytes, JPEG_MAX_QUALITY).write_image(
                rgb.as_raw(),
                width,
                height,
                ExtendedColorType::Rgb8,
            )
        }
        ExportFormat::WebP => WebPEncoder::new_lossless(&mut bytes).write_image(
            bitmap.rgba_bytes(),
            width,
            height,
            ExtendedColorType::Rgba8,
        ),
    };
    result.map_err(|e| ExportError::EncodeFailed(e.to_string()))?;
    Ok(bytes)
}

/// Writes `bytes` to `path` so that the file is complete on disk when this
/// returns `Ok`.
///
/// # Errors
///
/// Returns [`ExportError::WriteFailed`] on any I/O failure. The destination
/// is left untouched in that case.
pub fn write_durably(path: &Path, bytes: &[u8]) -> Result<(), ExportError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| write_failed(parent, &e))?;
    }

    let tmp_path = tmp_path_for(path);
    let written = (|| {
        let mut file = File::create(&tmp_path)?;
        file.write_all(bytes)?;
        file.sync_all()?;
        fs::rename(&tmp_path, path)
    })();
    if let Err(err) = written {
        let _ = fs::remove_file(&tmp_path);
        return Err(write_failed(path, &err));
    }

    #[cfg(unix)]
    if let Some(parent) = path.parent() {
        // Persist the rename itself.
        if let Err(err) = File::open(parent).and_then(|dir| dir.sync_all()) {
            log::warn!("Failed to sync directory {}: {err}", parent.display());
        }
    }

    Ok(())
}

fn tmp_path_for(path: &Path) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(".tmp");
    PathBuf::from(name)
}

fn write_failed(path: &Path, err: &std::io::Error) -> ExportError {
    ExportError::WriteFailed(format!("{}: {err}", path.display()))
}

/// Encodes and durably writes a composite, choosing the format from the
/// destination's extension (PNG if unknown).
///
/// # Errors
///
/// Returns [`ExportError::EncodeFailed`] or [`ExportError::WriteFailed`].
pub fn export_blocking(composite: &Bitmap, destination: &Path) -> Result<(), ExportError> {
    let format = ExportFormat::from_path(destination).unwrap_or_default();
    let bytes = encode(composite, format)?;
    write_durably(destination, &bytes)?;
    log::info!(
        "Exported {}x{} {} ({} bytes) to {}",
        composite.width(),
        composite.height(),
        format.mime_type(),
        bytes.len(),
        destination.display()
    );
    Ok(())
}

// =============================================================================
// Exporter
// =============================================================================

/// Runs exports off the caller's task, one at a time.
///
/// Cloning an `Exporter` gives another handle to the same in-flight slot.
/// A second [`export`](Self::export) while one is pending is rejected with
/// [`ExportError::AlreadyInProgress`] instead of being queued.
#[derive(Debug, Clone, Default)]
pub struct Exporter {
    in_flight: Arc<AtomicBool>,
}

impl Exporter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` while an export holds the slot.
    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Starts exporting `composite` to `destination`.
    ///
    /// The slot is claimed immediately. The returned future runs encoding
    /// and writing on tokio's blocking pool and must be awaited inside a
    /// tokio runtime. The slot is released once both the future and the
    /// worker are finished, including when the future is dropped early.
    ///
    /// `composite` is the snapshot that gets written: later edits to the
    /// session never reach an export already started.
    ///
    /// # Errors
    ///
    /// Returns [`ExportError::AlreadyInProgress`] if another export holds
    /// the slot.
    pub fn export(
        &self,
        composite: Bitmap,
        destination: PathBuf,
    ) -> Result<PendingExport, ExportError> {
        let guard = InFlightGuard::acquire(&self.in_flight)
            .map(Arc::new)
            .ok_or(ExportError::AlreadyInProgress)?;
        let worker_guard = Arc::clone(&guard);

        let future = async move {
            let _guard = guard;
            let worker = tokio::task::spawn_blocking(move || {
                let _guard = worker_guard;
                export_blocking(&composite, &destination).map(|()| destination)
            });
            match worker.await {
                Ok(result) => result,
                Err(err) => Err(ExportError::WriteFailed(format!(
                    "export worker stopped: {err}"
                ))),
            }
        };

        Ok(PendingExport {
            inner: future.boxed(),
        })
    }
}

/// Holds the exporter slot until dropped.
#[derive(Debug)]
struct InFlightGuard(Arc<AtomicBool>);

impl InFlightGuard {
    fn acquire(flag: &Arc<AtomicBool>) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(Arc::clone(flag)))
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// An export that has claimed the slot. Resolves to the written path.
#[must_use = "an export does nothing until awaited"]
pub struct PendingExport {
    inner: BoxFuture<'static, Result<PathBuf, ExportError>>,
}

impl Future for PendingExport {
    type Output = Result<PathBuf, ExportError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        self.inner.as_mut().poll(cx)
    }
}

impl std::fmt::Debug for PendingExport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PendingExport").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Color;
    use tempfile::tempdir;

    fn sample() -> Bitmap {
        Bitmap::from_fn(8, 6, |x, y| Color::rgba(x as u8 * 30, y as u8 * 40, 90, 200))
    }

    #[test]
    fn export_format_extension() {
        assert_eq!(ExportFormat::Png.extension(), "png");
        assert_eq!(ExportFormat::Jpeg.extension(), "jpg");
        assert_eq!(ExportFormat::WebP.extension(), "webp");
    }

    #[test]
    fn export_format_from_extension() {
        assert_eq!(ExportFormat::from_extension("PNG"), Some(ExportFormat::Png));
        assert_eq!(ExportFormat::from_extension("jpeg"), Some(ExportFormat::Jpeg));
        assert_eq!(ExportFormat::from_extension("webp"), Some(ExportFormat::WebP));
        assert_eq!(ExportFormat::from_extension("gif"), None);
    }

    #[test]
    fn export_path_is_copy_with_extension() {
        let path = export_path(Path::new("/tmp/session"), ExportFormat::Jpeg);
        assert_eq!(path, PathBuf::from("/tmp/session/copy.jpg"));
    }

    #[test]
    fn png_encoding_is_lossless() {
        let bitmap = sample();
        let bytes = encode(&bitmap, ExportFormat::Png).expect("encode png");
        let decoded = image_rs::load_from_memory(&bytes).expect("decode png");
        assert_eq!(convert::from_dynamic(decoded), bitmap);
    }

    #[test]
    fn webp_encoding_is_lossless() {
        let bitmap = sample();
        let bytes = encode(&bitmap, ExportFormat::WebP).expect("encode webp");
        let decoded = image_rs::load_from_memory(&bytes).expect("decode webp");
        assert_eq!(convert::from_dynamic(decoded), bitmap);
    }

    #[test]
    fn jpeg_encoding_keeps_dimensions() {
        let bytes = encode(&sample(), ExportFormat::Jpeg).expect("encode jpeg");
        let decoded = image_rs::load_from_memory(&bytes).expect("decode jpeg");
        assert_eq!((decoded.width(), decoded.height()), (8, 6));
    }

    #[test]
    fn empty_bitmap_fails_to_encode() {
        let err = encode(&Bitmap::filled(0, 0, Color::WHITE), ExportFormat::Png).unwrap_err();
        assert!(matches!(err, ExportError::EncodeFailed(_)));
    }

    #[test]
    fn write_durably_overwrites_and_leaves_no_tmp() {
        let temp_dir = tempdir().expect("failed to create temp dir");
        let path = temp_dir.path().join("nested").join("copy.png");

        write_durably(&path, b"first").expect("first write");
        write_durably(&path, b"second").expect("second write");

        assert_eq!(fs::read(&path).expect("read back"), b"second");
        assert!(!tmp_path_for(&path).exists());
    }

    #[test]
    fn write_under_a_file_fails() {
        let temp_dir = tempdir().expect("failed to create temp dir");
        let blocker = temp_dir.path().join("blocker");
        fs::write(&blocker, b"x").expect("write blocker");

        let err = write_durably(&blocker.join("copy.png"), b"data").unwrap_err();
        assert!(matches!(err, ExportError::WriteFailed(_)));
    }

    #[tokio::test]
    async fn exporter_rejects_second_export_until_first_completes() {
        let temp_dir = tempdir().expect("failed to create temp dir");
        let exporter = Exporter::new();
        let first = exporter
            .export(sample(), temp_dir.path().join("copy.png"))
            .expect("first export claims slot");

        let second = exporter.clone().export(sample(), temp_dir.path().join("other.png"));
        assert_eq!(second.unwrap_err(), ExportError::AlreadyInProgress);

        let path = first.await.expect("first export completes");
        assert!(path.exists());
        assert!(!exporter.is_busy());
    }

    #[tokio::test]
    async fn dropping_pending_export_releases_slot() {
        let temp_dir = tempdir().expect("failed to create temp dir");
        let exporter = Exporter::new();
        let pending = exporter
            .export(sample(), temp_dir.path().join("copy.png"))
            .expect("claims slot");
        assert!(exporter.is_busy());
        drop(pending);
        assert!(!exporter.is_busy());
    }
}
