// SPDX-License-Identifier: MPL-2.0
use photo_editor::config::{self, Config};
use photo_editor::domain::error::{CropError, ExportError};
use photo_editor::domain::{Bitmap, Color, PixelRect, Point};
use photo_editor::editor::{
    crop, CropMode, CropOutcome, CropRegion, EditingSession, SessionConfig, SessionError,
    SessionEvent, SessionState,
};
use photo_editor::media::{load_image, ExportFormat, Exporter};
use std::path::Path;
use tempfile::tempdir;

/// 400x300 image where every pixel encodes its own coordinates.
fn gradient() -> Bitmap {
    Bitmap::from_fn(400, 300, |x, y| {
        Color::rgb((x % 256) as u8, (y % 256) as u8, ((x + y) % 256) as u8)
    })
}

fn session_under(base_dir: &Path, image: Bitmap) -> EditingSession {
    let config = SessionConfig {
        working_dir: Some(base_dir.to_path_buf()),
        ..SessionConfig::default()
    };
    EditingSession::new(image, config)
}

#[test]
fn rect_crop_keeps_exact_size_and_origin() {
    let source = gradient();
    let region = CropRegion::Rect(PixelRect::new(50, 50, 200, 150));

    let cropped = crop(&source, &region).expect("region is inside the source");
    assert_eq!(cropped.dimensions(), (200, 150));
    assert_eq!(cropped.pixel(0, 0), source.pixel(50, 50));
    assert_eq!(cropped.pixel(199, 149), source.pixel(249, 199));
}

#[test]
fn zero_area_crop_is_degenerate() {
    let source = gradient();
    for (w, h) in [(0, 10), (10, 0), (0, 0)] {
        let region = CropRegion::Rect(PixelRect::new(5, 5, w, h));
        assert_eq!(crop(&source, &region), Err(CropError::DegenerateRegion));
    }
}

#[test]
fn session_crop_replaces_base_and_cancel_keeps_it() {
    let dir = tempdir().expect("temp dir");
    let mut session = session_under(dir.path(), gradient());

    session.start_crop(CropMode::Rect).expect("idle");
    assert_eq!(session.cancel_crop(), Ok(CropOutcome::Cancelled));
    assert_eq!(session.base().dimensions(), (400, 300));

    let selection = session
        .start_crop(CropMode::Rect)
        .expect("idle")
        .rect_mut()
        .expect("rect mode");
    selection.set_bounds(50.0, 50.0, 200.0, 150.0);
    let outcome = session.finish_crop().expect("valid region");
    assert!(matches!(outcome, CropOutcome::Cropped(_)));
    assert_eq!(session.base().dimensions(), (200, 150));
    assert_eq!(session.state(), SessionState::Idle);
}

#[test]
fn clear_all_restores_pre_overlay_image() {
    let dir = tempdir().expect("temp dir");
    let base = gradient();
    let mut session = session_under(dir.path(), base.clone());

    session
        .add_text("hello", Point::new(100.0, 100.0))
        .expect("idle");
    session
        .add_sticker(Bitmap::filled(20, 20, Color::WHITE), Point::new(200.0, 150.0))
        .expect("idle");
    assert_eq!(session.overlays().len(), 2);

    session.clear_all().expect("idle");
    assert!(session.overlays().elements_in_paint_order().is_empty());
    assert_eq!(session.preview(), base);
}

#[tokio::test]
async fn write_failure_leaves_session_retryable() {
    let dir = tempdir().expect("temp dir");
    let mut session = session_under(dir.path(), gradient());
    session
        .add_sticker(Bitmap::filled(10, 10, Color::rgb(255, 0, 0)), Point::new(20.0, 20.0))
        .expect("idle");

    // A regular file where the working directory should go.
    std::fs::write(session.working_dir(), b"blocker").expect("write blocker");

    let err = session.finish().await.unwrap_err();
    assert!(matches!(
        err,
        SessionError::Export(ExportError::WriteFailed(_))
    ));
    assert_eq!(session.state(), SessionState::Idle);
    assert!(!session.exporter().is_busy());

    std::fs::remove_file(session.working_dir()).expect("remove blocker");
    let result = session.finish().await.expect("retry succeeds");
    assert_eq!(session.state(), SessionState::Closed);
    assert_eq!(result.path, session.export_path());

    let written = load_image(&result.path).expect("export decodes");
    assert_eq!(written, result.bitmap);
}

#[tokio::test]
async fn second_export_is_rejected_while_first_runs() {
    let dir = tempdir().expect("temp dir");
    let exporter = Exporter::new();
    let composite = Bitmap::filled(64, 64, Color::rgb(0, 128, 255));

    let first = exporter
        .export(composite.clone(), dir.path().join("copy.png"))
        .expect("slot is free");
    let second = exporter.export(composite, dir.path().join("other.png"));
    assert!(matches!(second, Err(ExportError::AlreadyInProgress)));

    let path = first.await.expect("first export completes");
    assert!(path.exists());
    assert!(!dir.path().join("other.png").exists());
    assert!(!exporter.is_busy());
}

#[tokio::test]
async fn finish_is_rejected_while_a_copy_is_saving() {
    let dir = tempdir().expect("temp dir");
    let mut session = session_under(dir.path(), gradient());

    let pending = session.save_copy().expect("open");
    let err = session.finish().await.unwrap_err();
    assert_eq!(err, SessionError::Export(ExportError::AlreadyInProgress));
    assert_eq!(session.state(), SessionState::Idle);

    pending.await.expect("copy is written");
    session.finish().await.expect("slot released");
    assert_eq!(session.state(), SessionState::Closed);
}

#[tokio::test]
async fn export_snapshot_ignores_later_edits() {
    let dir = tempdir().expect("temp dir");
    let base = Bitmap::filled(32, 32, Color::BLACK);
    let mut session = session_under(dir.path(), base.clone());

    let pending = session.save_copy().expect("open");
    session
        .add_sticker(Bitmap::filled(32, 32, Color::WHITE), Point::new(16.0, 16.0))
        .expect("idle");

    let path = pending.await.expect("copy is written");
    assert_eq!(load_image(&path).expect("decodes"), base);
}

#[tokio::test]
async fn finished_session_reports_path_and_refuses_more_work() {
    let dir = tempdir().expect("temp dir");
    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
    let config = SessionConfig {
        working_dir: Some(dir.path().to_path_buf()),
        export_format: ExportFormat::WebP,
        ..SessionConfig::default()
    };
    let mut session = EditingSession::new(gradient(), config).with_events(tx);

    let result = session.finish().await.expect("export succeeds");
    assert_eq!(result.path.extension().and_then(|e| e.to_str()), Some("webp"));
    assert_eq!(
        rx.recv().await,
        Some(SessionEvent::Finished {
            path: result.path.clone()
        })
    );

    assert_eq!(
        session.add_text("late", Point::new(0.0, 0.0)),
        Err(SessionError::Closed)
    );
    assert_eq!(session.cancel(), Err(SessionError::Closed));
}

#[test]
fn config_round_trip_feeds_the_session() {
    let dir = tempdir().expect("temp dir");
    let path = dir.path().join("settings.toml");

    let mut settings = Config::default();
    settings.export.format = ExportFormat::Jpeg;
    settings.export.working_dir = Some(dir.path().join("work"));
    settings.draw.stroke_width = 12.0;
    config::save_to_path(&settings, &path).expect("save config");

    let loaded = config::load_from_path(&path).expect("load config");
    assert_eq!(loaded, settings);

    let session = EditingSession::new(gradient(), SessionConfig::from(&loaded));
    assert!(session.working_dir().starts_with(dir.path().join("work")));
    assert_eq!(
        session.export_path().extension().and_then(|e| e.to_str()),
        Some("jpg")
    );
}
