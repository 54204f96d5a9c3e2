// SPDX-License-Identifier: MPL-2.0
//! Headless front end: load an image, apply a crop and annotations, export.

use photo_editor::app::paths;
use photo_editor::config;
use photo_editor::domain::Point;
use photo_editor::editor::{CropMode, EditingSession, SessionConfig};
use photo_editor::error::{Error, Result};
use photo_editor::infrastructure::HttpImageLoader;
use photo_editor::media::ExportFormat;
use std::path::PathBuf;
use std::process::ExitCode;

const USAGE: &str = "\
Usage: photo-editor <INPUT> [OPTIONS]

INPUT is a file path or an http(s) URL.

Options:
  --crop X,Y,W,H          Crop to a rectangle before annotating
  --text TEXT             Add a text overlay (with --text-at X,Y)
  --sticker PATH          Add a sticker image (with --sticker-at X,Y)
  --format png|jpeg|webp  Export format (default from settings)
  --data-dir DIR          Override the data directory
  --config-dir DIR        Override the config directory
  -h, --help              Print this help
";

struct Args {
    input: String,
    crop: Option<[f32; 4]>,
    text: Option<(String, Point)>,
    sticker: Option<(String, Point)>,
    format: Option<ExportFormat>,
    data_dir: Option<String>,
    config_dir: Option<String>,
}

fn main() -> ExitCode {
    env_logger::init();

    let mut raw = pico_args::Arguments::from_env();
    if raw.contains(["-h", "--help"]) {
        print!("{USAGE}");
        return ExitCode::SUCCESS;
    }

    let outcome = parse_args(raw).and_then(run);
    match outcome {
        Ok(path) => {
            println!("{}", path.display());
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("{err}");
            ExitCode::FAILURE
        }
    }
}

fn parse_args(mut raw: pico_args::Arguments) -> Result<Args> {
    let arg_error = |e: pico_args::Error| Error::Config(e.to_string());

    let crop = raw
        .opt_value_from_str::<_, String>("--crop")
        .map_err(arg_error)?
        .map(|s| parse_floats::<4>(&s, "--crop"))
        .transpose()?;
    let text = paired(&mut raw, "--text", "--text-at")?;
    let sticker = paired(&mut raw, "--sticker", "--sticker-at")?;
    let format = raw
        .opt_value_from_str::<_, String>("--format")
        .map_err(arg_error)?
        .map(|s| {
            ExportFormat::from_extension(&s)
                .ok_or_else(|| Error::Config(format!("unknown format '{s}'")))
        })
        .transpose()?;
    let data_dir = raw.opt_value_from_str("--data-dir").map_err(arg_error)?;
    let config_dir = raw.opt_value_from_str("--config-dir").map_err(arg_error)?;

    let mut free = raw.finish().into_iter();
    let input = free
        .next()
        .and_then(|s| s.into_string().ok())
        .ok_or_else(|| Error::Config(format!("missing INPUT\n\n{USAGE}")))?;
    if let Some(extra) = free.next() {
        return Err(Error::Config(format!(
            "unexpected argument {}",
            extra.to_string_lossy()
        )));
    }

    Ok(Args {
        input,
        crop,
        text,
        sticker,
        format,
        data_dir,
        config_dir,
    })
}

/// Reads `--value` together with its `--at` companion.
fn paired(
    raw: &mut pico_args::Arguments,
    value_flag: &'static str,
    at_flag: &'static str,
) -> Result<Option<(String, Point)>> {
    let value: Option<String> = raw
        .opt_value_from_str(value_flag)
        .map_err(|e| Error::Config(e.to_string()))?;
    let at: Option<String> = raw
        .opt_value_from_str(at_flag)
        .map_err(|e| Error::Config(e.to_string()))?;
    match (value, at) {
        (Some(value), Some(at)) => {
            let [x, y] = parse_floats::<2>(&at, at_flag)?;
            Ok(Some((value, Point::new(x, y))))
        }
        (Some(_), None) => Err(Error::Config(format!("{value_flag} needs {at_flag} X,Y"))),
        (None, Some(_)) => Err(Error::Config(format!("{at_flag} needs {value_flag}"))),
        (None, None) => Ok(None),
    }
}

fn parse_floats<const N: usize>(s: &str, flag: &str) -> Result<[f32; N]> {
    let values = s
        .split(',')
        .map(|part| part.trim().parse::<f32>())
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| Error::Config(format!("{flag}: {e}")))?;
    <[f32; N]>::try_from(values)
        .map_err(|_| Error::Config(format!("{flag} expects {N} comma-separated numbers")))
}

fn run(args: Args) -> Result<PathBuf> {
    paths::init_cli_overrides(args.data_dir, args.config_dir);

    let (mut settings, warning) = config::load();
    if let Some(warning) = warning {
        log::warn!("{warning}");
    }
    if let Some(format) = args.format {
        settings.export.format = format;
    }

    let runtime = tokio::runtime::Runtime::new()?;
    let loader = HttpImageLoader::from_config(&settings.network)?;
    let base = runtime.block_on(loader.fetch(&args.input))?;

    let mut session = EditingSession::new(base, SessionConfig::from(&settings));

    if let Some([x, y, width, height]) = args.crop {
        if let Some(selection) = session.start_crop(CropMode::Rect)?.rect_mut() {
            selection.set_bounds(x, y, width, height);
        }
        session.finish_crop()?;
    }
    if let Some((text, at)) = args.text {
        session.add_text(&text, at)?;
    }
    if let Some((source, at)) = args.sticker {
        let sticker = runtime.block_on(loader.fetch(&source))?;
        session.add_sticker(sticker, at)?;
    }

    let result = runtime.block_on(session.finish())?;
    Ok(result.path)
}
