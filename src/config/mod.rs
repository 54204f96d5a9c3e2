// SPDX-License-Identifier: MPL-2.0
//! This module handles the editor's configuration, including loading and saving
//! user preferences to a `settings.toml` file.
//!
//! # Configuration Sections
//!
//! - `[controls]` - Toolbar controls the host hides
//! - `[export]` - Output format, working directory and background fill
//! - `[draw]` - Brush color and width
//! - `[text]` - Text color, size, shadow and fonts
//! - `[network]` - Remote image loading
//!
//! # Path Resolution
//!
//! 1. Use `load_from_path()`/`save_to_path()` with explicit path
//! 2. Set `PHOTO_EDITOR_CONFIG_DIR` environment variable
//! 3. Falls back to platform-specific config directory
//!
//! # Examples
//!
//! ```no_run
//! use photo_editor::config::{self, Config};
//! use photo_editor::media::ExportFormat;
//!
//! // Load existing configuration (returns tuple with optional warning)
//! let (mut config, _warning) = config::load();
//!
//! config.export.format = ExportFormat::WebP;
//! config::save(&config).expect("Failed to save config");
//! ```

pub mod defaults;

pub use defaults::*;

use crate::app::paths;
use crate::domain::editing::HiddenControls;
use crate::domain::Color;
use crate::error::{Error, Result};
use crate::media::ExportFormat;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

const CONFIG_FILE: &str = "settings.toml";

// =============================================================================
// Section Structs
// =============================================================================

/// Controls the host should not show. Never enforced by the editor itself.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct ControlsConfig {
    #[serde(default)]
    pub hidden: HiddenControls,
}

/// Export settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct ExportConfig {
    #[serde(default)]
    pub format: ExportFormat,

    /// Base directory for session working directories.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub working_dir: Option<PathBuf>,

    /// Color painted under transparent pixels of the exported image.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background: Option<Color>,
}

/// Freehand drawing settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DrawConfig {
    #[serde(default = "default_draw_color")]
    pub color: Color,

    #[serde(default = "default_stroke_width")]
    pub stroke_width: f32,
}

impl Default for DrawConfig {
    fn default() -> Self {
        Self {
            color: DEFAULT_DRAW_COLOR,
            stroke_width: DEFAULT_STROKE_WIDTH,
        }
    }
}

/// A font file registered under a family name.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FontEntry {
    pub family: String,
    pub path: PathBuf,
}

/// Text overlay settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TextConfig {
    #[serde(default = "default_text_color")]
    pub color: Color,

    #[serde(default = "default_font_size")]
    pub font_size: f32,

    #[serde(default = "default_text_shadow")]
    pub shadow: bool,

    /// Family used when a text block names none.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_font: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fonts: Vec<FontEntry>,
}

impl Default for TextConfig {
    fn default() -> Self {
        Self {
            color: DEFAULT_TEXT_COLOR,
            font_size: DEFAULT_FONT_SIZE,
            shadow: DEFAULT_TEXT_SHADOW,
            default_font: None,
            fonts: Vec::new(),
        }
    }
}

/// Remote image loading settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct NetworkConfig {
    /// Whole-request timeout. Absent means only the connect and read
    /// timeouts bound a request.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub http_timeout_secs: Option<u64>,

    /// Overrides [`DEFAULT_HTTP_CONNECT_TIMEOUT`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connect_timeout_secs: Option<u64>,

    /// Overrides [`DEFAULT_HTTP_READ_TIMEOUT`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub read_timeout_secs: Option<u64>,

    /// Overrides [`MAX_HTTP_BODY_BYTES`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_body_bytes: Option<u64>,
}

// =============================================================================
// Main Config Struct (Sectioned)
// =============================================================================

/// Editor configuration with logical sections.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Config {
    #[serde(default)]
    pub controls: ControlsConfig,

    #[serde(default)]
    pub export: ExportConfig,

    #[serde(default)]
    pub draw: DrawConfig,

    #[serde(default)]
    pub text: TextConfig,

    #[serde(default)]
    pub network: NetworkConfig,
}

// =============================================================================
// Default Value Functions
// =============================================================================

fn default_draw_color() -> Color {
    DEFAULT_DRAW_COLOR
}

fn default_stroke_width() -> f32 {
    DEFAULT_STROKE_WIDTH
}

fn default_text_color() -> Color {
    DEFAULT_TEXT_COLOR
}

fn default_font_size() -> f32 {
    DEFAULT_FONT_SIZE
}

fn default_text_shadow() -> bool {
    DEFAULT_TEXT_SHADOW
}

// =============================================================================
// Config Path Resolution
// =============================================================================

fn get_config_path_with_override(base_dir: Option<PathBuf>) -> Option<PathBuf> {
    paths::get_app_config_dir_with_override(base_dir).map(|mut path| {
        path.push(CONFIG_FILE);
        path
    })
}

// =============================================================================
// Load / Save
// =============================================================================

/// Loads the configuration from the default path.
///
/// Returns a tuple of (config, optional_warning). If loading fails, returns
/// the default config with a warning explaining what went wrong.
pub fn load() -> (Config, Option<String>) {
    load_with_override(None)
}

/// Loads the configuration from `<base_dir>/settings.toml`, or from the
/// resolved config dir when `base_dir` is `None`.
pub fn load_with_override(base_dir: Option<PathBuf>) -> (Config, Option<String>) {
    if let Some(path) = get_config_path_with_override(base_dir) {
        if path.exists() {
            match load_from_path(&path) {
                Ok(config) => return (config, None),
                Err(err) => {
                    log::warn!("Ignoring {}: {err}", path.display());
                    return (
                        Config::default(),
                        Some(format!("{} is invalid, using defaults: {err}", path.display())),
                    );
                }
            }
        }
    }
    (Config::default(), None)
}

/// Reads and parses a config file.
///
/// # Errors
///
/// Returns [`Error::Io`] if the file can't be read and [`Error::Config`] if
/// it isn't valid TOML for [`Config`].
pub fn load_from_path(path: &Path) -> Result<Config> {
    let content = fs::read_to_string(path)?;
    let config: Config = toml::from_str(&content)?;
    Ok(config)
}

/// Saves the configuration to the default path.
///
/// # Errors
///
/// Returns an error if the file can't be serialized or written.
pub fn save(config: &Config) -> Result<()> {
    save_with_override(config, None)
}

/// Saves the configuration below `base_dir`, or the resolved config dir.
///
/// # Errors
///
/// Returns an error if the file can't be serialized or written.
pub fn save_with_override(config: &Config, base_dir: Option<PathBuf>) -> Result<()> {
    if let Some(path) = get_config_path_with_override(base_dir) {
        return save_to_path(config, &path);
    }
    Ok(())
}

/// Writes a config file, creating parent directories.
///
/// # Errors
///
/// Returns an error if the file can't be serialized or written.
pub fn save_to_path(config: &Config, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let content = toml::to_string_pretty(config).map_err(Error::from)?;
    fs::write(path, content)?;
    Ok(())
}
