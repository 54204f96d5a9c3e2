// SPDX-License-Identifier: MPL-2.0
//! Centralized path management for application directories.
//!
//! # Path Resolution Order
//!
//! Paths are resolved in the following priority order:
//! 1. **Explicit override** - parameter to `_with_override()` functions (for tests)
//! 2. **CLI arguments** (`--data-dir`, `--config-dir`) - set via [`init_cli_overrides`]
//! 3. **Environment variables** (`PHOTO_EDITOR_DATA_DIR`, `PHOTO_EDITOR_CONFIG_DIR`)
//! 4. **Platform default** - via `dirs` crate
//!
//! Session working directories live below the data directory unless the
//! configuration names another base directory.

use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use uuid::Uuid;

/// Application name used for directory naming.
pub const APP_NAME: &str = "PhotoEditor";

/// Environment variable to override the data directory.
pub const ENV_DATA_DIR: &str = "PHOTO_EDITOR_DATA_DIR";

/// Environment variable to override the config directory.
pub const ENV_CONFIG_DIR: &str = "PHOTO_EDITOR_CONFIG_DIR";

/// Subdirectory of the data dir holding per-session working directories.
const SESSIONS_DIR: &str = "sessions";

static CLI_DATA_DIR: OnceLock<Option<PathBuf>> = OnceLock::new();
static CLI_CONFIG_DIR: OnceLock<Option<PathBuf>> = OnceLock::new();

/// Records the `--data-dir` / `--config-dir` arguments.
///
/// Only the first call has an effect; later calls are logged and ignored.
pub fn init_cli_overrides(data_dir: Option<String>, config_dir: Option<String>) {
    if CLI_DATA_DIR.set(data_dir.map(PathBuf::from)).is_err()
        || CLI_CONFIG_DIR.set(config_dir.map(PathBuf::from)).is_err()
    {
        log::debug!("CLI path overrides already initialized; ignoring");
    }
}

fn get_cli_data_dir() -> Option<PathBuf> {
    CLI_DATA_DIR.get().and_then(Clone::clone)
}

fn get_cli_config_dir() -> Option<PathBuf> {
    CLI_CONFIG_DIR.get().and_then(Clone::clone)
}

fn env_dir(name: &str) -> Option<PathBuf> {
    std::env::var(name)
        .ok()
        .filter(|value| !value.is_empty())
        .map(PathBuf::from)
}

/// Returns the application data directory path.
///
/// - Linux: `~/.local/share/PhotoEditor/`
/// - macOS: `~/Library/Application Support/PhotoEditor/`
/// - Windows: `C:\Users\<User>\AppData\Roaming\PhotoEditor\`
///
/// Returns `None` if the data directory cannot be determined (rare edge case).
pub fn get_app_data_dir() -> Option<PathBuf> {
    get_app_data_dir_with_override(None)
}

/// Returns the application data directory path with an optional override.
pub fn get_app_data_dir_with_override(override_path: Option<PathBuf>) -> Option<PathBuf> {
    override_path
        .or_else(get_cli_data_dir)
        .or_else(|| env_dir(ENV_DATA_DIR))
        .or_else(|| dirs::data_dir().map(|path| path.join(APP_NAME)))
}

/// Returns the application config directory path (holds `settings.toml`).
pub fn get_app_config_dir() -> Option<PathBuf> {
    get_app_config_dir_with_override(None)
}

/// Returns the application config directory path with an optional override.
pub fn get_app_config_dir_with_override(override_path: Option<PathBuf>) -> Option<PathBuf> {
    override_path
        .or_else(get_cli_config_dir)
        .or_else(|| env_dir(ENV_CONFIG_DIR))
        .or_else(|| dirs::config_dir().map(|path| path.join(APP_NAME)))
}

/// Returns the working directory of session `id`.
///
/// With a configured `base`, this is `<base>/<id>`. Otherwise it is
/// `<data-dir>/sessions/<id>`, falling back to the system temp dir when no
/// data dir can be determined.
#[must_use]
pub fn session_dir(base: Option<&Path>, id: Uuid) -> PathBuf {
    let name = id.to_string();
    match base {
        Some(base) => base.join(name),
        None => get_app_data_dir()
            .unwrap_or_else(|| std::env::temp_dir().join(APP_NAME))
            .join(SESSIONS_DIR)
            .join(name),
    }
}
