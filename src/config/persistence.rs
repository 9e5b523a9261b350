//! Style configuration persistence
//!
//! This module handles loading and saving style configuration files from
//! platform-specific directories or explicit paths, with robust error
//! handling and graceful fallback to the standard preset.

use crate::config::StyleSettings;
use crate::error::{Error, Result, ResultExt};
use log::{debug, info, warn};
use std::fs;
use std::path::{Path, PathBuf};

// ─────────────────────────────────────────────────────────────────────────────
// Constants
// ─────────────────────────────────────────────────────────────────────────────

/// Application name used for the config directory
const APP_NAME: &str = "richstyle";

/// Configuration file name
const CONFIG_FILE_NAME: &str = "styles.json";

/// Suffix of the temporary file used during atomic writes
const BACKUP_SUFFIX: &str = "bak";

// ─────────────────────────────────────────────────────────────────────────────
// Platform-Specific Directory Resolution
// ─────────────────────────────────────────────────────────────────────────────

/// Get the platform-specific configuration directory for the crate.
///
/// - **Windows**: `%APPDATA%\richstyle\`
/// - **macOS**: `~/Library/Application Support/richstyle/`
/// - **Linux**: `~/.config/richstyle/`
///
/// # Errors
///
/// Returns `Error::ConfigDirNotFound` if the config directory cannot be determined.
pub fn get_config_dir() -> Result<PathBuf> {
    dirs::config_dir()
        .map(|base| base.join(APP_NAME))
        .ok_or(Error::ConfigDirNotFound)
}

/// Get the full path to the default style configuration file.
pub fn get_config_file_path() -> Result<PathBuf> {
    Ok(get_config_dir()?.join(CONFIG_FILE_NAME))
}

// ─────────────────────────────────────────────────────────────────────────────
// Load Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// Load style settings from the default location.
///
/// Missing, empty or corrupted files fall back to the standard preset with
/// a warning; this never fails.
pub fn load_config() -> StyleSettings {
    get_config_file_path()
        .and_then(|path| {
            if path.exists() {
                load_config_from(&path)
            } else {
                debug!(
                    "Style config not found at {}, using defaults",
                    path.display()
                );
                Ok(StyleSettings::default())
            }
        })
        .unwrap_or_warn_default(StyleSettings::default(), "Failed to load style configuration")
}

/// Load style settings from an explicit path.
///
/// Files ending in `.toml` are parsed as TOML, everything else as JSON.
/// An empty file yields the defaults.
pub fn load_config_from(path: &Path) -> Result<StyleSettings> {
    debug!("Loading style config from: {}", path.display());

    let contents = fs::read_to_string(path).map_err(|e| Error::ConfigLoad {
        path: path.to_path_buf(),
        source: Box::new(e),
    })?;

    if contents.trim().is_empty() {
        debug!("Style config is empty, using defaults");
        return Ok(StyleSettings::default());
    }

    let settings = if is_toml(path) {
        StyleSettings::from_toml_sanitized(&contents).map_err(|e| {
            warn!("Style config at {} is invalid TOML: {}", path.display(), e);
            Error::from(e)
        })?
    } else {
        StyleSettings::from_json_sanitized(&contents).map_err(|e| {
            warn!("Style config at {} is invalid JSON: {}", path.display(), e);
            Error::from(e)
        })?
    };

    info!(
        "Loaded {} styles from {}",
        settings.styles.len(),
        path.display()
    );
    Ok(settings)
}

fn is_toml(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"))
}

// ─────────────────────────────────────────────────────────────────────────────
// Save Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// Save style settings to the default location.
pub fn save_config(settings: &StyleSettings) -> Result<()> {
    let path = get_config_file_path()?;
    save_config_to(settings, &path)
}

/// Save style settings to `path` as pretty JSON.
///
/// The write is atomic: contents go to a sibling backup file first, which
/// then replaces the target. Missing parent directories are created.
pub fn save_config_to(settings: &StyleSettings, path: &Path) -> Result<()> {
    if let Some(dir) = path.parent() {
        if !dir.as_os_str().is_empty() && !dir.exists() {
            debug!("Creating config directory: {}", dir.display());
            fs::create_dir_all(dir).map_err(|e| Error::ConfigSave {
                path: dir.to_path_buf(),
                source: Box::new(e),
            })?;
        }
    }

    let json = serde_json::to_string_pretty(settings).map_err(|e| Error::ConfigSave {
        path: path.to_path_buf(),
        source: Box::new(e),
    })?;

    let backup_path = path.with_extension(BACKUP_SUFFIX);
    fs::write(&backup_path, &json).map_err(|e| Error::ConfigSave {
        path: backup_path.clone(),
        source: Box::new(e),
    })?;

    fs::rename(&backup_path, path).map_err(|e| Error::ConfigSave {
        path: path.to_path_buf(),
        source: Box::new(e),
    })?;

    info!("Style configuration saved to {}", path.display());
    Ok(())
}

/// Save style settings, ignoring errors.
///
/// Returns `true` if the save was successful.
pub fn save_config_silent(settings: &StyleSettings) -> bool {
    match save_config(settings) {
        Ok(()) => true,
        Err(e) => {
            warn!("Failed to save style configuration: {}", e);
            false
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
