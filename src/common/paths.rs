//! Configuration paths
//!
//! Uses the directories crate for platform-appropriate locations:
//! - Linux: `~/.config/authprobe/`
//! - macOS: `~/Library/Application Support/authprobe/`
//! - Windows: `%APPDATA%\authprobe\`

use std::path::PathBuf;

/// Application name used for config directories
const APP_NAME: &str = "authprobe";

/// Get the configuration directory path
pub fn config_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", APP_NAME).map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the configuration file
pub fn config_path() -> Option<PathBuf> {
    config_dir().map(|dir| dir.join("config.toml"))
}
