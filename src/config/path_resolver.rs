//! Storage and config locations
//!
//! Default directories come from the platform conventions reported by
//! `directories` (XDG on Linux). User-supplied paths get `~` expanded and are
//! made absolute against the current directory.

use anyhow::{Context, Result};
use directories::BaseDirs;
use std::path::PathBuf;

const APP_DIR: &str = "personal-memory";

/// Make a user-supplied path absolute, expanding a leading `~`
pub fn resolve_path(path: &str) -> Result<PathBuf> {
    let expanded = PathBuf::from(shellexpand::tilde(path).as_ref());
    if expanded.is_absolute() {
        return Ok(expanded);
    }

    let cwd = std::env::current_dir().context("Failed to get current directory")?;
    Ok(cwd.join(expanded))
}

/// Directory holding the config file, e.g. `~/.config/personal-memory`
pub fn config_dir() -> PathBuf {
    base_dir(|dirs| dirs.config_dir().to_path_buf(), ".config")
}

/// Directory holding note files by default, e.g. `~/.local/share/personal-memory`
pub fn data_dir() -> PathBuf {
    base_dir(|dirs| dirs.data_dir().to_path_buf(), ".local/share")
}

/// `config.toml` inside [`config_dir`]
pub fn default_config_path() -> PathBuf {
    config_dir().join("config.toml")
}

/// Without a home directory, fall back to a path relative to the working directory
fn base_dir<F>(pick: F, fallback: &str) -> PathBuf
where
    F: FnOnce(&BaseDirs) -> PathBuf,
{
    match BaseDirs::new() {
        Some(dirs) => pick(&dirs).join(APP_DIR),
        None => {
            tracing::warn!("No home directory found, using ./{}/{}", fallback, APP_DIR);
            PathBuf::from(fallback).join(APP_DIR)
        }
    }
}
