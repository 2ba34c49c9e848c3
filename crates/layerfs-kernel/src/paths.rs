//! XDG Base Directory paths for layerfs.
//!
//! | Purpose | XDG Variable | Default | layerfs file |
//! |---------|--------------|---------|--------------|
//! | Config | `$XDG_CONFIG_HOME` | `~/.config` | `layerfs/config.toml` |
//! | Cache | `$XDG_CACHE_HOME` | `~/.cache` | `layerfs/cache.db` |
//! | Data | `$XDG_DATA_HOME` | `~/.local/share` | `layerfs/history.txt` |

use std::path::PathBuf;

use directories::BaseDirs;

const APP_DIR: &str = "layerfs";

/// Get the user's home directory.
///
/// Returns `$HOME` or falls back to `/tmp` if not set.
pub fn home_dir() -> PathBuf {
    std::env::var("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("/tmp"))
}

/// `$XDG_DATA_HOME`, falling back to `~/.local/share`.
pub fn xdg_data_home() -> PathBuf {
    BaseDirs::new()
        .map(|d| d.data_dir().to_path_buf())
        .unwrap_or_else(|| home_dir().join(".local").join("share"))
}

/// `$XDG_CONFIG_HOME`, falling back to `~/.config`.
pub fn xdg_config_home() -> PathBuf {
    BaseDirs::new()
        .map(|d| d.config_dir().to_path_buf())
        .unwrap_or_else(|| home_dir().join(".config"))
}

/// `$XDG_CACHE_HOME`, falling back to `~/.cache`.
pub fn xdg_cache_home() -> PathBuf {
    BaseDirs::new()
        .map(|d| d.cache_dir().to_path_buf())
        .unwrap_or_else(|| home_dir().join(".cache"))
}

pub fn data_dir() -> PathBuf {
    xdg_data_home().join(APP_DIR)
}

pub fn config_dir() -> PathBuf {
    xdg_config_home().join(APP_DIR)
}

pub fn cache_dir() -> PathBuf {
    xdg_cache_home().join(APP_DIR)
}

/// Default location of the durable write store.
pub fn default_store_path() -> PathBuf {
    cache_dir().join("cache.db")
}

/// Shell configuration file.
pub fn config_path() -> PathBuf {
    config_dir().join("config.toml")
}

/// Shell line-editor history.
pub fn history_path() -> PathBuf {
    data_dir().join("history.txt")
}
