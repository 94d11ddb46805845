//! Platform-specific locations of configuration files.

use std::path::PathBuf;

use crate::consts::{APP_NAME, PREFERENCE_ENV};

/// Returns the user's home directory
#[cfg(windows)]
pub fn home_dir() -> PathBuf {
  let userprofile = std::env::var("USERPROFILE").unwrap_or_default();
  PathBuf::from(userprofile)
}

/// Returns the user's home directory
#[cfg(not(windows))]
pub fn home_dir() -> PathBuf {
  let home = std::env::var("HOME").unwrap_or_default();
  PathBuf::from(home)
}

/// Returns the directory for configuration files for the application
#[cfg(windows)]
pub fn config_dir() -> PathBuf {
  let appdata = std::env::var("APPDATA")
    .map(PathBuf::from)
    .unwrap_or_else(|_| home_dir().join("AppData").join("Roaming"));
  appdata.join(APP_NAME)
}

/// Returns the directory for configuration files for the application
#[cfg(not(windows))]
pub fn config_dir() -> PathBuf {
  let config_home = std::env::var("XDG_CONFIG_HOME")
    .map(PathBuf::from)
    .unwrap_or_else(|_| home_dir().join(".config"));
  config_home.join(APP_NAME)
}

/// Location of the preference file.
///
/// `DEVINIT_PREFERENCE` wins over the per-user configuration directory.
pub fn preference_file() -> PathBuf {
  match std::env::var(PREFERENCE_ENV) {
    Ok(path) if !path.is_empty() => PathBuf::from(path),
    _ => config_dir().join("preference.yaml"),
  }
}
