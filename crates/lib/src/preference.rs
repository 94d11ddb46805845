//! User preferences: configured registries and HTTP timeout.
//!
//! Preferences are read from `$DEVINIT_PREFERENCE` or
//! `<config_dir>/devinit/preference.yaml`. A missing file yields the
//! defaults (the public devfile registry and a 30 second timeout).

use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Deserializer};
use thiserror::Error;
use tracing::debug;

use crate::consts::{DEFAULT_REGISTRY_NAME, DEFAULT_REGISTRY_URL};
use crate::paths::preference_file;
use crate::registry::Registry;

/// Timeout applied to HTTP requests when none is configured.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Error)]
pub enum PreferenceError {
  #[error("failed to read preference file {}: {source}", path.display())]
  Read { path: PathBuf, source: io::Error },

  #[error("failed to parse preference file {}: {source}", path.display())]
  Parse { path: PathBuf, source: serde_yaml::Error },

  #[error("preference file {} configures no registry", path.display())]
  NoRegistry { path: PathBuf },

  #[error("preference file {} configures registry {name:?} more than once", path.display())]
  DuplicateRegistry { path: PathBuf, name: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Preferences {
  /// Registries in lookup order.
  pub registries: Vec<Registry>,
  /// Timeout of each HTTP request.
  pub timeout: Duration,
}

impl Default for Preferences {
  fn default() -> Self {
    Self {
      registries: vec![Registry::new(DEFAULT_REGISTRY_NAME, DEFAULT_REGISTRY_URL)],
      timeout: DEFAULT_TIMEOUT,
    }
  }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct PreferenceFile {
  registries: Option<Vec<Registry>>,
  #[serde(default, deserialize_with = "deserialize_duration")]
  timeout: Option<Duration>,
}

fn deserialize_duration<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
where
  D: Deserializer<'de>,
{
  let raw = Option::<String>::deserialize(deserializer)?;
  raw
    .map(|s| humantime::parse_duration(&s).map_err(serde::de::Error::custom))
    .transpose()
}

impl Preferences {
  /// Load preferences from the default location.
  pub fn load() -> Result<Self, PreferenceError> {
    Self::load_from(&preference_file())
  }

  /// Load preferences from `path`, falling back to defaults if it does not exist.
  pub fn load_from(path: &Path) -> Result<Self, PreferenceError> {
    let content = match fs::read_to_string(path) {
      Ok(content) => content,
      Err(e) if e.kind() == io::ErrorKind::NotFound => {
        debug!(path = %path.display(), "no preference file, using defaults");
        return Ok(Self::default());
      }
      Err(e) => {
        return Err(PreferenceError::Read {
          path: path.to_path_buf(),
          source: e,
        });
      }
    };
    Self::parse(&content, path)
  }

  fn parse(content: &str, path: &Path) -> Result<Self, PreferenceError> {
    let file: PreferenceFile = serde_yaml::from_str(content).map_err(|e| PreferenceError::Parse {
      path: path.to_path_buf(),
      source: e,
    })?;
    let defaults = Self::default();

    let registries = match file.registries {
      None => defaults.registries,
      Some(registries) if registries.is_empty() => {
        return Err(PreferenceError::NoRegistry {
          path: path.to_path_buf(),
        });
      }
      Some(registries) => registries,
    };

    let mut seen = HashSet::new();
    for registry in &registries {
      if !seen.insert(registry.name.as_str()) {
        return Err(PreferenceError::DuplicateRegistry {
          path: path.to_path_buf(),
          name: registry.name.clone(),
        });
      }
    }

    Ok(Self {
      registries,
      timeout: file.timeout.unwrap_or(defaults.timeout),
    })
  }
}
