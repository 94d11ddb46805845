//! Canonical flag mapping of the `init` command and its validation.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use super::error::InitError;
use super::name::validate_name;
use crate::fs::Filesystem;
use crate::registry::Registry;

pub const FLAG_NAME: &str = "name";
pub const FLAG_DEVFILE: &str = "devfile";
pub const FLAG_DEVFILE_REGISTRY: &str = "devfile-registry";
pub const FLAG_STARTER: &str = "starter";
pub const FLAG_DEVFILE_PATH: &str = "devfile-path";

/// Every flag the init pipeline understands.
pub const FLAG_KEYS: [&str; 5] = [
  FLAG_NAME,
  FLAG_DEVFILE,
  FLAG_DEVFILE_REGISTRY,
  FLAG_STARTER,
  FLAG_DEVFILE_PATH,
];

/// Flags explicitly provided on the command line.
///
/// Only recognised keys with non-empty values are kept; an empty mapping
/// selects interactive mode.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Flags(BTreeMap<String, String>);

impl Flags {
  /// Canonicalise a raw key/value mapping.
  pub fn from_raw<I, K, V>(raw: I) -> Self
  where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: Into<String>,
  {
    let flags = raw
      .into_iter()
      .filter(|(key, _)| FLAG_KEYS.contains(&key.as_ref()))
      .map(|(key, value)| (key.as_ref().to_string(), value.into()))
      .filter(|(_, value)| !value.is_empty())
      .collect();
    Self(flags)
  }

  pub fn get(&self, key: &str) -> Option<&str> {
    self.0.get(key).map(String::as_str)
  }

  pub fn contains(&self, key: &str) -> bool {
    self.0.contains_key(key)
  }

  pub fn is_empty(&self) -> bool {
    self.0.is_empty()
  }

  pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
    self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
  }
}

/// Whether a `--devfile-path` value designates an HTTP(S) URL.
pub fn is_url(path: &str) -> bool {
  reqwest::Url::parse(path).is_ok_and(|url| matches!(url.scheme(), "http" | "https"))
}

/// Resolve a local `--devfile-path` against the context directory.
pub fn resolve_local_path(path: &str, dir: &Path) -> PathBuf {
  let path = Path::new(path);
  if path.is_absolute() {
    path.to_path_buf()
  } else {
    dir.join(path)
  }
}

/// Reject invalid flag combinations.
///
/// Runs before any network access. The only filesystem access is the
/// existence check of a local `--devfile-path`, performed after every
/// combination check has passed.
pub fn validate(flags: &Flags, fs: &dyn Filesystem, dir: &Path, registries: &[Registry]) -> Result<(), InitError> {
  if flags.is_empty() {
    return Ok(());
  }

  let has_devfile = flags.contains(FLAG_DEVFILE);
  let has_devfile_path = flags.contains(FLAG_DEVFILE_PATH);

  if has_devfile && has_devfile_path {
    return Err(InitError::FlagConflict);
  }
  if flags.contains(FLAG_DEVFILE_REGISTRY) && !has_devfile {
    return Err(InitError::FlagDependency);
  }
  if flags.contains(FLAG_STARTER) && !has_devfile && !has_devfile_path {
    return Err(InitError::StarterWithoutDevfile);
  }
  if !has_devfile && !has_devfile_path {
    return Err(InitError::DevfileRequired);
  }

  if let Some(name) = flags.get(FLAG_NAME) {
    validate_name(name)?;
  }

  if let Some(registry) = flags.get(FLAG_DEVFILE_REGISTRY)
    && !registries.iter().any(|r| r.name == registry)
  {
    return Err(InitError::RegistryNotFound {
      name: registry.to_string(),
      known: registries.iter().map(|r| r.name.as_str()).collect::<Vec<_>>().join(", "),
    });
  }

  if let Some(path) = flags.get(FLAG_DEVFILE_PATH)
    && !is_url(path)
  {
    let path = resolve_local_path(path, dir);
    if !fs.stat(&path).is_ok_and(|info| info.is_file()) {
      return Err(InitError::DevfilePathNotFound { path });
    }
  }

  Ok(())
}
