//! Component name validation and default derivation.

use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;

use super::error::InitError;
use crate::consts::MAX_NAME_LEN;

static NAME_RE: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new("^[a-z]([-a-z0-9]*[a-z0-9])?$").unwrap_or_else(|e| panic!("invalid name pattern: {e}"))
});

/// Name used when nothing else yields a valid name.
pub const FALLBACK_NAME: &str = "my-component";

/// Validate a component name (DNS-1123 label starting with a letter).
pub fn validate_name(name: &str) -> Result<(), InitError> {
  if name.len() > MAX_NAME_LEN {
    return Err(InitError::NameInvalid {
      name: name.to_string(),
      reason: format!("must be no more than {MAX_NAME_LEN} characters"),
    });
  }
  if !NAME_RE.is_match(name) {
    return Err(InitError::NameInvalid {
      name: name.to_string(),
      reason: "must consist of lower case alphanumeric characters or '-', start with a letter \
               and end with an alphanumeric character"
        .to_string(),
    });
  }
  Ok(())
}

/// Turn arbitrary text into a valid component name, if any letters survive.
pub fn sanitize_name(raw: &str) -> Option<String> {
  let mut name = String::with_capacity(raw.len());
  for c in raw.trim().chars().flat_map(char::to_lowercase) {
    let c = if c.is_ascii_lowercase() || c.is_ascii_digit() { c } else { '-' };
    if c == '-' && name.ends_with('-') {
      continue;
    }
    name.push(c);
  }

  let start = name.find(|c: char| c.is_ascii_lowercase())?;
  let mut name = name[start..].to_string();
  name.truncate(MAX_NAME_LEN);
  let name = name.trim_end_matches('-').to_string();

  validate_name(&name).ok().map(|_| name)
}

/// Default component name: the first candidate that sanitizes into a valid
/// name, then the directory basename, then [`FALLBACK_NAME`].
pub fn default_name<'a>(candidates: impl IntoIterator<Item = &'a str>, dir: &Path) -> String {
  let basename = dir.file_name().map(|n| n.to_string_lossy().into_owned());
  candidates
    .into_iter()
    .filter_map(sanitize_name)
    .chain(basename.as_deref().and_then(sanitize_name))
    .next()
    .unwrap_or_else(|| FALLBACK_NAME.to_string())
}
