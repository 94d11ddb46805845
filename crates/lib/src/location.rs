//! Read-only probes of the context directory.

use std::io;
use std::path::Path;

use crate::consts::DEVFILE_NAME;
use crate::fs::Filesystem;

/// Whether `dir` directly contains a regular file named `devfile.yaml`.
pub fn contains_devfile(fs: &dyn Filesystem, dir: &Path) -> io::Result<bool> {
  match fs.stat(&dir.join(DEVFILE_NAME)) {
    Ok(info) => Ok(info.is_file()),
    Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
    Err(e) => Err(e),
  }
}

/// Whether `dir` has no entries at all.
pub fn dir_is_empty(fs: &dyn Filesystem, dir: &Path) -> io::Result<bool> {
  fs.is_empty(dir)
}
