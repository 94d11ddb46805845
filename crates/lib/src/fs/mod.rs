//! Filesystem abstraction used by the init pipeline.
//!
//! Every filesystem access of the pipeline goes through [`Filesystem`] so
//! that tests can run the whole command against [`MemoryFs`] instead of the
//! real disk. Errors are returned as plain [`std::io::Error`]s; this layer
//! never retries.

mod memory;

use std::fmt::Debug;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

pub use memory::MemoryFs;

/// Kind of a filesystem entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
  File,
  Dir,
  Other,
}

/// Result of [`Filesystem::stat`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileInfo {
  pub kind: EntryKind,
  pub len: u64,
}

impl FileInfo {
  pub fn is_file(&self) -> bool {
    self.kind == EntryKind::File
  }

  pub fn is_dir(&self) -> bool {
    self.kind == EntryKind::Dir
  }
}

/// A single directory entry returned by [`Filesystem::read_dir`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
  pub name: String,
  pub kind: EntryKind,
}

/// Injectable filesystem.
///
/// Paths should be absolute; implementations may resolve relative paths
/// against [`Filesystem::getwd`].
pub trait Filesystem: Send + Sync + Debug {
  /// Current working directory.
  fn getwd(&self) -> io::Result<PathBuf>;

  fn stat(&self, path: &Path) -> io::Result<FileInfo>;

  /// Remove a single file. Never removes directories.
  fn remove(&self, path: &Path) -> io::Result<()>;

  fn read_file(&self, path: &Path) -> io::Result<Vec<u8>>;

  /// Write `contents` to `path`, replacing any existing file.
  ///
  /// The parent directory must exist.
  fn write_file(&self, path: &Path, contents: &[u8]) -> io::Result<()>;

  fn create_dir_all(&self, path: &Path) -> io::Result<()>;

  /// Entries of a directory, sorted by name.
  fn read_dir(&self, path: &Path) -> io::Result<Vec<DirEntry>>;

  /// Whether `dir` contains no entries at all.
  fn is_empty(&self, dir: &Path) -> io::Result<bool> {
    Ok(self.read_dir(dir)?.is_empty())
  }

  /// Apply unix permission bits. Implementations without permissions ignore it.
  fn set_mode(&self, _path: &Path, _mode: u32) -> io::Result<()> {
    Ok(())
  }
}

/// [`Filesystem`] backed by the real disk.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultFs;

impl Filesystem for DefaultFs {
  fn getwd(&self) -> io::Result<PathBuf> {
    let cwd = std::env::current_dir()?;
    dunce::canonicalize(&cwd)
  }

  fn stat(&self, path: &Path) -> io::Result<FileInfo> {
    let metadata = fs::metadata(path)?;
    let kind = if metadata.is_file() {
      EntryKind::File
    } else if metadata.is_dir() {
      EntryKind::Dir
    } else {
      EntryKind::Other
    };
    Ok(FileInfo {
      kind,
      len: metadata.len(),
    })
  }

  fn remove(&self, path: &Path) -> io::Result<()> {
    fs::remove_file(path)
  }

  fn read_file(&self, path: &Path) -> io::Result<Vec<u8>> {
    fs::read(path)
  }

  fn write_file(&self, path: &Path, contents: &[u8]) -> io::Result<()> {
    fs::write(path, contents)
  }

  fn create_dir_all(&self, path: &Path) -> io::Result<()> {
    fs::create_dir_all(path)
  }

  fn read_dir(&self, path: &Path) -> io::Result<Vec<DirEntry>> {
    let mut entries = Vec::new();
    for entry in fs::read_dir(path)? {
      let entry = entry?;
      let file_type = entry.file_type()?;
      let kind = if file_type.is_file() {
        EntryKind::File
      } else if file_type.is_dir() {
        EntryKind::Dir
      } else {
        EntryKind::Other
      };
      entries.push(DirEntry {
        name: entry.file_name().to_string_lossy().into_owned(),
        kind,
      });
    }
    entries.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(entries)
  }

  #[cfg(unix)]
  fn set_mode(&self, path: &Path, mode: u32) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(mode))
  }
}
