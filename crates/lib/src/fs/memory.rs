//! In-memory [`Filesystem`] for tests.

use std::collections::BTreeMap;
use std::io;
use std::path::{Component, Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use super::{DirEntry, EntryKind, FileInfo, Filesystem};

#[derive(Debug, Clone)]
enum Node {
  File(Vec<u8>),
  Dir,
}

/// A filesystem held entirely in memory.
///
/// Directories are created implicitly for the working directory and by
/// [`MemoryFs::with_file`]; [`Filesystem::write_file`] requires the parent
/// to exist, like the real filesystem does.
#[derive(Debug)]
pub struct MemoryFs {
  cwd: PathBuf,
  nodes: Mutex<BTreeMap<PathBuf, Node>>,
}

impl MemoryFs {
  /// Create an empty filesystem whose working directory is `cwd`.
  pub fn new(cwd: impl Into<PathBuf>) -> Self {
    let fs = Self {
      cwd: cwd.into(),
      nodes: Mutex::new(BTreeMap::new()),
    };
    let cwd = fs.cwd.clone();
    fs.insert_dirs(&cwd);
    fs
  }

  /// Add a file, creating parent directories. Relative paths land under the working directory.
  pub fn with_file(self, path: impl AsRef<Path>, contents: impl AsRef<[u8]>) -> Self {
    let path = self.resolve(path.as_ref());
    if let Some(parent) = path.parent() {
      self.insert_dirs(parent);
    }
    self.lock().insert(path, Node::File(contents.as_ref().to_vec()));
    self
  }

  /// All files with their contents, keyed by absolute path.
  pub fn snapshot(&self) -> BTreeMap<PathBuf, Vec<u8>> {
    self
      .lock()
      .iter()
      .filter_map(|(path, node)| match node {
        Node::File(contents) => Some((path.clone(), contents.clone())),
        Node::Dir => None,
      })
      .collect()
  }

  /// Contents of a file as UTF-8, if it exists.
  pub fn contents(&self, path: impl AsRef<Path>) -> Option<String> {
    let path = self.resolve(path.as_ref());
    match self.lock().get(&path) {
      Some(Node::File(contents)) => Some(String::from_utf8_lossy(contents).into_owned()),
      _ => None,
    }
  }

  fn lock(&self) -> MutexGuard<'_, BTreeMap<PathBuf, Node>> {
    // A poisoned lock only means another test thread panicked mid-write.
    self.nodes.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
  }

  fn resolve(&self, path: &Path) -> PathBuf {
    let joined = if path.is_absolute() {
      path.to_path_buf()
    } else {
      self.cwd.join(path)
    };
    let mut normalized = PathBuf::new();
    for component in joined.components() {
      match component {
        Component::CurDir => {}
        Component::ParentDir => {
          normalized.pop();
        }
        other => normalized.push(other.as_os_str()),
      }
    }
    normalized
  }

  fn insert_dirs(&self, dir: &Path) {
    let mut nodes = self.lock();
    for ancestor in dir.ancestors() {
      nodes.entry(ancestor.to_path_buf()).or_insert(Node::Dir);
    }
  }
}

fn not_found(path: &Path) -> io::Error {
  io::Error::new(io::ErrorKind::NotFound, format!("{}: no such file or directory", path.display()))
}

impl Filesystem for MemoryFs {
  fn getwd(&self) -> io::Result<PathBuf> {
    Ok(self.cwd.clone())
  }

  fn stat(&self, path: &Path) -> io::Result<FileInfo> {
    let path = self.resolve(path);
    match self.lock().get(&path) {
      Some(Node::File(contents)) => Ok(FileInfo {
        kind: EntryKind::File,
        len: contents.len() as u64,
      }),
      Some(Node::Dir) => Ok(FileInfo {
        kind: EntryKind::Dir,
        len: 0,
      }),
      None => Err(not_found(&path)),
    }
  }

  fn remove(&self, path: &Path) -> io::Result<()> {
    let path = self.resolve(path);
    let mut nodes = self.lock();
    match nodes.get(&path) {
      Some(Node::File(_)) => {
        nodes.remove(&path);
        Ok(())
      }
      Some(Node::Dir) => Err(io::Error::new(
        io::ErrorKind::IsADirectory,
        format!("{}: is a directory", path.display()),
      )),
      None => Err(not_found(&path)),
    }
  }

  fn read_file(&self, path: &Path) -> io::Result<Vec<u8>> {
    let path = self.resolve(path);
    match self.lock().get(&path) {
      Some(Node::File(contents)) => Ok(contents.clone()),
      Some(Node::Dir) => Err(io::Error::new(
        io::ErrorKind::IsADirectory,
        format!("{}: is a directory", path.display()),
      )),
      None => Err(not_found(&path)),
    }
  }

  fn write_file(&self, path: &Path, contents: &[u8]) -> io::Result<()> {
    let path = self.resolve(path);
    let mut nodes = self.lock();
    let parent_exists = path
      .parent()
      .is_some_and(|parent| matches!(nodes.get(parent), Some(Node::Dir)));
    if !parent_exists {
      return Err(not_found(&path));
    }
    if matches!(nodes.get(&path), Some(Node::Dir)) {
      return Err(io::Error::new(
        io::ErrorKind::IsADirectory,
        format!("{}: is a directory", path.display()),
      ));
    }
    nodes.insert(path, Node::File(contents.to_vec()));
    Ok(())
  }

  fn create_dir_all(&self, path: &Path) -> io::Result<()> {
    let path = self.resolve(path);
    {
      let nodes = self.lock();
      if let Some(existing) = path.ancestors().find(|a| matches!(nodes.get(*a), Some(Node::File(_)))) {
        return Err(io::Error::new(
          io::ErrorKind::AlreadyExists,
          format!("{}: not a directory", existing.display()),
        ));
      }
    }
    self.insert_dirs(&path);
    Ok(())
  }

  fn read_dir(&self, path: &Path) -> io::Result<Vec<DirEntry>> {
    let path = self.resolve(path);
    let nodes = self.lock();
    match nodes.get(&path) {
      Some(Node::Dir) => {}
      Some(Node::File(_)) => {
        return Err(io::Error::new(
          io::ErrorKind::NotADirectory,
          format!("{}: not a directory", path.display()),
        ));
      }
      None => return Err(not_found(&path)),
    }
    let entries = nodes
      .iter()
      .filter(|(child, _)| child.parent() == Some(path.as_path()))
      .filter_map(|(child, node)| {
        let name = child.file_name()?.to_string_lossy().into_owned();
        let kind = match node {
          Node::File(_) => EntryKind::File,
          Node::Dir => EntryKind::Dir,
        };
        Some(DirEntry { name, kind })
      })
      .collect();
    Ok(entries)
  }
}
