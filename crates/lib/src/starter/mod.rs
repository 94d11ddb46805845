//! Starter project download and overlay.
//!
//! Downloading a starter is destructive: the staged `devfile.yaml` is
//! removed right before the starter content is written, because a starter
//! may ship its own devfile. Whether a failure happened before or after the
//! context directory was touched is reported through
//! [`StarterDownloadError::touched`], which decides whether the caller may
//! still roll back.

mod archive;
mod git;

use std::io;
use std::path::{Component, Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info};

use crate::consts::DEVFILE_NAME;
use crate::devfile::StarterProject;
use crate::fs::Filesystem;
use crate::init::{InitError, RunContext};
use crate::registry::RegistryClient;

/// Failure of [`download_starter_project`].
#[derive(Debug, Error)]
#[error("{source}")]
pub struct StarterDownloadError {
  pub source: InitError,
  /// Whether any file or directory was created in the context directory.
  pub touched: bool,
}

impl StarterDownloadError {
  fn untouched(source: InitError) -> Self {
    Self { source, touched: false }
  }
}

/// Download `starter` and overlay it onto `dir`.
pub async fn download_starter_project(
  fs: &dyn Filesystem,
  registry: &RegistryClient,
  ctx: &RunContext,
  starter: &StarterProject,
  dir: &Path,
) -> Result<(), StarterDownloadError> {
  let sub_dir = starter.sub_dir.as_deref().map(relative_sub_dir).transpose().map_err(|message| {
    StarterDownloadError::untouched(InitError::DownloadFailed {
      name: starter.name.clone(),
      message,
    })
  })?;

  let written = match (&starter.zip, &starter.git) {
    (Some(zip), _) => {
      info!(starter = %starter.name, location = %zip.location, "downloading starter project");
      let bytes = registry
        .fetch(ctx, &zip.location)
        .await
        .map_err(|e| StarterDownloadError::untouched(download_failed(&starter.name, e)))?;
      ctx.check_cancelled().map_err(StarterDownloadError::untouched)?;

      let mut overlay = Overlay::new(fs, dir, sub_dir);
      overlay
        .clear_staged_devfile()
        .map_err(|e| StarterDownloadError::untouched(extract_failed(&starter.name, e.to_string())))?;
      if let Err(message) = archive::extract(&bytes, &mut overlay) {
        return Err(StarterDownloadError {
          source: extract_failed(&starter.name, message),
          touched: overlay.touched(),
        });
      }
      overlay.written()
    }
    (None, Some(git)) => git::download(fs, ctx, &starter.name, git, sub_dir, dir).await?,
    (None, None) => {
      return Err(StarterDownloadError::untouched(InitError::DownloadFailed {
        name: starter.name.clone(),
        message: "starter project declares no source".to_string(),
      }));
    }
  };

  info!(starter = %starter.name, files = written, "starter project extracted");
  Ok(())
}

fn download_failed(name: &str, err: InitError) -> InitError {
  match err {
    InitError::Cancelled => InitError::Cancelled,
    other => InitError::DownloadFailed {
      name: name.to_string(),
      message: other.to_string(),
    },
  }
}

fn extract_failed(name: &str, message: String) -> InitError {
  InitError::ExtractFailed {
    name: name.to_string(),
    message,
  }
}

/// Validate a starter `subDir` as a relative path inside the project.
fn relative_sub_dir(sub_dir: &str) -> Result<PathBuf, String> {
  let mut relative = PathBuf::new();
  for component in Path::new(sub_dir).components() {
    match component {
      Component::Normal(part) => relative.push(part),
      Component::CurDir => {}
      _ => return Err(format!("invalid subDir {sub_dir:?}")),
    }
  }
  Ok(relative)
}

/// Writes starter content into the context directory, remembering whether
/// anything has been created yet.
pub(crate) struct Overlay<'a> {
  fs: &'a dyn Filesystem,
  dest: &'a Path,
  sub_dir: Option<PathBuf>,
  written: usize,
}

impl<'a> Overlay<'a> {
  pub(crate) fn new(fs: &'a dyn Filesystem, dest: &'a Path, sub_dir: Option<PathBuf>) -> Self {
    Self {
      fs,
      dest,
      sub_dir: sub_dir.filter(|s| !s.as_os_str().is_empty()),
      written: 0,
    }
  }

  /// Remove the devfile staged by the acquirer, if still present.
  pub(crate) fn clear_staged_devfile(&self) -> io::Result<()> {
    match self.fs.remove(&self.dest.join(DEVFILE_NAME)) {
      Ok(()) => {
        debug!("removed staged devfile before overlaying starter project");
        Ok(())
      }
      Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
      Err(e) => Err(e),
    }
  }

  pub(crate) fn touched(&self) -> bool {
    self.written > 0
  }

  pub(crate) fn written(&self) -> usize {
    self.written
  }

  /// Map a project-relative path to its destination, applying `subDir`.
  ///
  /// Returns `Ok(None)` for entries outside `subDir` or for the `subDir`
  /// itself, and an error for entries escaping the project.
  pub(crate) fn target(&self, relative: &Path) -> Result<Option<PathBuf>, String> {
    let mut clean = PathBuf::new();
    for component in relative.components() {
      match component {
        Component::Normal(part) => clean.push(part),
        Component::CurDir => {}
        _ => return Err(format!("refusing to extract unsafe path {}", relative.display())),
      }
    }
    let clean = match &self.sub_dir {
      Some(sub_dir) => match clean.strip_prefix(sub_dir) {
        Ok(rest) => rest.to_path_buf(),
        Err(_) => return Ok(None),
      },
      None => clean,
    };
    if clean.as_os_str().is_empty() {
      return Ok(None);
    }
    Ok(Some(self.dest.join(clean)))
  }

  pub(crate) fn create_dir(&mut self, target: &Path) -> Result<(), String> {
    self
      .fs
      .create_dir_all(target)
      .map_err(|e| format!("failed to create {}: {e}", target.display()))?;
    self.written += 1;
    Ok(())
  }

  pub(crate) fn write_file(&mut self, target: &Path, contents: &[u8], mode: Option<u32>) -> Result<(), String> {
    if let Some(parent) = target.parent() {
      self
        .fs
        .create_dir_all(parent)
        .map_err(|e| format!("failed to create {}: {e}", parent.display()))?;
    }
    self
      .fs
      .write_file(target, contents)
      .map_err(|e| format!("failed to write {}: {e}", target.display()))?;
    self.written += 1;
    if let Some(mode) = mode {
      self
        .fs
        .set_mode(target, mode)
        .map_err(|e| format!("failed to set permissions on {}: {e}", target.display()))?;
    }
    Ok(())
  }
}
