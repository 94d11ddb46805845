//! Git starter projects.
//!
//! The repository is cloned with `gix` into a temporary directory on a
//! blocking thread, then its work tree (without `.git`) is copied into the
//! context directory through the [`Filesystem`].

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use thiserror::Error;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use super::{Overlay, StarterDownloadError, extract_failed};
use crate::devfile::GitSource;
use crate::fs::Filesystem;
use crate::init::{InitError, RunContext};

#[derive(Debug, Error)]
enum CloneError {
  #[error("failed to create temporary directory: {0}")]
  TempDir(#[source] std::io::Error),

  #[error("failed to clone repository '{url}': {source}")]
  Clone {
    url: String,
    #[source]
    source: Box<dyn std::error::Error + Send + Sync>,
  },

  #[error("failed to checkout revision '{rev}': {source}")]
  Checkout {
    rev: String,
    #[source]
    source: Box<dyn std::error::Error + Send + Sync>,
  },

  #[error("clone task failed: {0}")]
  Join(String),
}

/// Clone `git` and overlay its tree onto `dir`. Returns the number of entries written.
pub(super) async fn download(
  fs: &dyn Filesystem,
  ctx: &RunContext,
  name: &str,
  git: &GitSource,
  sub_dir: Option<PathBuf>,
  dir: &Path,
) -> Result<usize, StarterDownloadError> {
  let untouched = |message: String| {
    StarterDownloadError::untouched(InitError::DownloadFailed {
      name: name.to_string(),
      message,
    })
  };

  let url = git
    .remote_url()
    .ok_or_else(|| untouched("git starter project has no usable remote".to_string()))?
    .to_string();
  let revision = git.revision().map(str::to_string);

  let checkout = tempfile::Builder::new()
    .prefix("devinit-starter-")
    .tempdir()
    .map_err(|e| untouched(CloneError::TempDir(e).to_string()))?;
  let worktree = checkout.path().to_path_buf();

  info!(starter = name, url = %url, revision = ?revision, "cloning starter project");
  let cloned = {
    let worktree = worktree.clone();
    run_interruptible(ctx, move |interrupt| clone_repo(&url, revision.as_deref(), &worktree, interrupt))
      .await
      .map_err(StarterDownloadError::untouched)?
  };
  cloned.map_err(|e| untouched(e.to_string()))?;
  ctx.check_cancelled().map_err(StarterDownloadError::untouched)?;

  let mut overlay = Overlay::new(fs, dir, sub_dir);
  overlay
    .clear_staged_devfile()
    .map_err(|e| StarterDownloadError::untouched(extract_failed(name, e.to_string())))?;
  if let Err(message) = copy_tree(&worktree, &mut overlay) {
    return Err(StarterDownloadError {
      source: extract_failed(name, message),
      touched: overlay.touched(),
    });
  }
  Ok(overlay.written())
}

/// Run `work` on a blocking thread, racing it against cancellation.
///
/// On cancellation the interrupt flag is raised and the task is joined before
/// returning, so the task never outlives the call.
async fn run_interruptible<F>(ctx: &RunContext, work: F) -> Result<Result<(), CloneError>, InitError>
where
  F: FnOnce(&AtomicBool) -> Result<(), CloneError> + Send + 'static,
{
  let interrupt = Arc::new(AtomicBool::new(false));
  let mut task = {
    let interrupt = Arc::clone(&interrupt);
    tokio::task::spawn_blocking(move || work(&interrupt))
  };

  tokio::select! {
    joined = &mut task => Ok(joined.map_err(|e| CloneError::Join(e.to_string())).and_then(|r| r)),
    _ = ctx.cancelled() => {
      interrupt.store(true, Ordering::Relaxed);
      if let Err(e) = task.await {
        warn!(error = %e, "interrupted clone task failed");
      }
      Err(InitError::Cancelled)
    }
  }
}

fn clone_repo(url: &str, revision: Option<&str>, dest: &Path, interrupt: &AtomicBool) -> Result<(), CloneError> {
  let clone_failed = |e: Box<dyn std::error::Error + Send + Sync>| CloneError::Clone {
    url: url.to_string(),
    source: e,
  };

  let mut prepared = gix::prepare_clone(url, dest).map_err(|e| clone_failed(Box::new(e)))?;
  if let Some(revision) = revision {
    prepared = prepared
      .with_ref_name(Some(revision))
      .map_err(|e| clone_failed(Box::new(e)))?;
  }

  let (mut checkout, _outcome) = prepared
    .fetch_then_checkout(gix::progress::Discard, interrupt)
    .map_err(|e| clone_failed(Box::new(e)))?;

  checkout
    .main_worktree(gix::progress::Discard, interrupt)
    .map_err(|e| CloneError::Checkout {
      rev: revision.unwrap_or("HEAD").to_string(),
      source: Box::new(e),
    })?;

  debug!(url, dest = %dest.display(), "clone complete");
  Ok(())
}

/// Copy the cloned work tree through `overlay`, skipping `.git` and symlinks.
fn copy_tree(root: &Path, overlay: &mut Overlay<'_>) -> Result<(), String> {
  let walker = WalkDir::new(root)
    .min_depth(1)
    .sort_by_file_name()
    .into_iter()
    .filter_entry(|entry| entry.file_name() != ".git");

  for entry in walker {
    let entry = entry.map_err(|e| format!("failed to walk cloned repository: {e}"))?;
    let relative = entry
      .path()
      .strip_prefix(root)
      .map_err(|e| format!("unexpected path {}: {e}", entry.path().display()))?;
    let file_type = entry.file_type();
    if file_type.is_symlink() {
      debug!(path = %relative.display(), "skipping symlink in starter project");
      continue;
    }
    let Some(target) = overlay.target(relative)? else {
      continue;
    };
    if file_type.is_dir() {
      overlay.create_dir(&target)?;
      continue;
    }
    let contents = fs::read(entry.path()).map_err(|e| format!("failed to read {}: {e}", relative.display()))?;
    overlay.write_file(&target, &contents, file_mode(entry.path()))?;
  }
  Ok(())
}

#[cfg(unix)]
fn file_mode(path: &Path) -> Option<u32> {
  use std::os::unix::fs::PermissionsExt;
  fs::metadata(path).ok().map(|m| m.permissions().mode())
}

#[cfg(not(unix))]
fn file_mode(_path: &Path) -> Option<u32> {
  None
}
