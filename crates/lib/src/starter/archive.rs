//! Extraction of zip, tar and tar.gz starter archives.
//!
//! Archives are held in memory. When every entry lives under one top-level
//! directory (as in GitHub source archives) that directory is stripped.

use std::io::{Cursor, Read};
use std::path::{Component, Path, PathBuf};

use flate2::read::GzDecoder;
use tracing::{debug, warn};

use super::Overlay;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ArchiveFormat {
  Zip,
  TarGz,
  Tar,
}

/// Detect the archive format from its magic bytes.
pub(crate) fn sniff(bytes: &[u8]) -> Option<ArchiveFormat> {
  if bytes.starts_with(b"PK\x03\x04") || bytes.starts_with(b"PK\x05\x06") {
    Some(ArchiveFormat::Zip)
  } else if bytes.starts_with(&[0x1f, 0x8b]) {
    Some(ArchiveFormat::TarGz)
  } else if bytes.len() >= 262 && &bytes[257..262] == b"ustar" {
    Some(ArchiveFormat::Tar)
  } else {
    None
  }
}

/// Extract `bytes` through `overlay`.
pub(crate) fn extract(bytes: &[u8], overlay: &mut Overlay<'_>) -> Result<(), String> {
  match sniff(bytes) {
    Some(ArchiveFormat::Zip) => extract_zip(bytes, overlay),
    Some(ArchiveFormat::TarGz) => extract_tar(bytes, true, overlay),
    Some(ArchiveFormat::Tar) => extract_tar(bytes, false, overlay),
    None => Err("unsupported archive format (expected zip, tar or tar.gz)".to_string()),
  }
}

/// The single top-level directory shared by all entries, if any.
///
/// Files at the archive root disable stripping.
fn common_root(entries: &[(PathBuf, bool)]) -> Option<PathBuf> {
  let mut root: Option<&std::ffi::OsStr> = None;
  for (path, is_dir) in entries {
    let mut components = path.components().filter(|c| !matches!(c, Component::CurDir));
    let first = match components.next() {
      Some(Component::Normal(first)) => first,
      _ => return None,
    };
    if !is_dir && components.next().is_none() {
      return None;
    }
    match root {
      None => root = Some(first),
      Some(existing) if existing == first => {}
      Some(_) => return None,
    }
  }
  root.map(PathBuf::from)
}

fn relative_to_root<'p>(path: &'p Path, root: Option<&Path>) -> &'p Path {
  match root {
    Some(root) => path.strip_prefix(root).unwrap_or(path),
    None => path,
  }
}

fn extract_zip(bytes: &[u8], overlay: &mut Overlay<'_>) -> Result<(), String> {
  let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).map_err(|e| format!("failed to open zip: {e}"))?;

  let mut entries = Vec::with_capacity(archive.len());
  for i in 0..archive.len() {
    let file = archive.by_index(i).map_err(|e| format!("failed to read zip entry: {e}"))?;
    let path = file
      .enclosed_name()
      .ok_or_else(|| format!("refusing to extract unsafe path {}", file.name()))?;
    entries.push((path, file.is_dir()));
  }
  let root = common_root(&entries);
  debug!(entries = entries.len(), root = ?root, "extracting zip archive");

  for (i, (path, is_dir)) in entries.iter().enumerate() {
    let Some(target) = overlay.target(relative_to_root(path, root.as_deref()))? else {
      continue;
    };
    if *is_dir {
      overlay.create_dir(&target)?;
      continue;
    }
    let mut file = archive.by_index(i).map_err(|e| format!("failed to read zip entry: {e}"))?;
    let mut contents = Vec::new();
    file
      .read_to_end(&mut contents)
      .map_err(|e| format!("failed to read {}: {e}", path.display()))?;
    overlay.write_file(&target, &contents, file.unix_mode())?;
  }

  Ok(())
}

fn extract_tar(bytes: &[u8], gzip: bool, overlay: &mut Overlay<'_>) -> Result<(), String> {
  let open = || -> tar::Archive<Box<dyn Read + '_>> {
    let reader: Box<dyn Read> = if gzip {
      Box::new(GzDecoder::new(bytes))
    } else {
      Box::new(bytes)
    };
    tar::Archive::new(reader)
  };

  let mut entries = Vec::new();
  let mut listing = open();
  for entry in listing.entries().map_err(|e| format!("failed to read tar: {e}"))? {
    let entry = entry.map_err(|e| format!("failed to read tar entry: {e}"))?;
    let path = entry
      .path()
      .map_err(|e| format!("invalid tar entry path: {e}"))?
      .into_owned();
    let entry_type = entry.header().entry_type();
    if !entry_type.is_dir() && !entry_type.is_file() {
      continue;
    }
    entries.push((path, entry_type.is_dir()));
  }
  let root = common_root(&entries);
  debug!(entries = entries.len(), root = ?root, "extracting tar archive");

  let mut archive = open();
  for entry in archive.entries().map_err(|e| format!("failed to read tar: {e}"))? {
    let mut entry = entry.map_err(|e| format!("failed to read tar entry: {e}"))?;
    let path = entry
      .path()
      .map_err(|e| format!("invalid tar entry path: {e}"))?
      .into_owned();
    let entry_type = entry.header().entry_type();
    if !entry_type.is_dir() && !entry_type.is_file() {
      warn!(path = %path.display(), "skipping unsupported tar entry");
      continue;
    }
    let Some(target) = overlay.target(relative_to_root(&path, root.as_deref()))? else {
      continue;
    };
    if entry_type.is_dir() {
      overlay.create_dir(&target)?;
      continue;
    }
    let mode = entry.header().mode().ok();
    let mut contents = Vec::new();
    entry
      .read_to_end(&mut contents)
      .map_err(|e| format!("failed to read {}: {e}", path.display()))?;
    overlay.write_file(&target, &contents, mode)?;
  }

  Ok(())
}
