//! Parsed devfiles bound to their on-disk location.
//!
//! A [`DevfileObj`] is what the init pipeline passes around: the parsed
//! document plus the path it was staged at. Mutations that must persist
//! (the component name) write through to disk immediately.

mod types;

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use tracing::debug;

pub use types::{CheckoutFrom, Command, DEPLOY_GROUP_KIND, Devfile, GitSource, Metadata, StarterProject, ZipSource};

use crate::consts::{DEVFILE_NAME, NOT_AVAILABLE};
use crate::fs::Filesystem;
use crate::init::InitError;

/// A parsed and validated devfile together with its on-disk path.
#[derive(Debug, Clone, PartialEq)]
pub struct DevfileObj {
  path: PathBuf,
  data: Devfile,
}

impl DevfileObj {
  /// Parse and validate devfile content.
  ///
  /// `origin` describes where the bytes came from and is only used in errors.
  pub fn parse(content: &[u8], origin: &str, path: impl Into<PathBuf>) -> Result<Self, InitError> {
    let data: Devfile = serde_yaml::from_slice(content).map_err(|e| InitError::ManifestInvalid {
      origin: origin.to_string(),
      reason: e.to_string(),
    })?;
    validate(&data).map_err(|reason| InitError::ManifestInvalid {
      origin: origin.to_string(),
      reason,
    })?;
    Ok(Self {
      path: path.into(),
      data,
    })
  }

  /// Read and parse the devfile at `path`.
  pub fn read(fs: &dyn Filesystem, path: &Path) -> Result<Self, InitError> {
    let content = fs
      .read_file(path)
      .map_err(|e| InitError::io("read devfile", path, e))?;
    Self::parse(&content, &path.display().to_string(), path)
  }

  /// Parse `content` and stage it verbatim as `devfile.yaml` in `dir`.
  pub fn stage(fs: &dyn Filesystem, dir: &Path, content: &[u8], origin: &str) -> Result<Self, InitError> {
    let path = dir.join(DEVFILE_NAME);
    let devfile = Self::parse(content, origin, &path)?;
    fs.write_file(&path, content)
      .map_err(|e| InitError::io("write devfile", &path, e))?;
    debug!(path = %path.display(), origin, "staged devfile");
    Ok(devfile)
  }

  pub fn path(&self) -> &Path {
    &self.path
  }

  pub fn data(&self) -> &Devfile {
    &self.data
  }

  pub fn metadata(&self) -> &Metadata {
    &self.data.metadata
  }

  pub fn metadata_name(&self) -> Option<&str> {
    self.data.metadata.name.as_deref()
  }

  /// Set `metadata.name` and write the devfile to disk.
  pub fn set_metadata_name(&mut self, fs: &dyn Filesystem, name: &str) -> Result<(), InitError> {
    self.data.metadata.name = Some(name.to_string());
    self.write(fs)
  }

  /// Serialise the devfile to its path.
  pub fn write(&self, fs: &dyn Filesystem) -> Result<(), InitError> {
    let content = serde_yaml::to_string(&self.data).map_err(|e| InitError::ManifestInvalid {
      origin: self.path.display().to_string(),
      reason: e.to_string(),
    })?;
    fs.write_file(&self.path, content.as_bytes())
      .map_err(|e| InitError::io("write devfile", &self.path, e))
  }

  /// Commands whose group kind is `kind`.
  pub fn commands_by_group<'a>(&'a self, kind: &'a str) -> impl Iterator<Item = &'a Command> + 'a {
    self
      .data
      .commands
      .iter()
      .filter(move |command| command.group_kind() == Some(kind))
  }

  pub fn has_deploy_command(&self) -> bool {
    self.commands_by_group(DEPLOY_GROUP_KIND).next().is_some()
  }

  /// Component type reported for telemetry: project type, else language.
  pub fn component_type(&self) -> &str {
    let metadata = &self.data.metadata;
    metadata
      .project_type
      .as_deref()
      .filter(|s| !s.is_empty())
      .or(metadata.language.as_deref().filter(|s| !s.is_empty()))
      .unwrap_or(NOT_AVAILABLE)
  }

  pub fn starter_projects(&self) -> &[StarterProject] {
    &self.data.starter_projects
  }

  pub fn starter_project(&self, name: &str) -> Option<&StarterProject> {
    self.data.starter_projects.iter().find(|s| s.name == name)
  }
}

/// Structural validation beyond what deserialisation enforces.
fn validate(devfile: &Devfile) -> Result<(), String> {
  let mut version = devfile.schema_version.split('.');
  let major = version.next().and_then(|v| v.parse::<u64>().ok());
  let rest_numeric = version.all(|v| v.split('-').next().is_some_and(|n| n.parse::<u64>().is_ok()));
  match major {
    Some(2) if rest_numeric => {}
    _ => return Err(format!("unsupported schemaVersion {:?}", devfile.schema_version)),
  }

  let mut ids = HashSet::new();
  for command in &devfile.commands {
    if command.id.is_empty() {
      return Err("command with empty id".to_string());
    }
    if !ids.insert(command.id.as_str()) {
      return Err(format!("duplicate command id {:?}", command.id));
    }
  }

  let mut names = HashSet::new();
  for starter in &devfile.starter_projects {
    if starter.name.is_empty() {
      return Err("starter project with empty name".to_string());
    }
    if !names.insert(starter.name.as_str()) {
      return Err(format!("duplicate starter project {:?}", starter.name));
    }
    match (&starter.zip, &starter.git) {
      (Some(zip), None) if !zip.location.is_empty() => {}
      (None, Some(git)) if git.remote_url().is_some() => {}
      (None, Some(_)) => {
        return Err(format!(
          "starter project {:?} must name a single git remote or set checkoutFrom.remote",
          starter.name
        ));
      }
      _ => {
        return Err(format!(
          "starter project {:?} must declare exactly one of zip.location or git",
          starter.name
        ));
      }
    }
  }

  Ok(())
}
