//! Non-interactive backend driven by command-line flags.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info};

use super::{BackendKind, InitBackend, stage_registry_devfile};
use crate::devfile::{DevfileObj, StarterProject};
use crate::fs::Filesystem;
use crate::init::context::RunContext;
use crate::init::error::InitError;
use crate::init::flags::{FLAG_DEVFILE, FLAG_DEVFILE_PATH, FLAG_DEVFILE_REGISTRY, FLAG_NAME, FLAG_STARTER, Flags};
use crate::init::flags::{is_url, resolve_local_path};
use crate::init::name::{default_name, validate_name};
use crate::registry::RegistryClient;

#[derive(Debug)]
pub struct FlagsBackend {
  fs: Arc<dyn Filesystem>,
  registry: Arc<RegistryClient>,
}

impl FlagsBackend {
  pub fn new(fs: Arc<dyn Filesystem>, registry: Arc<RegistryClient>) -> Self {
    Self { fs, registry }
  }
}

#[async_trait]
impl InitBackend for FlagsBackend {
  fn kind(&self) -> BackendKind {
    BackendKind::Flags
  }

  async fn select_and_personalize_devfile(
    &self,
    ctx: &RunContext,
    flags: &Flags,
    dir: &Path,
  ) -> Result<(DevfileObj, PathBuf), InitError> {
    if let Some(path) = flags.get(FLAG_DEVFILE_PATH) {
      let content = if is_url(path) {
        info!(url = path, "downloading devfile");
        self.registry.fetch(ctx, path).await?
      } else {
        let local = resolve_local_path(path, dir);
        debug!(path = %local.display(), "reading devfile");
        self
          .fs
          .read_file(&local)
          .map_err(|e| InitError::io("read devfile", &local, e))?
      };
      ctx.check_cancelled()?;
      let devfile = DevfileObj::stage(self.fs.as_ref(), dir, &content, path)?;
      let staged = devfile.path().to_path_buf();
      return Ok((devfile, staged));
    }

    let name = flags.get(FLAG_DEVFILE).ok_or(InitError::DevfileRequired)?;
    let (registry, stack) = self
      .registry
      .locate_stack(ctx, name, flags.get(FLAG_DEVFILE_REGISTRY))
      .await?;
    stage_registry_devfile(self.fs.as_ref(), &self.registry, ctx, &registry, &stack, dir).await
  }

  async fn select_starter_project(
    &self,
    _ctx: &RunContext,
    devfile: &DevfileObj,
    flags: &Flags,
    _dir: &Path,
  ) -> Result<Option<StarterProject>, InitError> {
    let Some(name) = flags.get(FLAG_STARTER) else {
      return Ok(None);
    };
    match devfile.starter_project(name) {
      Some(starter) => Ok(Some(starter.clone())),
      None => {
        let available: Vec<&str> = devfile.starter_projects().iter().map(|s| s.name.as_str()).collect();
        Err(InitError::StarterNotFound {
          name: name.to_string(),
          available: if available.is_empty() {
            "none".to_string()
          } else {
            available.join(", ")
          },
        })
      }
    }
  }

  async fn personalize_name(
    &self,
    _ctx: &RunContext,
    devfile: &DevfileObj,
    flags: &Flags,
    dir: &Path,
  ) -> Result<String, InitError> {
    if let Some(name) = flags.get(FLAG_NAME) {
      validate_name(name)?;
      return Ok(name.to_string());
    }
    Ok(default_name(devfile.metadata_name(), dir))
  }
}
