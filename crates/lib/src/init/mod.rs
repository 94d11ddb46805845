//! Initialize the current directory as a component.
//!
//! [`InitClient::init`] runs the whole pipeline:
//! 1. refuse directories that already hold a `devfile.yaml`
//! 2. validate the flags
//! 3. acquire and stage a devfile through the selected backend
//! 4. pick a starter project and a component name
//! 5. overlay the starter project, if any
//! 6. write the personalised devfile
//!
//! On failure after validation the directory is rolled back: the staged
//! devfile is removed, unless starter content was already written, in which
//! case nothing is touched.

pub mod backend;
pub mod context;
pub mod error;
pub mod flags;
pub mod name;
pub mod prompt;

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, warn};

pub use backend::{BackendKind, DetectionBackend, FlagsBackend, InitBackend, InteractiveBackend};
pub use context::{Canceller, RunContext, Telemetry, TelemetryKey};
pub use error::{Cleanup, ErrorCategory, ErrorKind, InitError, InitFailure};
pub use flags::Flags;
pub use prompt::{NoPrompt, Prompter};

use crate::consts::{APP_NAME, DEVFILE_NAME, NOT_AVAILABLE};
use crate::devfile::DevfileObj;
use crate::fs::Filesystem;
use crate::location::{contains_devfile, dir_is_empty};
use crate::registry::RegistryClient;
use crate::starter::download_starter_project;

const EMPTY_DIR_GREETING: &str = "The current directory is empty. devinit will help you start a new project.";

const SOURCE_DIR_GREETING: &str = "The current directory already contains source code. devinit will try to \
                                   autodetect the language and project type in order to select the best suited \
                                   devfile for your project.";

/// Outcome of a successful init.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InitResult {
  pub name: String,
  pub devfile_path: PathBuf,
  pub backend: BackendKind,
  /// Name of the overlaid starter project.
  pub starter: Option<String>,
  pub has_deploy_command: bool,
}

impl InitResult {
  /// Message shown to the user once the component is ready.
  pub fn exit_message(&self) -> String {
    let mut message = format!(
      "Your new component '{}' is ready in the current directory.\n\
       To start editing your component, use '{APP_NAME} dev' and open this folder in your favorite IDE.\n\
       Changes will be directly reflected on the cluster.",
      self.name
    );
    if self.has_deploy_command {
      message.push_str(&format!("\nTo deploy your component to a cluster use \"{APP_NAME} deploy\"."));
    }
    message
  }
}

/// Runs `init` invocations against a filesystem, a set of registries and a prompter.
pub struct InitClient {
  fs: Arc<dyn Filesystem>,
  registry: Arc<RegistryClient>,
  prompter: Arc<dyn Prompter>,
  backends: [Box<dyn InitBackend>; 3],
}

impl InitClient {
  pub fn new(fs: Arc<dyn Filesystem>, registry: RegistryClient, prompter: Arc<dyn Prompter>) -> Self {
    let registry = Arc::new(registry);
    let backends: [Box<dyn InitBackend>; 3] = [
      Box::new(FlagsBackend::new(Arc::clone(&fs), Arc::clone(&registry))),
      Box::new(DetectionBackend::new(
        Arc::clone(&fs),
        Arc::clone(&registry),
        Arc::clone(&prompter),
      )),
      Box::new(InteractiveBackend::new(
        Arc::clone(&fs),
        Arc::clone(&registry),
        Arc::clone(&prompter),
      )),
    ];
    Self {
      fs,
      registry,
      prompter,
      backends,
    }
  }

  pub fn registry(&self) -> &RegistryClient {
    &self.registry
  }

  fn backend(&self, flags: &Flags, dir_is_empty: bool) -> &dyn InitBackend {
    let [.., interactive] = &self.backends;
    let backend = self
      .backends
      .iter()
      .find(|backend| backend.handles(flags, dir_is_empty))
      .unwrap_or(interactive);
    &**backend
  }

  /// Initialize the working directory of the client's filesystem.
  pub async fn init(&self, ctx: &RunContext, flags: Flags) -> Result<InitResult, InitFailure> {
    let fs = self.fs.as_ref();
    let nothing_written = |source: InitError| InitFailure {
      source,
      cleanup: Cleanup::NothingWritten,
    };

    let dir = fs
      .getwd()
      .map_err(|e| nothing_written(InitError::io("determine working directory", ".", e)))?;
    ctx.telemetry().set(TelemetryKey::Interactive, flags.is_empty());

    match contains_devfile(fs, &dir) {
      Ok(false) => {}
      Ok(true) => return Err(nothing_written(InitError::AlreadyInitialised { dir })),
      Err(e) => return Err(nothing_written(InitError::io("inspect", dir.join(DEVFILE_NAME), e))),
    }

    flags::validate(&flags, fs, &dir, self.registry.registries()).map_err(nothing_written)?;

    let empty = dir_is_empty(fs, &dir).map_err(|e| nothing_written(InitError::io("read directory", &dir, e)))?;
    let backend = self.backend(&flags, empty);
    info!(dir = %dir.display(), backend = %backend.kind(), "initializing component");

    let mut starter_downloaded = false;
    match self.run(ctx, backend, &flags, &dir, empty, &mut starter_downloaded).await {
      Ok(result) => Ok(result),
      Err(source) => Err(self.rollback(&dir, source, starter_downloaded)),
    }
  }

  async fn run(
    &self,
    ctx: &RunContext,
    backend: &dyn InitBackend,
    flags: &Flags,
    dir: &Path,
    dir_is_empty: bool,
    starter_downloaded: &mut bool,
  ) -> Result<InitResult, InitError> {
    let fs = self.fs.as_ref();

    if flags.is_empty() {
      self.prompter.info(if dir_is_empty {
        EMPTY_DIR_GREETING
      } else {
        SOURCE_DIR_GREETING
      });
    }

    let (mut devfile, devfile_path) = backend.select_and_personalize_devfile(ctx, flags, dir).await?;
    ctx.check_cancelled()?;

    let starter = backend.select_starter_project(ctx, &devfile, flags, dir).await?;
    let name = backend.personalize_name(ctx, &devfile, flags, dir).await?;
    ctx.check_cancelled()?;

    if let Some(starter) = &starter {
      match download_starter_project(fs, &self.registry, ctx, starter, dir).await {
        Ok(()) => *starter_downloaded = true,
        Err(e) => {
          *starter_downloaded = e.touched;
          return Err(e.source);
        }
      }

      if fs.stat(&devfile_path).is_ok_and(|info| info.is_file()) {
        debug!(path = %devfile_path.display(), "starter project ships its own devfile");
        devfile = DevfileObj::read(fs, &devfile_path)?;
      }
    }

    ctx.check_cancelled()?;
    devfile.set_metadata_name(fs, &name)?;
    info!(name = %name, path = %devfile.path().display(), "devfile written");

    let metadata = devfile.metadata();
    let telemetry = ctx.telemetry();
    telemetry.set(TelemetryKey::ComponentType, devfile.component_type());
    telemetry.set(
      TelemetryKey::Language,
      metadata.language.as_deref().unwrap_or(NOT_AVAILABLE),
    );
    telemetry.set(
      TelemetryKey::ProjectType,
      metadata.project_type.as_deref().unwrap_or(NOT_AVAILABLE),
    );
    telemetry.set(
      TelemetryKey::DevfileName,
      devfile.metadata_name().unwrap_or(NOT_AVAILABLE),
    );

    Ok(InitResult {
      name,
      devfile_path: devfile.path().to_path_buf(),
      backend: backend.kind(),
      starter: starter.map(|s| s.name),
      has_deploy_command: devfile.has_deploy_command(),
    })
  }

  /// Apply the rollback rule to a failure that happened after validation.
  fn rollback(&self, dir: &Path, source: InitError, starter_downloaded: bool) -> InitFailure {
    if starter_downloaded {
      warn!(error = %source, "init failed after the starter project was downloaded, leaving directory as is");
      return InitFailure {
        source,
        cleanup: Cleanup::Preserved,
      };
    }

    let devfile = dir.join(DEVFILE_NAME);
    match self.fs.remove(&devfile) {
      Ok(()) => debug!(path = %devfile.display(), "removed staged devfile"),
      Err(e) if e.kind() == io::ErrorKind::NotFound => {}
      Err(e) => warn!(path = %devfile.display(), error = %e, "failed to remove staged devfile"),
    }
    InitFailure {
      source,
      cleanup: Cleanup::DevfileRemoved,
    }
  }
}
