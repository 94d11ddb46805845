//! Errors of the init pipeline and the rollback annotation wrapped around them.

use std::fmt;
use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while initializing a component.
#[derive(Debug, Error)]
pub enum InitError {
  #[error("--devfile and --devfile-path cannot be used together")]
  FlagConflict,

  #[error("--devfile-registry can only be used together with --devfile")]
  FlagDependency,

  #[error("--starter requires --devfile or --devfile-path")]
  StarterWithoutDevfile,

  #[error("either --devfile or --devfile-path must be specified")]
  DevfileRequired,

  #[error("invalid component name {name:?}: {reason}")]
  NameInvalid { name: String, reason: String },

  #[error("registry {name:?} is not configured (known registries: {known})")]
  RegistryNotFound { name: String, known: String },

  #[error("devfile not found at {}", path.display())]
  DevfilePathNotFound { path: PathBuf },

  #[error("a devfile already exists in {}", dir.display())]
  AlreadyInitialised { dir: PathBuf },

  #[error("failed to fetch {url}: {message}")]
  FetchFailed { url: String, message: String },

  #[error("invalid devfile {origin}: {reason}")]
  ManifestInvalid { origin: String, reason: String },

  #[error("devfile {name:?} not found in registries: {registries}")]
  DevfileNotFound { name: String, registries: String },

  #[error("could not detect a suitable devfile for the sources in {}", dir.display())]
  DetectionFailed { dir: PathBuf },

  #[error("starter project {name:?} not found in devfile (available: {available})")]
  StarterNotFound { name: String, available: String },

  #[error("unable to download starter project {name:?}: {message}")]
  DownloadFailed { name: String, message: String },

  #[error("unable to extract starter project {name:?}: {message}")]
  ExtractFailed { name: String, message: String },

  #[error("aborted by user")]
  UserAborted,

  #[error("operation cancelled")]
  Cancelled,

  #[error("prompt failed: {0}")]
  Prompt(String),

  #[error("failed to {op} {}: {source}", path.display())]
  Io {
    op: &'static str,
    path: PathBuf,
    #[source]
    source: io::Error,
  },
}

impl InitError {
  pub(crate) fn io(op: &'static str, path: impl Into<PathBuf>, source: io::Error) -> Self {
    InitError::Io {
      op,
      path: path.into(),
      source,
    }
  }

  /// Machine-readable kind of the error.
  pub fn kind(&self) -> ErrorKind {
    match self {
      InitError::FlagConflict => ErrorKind::FlagConflict,
      InitError::FlagDependency => ErrorKind::FlagDependency,
      InitError::StarterWithoutDevfile => ErrorKind::StarterWithoutDevfile,
      InitError::DevfileRequired => ErrorKind::DevfileRequired,
      InitError::NameInvalid { .. } => ErrorKind::NameInvalid,
      InitError::RegistryNotFound { .. } => ErrorKind::RegistryNotFound,
      InitError::DevfilePathNotFound { .. } => ErrorKind::DevfilePathNotFound,
      InitError::AlreadyInitialised { .. } => ErrorKind::AlreadyInitialised,
      InitError::FetchFailed { .. } => ErrorKind::FetchFailed,
      InitError::ManifestInvalid { .. } => ErrorKind::ManifestInvalid,
      InitError::DevfileNotFound { .. } => ErrorKind::DevfileNotFound,
      InitError::DetectionFailed { .. } => ErrorKind::DetectionFailed,
      InitError::StarterNotFound { .. } => ErrorKind::StarterNotFound,
      InitError::DownloadFailed { .. } => ErrorKind::DownloadFailed,
      InitError::ExtractFailed { .. } => ErrorKind::ExtractFailed,
      InitError::UserAborted => ErrorKind::UserAborted,
      InitError::Cancelled => ErrorKind::Cancelled,
      InitError::Prompt(_) => ErrorKind::Prompt,
      InitError::Io { .. } => ErrorKind::Io,
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
  FlagConflict,
  FlagDependency,
  StarterWithoutDevfile,
  DevfileRequired,
  NameInvalid,
  RegistryNotFound,
  DevfilePathNotFound,
  AlreadyInitialised,
  FetchFailed,
  ManifestInvalid,
  DevfileNotFound,
  DetectionFailed,
  StarterNotFound,
  DownloadFailed,
  ExtractFailed,
  UserAborted,
  Cancelled,
  Prompt,
  Io,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
  /// Rejected flags, before any network I/O.
  Validation,
  /// The directory refuses the command.
  Precondition,
  Acquisition,
  Extraction,
  User,
  Runtime,
}

impl ErrorKind {
  pub fn category(self) -> ErrorCategory {
    match self {
      ErrorKind::FlagConflict
      | ErrorKind::FlagDependency
      | ErrorKind::StarterWithoutDevfile
      | ErrorKind::DevfileRequired
      | ErrorKind::NameInvalid
      | ErrorKind::RegistryNotFound
      | ErrorKind::DevfilePathNotFound => ErrorCategory::Validation,
      ErrorKind::AlreadyInitialised => ErrorCategory::Precondition,
      ErrorKind::FetchFailed
      | ErrorKind::ManifestInvalid
      | ErrorKind::DevfileNotFound
      | ErrorKind::DetectionFailed
      | ErrorKind::StarterNotFound => ErrorCategory::Acquisition,
      ErrorKind::DownloadFailed | ErrorKind::ExtractFailed => ErrorCategory::Extraction,
      ErrorKind::UserAborted | ErrorKind::Cancelled => ErrorCategory::User,
      ErrorKind::Prompt | ErrorKind::Io => ErrorCategory::Runtime,
    }
  }
}

/// What the rollback did to the context directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cleanup {
  /// The command failed before writing anything.
  NothingWritten,
  /// The staged devfile was removed.
  DevfileRemoved,
  /// The starter project touched the directory, so it was left as is.
  Preserved,
}

impl fmt::Display for Cleanup {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Cleanup::NothingWritten => write!(f, "the command failed, no files were written"),
      Cleanup::DevfileRemoved => write!(
        f,
        "the command failed, manifest removed: devfile.yaml was deleted from the current directory"
      ),
      Cleanup::Preserved => write!(
        f,
        "the command failed after downloading the starter project, the directory is not cleaned up (user data may be present)"
      ),
    }
  }
}

/// The single error returned by an init invocation: the cause plus the cleanup outcome.
#[derive(Debug, Error)]
#[error("{source}\n{cleanup}")]
pub struct InitFailure {
  pub source: InitError,
  pub cleanup: Cleanup,
}

impl InitFailure {
  pub fn kind(&self) -> ErrorKind {
    self.source.kind()
  }

  /// Process exit code for this failure.
  ///
  /// Aborts and cancellations exit successfully unless they left starter
  /// content behind.
  pub fn exit_code(&self) -> i32 {
    match (self.kind().category(), self.cleanup) {
      (ErrorCategory::User, Cleanup::NothingWritten | Cleanup::DevfileRemoved) => 0,
      _ => 1,
    }
  }
}
