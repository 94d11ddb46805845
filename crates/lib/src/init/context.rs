//! Per-invocation run context: cooperative cancellation and telemetry facts.

use std::collections::BTreeMap;
use std::future::Future;
use std::sync::{Arc, Mutex};

use serde_json::Value;
use tokio::sync::watch;
use tracing::debug;

use super::error::InitError;

/// Telemetry facts recorded by the orchestrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum TelemetryKey {
  Interactive,
  ComponentType,
  Language,
  ProjectType,
  DevfileName,
}

impl TelemetryKey {
  pub fn as_str(self) -> &'static str {
    match self {
      TelemetryKey::Interactive => "interactive",
      TelemetryKey::ComponentType => "componentType",
      TelemetryKey::Language => "language",
      TelemetryKey::ProjectType => "projectType",
      TelemetryKey::DevfileName => "devfileName",
    }
  }
}

/// Write-once telemetry slots.
#[derive(Debug, Default)]
pub struct Telemetry {
  facts: Mutex<BTreeMap<TelemetryKey, Value>>,
}

impl Telemetry {
  /// Record a fact. The first value written for a key is kept.
  pub fn set(&self, key: TelemetryKey, value: impl Into<Value>) {
    let mut facts = self.facts.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    if facts.contains_key(&key) {
      debug!(key = key.as_str(), "telemetry fact already set, ignoring");
      return;
    }
    let value = value.into();
    debug!(key = key.as_str(), value = %value, "telemetry");
    facts.insert(key, value);
  }

  /// All recorded facts keyed by their wire name.
  pub fn snapshot(&self) -> BTreeMap<String, Value> {
    self
      .facts
      .lock()
      .unwrap_or_else(|poisoned| poisoned.into_inner())
      .iter()
      .map(|(key, value)| (key.as_str().to_string(), value.clone()))
      .collect()
  }
}

/// Handle that cancels a [`RunContext`] from elsewhere (a signal handler, a test).
#[derive(Debug, Clone)]
pub struct Canceller(Arc<watch::Sender<bool>>);

impl Canceller {
  pub fn cancel(&self) {
    self.0.send_replace(true);
  }
}

/// Context carried through one `init` invocation.
#[derive(Debug)]
pub struct RunContext {
  cancel: Arc<watch::Sender<bool>>,
  telemetry: Telemetry,
}

impl Default for RunContext {
  fn default() -> Self {
    Self::new()
  }
}

impl RunContext {
  pub fn new() -> Self {
    let (cancel, _) = watch::channel(false);
    Self {
      cancel: Arc::new(cancel),
      telemetry: Telemetry::default(),
    }
  }

  pub fn canceller(&self) -> Canceller {
    Canceller(Arc::clone(&self.cancel))
  }

  pub fn telemetry(&self) -> &Telemetry {
    &self.telemetry
  }

  pub fn is_cancelled(&self) -> bool {
    *self.cancel.borrow()
  }

  /// Fail with [`InitError::Cancelled`] if cancellation was requested.
  pub fn check_cancelled(&self) -> Result<(), InitError> {
    if self.is_cancelled() {
      return Err(InitError::Cancelled);
    }
    Ok(())
  }

  /// Resolves once cancellation is requested.
  pub async fn cancelled(&self) {
    let mut rx = self.cancel.subscribe();
    // The sender lives in `self`, so the channel cannot close while we wait.
    let _ = rx.wait_for(|cancelled| *cancelled).await;
  }

  /// Run `fut` unless cancellation wins the race.
  pub async fn guard<F, T>(&self, fut: F) -> Result<T, InitError>
  where
    F: Future<Output = Result<T, InitError>>,
  {
    self.check_cancelled()?;
    tokio::select! {
      result = fut => result,
      _ = self.cancelled() => Err(InitError::Cancelled),
    }
  }
}
