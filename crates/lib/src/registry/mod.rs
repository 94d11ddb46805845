//! HTTP access to devfile registries and remote devfiles.
//!
//! A registry serves two endpoints:
//! - `GET {url}/index`: JSON list of [`DevfileStack`]s
//! - `GET {url}/devfiles/{name}`: the devfile of one stack
//!
//! Requests are raced against the run context's cancellation and never
//! retried; redirects are followed by the HTTP client.

mod types;

use std::time::Duration;

use tracing::{debug, info, warn};

pub use types::{DevfileStack, Registry};

use crate::init::{InitError, RunContext};
use crate::preference::Preferences;

/// Client for registries and plain HTTP downloads.
#[derive(Debug, Clone)]
pub struct RegistryClient {
  http: reqwest::Client,
  registries: Vec<Registry>,
}

impl RegistryClient {
  /// Build a client for `registries`, with `timeout` applied to every request.
  pub fn new(registries: Vec<Registry>, timeout: Duration) -> Result<Self, reqwest::Error> {
    let http = reqwest::Client::builder()
      .user_agent(concat!("devinit/", env!("CARGO_PKG_VERSION")))
      .timeout(timeout)
      .build()?;
    Ok(Self { http, registries })
  }

  pub fn from_preferences(preferences: &Preferences) -> Result<Self, reqwest::Error> {
    Self::new(preferences.registries.clone(), preferences.timeout)
  }

  /// Configured registries, in preference order.
  pub fn registries(&self) -> &[Registry] {
    &self.registries
  }

  pub fn registry(&self, name: &str) -> Option<&Registry> {
    self.registries.iter().find(|r| r.name == name)
  }

  /// GET `url` and return the body.
  pub async fn fetch(&self, ctx: &RunContext, url: &str) -> Result<Vec<u8>, InitError> {
    let failed = |message: String| InitError::FetchFailed {
      url: url.to_string(),
      message,
    };

    ctx
      .guard(async {
        debug!(url, "GET");
        let response = self.http.get(url).send().await.map_err(|e| failed(e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
          return Err(failed(format!("HTTP {status}")));
        }
        let bytes = response.bytes().await.map_err(|e| failed(e.to_string()))?;
        debug!(url, size = bytes.len(), "fetched");
        Ok(bytes.to_vec())
      })
      .await
  }

  /// Stacks listed by `registry`.
  pub async fn index(&self, ctx: &RunContext, registry: &Registry) -> Result<Vec<DevfileStack>, InitError> {
    let url = registry.endpoint("index");
    let body = self.fetch(ctx, &url).await?;
    serde_json::from_slice(&body).map_err(|e| InitError::FetchFailed {
      url,
      message: format!("invalid registry index: {e}"),
    })
  }

  /// Raw devfile of stack `name` in `registry`.
  pub async fn devfile(&self, ctx: &RunContext, registry: &Registry, name: &str) -> Result<Vec<u8>, InitError> {
    info!(registry = %registry.name, stack = name, "downloading devfile");
    self.fetch(ctx, &registry.endpoint(&format!("devfiles/{name}"))).await
  }

  /// Find the registry listing stack `name`.
  ///
  /// With `registry` set only that registry is searched. Otherwise the
  /// configured registries are searched in order; a registry that cannot be
  /// reached is skipped, and its error is returned if no other registry
  /// lists the stack.
  pub async fn locate_stack(
    &self,
    ctx: &RunContext,
    name: &str,
    registry: Option<&str>,
  ) -> Result<(Registry, DevfileStack), InitError> {
    let candidates: Vec<&Registry> = match registry {
      Some(wanted) => {
        let found = self.registry(wanted).ok_or_else(|| InitError::RegistryNotFound {
          name: wanted.to_string(),
          known: self.registry_names(),
        })?;
        vec![found]
      }
      None => self.registries.iter().collect(),
    };

    let mut first_error = None;
    for candidate in &candidates {
      let stacks = match self.index(ctx, candidate).await {
        Ok(stacks) => stacks,
        Err(InitError::Cancelled) => return Err(InitError::Cancelled),
        Err(e) if registry.is_none() => {
          warn!(registry = %candidate.name, error = %e, "skipping unreachable registry");
          first_error.get_or_insert(e);
          continue;
        }
        Err(e) => return Err(e),
      };
      if let Some(stack) = stacks.into_iter().find(|s| s.name == name) {
        return Ok(((*candidate).clone(), stack));
      }
    }

    match first_error {
      Some(e) => Err(e),
      None => Err(InitError::DevfileNotFound {
        name: name.to_string(),
        registries: candidates.iter().map(|r| r.name.as_str()).collect::<Vec<_>>().join(", "),
      }),
    }
  }

  fn registry_names(&self) -> String {
    self.registries.iter().map(|r| r.name.as_str()).collect::<Vec<_>>().join(", ")
  }
}
