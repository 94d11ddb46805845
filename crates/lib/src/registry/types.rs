//! Registry configuration and index entries.

use serde::{Deserialize, Serialize};

/// A devfile registry as configured in the preference file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registry {
  pub name: String,
  pub url: String,
}

impl Registry {
  pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
    Self {
      name: name.into(),
      url: url.into(),
    }
  }

  pub(crate) fn endpoint(&self, path: &str) -> String {
    format!("{}/{}", self.url.trim_end_matches('/'), path.trim_start_matches('/'))
  }
}

/// One stack listed by a registry's `/index` endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DevfileStack {
  pub name: String,
  pub display_name: String,
  pub description: String,
  pub language: String,
  pub project_type: String,
  pub tags: Vec<String>,
  pub starter_projects: Vec<String>,
}

impl DevfileStack {
  /// Label shown in interactive menus.
  pub fn label(&self) -> String {
    if self.project_type.is_empty() {
      self.name.clone()
    } else {
      format!("{} ({})", self.project_type, self.name)
    }
  }
}
