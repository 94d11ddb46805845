//! Devfile document types.
//!
//! Only the fields the init pipeline reads are typed. Everything else is
//! kept in the flattened `extra` mappings so that re-serialising a devfile
//! preserves content the pipeline does not understand.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_yaml::{Mapping, Value};

/// Group kind of commands used to deploy a component.
pub const DEPLOY_GROUP_KIND: &str = "deploy";

/// A devfile document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Devfile {
  pub schema_version: String,
  #[serde(default)]
  pub metadata: Metadata,
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub commands: Vec<Command>,
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub starter_projects: Vec<StarterProject>,
  #[serde(flatten)]
  pub extra: Mapping,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metadata {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub name: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub language: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub project_type: Option<String>,
  #[serde(flatten)]
  pub extra: Mapping,
}

/// A devfile command. Only the id is typed; the body (`exec`, `apply`,
/// `composite`, ...) is kept as-is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Command {
  pub id: String,
  #[serde(flatten)]
  pub body: Mapping,
}

impl Command {
  /// `group.kind` of the command, whatever its type.
  pub fn group_kind(&self) -> Option<&str> {
    ["exec", "apply", "composite"].iter().find_map(|kind| {
      self
        .body
        .get(*kind)?
        .get("group")?
        .get("kind")
        .and_then(Value::as_str)
    })
  }
}

/// A starter project declared by a devfile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StarterProject {
  pub name: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub description: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub sub_dir: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub zip: Option<ZipSource>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub git: Option<GitSource>,
  #[serde(flatten)]
  pub extra: Mapping,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZipSource {
  pub location: String,
  #[serde(flatten)]
  pub extra: Mapping,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GitSource {
  #[serde(default)]
  pub remotes: BTreeMap<String, String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub checkout_from: Option<CheckoutFrom>,
  #[serde(flatten)]
  pub extra: Mapping,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CheckoutFrom {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub remote: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub revision: Option<String>,
}

impl GitSource {
  /// The remote URL to clone: the one named by `checkoutFrom.remote`, or the only remote.
  pub fn remote_url(&self) -> Option<&str> {
    match self.checkout_from.as_ref().and_then(|c| c.remote.as_deref()) {
      Some(remote) => self.remotes.get(remote).map(String::as_str),
      None if self.remotes.len() == 1 => self.remotes.values().next().map(String::as_str),
      None => None,
    }
  }

  pub fn revision(&self) -> Option<&str> {
    self.checkout_from.as_ref().and_then(|c| c.revision.as_deref())
  }
}
