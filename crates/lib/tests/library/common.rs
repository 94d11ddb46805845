//! Shared helpers: scripted prompter, in-memory archives and a mock registry.

use std::collections::VecDeque;
use std::io::{Cursor, Write};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use devinit_lib::fs::MemoryFs;
use devinit_lib::init::{InitClient, InitError, Prompter};
use devinit_lib::registry::{Registry, RegistryClient};

/// Working directory of every in-memory test filesystem.
pub const APP_DIR: &str = "/work/app";

/// One scripted answer.
#[derive(Debug, Clone)]
pub enum Answer {
  Select(usize),
  Input(&'static str),
  Abort,
}

/// Prompter that replays scripted answers and records everything shown.
#[derive(Debug, Default)]
pub struct ScriptedPrompter {
  answers: Mutex<VecDeque<Answer>>,
  pub shown: Mutex<Vec<String>>,
  pub asked: Mutex<Vec<String>>,
}

impl ScriptedPrompter {
  pub fn new(answers: impl IntoIterator<Item = Answer>) -> Arc<Self> {
    Arc::new(Self {
      answers: Mutex::new(answers.into_iter().collect()),
      ..Default::default()
    })
  }

  pub fn shown(&self) -> Vec<String> {
    self.shown.lock().unwrap().clone()
  }

  pub fn asked(&self) -> Vec<String> {
    self.asked.lock().unwrap().clone()
  }

  fn next(&self, prompt: &str) -> Answer {
    self.asked.lock().unwrap().push(prompt.to_string());
    self
      .answers
      .lock()
      .unwrap()
      .pop_front()
      .unwrap_or_else(|| panic!("no scripted answer left for {prompt:?}"))
  }
}

impl Prompter for ScriptedPrompter {
  fn info(&self, message: &str) {
    self.shown.lock().unwrap().push(message.to_string());
  }

  fn select(&self, prompt: &str, _items: &[String], _default: usize) -> Result<Option<usize>, InitError> {
    match self.next(prompt) {
      Answer::Select(i) => Ok(Some(i)),
      Answer::Abort => Ok(None),
      other => panic!("expected a selection for {prompt:?}, got {other:?}"),
    }
  }

  fn input(&self, prompt: &str, _default: &str) -> Result<Option<String>, InitError> {
    match self.next(prompt) {
      Answer::Input(text) => Ok(Some(text.to_string())),
      Answer::Abort => Ok(None),
      other => panic!("expected text input for {prompt:?}, got {other:?}"),
    }
  }
}

/// Registry index served by [`registry_server`].
pub const INDEX: &str = r#"[
  {"name": "go", "displayName": "Go Runtime", "language": "Go", "projectType": "Go", "tags": ["Go"]},
  {"name": "nodejs", "displayName": "NodeJS Runtime", "language": "JavaScript", "projectType": "Node.js",
   "tags": ["Node.js", "Express"], "starterProjects": ["nodejs-starter"]}
]"#;

pub const GO_DEVFILE: &str = "schemaVersion: 2.2.0
metadata:
  name: go
  language: Go
  projectType: Go
components:
  - name: runtime
    container:
      image: registry.access.redhat.com/ubi9/go-toolset:latest
commands:
  - id: run
    exec:
      component: runtime
      commandLine: go run main.go
      group:
        kind: run
        isDefault: true
";

/// Node.js devfile whose zip starter is served at `{base}/starters/nodejs-starter.zip`.
pub fn nodejs_devfile(base: &str) -> String {
  format!(
    "schemaVersion: 2.2.0
metadata:
  name: nodejs
  language: JavaScript
  projectType: Node.js
components:
  - name: runtime
    container:
      image: registry.access.redhat.com/ubi8/nodejs-18:latest
commands:
  - id: install
    exec:
      component: runtime
      commandLine: npm install
      group:
        kind: build
  - id: deploy
    composite:
      commands: [install]
      group:
        kind: deploy
starterProjects:
  - name: nodejs-starter
    description: Express starter
    zip:
      location: {base}/starters/nodejs-starter.zip
"
  )
}

/// Devfile shipped inside the starter archive.
pub const STARTER_DEVFILE: &str = "schemaVersion: 2.2.0
metadata:
  name: original
  language: JavaScript
  projectType: Express
  version: 1.0.0
components:
  - name: runtime
    container:
      image: quay.io/example/express:latest
";

/// Build a zip archive of `files` with stored (uncompressed) entries.
pub fn zip_of(files: &[(&str, &str)]) -> Vec<u8> {
  let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
  let options = zip::write::SimpleFileOptions::default().compression_method(zip::CompressionMethod::Stored);
  for (name, content) in files {
    writer.start_file(*name, options).unwrap();
    writer.write_all(content.as_bytes()).unwrap();
  }
  writer.finish().unwrap().into_inner()
}

/// Zip whose second entry fails its CRC check during extraction.
pub fn corrupted_zip() -> Vec<u8> {
  let mut bytes = zip_of(&[
    ("nodejs-starter/package.json", r#"{"name": "starter"}"#),
    ("nodejs-starter/server.js", "BROKEN-ENTRY-CONTENT"),
  ]);
  let needle = b"BROKEN-ENTRY-CONTENT";
  let offset = bytes.windows(needle.len()).position(|w| w == needle).unwrap();
  bytes[offset] = b'X';
  bytes
}

/// A mock registry serving [`INDEX`], the go and nodejs devfiles, and the nodejs starter.
pub struct RegistryServer {
  pub server: mockito::ServerGuard,
  _mocks: Vec<mockito::Mock>,
}

impl RegistryServer {
  pub fn url(&self) -> String {
    self.server.url()
  }

  pub fn registry(&self) -> Registry {
    Registry::new("local", self.url())
  }
}

pub async fn registry_server(starter: Vec<u8>) -> RegistryServer {
  let mut server = mockito::Server::new_async().await;
  let base = server.url();
  let mocks = vec![
    server.mock("GET", "/index").with_body(INDEX).create_async().await,
    server
      .mock("GET", "/devfiles/go")
      .with_body(GO_DEVFILE)
      .create_async()
      .await,
    server
      .mock("GET", "/devfiles/nodejs")
      .with_body(nodejs_devfile(&base))
      .create_async()
      .await,
    server
      .mock("GET", "/starters/nodejs-starter.zip")
      .with_body(starter)
      .create_async()
      .await,
  ];
  RegistryServer { server, _mocks: mocks }
}

pub fn client(fs: Arc<MemoryFs>, registries: Vec<Registry>, prompter: Arc<dyn Prompter>) -> InitClient {
  let registry = RegistryClient::new(registries, Duration::from_secs(5)).unwrap();
  InitClient::new(fs, registry, prompter)
}

/// Parse YAML for structural comparisons.
pub fn yaml(content: &str) -> serde_yaml::Value {
  serde_yaml::from_str(content).unwrap()
}
