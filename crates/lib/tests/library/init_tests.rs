//! End-to-end runs of the init pipeline against an in-memory directory and a mock registry.

use std::path::PathBuf;
use std::sync::Arc;

use devinit_lib::fs::MemoryFs;
use devinit_lib::init::{BackendKind, Cleanup, ErrorKind, Flags, NoPrompt, RunContext};
use serde_json::Value;

use super::common::*;

fn flags(pairs: &[(&str, &str)]) -> Flags {
  Flags::from_raw(pairs.iter().map(|(k, v)| (*k, *v)))
}

fn starter_zip() -> Vec<u8> {
  zip_of(&[
    ("nodejs-starter/devfile.yaml", STARTER_DEVFILE),
    ("nodejs-starter/package.json", r#"{"name": "starter"}"#),
    ("nodejs-starter/server.js", "require('express')"),
  ])
}

#[tokio::test]
async fn flags_without_starter() {
  let server = registry_server(starter_zip()).await;
  let fs = Arc::new(MemoryFs::new(APP_DIR));
  let client = client(Arc::clone(&fs), vec![server.registry()], Arc::new(NoPrompt));
  let ctx = RunContext::new();

  let result = client
    .init(&ctx, flags(&[("name", "my-app"), ("devfile", "nodejs")]))
    .await
    .unwrap();

  assert_eq!(result.name, "my-app");
  assert_eq!(result.backend, BackendKind::Flags);
  assert_eq!(result.devfile_path, PathBuf::from(APP_DIR).join("devfile.yaml"));
  assert!(result.has_deploy_command);

  let written = yaml(&fs.contents(&result.devfile_path).unwrap());
  assert_eq!(written["metadata"]["name"], "my-app");

  let telemetry = ctx.telemetry().snapshot();
  assert_eq!(telemetry["interactive"], Value::from(false));
  assert_eq!(telemetry["language"], Value::from("JavaScript"));
  assert_eq!(telemetry["projectType"], Value::from("Node.js"));
  assert_eq!(telemetry["componentType"], Value::from("Node.js"));
  assert_eq!(telemetry["devfileName"], Value::from("my-app"));
}

#[tokio::test]
async fn flag_conflict_writes_nothing() {
  let fs = Arc::new(MemoryFs::new(APP_DIR).with_file("d.yaml", GO_DEVFILE));
  let before = fs.snapshot();
  let client = client(Arc::clone(&fs), vec![], Arc::new(NoPrompt));

  let failure = client
    .init(&RunContext::new(), flags(&[("devfile", "nodejs"), ("devfile-path", "./d.yaml")]))
    .await
    .unwrap_err();

  assert_eq!(failure.kind(), ErrorKind::FlagConflict);
  assert_eq!(failure.cleanup, Cleanup::NothingWritten);
  assert_eq!(failure.exit_code(), 1);
  assert_eq!(fs.snapshot(), before);
}

#[tokio::test]
async fn already_initialised_directory_is_untouched() {
  let fs = Arc::new(MemoryFs::new(APP_DIR).with_file("devfile.yaml", "not even yaml: ["));
  let before = fs.snapshot();
  let prompter = ScriptedPrompter::new([]);
  let client = client(Arc::clone(&fs), vec![], prompter.clone());

  let failure = client.init(&RunContext::new(), Flags::default()).await.unwrap_err();

  assert_eq!(failure.kind(), ErrorKind::AlreadyInitialised);
  assert_eq!(failure.exit_code(), 1);
  assert_eq!(fs.snapshot(), before);
  assert!(prompter.asked().is_empty());
}

#[tokio::test]
async fn starter_devfile_wins_over_registry_devfile() {
  let server = registry_server(starter_zip()).await;
  let fs = Arc::new(MemoryFs::new(APP_DIR));
  let client = client(Arc::clone(&fs), vec![server.registry()], Arc::new(NoPrompt));

  let ctx = RunContext::new();
  let result = client
    .init(
      &ctx,
      flags(&[("name", "x"), ("devfile", "nodejs"), ("starter", "nodejs-starter")]),
    )
    .await
    .unwrap();

  assert_eq!(result.starter.as_deref(), Some("nodejs-starter"));
  let telemetry = ctx.telemetry().snapshot();
  assert_eq!(telemetry["projectType"], Value::from("Express"));
  assert_eq!(telemetry["devfileName"], Value::from("x"));
  assert!(!result.has_deploy_command);

  let mut written = yaml(&fs.contents(format!("{APP_DIR}/devfile.yaml")).unwrap());
  assert_eq!(written["metadata"]["name"], "x");
  written["metadata"]["name"] = "original".into();
  assert_eq!(written, yaml(STARTER_DEVFILE));

  assert_eq!(fs.contents(format!("{APP_DIR}/server.js")).unwrap(), "require('express')");
}

#[tokio::test]
async fn extraction_failure_preserves_directory() {
  let server = registry_server(corrupted_zip()).await;
  let fs = Arc::new(MemoryFs::new(APP_DIR));
  let client = client(Arc::clone(&fs), vec![server.registry()], Arc::new(NoPrompt));

  let failure = client
    .init(
      &RunContext::new(),
      flags(&[("name", "x"), ("devfile", "nodejs"), ("starter", "nodejs-starter")]),
    )
    .await
    .unwrap_err();

  assert_eq!(failure.kind(), ErrorKind::ExtractFailed);
  assert_eq!(failure.cleanup, Cleanup::Preserved);
  assert!(failure.to_string().contains("not cleaned up"));
  assert_eq!(failure.exit_code(), 1);
  assert!(fs.contents(format!("{APP_DIR}/package.json")).is_some());
}

#[tokio::test]
async fn interactive_run_in_empty_directory() {
  let server = registry_server(starter_zip()).await;
  let fs = Arc::new(MemoryFs::new(APP_DIR));
  // language "Go" (sorted: Go, JavaScript), stack "go", then the name
  let prompter = ScriptedPrompter::new([Answer::Select(0), Answer::Select(0), Answer::Input("hello-go")]);
  let client = client(Arc::clone(&fs), vec![server.registry()], prompter.clone());
  let ctx = RunContext::new();

  let result = client.init(&ctx, Flags::default()).await.unwrap();

  assert_eq!(result.backend, BackendKind::Interactive);
  assert_eq!(result.name, "hello-go");
  assert_eq!(ctx.telemetry().snapshot()["interactive"], Value::from(true));
  assert!(prompter.shown()[0].contains("is empty"));

  let written = yaml(&fs.contents(format!("{APP_DIR}/devfile.yaml")).unwrap());
  assert_eq!(written["metadata"]["name"], "hello-go");
  assert_eq!(written["metadata"]["language"], "Go");
}

#[tokio::test]
async fn interactive_run_with_starter_and_reprompted_name() {
  let server = registry_server(starter_zip()).await;
  let fs = Arc::new(MemoryFs::new(APP_DIR));
  let prompter = ScriptedPrompter::new([
    Answer::Select(1), // JavaScript
    Answer::Select(0), // nodejs
    Answer::Select(1), // nodejs-starter
    Answer::Input("Not Valid"),
    Answer::Input("web"),
  ]);
  let client = client(Arc::clone(&fs), vec![server.registry()], prompter.clone());

  let result = client.init(&RunContext::new(), Flags::default()).await.unwrap();

  assert_eq!(result.name, "web");
  assert_eq!(result.starter.as_deref(), Some("nodejs-starter"));
  assert!(prompter.shown().iter().any(|m| m.contains("invalid component name")));
  assert!(fs.contents(format!("{APP_DIR}/package.json")).is_some());
}

#[tokio::test]
async fn interactive_abort_removes_staged_devfile() {
  let server = registry_server(starter_zip()).await;
  let fs = Arc::new(MemoryFs::new(APP_DIR));
  let prompter = ScriptedPrompter::new([Answer::Select(0), Answer::Select(0), Answer::Abort]);
  let client = client(Arc::clone(&fs), vec![server.registry()], prompter);

  let failure = client.init(&RunContext::new(), Flags::default()).await.unwrap_err();

  assert_eq!(failure.kind(), ErrorKind::UserAborted);
  assert_eq!(failure.cleanup, Cleanup::DevfileRemoved);
  assert_eq!(failure.exit_code(), 0);
  assert!(fs.snapshot().is_empty());
}

#[tokio::test]
async fn detection_picks_stack_for_existing_sources() {
  let server = registry_server(starter_zip()).await;
  let fs = Arc::new(
    MemoryFs::new(APP_DIR)
      .with_file("package.json", r#"{"name": "Shop Front", "dependencies": {"express": "^4.19"}}"#)
      .with_file("src/server.js", "require('express')"),
  );
  let prompter = ScriptedPrompter::new([]);
  let client = client(Arc::clone(&fs), vec![server.registry()], prompter.clone());
  let ctx = RunContext::new();

  let result = client.init(&ctx, Flags::default()).await.unwrap();

  assert_eq!(result.backend, BackendKind::Detection);
  assert_eq!(result.name, "shop-front");
  assert_eq!(result.starter, None);
  assert!(prompter.shown()[0].contains("already contains source code"));
  assert!(prompter.shown()[1].contains("nodejs"));
  assert_eq!(ctx.telemetry().snapshot()["interactive"], Value::from(true));
  assert_eq!(
    fs.contents(format!("{APP_DIR}/src/server.js")).unwrap(),
    "require('express')"
  );
}

#[tokio::test]
async fn detection_failure_leaves_sources_alone() {
  let server = registry_server(starter_zip()).await;
  let fs = Arc::new(MemoryFs::new(APP_DIR).with_file("notes.txt", "todo"));
  let before = fs.snapshot();
  let client = client(Arc::clone(&fs), vec![server.registry()], ScriptedPrompter::new([]));

  let failure = client.init(&RunContext::new(), Flags::default()).await.unwrap_err();

  assert_eq!(failure.kind(), ErrorKind::DetectionFailed);
  assert_eq!(failure.cleanup, Cleanup::DevfileRemoved);
  assert_eq!(fs.snapshot(), before);
}

#[tokio::test]
async fn devfile_path_from_url() {
  let mut server = mockito::Server::new_async().await;
  let _devfile = server
    .mock("GET", "/samples/devfile.yaml")
    .with_body(GO_DEVFILE)
    .create_async()
    .await;
  let fs = Arc::new(MemoryFs::new(APP_DIR));
  let client = client(Arc::clone(&fs), vec![], Arc::new(NoPrompt));

  let url = format!("{}/samples/devfile.yaml", server.url());
  let result = client
    .init(&RunContext::new(), flags(&[("devfile-path", url.as_str())]))
    .await
    .unwrap();

  assert_eq!(result.name, "go");
  assert!(fs.contents(format!("{APP_DIR}/devfile.yaml")).is_some());
}

#[tokio::test]
async fn cancelled_run_removes_staged_devfile() {
  let server = registry_server(starter_zip()).await;
  let fs = Arc::new(MemoryFs::new(APP_DIR));
  let client = client(Arc::clone(&fs), vec![server.registry()], Arc::new(NoPrompt));
  let ctx = RunContext::new();
  ctx.canceller().cancel();

  let failure = client
    .init(&ctx, flags(&[("devfile", "nodejs"), ("starter", "nodejs-starter")]))
    .await
    .unwrap_err();

  assert_eq!(failure.kind(), ErrorKind::Cancelled);
  assert_eq!(failure.cleanup, Cleanup::DevfileRemoved);
  assert_eq!(failure.exit_code(), 0);
  assert!(fs.snapshot().is_empty());
}
