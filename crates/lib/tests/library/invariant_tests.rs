//! Directory consistency guarantees of the init pipeline.

use std::sync::Arc;

use devinit_lib::fs::MemoryFs;
use devinit_lib::init::{Cleanup, ErrorCategory, ErrorKind, Flags, NoPrompt, RunContext};
use devinit_lib::registry::Registry;

use super::common::*;

fn flags(pairs: &[(&str, &str)]) -> Flags {
  Flags::from_raw(pairs.iter().map(|(k, v)| (*k, *v)))
}

#[tokio::test]
async fn existing_devfile_is_never_clobbered() {
  let server = registry_server(zip_of(&[("a.txt", "a")])).await;
  for pairs in [
    vec![],
    vec![("devfile", "nodejs")],
    vec![("devfile", "nodejs"), ("name", "other"), ("starter", "nodejs-starter")],
  ] {
    let fs = Arc::new(
      MemoryFs::new(APP_DIR)
        .with_file("devfile.yaml", GO_DEVFILE)
        .with_file("main.go", "package main"),
    );
    let before = fs.snapshot();
    let client = client(Arc::clone(&fs), vec![server.registry()], Arc::new(NoPrompt));

    let failure = client.init(&RunContext::new(), flags(&pairs)).await.unwrap_err();

    assert_eq!(failure.kind(), ErrorKind::AlreadyInitialised, "flags {pairs:?}");
    assert_eq!(fs.snapshot(), before, "flags {pairs:?}");
  }
}

#[tokio::test]
async fn failure_before_starter_restores_directory() {
  let mut server = mockito::Server::new_async().await;
  let base = server.url();
  let _index = server.mock("GET", "/index").with_body(INDEX).create_async().await;
  let _devfile = server
    .mock("GET", "/devfiles/nodejs")
    .with_body(nodejs_devfile(&base))
    .create_async()
    .await;
  let _starter = server
    .mock("GET", "/starters/nodejs-starter.zip")
    .with_status(404)
    .create_async()
    .await;
  let registry = Registry::new("local", base.as_str());

  // starter missing from the devfile, and starter download failing before extraction
  for (starter, kind) in [
    ("does-not-exist", ErrorKind::StarterNotFound),
    ("nodejs-starter", ErrorKind::DownloadFailed),
  ] {
    let fs = Arc::new(MemoryFs::new(APP_DIR).with_file("README.md", "# app"));
    let before = fs.snapshot();
    let client = client(Arc::clone(&fs), vec![registry.clone()], Arc::new(NoPrompt));

    let failure = client
      .init(&RunContext::new(), flags(&[("devfile", "nodejs"), ("starter", starter)]))
      .await
      .unwrap_err();

    assert_eq!(failure.kind(), kind);
    assert_eq!(failure.cleanup, Cleanup::DevfileRemoved);
    assert!(failure.to_string().contains("manifest removed"));
    assert_eq!(fs.snapshot(), before);
  }
}

#[tokio::test]
async fn failure_after_starter_removes_nothing() {
  let server = registry_server(corrupted_zip()).await;
  let fs = Arc::new(MemoryFs::new(APP_DIR).with_file("notes/keep.txt", "mine"));
  let client = client(Arc::clone(&fs), vec![server.registry()], Arc::new(NoPrompt));

  let failure = client
    .init(
      &RunContext::new(),
      flags(&[("devfile", "nodejs"), ("starter", "nodejs-starter")]),
    )
    .await
    .unwrap_err();

  assert_eq!(failure.cleanup, Cleanup::Preserved);
  assert_eq!(fs.contents(format!("{APP_DIR}/notes/keep.txt")).unwrap(), "mine");
  assert!(fs.contents(format!("{APP_DIR}/package.json")).is_some());
}

#[tokio::test]
async fn invalid_starter_devfile_is_fatal_and_preserves_starter() {
  let broken_devfile = "schemaVersion: 1.0.0\nmetadata:\n  name: legacy\n";
  let server = registry_server(zip_of(&[
    ("nodejs-starter/devfile.yaml", broken_devfile),
    ("nodejs-starter/server.js", "require('express')"),
  ]))
  .await;
  let fs = Arc::new(MemoryFs::new(APP_DIR));
  let client = client(Arc::clone(&fs), vec![server.registry()], Arc::new(NoPrompt));

  let failure = client
    .init(
      &RunContext::new(),
      flags(&[("name", "x"), ("devfile", "nodejs"), ("starter", "nodejs-starter")]),
    )
    .await
    .unwrap_err();

  assert_eq!(failure.kind(), ErrorKind::ManifestInvalid);
  assert_eq!(failure.cleanup, Cleanup::Preserved);
  assert_eq!(failure.exit_code(), 1);
  assert_eq!(fs.contents(format!("{APP_DIR}/server.js")).unwrap(), "require('express')");
  assert_eq!(fs.contents(format!("{APP_DIR}/devfile.yaml")).unwrap(), broken_devfile);
}

#[tokio::test]
async fn default_name_is_idempotent() {
  let server = registry_server(zip_of(&[("a.txt", "a")])).await;
  let mut names = Vec::new();
  for _ in 0..2 {
    let fs = Arc::new(MemoryFs::new("/home/dev/My Service"));
    let client = client(fs, vec![server.registry()], Arc::new(NoPrompt));
    let result = client
      .init(&RunContext::new(), flags(&[("devfile", "go")]))
      .await
      .unwrap();
    names.push(result.name);
  }
  assert_eq!(names, vec!["go".to_string(), "go".to_string()]);
}

#[tokio::test]
async fn invalid_flag_combinations_fail_before_network_access() {
  let mut server = mockito::Server::new_async().await;
  let index = server.mock("GET", mockito::Matcher::Any).expect(0).create_async().await;
  let registry = Registry::new("local", server.url());

  for pairs in [
    vec![("devfile", "nodejs"), ("devfile-path", "./d.yaml")],
    vec![("devfile-registry", "local"), ("devfile-path", "./d.yaml")],
    vec![("starter", "nodejs-starter")],
    vec![("name", "app")],
    vec![("devfile", "nodejs"), ("name", "Invalid Name")],
    vec![("devfile", "nodejs"), ("devfile-registry", "unknown")],
    vec![("devfile-path", "./missing.yaml")],
  ] {
    let fs = Arc::new(MemoryFs::new(APP_DIR).with_file("d.yaml", GO_DEVFILE));
    let before = fs.snapshot();
    let client = client(Arc::clone(&fs), vec![registry.clone()], Arc::new(NoPrompt));

    let failure = client.init(&RunContext::new(), flags(&pairs)).await.unwrap_err();

    assert_eq!(failure.kind().category(), ErrorCategory::Validation, "flags {pairs:?}");
    assert_eq!(failure.cleanup, Cleanup::NothingWritten);
    assert_eq!(fs.snapshot(), before);
  }
  index.assert_async().await;
}
