//! End-to-end runs of `devinit init`.

use predicates::prelude::*;

use crate::common::{TestEnv, zip_of};

fn starter_zip() -> Vec<u8> {
  zip_of(&[
    ("nodejs-starter/package.json", r#"{"name": "starter"}"#),
    ("nodejs-starter/server.js", "console.log('hi')\n"),
  ])
}

// =============================================================================
// Flags
// =============================================================================

#[test]
fn flags_init_writes_personalized_devfile() {
  let env = TestEnv::with_registry(starter_zip());

  env
    .devinit_cmd()
    .args(["init", "--name", "my-app", "--devfile", "nodejs"])
    .assert()
    .success()
    .stdout(predicate::str::contains("Your new component 'my-app'"))
    .stdout(predicate::str::contains("devinit deploy"));

  let devfile = env.read_file("devfile.yaml").expect("devfile written");
  assert!(devfile.contains("name: my-app"));
  assert!(!env.exists("server.js"));
}

#[test]
fn json_output_includes_telemetry() {
  let env = TestEnv::with_registry(starter_zip());

  let output = env
    .devinit_cmd()
    .args(["-o", "json", "init", "--name", "my-app", "--devfile", "nodejs"])
    .output()
    .unwrap();
  assert!(output.status.success());

  let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
  assert_eq!(json["name"], "my-app");
  assert_eq!(json["backend"], "flags");
  assert_eq!(json["telemetry"]["devfileName"], "my-app");
  assert_eq!(json["telemetry"]["language"], "JavaScript");
  assert_eq!(json["telemetry"]["interactive"], false);
}

#[test]
fn starter_is_overlaid_into_directory() {
  let env = TestEnv::with_registry(starter_zip());

  env
    .devinit_cmd()
    .args(["init", "--name", "my-app", "--devfile", "nodejs", "--starter", "nodejs-starter"])
    .assert()
    .success()
    .stdout(predicate::str::contains("nodejs-starter"));

  assert_eq!(env.read_file("server.js").as_deref(), Some("console.log('hi')\n"));
  assert!(env.exists("package.json"));
  assert!(!env.exists("nodejs-starter"));
  assert!(env.read_file("devfile.yaml").unwrap().contains("name: my-app"));
}

#[test]
fn unknown_starter_removes_devfile() {
  let env = TestEnv::with_registry(starter_zip());

  env
    .devinit_cmd()
    .args(["init", "--name", "my-app", "--devfile", "nodejs", "--starter", "nope"])
    .assert()
    .code(1)
    .stderr(predicate::str::contains("nodejs-starter"))
    .stderr(predicate::str::contains("devfile.yaml was deleted"));

  assert!(!env.exists("devfile.yaml"));
}

#[test]
fn extraction_failure_preserves_directory() {
  let mut broken = zip_of(&[
    ("nodejs-starter/package.json", r#"{"name": "starter"}"#),
    ("nodejs-starter/server.js", "BROKEN-ENTRY-CONTENT"),
  ]);
  let needle = b"BROKEN-ENTRY-CONTENT";
  let offset = broken.windows(needle.len()).position(|w| w == needle).unwrap();
  broken[offset] = b'X';
  let env = TestEnv::with_registry(broken);

  env
    .devinit_cmd()
    .args(["init", "--name", "my-app", "--devfile", "nodejs", "--starter", "nodejs-starter"])
    .assert()
    .code(1)
    .stderr(predicate::str::contains("not cleaned up"));

  assert!(env.exists("package.json"));
}

// =============================================================================
// Detection & interactive
// =============================================================================

#[test]
fn detection_runs_without_a_terminal() {
  let env = TestEnv::with_registry(starter_zip());
  env.write_file(
    "package.json",
    r#"{"name": "@acme/shop-front", "dependencies": {"express": "^4.18.0"}}"#,
  );
  env.write_file("index.js", "require('express')\n");

  env
    .devinit_cmd()
    .arg("init")
    .assert()
    .success()
    .stdout(predicate::str::contains("Your new component 'shop-front'"))
    .stderr(predicate::str::contains("the nodejs devfile was selected"));

  assert!(env.read_file("devfile.yaml").unwrap().contains("name: shop-front"));
  assert!(env.exists("index.js"));
}

#[test]
fn empty_directory_without_terminal_fails_cleanly() {
  let env = TestEnv::with_registry(starter_zip());

  env
    .devinit_cmd()
    .arg("init")
    .assert()
    .failure()
    .stderr(predicate::str::contains("cannot prompt in non-interactive mode"));

  assert!(!env.exists("devfile.yaml"));
}
