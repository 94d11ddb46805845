//! Source detection: pick the registry stack that best fits existing code.
//!
//! The context directory is scanned up to two levels deep for marker files
//! (`package.json`, `go.mod`, `pom.xml`, ...) and source file extensions.
//! Marker files are also inspected for framework hints. Every registry
//! stack is then scored against these signals.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use serde::Deserialize;
use tracing::{debug, trace};

use crate::fs::{EntryKind, Filesystem};
use crate::init::InitError;
use crate::registry::DevfileStack;

/// Directories never descended into.
const SKIPPED_DIRS: [&str; 6] = ["node_modules", "target", "vendor", "venv", "__pycache__", "dist"];

/// Deepest directory level scanned, the context directory being level 1.
const MAX_DEPTH: usize = 2;

const MARKER_WEIGHT: u32 = 10;
const EXTENSION_WEIGHT: u32 = 1;
const FRAMEWORK_BONUS: u32 = 20;
const TAG_BONUS: u32 = 5;

/// Language and framework signals found in a directory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Signals {
  /// Accumulated weight per language.
  pub languages: BTreeMap<&'static str, u32>,
  pub frameworks: BTreeSet<&'static str>,
  /// Project name declared by `package.json` or `go.mod` at the top level.
  pub project_name: Option<String>,
}

impl Signals {
  pub fn is_empty(&self) -> bool {
    self.languages.is_empty() && self.frameworks.is_empty()
  }

  fn add_language(&mut self, language: &'static str, weight: u32) {
    *self.languages.entry(language).or_default() += weight;
  }
}

/// Map a marker file name to its language.
fn marker_language(file: &str) -> Option<&'static str> {
  let language = match file {
    "package.json" => "javascript",
    "tsconfig.json" => "typescript",
    "go.mod" => "go",
    "pom.xml" | "build.gradle" | "build.gradle.kts" => "java",
    "requirements.txt" | "pyproject.toml" | "setup.py" | "Pipfile" => "python",
    "Cargo.toml" => "rust",
    "composer.json" => "php",
    "Gemfile" => "ruby",
    _ if file.ends_with(".csproj") || file.ends_with(".sln") => "dotnet",
    _ => return None,
  };
  Some(language)
}

fn extension_language(file: &str) -> Option<&'static str> {
  let extension = Path::new(file).extension()?.to_str()?;
  let language = match extension {
    "js" | "mjs" | "cjs" | "jsx" => "javascript",
    "ts" | "tsx" => "typescript",
    "go" => "go",
    "java" | "kt" => "java",
    "py" => "python",
    "rs" => "rust",
    "cs" => "dotnet",
    "php" => "php",
    "rb" => "ruby",
    _ => return None,
  };
  Some(language)
}

/// Normalise a registry language label to a detection language.
fn normalize_language(label: &str) -> Option<&'static str> {
  let language = match label.trim().to_ascii_lowercase().as_str() {
    "javascript" | "nodejs" | "node.js" | "node" => "javascript",
    "typescript" => "typescript",
    "go" | "golang" => "go",
    "java" => "java",
    "python" => "python",
    "rust" => "rust",
    ".net" | "dotnet" | "c#" | "csharp" => "dotnet",
    "php" => "php",
    "ruby" => "ruby",
    _ => return None,
  };
  Some(language)
}

/// Framework names referenced by a marker file's content.
fn framework_hints(file: &str, content: &str) -> Vec<&'static str> {
  let needles: &[(&str, &'static str)] = match file {
    "package.json" => &[
      ("\"express\"", "express"),
      ("\"react\"", "react"),
      ("\"next\"", "next"),
      ("\"vue\"", "vue"),
      ("\"nuxt\"", "nuxt"),
      ("\"svelte\"", "svelte"),
      ("\"@angular/core\"", "angular"),
      ("\"@nestjs/core\"", "nest"),
    ],
    "pom.xml" | "build.gradle" | "build.gradle.kts" => &[
      ("spring-boot", "spring"),
      ("quarkus", "quarkus"),
      ("vertx", "vertx"),
      ("micronaut", "micronaut"),
      ("wildfly", "wildfly"),
      ("openliberty", "liberty"),
    ],
    "requirements.txt" | "pyproject.toml" | "setup.py" | "Pipfile" => {
      &[("django", "django"), ("flask", "flask"), ("fastapi", "fastapi")]
    }
    "go.mod" => &[("github.com/gin-gonic/gin", "gin"), ("github.com/labstack/echo", "echo")],
    "composer.json" => &[("laravel/framework", "laravel")],
    _ => &[],
  };
  let lower = content.to_ascii_lowercase();
  needles
    .iter()
    .filter(|(needle, _)| lower.contains(needle))
    .map(|(_, framework)| *framework)
    .collect()
}

#[derive(Deserialize)]
struct PackageJson {
  name: Option<String>,
}

fn declared_project_name(file: &str, content: &str) -> Option<String> {
  let name = match file {
    "package.json" => serde_json::from_str::<PackageJson>(content)
      .ok()?
      .name
      .map(|name| name.rsplit('/').next().unwrap_or(&name).to_string()),
    "go.mod" => content
      .lines()
      .find_map(|line| line.trim().strip_prefix("module "))
      .and_then(|module| module.trim().trim_matches('"').rsplit('/').next().map(str::to_string)),
    _ => None,
  };
  name.filter(|name| !name.is_empty())
}

/// Scan `dir` for language and framework signals.
pub fn scan(fs: &dyn Filesystem, dir: &Path) -> Result<Signals, InitError> {
  let mut signals = Signals::default();
  scan_dir(fs, dir, 1, &mut signals)?;
  debug!(languages = ?signals.languages, frameworks = ?signals.frameworks, project = ?signals.project_name, "scanned sources");
  Ok(signals)
}

fn scan_dir(fs: &dyn Filesystem, dir: &Path, depth: usize, signals: &mut Signals) -> Result<(), InitError> {
  let entries = fs
    .read_dir(dir)
    .map_err(|e| InitError::io("read directory", dir, e))?;

  for entry in entries {
    if entry.name.starts_with('.') {
      continue;
    }
    let path = dir.join(&entry.name);
    match entry.kind {
      EntryKind::Dir => {
        if depth < MAX_DEPTH && !SKIPPED_DIRS.contains(&entry.name.as_str()) {
          scan_dir(fs, &path, depth + 1, signals)?;
        }
      }
      EntryKind::File => {
        if let Some(language) = marker_language(&entry.name) {
          trace!(path = %path.display(), language, "marker file");
          signals.add_language(language, MARKER_WEIGHT);
          // Unreadable marker files still count as markers.
          if let Ok(bytes) = fs.read_file(&path) {
            let content = String::from_utf8_lossy(&bytes);
            signals.frameworks.extend(framework_hints(&entry.name, &content));
            if depth == 1 && signals.project_name.is_none() {
              signals.project_name = declared_project_name(&entry.name, &content);
            }
          }
        } else if let Some(language) = extension_language(&entry.name) {
          signals.add_language(language, EXTENSION_WEIGHT);
        }
      }
      EntryKind::Other => {}
    }
  }
  Ok(())
}

/// Score how well `stack` fits `signals`. Zero means no fit.
pub fn score(signals: &Signals, stack: &DevfileStack) -> u32 {
  let language = normalize_language(&stack.language);
  let mut score = language
    .and_then(|language| signals.languages.get(language).copied())
    .unwrap_or(0);

  // Typescript sources also count for JavaScript stacks, at half weight.
  if language == Some("javascript")
    && let Some(ts) = signals.languages.get("typescript")
  {
    score += ts / 2;
  }
  if score == 0 {
    return 0;
  }

  let haystack = format!("{} {}", stack.name, stack.project_type).to_ascii_lowercase();
  if signals.frameworks.iter().any(|framework| haystack.contains(framework)) {
    score += FRAMEWORK_BONUS;
  }

  for tag in &stack.tags {
    let tag = tag.to_ascii_lowercase();
    let matches_framework = signals.frameworks.iter().any(|framework| tag.contains(framework));
    let matches_language = normalize_language(&tag).is_some_and(|l| signals.languages.contains_key(l));
    if matches_framework || matches_language {
      score += TAG_BONUS;
    }
  }

  score
}

/// Highest scoring stack; ties go to the lexicographically smallest name.
pub fn best_match<'a>(signals: &Signals, stacks: impl IntoIterator<Item = &'a DevfileStack>) -> Option<(&'a DevfileStack, u32)> {
  let mut best: Option<(&DevfileStack, u32)> = None;
  for stack in stacks {
    let score = score(signals, stack);
    trace!(stack = %stack.name, score, "scored stack");
    if score == 0 {
      continue;
    }
    best = match best {
      Some((current, current_score))
        if current_score > score || (current_score == score && current.name <= stack.name) =>
      {
        Some((current, current_score))
      }
      _ => Some((stack, score)),
    };
  }
  best
}
