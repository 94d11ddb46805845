//! devinit-lib: bootstrap a directory as a devfile component.
//!
//! The crate holds the whole `init` pipeline:
//! - `fs`: injectable filesystem, real and in-memory
//! - `devfile`: the devfile model and its on-disk form
//! - `registry`: devfile registry client
//! - `detect`: language and framework detection for existing sources
//! - `starter`: starter project download and overlay
//! - `init`: flag validation, backends and the orchestrator with its rollback rule

pub mod consts;
pub mod detect;
pub mod devfile;
pub mod fs;
pub mod init;
pub mod location;
pub mod paths;
pub mod preference;
pub mod registry;
pub mod starter;
