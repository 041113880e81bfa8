// SPDX-License-Identifier: MIT OR Apache-2.0
//! Command line tool for graph editor game-object records.
//!
//! The binary is a thin wrapper around [`commands::run`]; the modules are
//! public so the commands can be driven from tests and other tools.

pub mod commands;
pub mod file_watcher;
pub mod project;

pub use commands::{run, Cli, Command, CommandError, FileStatus, Outcome, ReferenceEntry, ReferenceReport};
pub use file_watcher::{FileEvent, FileWatcher, FileWatcherConfig};
pub use project::{project_root, resolve_project_root, ProjectError, ProjectManager, ProjectSettings};
