// SPDX-License-Identifier: MIT OR Apache-2.0
//! Command line surface of the `graph_editor` tool.

use crate::file_watcher::{FileEvent, FileWatcher, FileWatcherConfig};
use crate::project::{self, ProjectError, ProjectManager, ProjectSettings};
use clap::{Parser, Subcommand};
use graph_editor_scene::{parse, AssetPath, AssetReference, GameObject, ModelError};
use indexmap::{IndexMap, IndexSet};
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// How long `watch` blocks before polling the channel again
const WATCH_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Check, format and inspect game-object records
#[derive(Debug, Parser)]
#[command(name = "graph_editor", version, about)]
pub struct Cli {
    /// Project root; defaults to the working directory without a trailing `build`
    #[arg(long, global = true, value_name = "DIR")]
    pub project: Option<PathBuf>,

    /// Command to run
    #[command(subcommand)]
    pub command: Command,
}

/// Tool commands
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Parse and validate records
    Check {
        /// Record files or directories; all project records when empty
        paths: Vec<PathBuf>,
    },
    /// Rewrite records in canonical form
    Fmt {
        /// Only list files that are not in canonical form
        #[arg(long)]
        check: bool,
        /// Record files or directories; all project records when empty
        paths: Vec<PathBuf>,
    },
    /// Print the typed model of a record as JSON
    Dump {
        /// Record file
        file: PathBuf,
    },
    /// List the resources records reference
    Refs {
        /// Record files or directories; all project records when empty
        paths: Vec<PathBuf>,
    },
    /// Print the resolved project root
    Root,
    /// Write a settings file with the default settings
    Init {
        /// Overwrite an existing settings file
        #[arg(long)]
        force: bool,
    },
    /// Re-check records as they change on disk
    Watch,
}

/// Errors that abort a command
#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    /// Project discovery or scanning failed
    #[error(transparent)]
    Project(#[from] ProjectError),
    /// A file could not be read or written
    #[error("failed to access {path:?}: {source}")]
    Io {
        /// Offending path
        path: PathBuf,
        /// Underlying error
        #[source]
        source: io::Error,
    },
    /// A record could not be loaded
    #[error("{path:?}: {source}")]
    Record {
        /// Record file
        path: PathBuf,
        /// Underlying error
        #[source]
        source: ModelError,
    },
    /// JSON output failed
    #[error("failed to encode JSON: {0}")]
    Json(#[from] serde_json::Error),
    /// The file watcher could not be set up
    #[error("file watcher failed: {0}")]
    Watch(#[from] notify::Error),
}

/// Overall result of a command that completed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Every file passed
    Clean,
    /// At least one file failed
    Failed,
}

impl Outcome {
    fn from_failures(failures: usize) -> Self {
        if failures == 0 {
            Self::Clean
        } else {
            Self::Failed
        }
    }
}

/// Result of checking one record
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileStatus {
    /// Valid and, when required, canonical
    Ok,
    /// Valid but not laid out the way the writer would
    NotCanonical,
    /// Rejected, with the reason
    Invalid(String),
}

impl FileStatus {
    /// Whether the file passed
    pub fn is_ok(&self) -> bool {
        matches!(self, Self::Ok)
    }
}

impl fmt::Display for FileStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ok => f.write_str("ok"),
            Self::NotCanonical => f.write_str("not in canonical form"),
            Self::Invalid(reason) => f.write_str(reason),
        }
    }
}

/// A resource reference found in a record
#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceEntry {
    /// Record holding the reference
    pub file: PathBuf,
    /// The reference itself
    pub reference: AssetReference,
    /// Whether the target is absent from the project
    pub missing: bool,
}

/// References gathered by `refs`
#[derive(Debug, Default)]
pub struct ReferenceReport {
    /// References of every record that loaded
    pub entries: Vec<ReferenceEntry>,
    /// Records that could not be loaded, with the reason
    pub invalid: Vec<(PathBuf, FileStatus)>,
}

/// Run a parsed command line against its project
pub fn run(cli: Cli) -> Result<Outcome, CommandError> {
    let root = match &cli.project {
        Some(dir) => PathBuf::from(project::resolve_project_root(&dir.to_string_lossy())),
        None => project::project_root()?,
    };
    let open = || ProjectManager::open(&root);

    match cli.command {
        Command::Check { paths } => check_command(&open()?, &paths),
        Command::Fmt { check, paths } => fmt_command(&open()?, &paths, check),
        Command::Dump { file } => dump_command(&file),
        Command::Refs { paths } => refs_command(&open()?, &paths),
        Command::Root => {
            println!("{}", open()?.root().display());
            Ok(Outcome::Clean)
        }
        // Replaces the settings file, so it never loads it
        Command::Init { force } => init_command(&root, force),
        Command::Watch => watch_command(&open()?),
    }
}

fn init_command(root: &Path, force: bool) -> Result<Outcome, CommandError> {
    let path = ProjectSettings::settings_path(root);
    if path.exists() && !force {
        tracing::warn!("{} already exists, pass --force to overwrite it", path.display());
        return Ok(Outcome::Failed);
    }
    ProjectManager::new(root).save()?;
    println!("{}", path.display());
    Ok(Outcome::Clean)
}

/// Canonical text of a valid record
pub fn canonical_text(text: &str) -> Result<String, ModelError> {
    let document = parse(text)?;
    GameObject::from_document(&document)?;
    Ok(document.to_text())
}

/// Check record text, optionally requiring canonical layout
pub fn check_text(text: &str, enforce_canonical: bool) -> FileStatus {
    match canonical_text(text) {
        Err(err) => FileStatus::Invalid(err.to_string()),
        Ok(canonical) if enforce_canonical && canonical != text => FileStatus::NotCanonical,
        Ok(_) => FileStatus::Ok,
    }
}

/// Check one record file
pub fn check_file(path: &Path, enforce_canonical: bool) -> Result<FileStatus, CommandError> {
    Ok(check_text(&read(path)?, enforce_canonical))
}

/// Files named on the command line, or every project record
pub fn collect_targets(project: &ProjectManager, paths: &[PathBuf]) -> Result<Vec<PathBuf>, CommandError> {
    if paths.is_empty() {
        return Ok(project.scan_records()?);
    }
    let mut targets = Vec::new();
    for path in paths {
        if path.is_dir() {
            targets.extend(project::scan_records(path, project.settings())?);
        } else {
            targets.push(path.clone());
        }
    }
    Ok(targets)
}

/// Check every target and report the ones that fail
pub fn check_all(project: &ProjectManager, paths: &[PathBuf]) -> Result<Vec<(PathBuf, FileStatus)>, CommandError> {
    let enforce = project.settings().enforce_canonical;
    collect_targets(project, paths)?
        .into_iter()
        .map(|path| {
            let status = check_file(&path, enforce)?;
            Ok((path, status))
        })
        .collect()
}

fn check_command(project: &ProjectManager, paths: &[PathBuf]) -> Result<Outcome, CommandError> {
    let results = check_all(project, paths)?;
    let mut failures = 0;
    for (path, status) in &results {
        if !status.is_ok() {
            println!("{}: {status}", display_path(project, path));
            failures += 1;
        }
    }
    tracing::info!("Checked {} records, {} failed", results.len(), failures);
    Ok(Outcome::from_failures(failures))
}

/// Bring every target into canonical form
///
/// With `check_only` nothing is written; files that would change are
/// returned as [`FileStatus::NotCanonical`].
pub fn format_all(
    project: &ProjectManager,
    paths: &[PathBuf],
    check_only: bool,
) -> Result<Vec<(PathBuf, FileStatus)>, CommandError> {
    let mut results = Vec::new();
    for path in collect_targets(project, paths)? {
        let text = read(&path)?;
        let status = match canonical_text(&text) {
            Err(err) => FileStatus::Invalid(err.to_string()),
            Ok(canonical) if canonical == text => FileStatus::Ok,
            Ok(_) if check_only => FileStatus::NotCanonical,
            Ok(canonical) => {
                std::fs::write(&path, canonical).map_err(|source| CommandError::Io {
                    path: path.clone(),
                    source,
                })?;
                tracing::info!("Formatted {}", display_path(project, &path));
                FileStatus::Ok
            }
        };
        results.push((path, status));
    }
    Ok(results)
}

fn fmt_command(project: &ProjectManager, paths: &[PathBuf], check_only: bool) -> Result<Outcome, CommandError> {
    let results = format_all(project, paths, check_only)?;
    let mut failures = 0;
    for (path, status) in &results {
        match status {
            FileStatus::Ok => {}
            FileStatus::NotCanonical => {
                println!("{}", display_path(project, path));
                failures += 1;
            }
            FileStatus::Invalid(reason) => {
                tracing::warn!("Skipping {}: {reason}", display_path(project, path));
                failures += 1;
            }
        }
    }
    Ok(Outcome::from_failures(failures))
}

fn dump_command(file: &Path) -> Result<Outcome, CommandError> {
    let object = load(file)?;
    println!("{}", serde_json::to_string_pretty(&object)?);
    Ok(Outcome::Clean)
}

/// Every resource reference in the targets, flagged when absent
///
/// Records that fail to load are listed in the report and skipped.
pub fn collect_references(project: &ProjectManager, paths: &[PathBuf]) -> Result<ReferenceReport, CommandError> {
    let mut report = ReferenceReport::default();
    for path in collect_targets(project, paths)? {
        let object = match GameObject::parse(&read(&path)?) {
            Ok(object) => object,
            Err(err) => {
                report.invalid.push((path, FileStatus::Invalid(err.to_string())));
                continue;
            }
        };
        for reference in object.asset_references() {
            let missing = !reference.path.is_builtin() && !project.resource_file(&reference.path).is_file();
            report.entries.push(ReferenceEntry {
                file: path.clone(),
                reference,
                missing,
            });
        }
    }
    Ok(report)
}

fn refs_command(project: &ProjectManager, paths: &[PathBuf]) -> Result<Outcome, CommandError> {
    let report = collect_references(project, paths)?;
    for (path, status) in &report.invalid {
        tracing::warn!("Skipping {}: {status}", display_path(project, path));
    }
    let mut missing: IndexMap<&AssetPath, Vec<&Path>> = IndexMap::new();
    for entry in &report.entries {
        let file = display_path(project, &entry.file);
        let role = entry.reference.role;
        let path = &entry.reference.path;
        if entry.missing {
            println!("{file}\t{role}\t{path}\tmissing");
            missing.entry(path).or_default().push(entry.file.as_path());
        } else {
            println!("{file}\t{role}\t{path}");
        }
    }
    for (path, files) in &missing {
        let files: Vec<String> = files.iter().map(|file| display_path(project, file)).collect();
        tracing::warn!("Missing resource {path} referenced from {}", files.join(", "));
    }
    Ok(Outcome::from_failures(missing.len() + report.invalid.len()))
}

fn watch_command(project: &ProjectManager) -> Result<Outcome, CommandError> {
    let enforce = project.settings().enforce_canonical;
    check_command(project, &[])?;

    let mut watcher = FileWatcher::new(FileWatcherConfig::for_records(project.settings(), project.root()))?;
    for dir in project.scan_dirs() {
        if dir.is_dir() {
            watcher.watch(&dir)?;
        }
    }
    if watcher.watched_directories().is_empty() {
        tracing::warn!("No scan root exists, nothing to watch");
        return Ok(Outcome::Failed);
    }

    while let Some(events) = watcher.wait_events(WATCH_POLL_INTERVAL) {
        let mut changed = IndexSet::new();
        for event in events {
            match event {
                FileEvent::Created(path) | FileEvent::Modified(path) => {
                    changed.insert(path);
                }
                FileEvent::Deleted(path) => {
                    changed.shift_remove(&path);
                    tracing::info!("Record removed: {}", display_path(project, &path));
                }
                FileEvent::Error(message) => tracing::warn!("File watcher error: {message}"),
            }
        }
        for path in changed.into_iter().filter(|p| p.is_file()) {
            match check_file(&path, enforce) {
                Ok(FileStatus::Ok) => tracing::info!("{}: ok", display_path(project, &path)),
                Ok(status) => println!("{}: {status}", display_path(project, &path)),
                Err(err) => tracing::warn!("{err}"),
            }
        }
    }
    Ok(Outcome::Failed)
}

fn read(path: &Path) -> Result<String, CommandError> {
    std::fs::read_to_string(path).map_err(|source| CommandError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn load(path: &Path) -> Result<GameObject, CommandError> {
    GameObject::parse(&read(path)?).map_err(|source| CommandError::Record {
        path: path.to_path_buf(),
        source,
    })
}

fn display_path(project: &ProjectManager, path: &Path) -> String {
    path.strip_prefix(project.root())
        .unwrap_or(path)
        .display()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use graph_editor_scene::AssetRole;
    use std::fs;

    const NODE_2D: &str = include_str!("../../graph_editor_scene/fixtures/gameobjects/node2D.go");
    const EDITOR_CAMERA: &str = include_str!("../../graph_editor_scene/fixtures/gameobjects/editor_camera.go");

    fn scratch_project(name: &str) -> ProjectManager {
        let dir = std::env::temp_dir().join(format!("graph_editor_commands_{name}_{}", std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(dir.join("graph_editor/gameobjects")).unwrap();
        ProjectManager::open(&dir).unwrap()
    }

    fn cleanup(project: ProjectManager) {
        fs::remove_dir_all(project.root()).unwrap();
    }

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_cli_parsing() {
        let cli = Cli::try_parse_from(["graph_editor", "fmt", "--check", "a.go", "b.go"]).unwrap();
        let Command::Fmt { check, paths } = cli.command else {
            panic!("expected fmt");
        };
        assert!(check);
        assert_eq!(paths, [PathBuf::from("a.go"), PathBuf::from("b.go")]);

        let cli = Cli::try_parse_from(["graph_editor", "root", "--project", "/game/build"]).unwrap();
        assert_eq!(cli.project, Some(PathBuf::from("/game/build")));
        assert!(matches!(cli.command, Command::Root));

        assert!(Cli::try_parse_from(["graph_editor", "dump"]).is_err());
    }

    fn init_cli(project: &ProjectManager, force: bool) -> Cli {
        Cli {
            project: Some(project.root().to_path_buf()),
            command: Command::Init { force },
        }
    }

    #[test]
    fn test_init_writes_settings_once() {
        let project = scratch_project("init");
        assert_eq!(run(init_cli(&project, false)).unwrap(), Outcome::Clean);
        let path = ProjectSettings::settings_path(project.root());
        assert_eq!(ProjectSettings::load(&path).unwrap(), ProjectSettings::default());
        assert_eq!(run(init_cli(&project, false)).unwrap(), Outcome::Failed);
        assert_eq!(run(init_cli(&project, true)).unwrap(), Outcome::Clean);
        cleanup(project);
    }

    #[test]
    fn test_init_force_replaces_invalid_settings() {
        let project = scratch_project("init_invalid");
        let path = ProjectSettings::settings_path(project.root());
        fs::write(&path, "(scan_roots: 3)").unwrap();
        let root = Cli {
            project: Some(project.root().to_path_buf()),
            command: Command::Root,
        };
        assert!(matches!(run(root), Err(CommandError::Project(ProjectError::Settings { .. }))));

        assert_eq!(run(init_cli(&project, false)).unwrap(), Outcome::Failed);
        assert_eq!(run(init_cli(&project, true)).unwrap(), Outcome::Clean);
        assert_eq!(ProjectSettings::load(&path).unwrap(), ProjectSettings::default());
        cleanup(project);
    }

    #[test]
    fn test_init_force_restores_defaults() {
        let mut project = scratch_project("init_custom");
        project.settings_mut().watch_debounce_ms = 900;
        project.settings_mut().enforce_canonical = false;
        project.save().unwrap();
        let path = ProjectSettings::settings_path(project.root());
        assert_eq!(ProjectSettings::load(&path).unwrap().watch_debounce_ms, 900);

        assert_eq!(run(init_cli(&project, true)).unwrap(), Outcome::Clean);
        assert_eq!(ProjectSettings::load(&path).unwrap(), ProjectSettings::default());
        cleanup(project);
    }

    #[test]
    fn test_check_text_fixtures() {
        assert_eq!(check_text(NODE_2D, true), FileStatus::Ok);
        assert_eq!(check_text(EDITOR_CAMERA, true), FileStatus::Ok);
    }

    #[test]
    fn test_check_text_layout() {
        let squashed = "components { id: \"script\" component: \"/graph_editor/scripts/node.script\" }\n";
        assert_eq!(check_text(squashed, true), FileStatus::NotCanonical);
        assert_eq!(check_text(squashed, false), FileStatus::Ok);
        assert_eq!(
            canonical_text(squashed).unwrap(),
            "components {\n  id: \"script\"\n  component: \"/graph_editor/scripts/node.script\"\n}\n"
        );
    }

    #[test]
    fn test_check_text_invalid() {
        let FileStatus::Invalid(reason) = check_text("components {\n", true) else {
            panic!("expected invalid");
        };
        assert!(reason.contains("components"), "{reason}");

        let duplicate = "components {\n  id: \"a\"\n  component: \"/a.script\"\n}\ncomponents {\n  id: \"a\"\n  component: \"/b.script\"\n}\n";
        assert!(matches!(check_text(duplicate, true), FileStatus::Invalid(_)));
    }

    #[test]
    fn test_check_all_scans_project() {
        let project = scratch_project("check");
        let objects = project.root().join("graph_editor/gameobjects");
        fs::write(objects.join("node2D.go"), NODE_2D).unwrap();
        fs::write(objects.join("broken.go"), "components {\n  id: 3\n}\n").unwrap();

        let results = check_all(&project, &[]).unwrap();
        assert_eq!(results.len(), 2);
        assert!(matches!(results[0].1, FileStatus::Invalid(_)));
        assert_eq!(results[1], (objects.join("node2D.go"), FileStatus::Ok));
        cleanup(project);
    }

    #[test]
    fn test_format_all() {
        let project = scratch_project("fmt");
        let file = project.root().join("graph_editor/gameobjects/script.go");
        let squashed = "components{id:\"script\" component:\"/graph_editor/scripts/node.script\"}";
        fs::write(&file, squashed).unwrap();

        let checked = format_all(&project, &[], true).unwrap();
        assert_eq!(checked, [(file.clone(), FileStatus::NotCanonical)]);
        assert_eq!(fs::read_to_string(&file).unwrap(), squashed);

        let formatted = format_all(&project, &[file.clone()], false).unwrap();
        assert_eq!(formatted, [(file.clone(), FileStatus::Ok)]);
        let written = fs::read_to_string(&file).unwrap();
        assert_eq!(check_text(&written, true), FileStatus::Ok);
        cleanup(project);
    }

    #[test]
    fn test_collect_references_flags_missing() {
        let project = scratch_project("refs");
        let root = project.root().to_path_buf();
        fs::write(root.join("graph_editor/gameobjects/node2D.go"), NODE_2D).unwrap();
        fs::create_dir_all(root.join("graph_editor/components/fonts")).unwrap();
        fs::write(root.join("graph_editor/components/fonts/ffff12.font"), "").unwrap();

        let report = collect_references(&project, &[]).unwrap();
        assert!(report.invalid.is_empty());
        let entries = report.entries;
        assert!(!entries.is_empty());

        let font = entries
            .iter()
            .find(|e| e.reference.role == AssetRole::Font)
            .unwrap();
        assert_eq!(font.reference.owner, "label");
        assert!(!font.missing);

        let builtin = entries
            .iter()
            .find(|e| e.reference.path.is_builtin())
            .unwrap();
        assert!(!builtin.missing);

        assert!(entries
            .iter()
            .any(|e| e.missing && e.reference.role == AssetRole::Texture));
        cleanup(project);
    }

    #[test]
    fn test_collect_references_skips_invalid_records() {
        let project = scratch_project("refs_invalid");
        let objects = project.root().join("graph_editor/gameobjects");
        fs::write(objects.join("a_broken.go"), "components {\n").unwrap();
        fs::write(objects.join("node2D.go"), NODE_2D).unwrap();

        let report = collect_references(&project, &[]).unwrap();
        assert_eq!(report.invalid.len(), 1);
        assert_eq!(report.invalid[0].0, objects.join("a_broken.go"));
        assert!(matches!(report.invalid[0].1, FileStatus::Invalid(_)));
        assert!(report.entries.iter().any(|e| e.file == objects.join("node2D.go")));
        assert_eq!(refs_command(&project, &[]).unwrap(), Outcome::Failed);
        cleanup(project);
    }

    #[test]
    fn test_explicit_directory_target() {
        let project = scratch_project("targets");
        let objects = project.root().join("graph_editor/gameobjects");
        fs::write(objects.join("camera.go"), EDITOR_CAMERA).unwrap();
        fs::write(objects.join("readme.md"), "").unwrap();

        let targets = collect_targets(&project, &[objects.clone()]).unwrap();
        assert_eq!(targets, [objects.join("camera.go")]);
        cleanup(project);
    }
}
