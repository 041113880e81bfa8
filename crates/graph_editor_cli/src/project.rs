// SPDX-License-Identifier: MIT OR Apache-2.0
//! Project root discovery and project settings.
//!
//! The project root is the directory the tool runs from, with a trailing
//! `build` directory dropped so the tool behaves the same when started from
//! the engine's build output. Settings live in `graph_editor.ron` at the
//! root; a project without one uses the defaults.

use graph_editor_scene::AssetPath;
use serde::{Deserialize, Serialize};
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;
use walkdir::WalkDir;

/// Current project settings format version
pub const SETTINGS_FORMAT_VERSION: u32 = 1;

/// Settings file name, relative to the project root
pub const SETTINGS_FILE_NAME: &str = "graph_editor.ron";

/// Build output directory dropped from the end of the working directory
const BUILD_DIR_NAME: &str = "build";

/// Errors raised while locating or reading a project
#[derive(Debug, thiserror::Error)]
pub enum ProjectError {
    /// The working directory could not be read
    #[error("{reason}: {source}")]
    CurrentDir {
        /// What went wrong, by error kind
        reason: &'static str,
        /// Underlying error
        #[source]
        source: io::Error,
    },
    /// A project file could not be read or written
    #[error("failed to access {path:?}: {source}")]
    Io {
        /// Offending path
        path: PathBuf,
        /// Underlying error
        #[source]
        source: io::Error,
    },
    /// The settings file is not valid RON
    #[error("invalid settings file {path:?}: {source}")]
    Settings {
        /// Settings file
        path: PathBuf,
        /// Underlying error
        #[source]
        source: ron::error::SpannedError,
    },
    /// The settings file was written by a newer version
    #[error("settings version {found} is newer than supported version {supported}")]
    UnsupportedVersion {
        /// Version found in the file
        found: u32,
        /// Newest version this build reads
        supported: u32,
    },
    /// Settings could not be serialized
    #[error("failed to serialize settings: {0}")]
    Serialize(#[from] ron::Error),
    /// A scan root could not be walked
    #[error("failed to scan {path:?}: {source}")]
    Walk {
        /// Directory being walked
        path: PathBuf,
        /// Underlying error
        #[source]
        source: walkdir::Error,
    },
}

/// Project root for a working directory
///
/// Backslashes become `/`, one trailing `/` is removed, and a last
/// component named `build` is dropped.
pub fn resolve_project_root(cwd: &str) -> String {
    let mut path = cwd.replace('\\', "/");
    if path.len() > 1 && path.ends_with('/') {
        path.pop();
    }
    if let Some(index) = path.rfind('/') {
        if &path[index + 1..] == BUILD_DIR_NAME {
            // Keep the leading slash of `/build`
            path.truncate(index.max(1));
        }
    }
    path
}

/// Project root for the current working directory
pub fn project_root() -> Result<PathBuf, ProjectError> {
    let cwd = std::env::current_dir().map_err(|source| {
        let reason = match source.kind() {
            io::ErrorKind::PermissionDenied => "permission denied reading the current directory",
            io::ErrorKind::NotFound => "the current directory has been unlinked",
            _ => "cannot read the current directory",
        };
        ProjectError::CurrentDir { reason, source }
    })?;
    Ok(PathBuf::from(resolve_project_root(&cwd.to_string_lossy())))
}

/// Per-project tool settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectSettings {
    /// Settings format version
    pub version: u32,
    /// Directories searched for records, relative to the project root
    pub scan_roots: Vec<PathBuf>,
    /// Directory names never descended into
    pub ignored_dirs: Vec<String>,
    /// Record file extensions, without the dot
    pub extensions: Vec<String>,
    /// Quiet period before the watcher reports a change
    pub watch_debounce_ms: u64,
    /// Whether `check` also requires files to be in canonical form
    pub enforce_canonical: bool,
}

impl Default for ProjectSettings {
    fn default() -> Self {
        Self {
            version: SETTINGS_FORMAT_VERSION,
            scan_roots: vec![PathBuf::from(".")],
            ignored_dirs: vec![BUILD_DIR_NAME.to_string(), ".internal".to_string(), ".git".to_string()],
            extensions: vec!["go".to_string()],
            watch_debounce_ms: 250,
            enforce_canonical: true,
        }
    }
}

impl ProjectSettings {
    /// Load settings from a file
    pub fn load(path: &Path) -> Result<Self, ProjectError> {
        let content = std::fs::read_to_string(path).map_err(|source| ProjectError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let settings: ProjectSettings = ron::from_str(&content).map_err(|source| ProjectError::Settings {
            path: path.to_path_buf(),
            source,
        })?;

        if settings.version > SETTINGS_FORMAT_VERSION {
            return Err(ProjectError::UnsupportedVersion {
                found: settings.version,
                supported: SETTINGS_FORMAT_VERSION,
            });
        }

        Ok(settings)
    }

    /// Save settings to a file
    pub fn save(&self, path: &Path) -> Result<(), ProjectError> {
        let config = ron::ser::PrettyConfig::default()
            .struct_names(true)
            .enumerate_arrays(false);
        let content = ron::ser::to_string_pretty(self, config)?;
        std::fs::write(path, content).map_err(|source| ProjectError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Settings file path for a project directory
    pub fn settings_path(project_dir: &Path) -> PathBuf {
        project_dir.join(SETTINGS_FILE_NAME)
    }

    /// Whether `path` names a record file
    pub fn is_record(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| self.extensions.iter().any(|known| known.eq_ignore_ascii_case(ext)))
    }

    /// Whether a directory with this name is skipped while scanning
    pub fn is_ignored_dir(&self, name: &str) -> bool {
        self.ignored_dirs.iter().any(|ignored| ignored == name)
    }

    /// Watcher debounce period
    pub fn watch_debounce(&self) -> Duration {
        Duration::from_millis(self.watch_debounce_ms)
    }
}

/// An opened project: its root and settings
#[derive(Debug, Clone)]
pub struct ProjectManager {
    root: PathBuf,
    settings: ProjectSettings,
}

impl ProjectManager {
    /// Create a project at `root` with default settings, ignoring any settings file
    pub fn new(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
            settings: ProjectSettings::default(),
        }
    }

    /// Open the project rooted at `root`
    pub fn open(root: &Path) -> Result<Self, ProjectError> {
        let settings_path = ProjectSettings::settings_path(root);
        let settings = if settings_path.is_file() {
            ProjectSettings::load(&settings_path)?
        } else {
            tracing::debug!("No {SETTINGS_FILE_NAME} in {:?}, using defaults", root);
            ProjectSettings::default()
        };

        tracing::debug!("Opened project at {:?}", root);
        Ok(Self {
            root: root.to_path_buf(),
            settings,
        })
    }

    /// Write the current settings to the project's settings file
    pub fn save(&self) -> Result<(), ProjectError> {
        self.settings.save(&ProjectSettings::settings_path(&self.root))?;
        tracing::info!("Saved project settings");
        Ok(())
    }

    /// Project root directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Current settings
    pub fn settings(&self) -> &ProjectSettings {
        &self.settings
    }

    /// Mutable settings; call [`ProjectManager::save`] to persist them
    pub fn settings_mut(&mut self) -> &mut ProjectSettings {
        &mut self.settings
    }

    /// Absolute scan root directories
    pub fn scan_dirs(&self) -> Vec<PathBuf> {
        self.settings
            .scan_roots
            .iter()
            .map(|dir| self.root.join(dir).components().collect::<PathBuf>())
            .collect()
    }

    /// Every record file under the scan roots, sorted by path
    pub fn scan_records(&self) -> Result<Vec<PathBuf>, ProjectError> {
        let mut records = Vec::new();
        for dir in self.scan_dirs() {
            if !dir.is_dir() {
                tracing::warn!("Scan root {:?} is not a directory, skipping", dir);
                continue;
            }
            records.extend(scan_records(&dir, &self.settings)?);
        }
        records.sort();
        records.dedup();
        Ok(records)
    }

    /// Where a project resource lives on disk
    pub fn resource_file(&self, path: &AssetPath) -> PathBuf {
        self.root.join(path.relative())
    }
}

/// Every record file below `dir`, skipping ignored directories, sorted by path
pub fn scan_records(dir: &Path, settings: &ProjectSettings) -> Result<Vec<PathBuf>, ProjectError> {
    let mut records = Vec::new();
    let walker = WalkDir::new(dir).into_iter().filter_entry(|entry| {
        entry.depth() == 0
            || !(entry.file_type().is_dir()
                && entry.file_name().to_str().is_some_and(|name| settings.is_ignored_dir(name)))
    });
    for entry in walker {
        let entry = entry.map_err(|source| ProjectError::Walk {
            path: dir.to_path_buf(),
            source,
        })?;
        if entry.file_type().is_file() && settings.is_record(entry.path()) {
            records.push(entry.into_path());
        }
    }
    records.sort();
    tracing::debug!("Found {} record files under {:?}", records.len(), dir);
    Ok(records)
}
