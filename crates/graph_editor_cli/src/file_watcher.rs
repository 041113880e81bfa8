// SPDX-License-Identifier: MIT OR Apache-2.0
//! File system watcher for record changes.
//!
//! Wraps a debounced `notify` watcher and forwards record file events over a
//! channel, so the `watch` command can re-check files on the main thread.

use crate::project::ProjectSettings;
use notify_debouncer_full::{
    new_debouncer,
    notify::{self, EventKind, RecommendedWatcher, RecursiveMode},
    DebounceEventResult, Debouncer, RecommendedCache,
};
use std::collections::HashSet;
use std::path::{Component, Path, PathBuf};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, TryRecvError};
use std::time::Duration;

/// Events emitted by the file watcher
#[derive(Debug, Clone, PartialEq)]
pub enum FileEvent {
    /// A file was created
    Created(PathBuf),
    /// A file was modified
    Modified(PathBuf),
    /// A file was deleted
    Deleted(PathBuf),
    /// An error occurred
    Error(String),
}

/// Configuration for the file watcher
#[derive(Debug, Clone)]
pub struct FileWatcherConfig {
    /// Debounce duration for events
    pub debounce_duration: Duration,
    /// Whether to watch directories recursively
    pub recursive: bool,
    /// File extensions to watch, lowercase (empty = watch all)
    pub extensions: HashSet<String>,
    /// Directory names whose contents are never reported
    pub ignored_dirs: HashSet<String>,
    /// Only components below this directory are matched against `ignored_dirs`
    pub root: Option<PathBuf>,
}

impl Default for FileWatcherConfig {
    fn default() -> Self {
        Self {
            debounce_duration: Duration::from_millis(250),
            recursive: true,
            extensions: HashSet::new(),
            ignored_dirs: HashSet::new(),
            root: None,
        }
    }
}

impl FileWatcherConfig {
    /// Create a config that watches the record files of the project at `root`
    pub fn for_records(settings: &ProjectSettings, root: &Path) -> Self {
        Self {
            debounce_duration: settings.watch_debounce(),
            recursive: true,
            extensions: settings.extensions.iter().map(|e| e.to_lowercase()).collect(),
            ignored_dirs: settings.ignored_dirs.iter().cloned().collect(),
            root: Some(root.to_path_buf()),
        }
    }

    /// Whether events for `path` are reported
    pub fn accepts(&self, path: &Path) -> bool {
        let below_root = self
            .root
            .as_deref()
            .and_then(|root| path.strip_prefix(root).ok())
            .unwrap_or(path);
        let in_ignored_dir = below_root.components().any(|component| match component {
            Component::Normal(name) => name.to_str().is_some_and(|n| self.ignored_dirs.contains(n)),
            _ => false,
        });
        if in_ignored_dir {
            return false;
        }
        self.extensions.is_empty()
            || path
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| self.extensions.contains(&e.to_lowercase()))
    }

    /// Translate a raw `notify` event into watcher events
    pub fn translate(&self, kind: &EventKind, paths: &[PathBuf]) -> Vec<FileEvent> {
        let make: fn(PathBuf) -> FileEvent = match kind {
            EventKind::Create(_) => FileEvent::Created,
            EventKind::Modify(_) => FileEvent::Modified,
            EventKind::Remove(_) => FileEvent::Deleted,
            EventKind::Any | EventKind::Access(_) | EventKind::Other => return Vec::new(),
        };
        paths
            .iter()
            .filter(|p| self.accepts(p))
            .cloned()
            .map(make)
            .collect()
    }
}

/// File system watcher for record changes
pub struct FileWatcher {
    /// The underlying debounced watcher
    debouncer: Debouncer<RecommendedWatcher, RecommendedCache>,
    /// Receiver for file events
    event_rx: Receiver<FileEvent>,
    /// Watched directories
    watched_dirs: Vec<PathBuf>,
    /// Configuration
    config: FileWatcherConfig,
}

impl FileWatcher {
    /// Create a new file watcher with the given configuration
    pub fn new(config: FileWatcherConfig) -> Result<Self, notify::Error> {
        let (event_tx, event_rx) = mpsc::channel();
        let filter = config.clone();

        let debouncer = new_debouncer(
            config.debounce_duration,
            None,
            move |result: DebounceEventResult| match result {
                Ok(events) => {
                    for event in events {
                        for file_event in filter.translate(&event.kind, &event.paths) {
                            let _ = event_tx.send(file_event);
                        }
                    }
                }
                Err(errors) => {
                    for error in errors {
                        let _ = event_tx.send(FileEvent::Error(error.to_string()));
                    }
                }
            },
        )?;

        Ok(Self {
            debouncer,
            event_rx,
            watched_dirs: Vec::new(),
            config,
        })
    }

    /// Watch a directory for changes
    pub fn watch(&mut self, path: impl AsRef<Path>) -> Result<(), notify::Error> {
        let path = path.as_ref().to_path_buf();
        let mode = if self.config.recursive {
            RecursiveMode::Recursive
        } else {
            RecursiveMode::NonRecursive
        };

        self.debouncer.watch(&path, mode)?;
        tracing::info!("Watching directory for changes: {:?}", path);
        self.watched_dirs.push(path);
        Ok(())
    }

    /// Get all watched directories
    pub fn watched_directories(&self) -> &[PathBuf] {
        &self.watched_dirs
    }

    /// Poll for pending file events (non-blocking)
    pub fn poll_events(&self) -> Vec<FileEvent> {
        let mut events = Vec::new();
        loop {
            match self.event_rx.try_recv() {
                Ok(event) => events.push(event),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    tracing::warn!("File watcher channel disconnected");
                    break;
                }
            }
        }
        events
    }

    /// Block until events arrive or `timeout` passes
    ///
    /// Returns `None` once the watcher thread has gone away.
    pub fn wait_events(&self, timeout: Duration) -> Option<Vec<FileEvent>> {
        match self.event_rx.recv_timeout(timeout) {
            Ok(first) => {
                let mut events = vec![first];
                events.extend(self.poll_events());
                Some(events)
            }
            Err(RecvTimeoutError::Timeout) => Some(Vec::new()),
            Err(RecvTimeoutError::Disconnected) => {
                tracing::warn!("File watcher channel disconnected");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::{AccessKind, CreateKind, ModifyKind, RemoveKind};

    #[test]
    fn test_config_default() {
        let config = FileWatcherConfig::default();
        assert!(config.recursive);
        assert!(config.extensions.is_empty());
        assert!(config.accepts(Path::new("/game/anything.bin")));
    }

    #[test]
    fn test_config_for_records() {
        let config = FileWatcherConfig::for_records(&ProjectSettings::default(), Path::new("/game"));
        assert!(config.extensions.contains("go"));
        assert_eq!(config.debounce_duration, Duration::from_millis(250));
        assert!(config.accepts(Path::new("/game/main/player.go")));
        assert!(config.accepts(Path::new("/game/main/Player.GO")));
        assert!(!config.accepts(Path::new("/game/main/player.script")));
        assert!(!config.accepts(Path::new("/game/build/default/player.go")));

        let nested = FileWatcherConfig::for_records(&ProjectSettings::default(), Path::new("/work/build/game"));
        assert!(nested.accepts(Path::new("/work/build/game/main/player.go")));
        assert!(!nested.accepts(Path::new("/work/build/game/build/player.go")));
    }

    #[test]
    fn test_translate() {
        let config = FileWatcherConfig::for_records(&ProjectSettings::default(), Path::new("/game"));
        let paths = vec![PathBuf::from("/game/a.go"), PathBuf::from("/game/a.png")];

        assert_eq!(
            config.translate(&EventKind::Create(CreateKind::File), &paths),
            [FileEvent::Created(PathBuf::from("/game/a.go"))]
        );
        assert_eq!(
            config.translate(&EventKind::Modify(ModifyKind::Any), &paths),
            [FileEvent::Modified(PathBuf::from("/game/a.go"))]
        );
        assert_eq!(
            config.translate(&EventKind::Remove(RemoveKind::File), &paths),
            [FileEvent::Deleted(PathBuf::from("/game/a.go"))]
        );
        assert!(config
            .translate(&EventKind::Access(AccessKind::Any), &paths)
            .is_empty());
    }
}
