// SPDX-License-Identifier: MIT OR Apache-2.0
//! Project resource paths referenced by records.
//!
//! Paths are absolute within the project (`/graph_editor/scripts/x.script`),
//! use forward slashes only and always end in a file with an extension.
//! Paths under `/builtins/` are shipped with the engine rather than the
//! project.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Root of the resources bundled with the engine
pub const BUILTINS_ROOT: &str = "/builtins/";

/// A validated project resource path
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AssetPath(String);

impl AssetPath {
    /// Validate and wrap a path
    pub fn parse(path: impl Into<String>) -> Result<Self, AssetPathError> {
        let path = path.into();
        validate(&path)?;
        Ok(Self(path))
    }

    /// The path text, exactly as written in the record
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Last path segment
    pub fn file_name(&self) -> &str {
        self.0.rsplit('/').next().unwrap_or(&self.0)
    }

    /// Extension of the file name, without the dot
    pub fn extension(&self) -> &str {
        self.file_name().rsplit_once('.').map_or("", |(_, ext)| ext)
    }

    /// Resource kind derived from the extension
    pub fn kind(&self) -> AssetKind {
        AssetKind::from_extension(self.extension())
    }

    /// Whether the resource ships with the engine
    pub fn is_builtin(&self) -> bool {
        self.0.starts_with(BUILTINS_ROOT)
    }

    /// Path relative to the project root, for joining onto a directory
    pub fn relative(&self) -> &str {
        self.0.trim_start_matches('/')
    }
}

impl fmt::Display for AssetPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for AssetPath {
    type Error = AssetPathError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<AssetPath> for String {
    fn from(path: AssetPath) -> Self {
        path.0
    }
}

impl AsRef<str> for AssetPath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

fn validate(path: &str) -> Result<(), AssetPathError> {
    if path.is_empty() {
        return Err(AssetPathError::Empty);
    }
    if path.trim() != path {
        return Err(AssetPathError::SurroundingWhitespace(path.to_string()));
    }
    if path.contains('\\') {
        return Err(AssetPathError::Backslash(path.to_string()));
    }
    let Some(rest) = path.strip_prefix('/') else {
        return Err(AssetPathError::NotAbsolute(path.to_string()));
    };
    for segment in rest.split('/') {
        match segment {
            "" => return Err(AssetPathError::EmptySegment(path.to_string())),
            "." | ".." => return Err(AssetPathError::RelativeSegment(path.to_string())),
            _ => {}
        }
    }
    let file_name = rest.rsplit('/').next().unwrap_or(rest);
    match file_name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() && !ext.is_empty() => Ok(()),
        _ => Err(AssetPathError::MissingExtension(path.to_string())),
    }
}

/// Reason an asset path was rejected
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AssetPathError {
    /// Empty string
    #[error("asset path is empty")]
    Empty,

    /// Leading or trailing whitespace
    #[error("asset path `{0}` has surrounding whitespace")]
    SurroundingWhitespace(String),

    /// Windows separators
    #[error("asset path `{0}` contains a backslash")]
    Backslash(String),

    /// Not rooted at the project
    #[error("asset path `{0}` does not start with `/`")]
    NotAbsolute(String),

    /// `//` or a trailing slash
    #[error("asset path `{0}` contains an empty segment")]
    EmptySegment(String),

    /// `.` or `..`
    #[error("asset path `{0}` contains a relative segment")]
    RelativeSegment(String),

    /// File name without extension
    #[error("asset path `{0}` has no file extension")]
    MissingExtension(String),
}

/// Resource kind, derived from the file extension
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AssetKind {
    /// Lua component script
    Script,
    /// 3D model component
    Model,
    /// Font used by labels
    Font,
    /// Render material
    Material,
    /// Texture atlas
    Atlas,
    /// Tile source
    TileSource,
    /// Raw image
    Image,
    /// Nested game object
    GameObject,
    /// Collection of game objects
    Collection,
    /// Anything else, by extension
    Other(String),
}

impl AssetKind {
    /// Classify an extension
    pub fn from_extension(ext: &str) -> Self {
        match ext {
            "script" => Self::Script,
            "model" => Self::Model,
            "font" => Self::Font,
            "material" => Self::Material,
            "atlas" => Self::Atlas,
            "tilesource" | "tileset" => Self::TileSource,
            "png" | "jpg" | "jpeg" => Self::Image,
            "go" => Self::GameObject,
            "collection" => Self::Collection,
            other => Self::Other(other.to_string()),
        }
    }

    /// Whether a sprite can take its animations from this kind of resource
    pub fn is_texture_source(&self) -> bool {
        matches!(self, Self::Atlas | Self::TileSource | Self::Image)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_project_paths() {
        let path = AssetPath::parse("/graph_editor/components/fonts/ffff12.font").unwrap();
        assert_eq!(path.file_name(), "ffff12.font");
        assert_eq!(path.extension(), "font");
        assert_eq!(path.kind(), AssetKind::Font);
        assert!(!path.is_builtin());
        assert_eq!(path.relative(), "graph_editor/components/fonts/ffff12.font");
    }

    #[test]
    fn test_builtins() {
        let path = AssetPath::parse("/builtins/materials/sprite.material").unwrap();
        assert!(path.is_builtin());
        assert_eq!(path.kind(), AssetKind::Material);
    }

    #[test]
    fn test_rejects_malformed_paths() {
        assert_eq!(AssetPath::parse(""), Err(AssetPathError::Empty));
        assert!(matches!(
            AssetPath::parse("graph_editor/a.font"),
            Err(AssetPathError::NotAbsolute(_))
        ));
        assert!(matches!(
            AssetPath::parse("/graph_editor//a.font"),
            Err(AssetPathError::EmptySegment(_))
        ));
        assert!(matches!(
            AssetPath::parse("/graph_editor/../a.font"),
            Err(AssetPathError::RelativeSegment(_))
        ));
        assert!(matches!(
            AssetPath::parse("\\graph_editor\\a.font"),
            Err(AssetPathError::Backslash(_))
        ));
        assert!(matches!(
            AssetPath::parse("/graph_editor/fonts"),
            Err(AssetPathError::MissingExtension(_))
        ));
        assert!(matches!(
            AssetPath::parse("/graph_editor/.font"),
            Err(AssetPathError::MissingExtension(_))
        ));
        assert!(matches!(
            AssetPath::parse(" /a.font"),
            Err(AssetPathError::SurroundingWhitespace(_))
        ));
    }

    #[test]
    fn test_texture_sources() {
        assert!(AssetKind::from_extension("atlas").is_texture_source());
        assert!(AssetKind::from_extension("tilesource").is_texture_source());
        assert!(!AssetKind::from_extension("font").is_texture_source());
    }
}
