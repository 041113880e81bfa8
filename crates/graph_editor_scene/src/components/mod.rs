// SPDX-License-Identifier: MIT OR Apache-2.0
//! Typed `data` payloads of embedded components.
//!
//! The `type` of an embedded component decides how its `data` string is
//! read. Cameras, sprites and labels are decoded into typed descriptions;
//! any other type, or a payload that does not fit its type, is kept as an
//! untyped [`Document`].

pub mod camera;
pub mod label;
pub mod sprite;

pub use camera::CameraDesc;
pub use label::{LabelDesc, Pivot};
pub use sprite::{SizeMode, SpriteDesc, SpriteTexture};

use crate::asset::AssetPath;
use crate::document::{Document, FieldValue, TextString};
use crate::model::AssetRole;
use crate::parser::{parse, ParseError};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The `type` tag of an embedded component
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ComponentKind {
    /// `camera`
    Camera,
    /// `sprite`
    Sprite,
    /// `label`
    Label,
    /// Any other engine component type
    Other(String),
}

impl ComponentKind {
    /// The tag as written in records
    pub fn as_str(&self) -> &str {
        match self {
            Self::Camera => "camera",
            Self::Sprite => "sprite",
            Self::Label => "label",
            Self::Other(kind) => kind,
        }
    }
}

impl From<&str> for ComponentKind {
    fn from(value: &str) -> Self {
        match value {
            "camera" => Self::Camera,
            "sprite" => Self::Sprite,
            "label" => Self::Label,
            other => Self::Other(other.to_string()),
        }
    }
}

impl From<String> for ComponentKind {
    fn from(value: String) -> Self {
        Self::from(value.as_str())
    }
}

impl From<ComponentKind> for String {
    fn from(kind: ComponentKind) -> Self {
        kind.as_str().to_string()
    }
}

impl fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Blend mode shared by sprites and labels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BlendMode {
    /// `BLEND_MODE_ALPHA`
    #[default]
    Alpha,
    /// `BLEND_MODE_ADD`
    Add,
    /// `BLEND_MODE_ADD_ALPHA`
    AddAlpha,
    /// `BLEND_MODE_MULT`
    Mult,
    /// `BLEND_MODE_SCREEN`
    Screen,
}

impl BlendMode {
    /// Identifier as written in records
    pub fn as_ident(&self) -> &'static str {
        match self {
            Self::Alpha => "BLEND_MODE_ALPHA",
            Self::Add => "BLEND_MODE_ADD",
            Self::AddAlpha => "BLEND_MODE_ADD_ALPHA",
            Self::Mult => "BLEND_MODE_MULT",
            Self::Screen => "BLEND_MODE_SCREEN",
        }
    }

    /// Parse a record identifier
    pub fn from_ident(ident: &str) -> Option<Self> {
        match ident {
            "BLEND_MODE_ALPHA" => Some(Self::Alpha),
            "BLEND_MODE_ADD" => Some(Self::Add),
            "BLEND_MODE_ADD_ALPHA" => Some(Self::AddAlpha),
            "BLEND_MODE_MULT" => Some(Self::Mult),
            "BLEND_MODE_SCREEN" => Some(Self::Screen),
            _ => None,
        }
    }
}

/// Decoded `data` payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ComponentData {
    /// Camera parameters
    Camera(CameraDesc),
    /// Sprite parameters
    Sprite(SpriteDesc),
    /// Label parameters
    Label(LabelDesc),
    /// Payload of an unknown type, or one that did not fit its type
    Opaque(Document),
}

impl ComponentData {
    /// Decode a payload for a component of type `kind`
    ///
    /// Only text that does not parse is an error. A payload whose fields do
    /// not match the type is kept as [`ComponentData::Opaque`].
    pub fn decode(kind: &ComponentKind, payload: &str) -> Result<Self, ParseError> {
        let document = parse(payload)?;
        let typed = match kind {
            ComponentKind::Camera => CameraDesc::from_document(&document).map(Self::Camera),
            ComponentKind::Sprite => SpriteDesc::from_document(&document).map(Self::Sprite),
            ComponentKind::Label => LabelDesc::from_document(&document).map(Self::Label),
            ComponentKind::Other(_) => return Ok(Self::Opaque(document)),
        };
        Ok(typed.unwrap_or_else(|err| {
            tracing::debug!(kind = kind.as_str(), %err, "keeping component data untyped");
            Self::Opaque(document)
        }))
    }

    /// Default payload for a freshly created component of type `kind`
    pub fn empty(kind: &ComponentKind) -> Self {
        match kind {
            ComponentKind::Camera => Self::Camera(CameraDesc::default()),
            ComponentKind::Sprite => Self::Sprite(SpriteDesc::default()),
            ComponentKind::Label => Self::Label(LabelDesc::default()),
            ComponentKind::Other(_) => Self::Opaque(Document::new()),
        }
    }

    /// The payload as a document
    pub fn to_document(&self) -> Document {
        match self {
            Self::Camera(camera) => camera.to_document(),
            Self::Sprite(sprite) => sprite.to_document(),
            Self::Label(label) => label.to_document(),
            Self::Opaque(document) => document.clone(),
        }
    }

    /// The payload as the string literal stored in the `data` field
    pub fn to_payload(&self) -> TextString {
        TextString::new(self.to_document().to_text())
    }

    /// Whether this payload matches `kind`
    pub fn matches(&self, kind: &ComponentKind) -> bool {
        match (self, kind) {
            (Self::Camera(_), ComponentKind::Camera)
            | (Self::Sprite(_), ComponentKind::Sprite)
            | (Self::Label(_), ComponentKind::Label)
            | (Self::Opaque(_), _) => true,
            _ => false,
        }
    }

    /// Resources referenced by the payload, tagged with their role
    pub fn asset_references(&self) -> Vec<(AssetRole, AssetPath)> {
        match self {
            Self::Camera(_) => Vec::new(),
            Self::Sprite(sprite) => sprite.asset_references(),
            Self::Label(label) => label.asset_references(),
            Self::Opaque(document) => {
                let mut found = Vec::new();
                collect_paths(document, &mut found);
                found
            }
        }
    }
}

/// Every string in an untyped payload that reads as an asset path
fn collect_paths(document: &Document, found: &mut Vec<(AssetRole, AssetPath)>) {
    for field in document.fields() {
        match &field.value {
            FieldValue::Block(body) => collect_paths(body, found),
            FieldValue::Str(text) if text.value().starts_with('/') => {
                if let Ok(path) = AssetPath::parse(text.value()) {
                    found.push((AssetRole::from_kind(&path.kind()), path));
                }
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_tags() {
        assert_eq!(ComponentKind::from("camera"), ComponentKind::Camera);
        assert_eq!(
            ComponentKind::from("collisionobject"),
            ComponentKind::Other("collisionobject".into())
        );
        assert_eq!(ComponentKind::Label.to_string(), "label");
    }

    #[test]
    fn test_unknown_type_stays_opaque() {
        let data = ComponentData::decode(
            &ComponentKind::from("model"),
            "mesh: \"/graph_editor/meshes/node.dae\"\nmaterial: \"/builtins/materials/model.material\"\n",
        )
        .unwrap();
        assert!(matches!(data, ComponentData::Opaque(_)));
        let refs = data.asset_references();
        assert_eq!(refs.len(), 2);
        assert_eq!(refs[1].0, AssetRole::Material);
    }

    #[test]
    fn test_mistyped_payload_falls_back() {
        let data = ComponentData::decode(&ComponentKind::Camera, "fov: \"wide\"\n").unwrap();
        let ComponentData::Opaque(document) = &data else {
            panic!("expected opaque payload, got {data:?}");
        };
        assert_eq!(document.to_text(), "fov: \"wide\"\n");
        assert!(data.matches(&ComponentKind::Camera));
    }

    #[test]
    fn test_unparsable_payload_is_an_error() {
        assert!(ComponentData::decode(&ComponentKind::Label, "size {\n").is_err());
    }

    #[test]
    fn test_payload_layout() {
        let payload = ComponentData::Camera(CameraDesc {
            fov: Some(0.7854),
            ..CameraDesc::default()
        })
        .to_payload();
        assert_eq!(payload.segments(), ["fov: 0.7854\\n", ""]);

        let empty = ComponentData::empty(&ComponentKind::Camera).to_payload();
        assert_eq!(empty.segments(), [""]);
    }

    #[test]
    fn test_blend_mode_idents() {
        assert_eq!(BlendMode::from_ident("BLEND_MODE_MULT"), Some(BlendMode::Mult));
        assert_eq!(BlendMode::Screen.as_ident(), "BLEND_MODE_SCREEN");
        assert_eq!(BlendMode::from_ident("BLEND_MODE_DARKEN"), None);
    }
}
