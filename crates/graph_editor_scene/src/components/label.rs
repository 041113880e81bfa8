// SPDX-License-Identifier: MIT OR Apache-2.0
//! Label component payload.

use crate::asset::AssetPath;
use crate::components::BlendMode;
use crate::document::{Document, FieldValue};
use crate::fields;
use crate::math::Vector4;
use crate::model::{AssetRole, ModelError};
use serde::{Deserialize, Serialize};

const CONTEXT: &str = "label";

/// Anchor point of the text box
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Pivot {
    /// `PIVOT_CENTER`
    #[default]
    Center,
    /// `PIVOT_N`
    North,
    /// `PIVOT_NE`
    NorthEast,
    /// `PIVOT_E`
    East,
    /// `PIVOT_SE`
    SouthEast,
    /// `PIVOT_S`
    South,
    /// `PIVOT_SW`
    SouthWest,
    /// `PIVOT_W`
    West,
    /// `PIVOT_NW`
    NorthWest,
}

impl Pivot {
    /// Identifier as written in records
    pub fn as_ident(&self) -> &'static str {
        match self {
            Self::Center => "PIVOT_CENTER",
            Self::North => "PIVOT_N",
            Self::NorthEast => "PIVOT_NE",
            Self::East => "PIVOT_E",
            Self::SouthEast => "PIVOT_SE",
            Self::South => "PIVOT_S",
            Self::SouthWest => "PIVOT_SW",
            Self::West => "PIVOT_W",
            Self::NorthWest => "PIVOT_NW",
        }
    }

    /// Parse a record identifier
    pub fn from_ident(ident: &str) -> Option<Self> {
        match ident {
            "PIVOT_CENTER" => Some(Self::Center),
            "PIVOT_N" => Some(Self::North),
            "PIVOT_NE" => Some(Self::NorthEast),
            "PIVOT_E" => Some(Self::East),
            "PIVOT_SE" => Some(Self::SouthEast),
            "PIVOT_S" => Some(Self::South),
            "PIVOT_SW" => Some(Self::SouthWest),
            "PIVOT_W" => Some(Self::West),
            "PIVOT_NW" => Some(Self::NorthWest),
            _ => None,
        }
    }
}

/// Label parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelDesc {
    /// Text box size, zero when omitted
    pub size: Vector4,
    /// Text color, opaque white when omitted
    pub color: Vector4,
    /// Outline color, opaque black when omitted
    pub outline: Vector4,
    /// Shadow color, opaque black when omitted
    pub shadow: Vector4,
    /// Line spacing multiplier
    pub leading: Option<f32>,
    /// Letter spacing
    pub tracking: Option<f32>,
    /// Anchor of the text box
    pub pivot: Option<Pivot>,
    /// Blend mode
    pub blend_mode: Option<BlendMode>,
    /// Wrap text at the box width
    pub line_break: Option<bool>,
    /// Initial text; scripts usually replace it at runtime
    pub text: Option<String>,
    /// Font resource
    pub font: Option<AssetPath>,
    /// Render material
    pub material: Option<AssetPath>,
    /// Fields this crate does not model, kept verbatim
    pub extra: Document,
}

impl Default for LabelDesc {
    fn default() -> Self {
        Self {
            size: Vector4::ZERO,
            color: Vector4::ONE,
            outline: Vector4::W_ONE,
            shadow: Vector4::W_ONE,
            leading: None,
            tracking: None,
            pivot: None,
            blend_mode: None,
            line_break: None,
            text: None,
            font: None,
            material: None,
            extra: Document::new(),
        }
    }
}

impl LabelDesc {
    /// Decode a label payload
    pub fn from_document(document: &Document) -> Result<Self, ModelError> {
        let mut label = Self::default();
        for field in document.fields() {
            match field.name.as_str() {
                "size" => label.size = Vector4::decode(CONTEXT, field, Vector4::ZERO)?,
                "color" => label.color = Vector4::decode(CONTEXT, field, Vector4::ONE)?,
                "outline" => label.outline = Vector4::decode(CONTEXT, field, Vector4::W_ONE)?,
                "shadow" => label.shadow = Vector4::decode(CONTEXT, field, Vector4::W_ONE)?,
                "leading" => label.leading = Some(fields::float(CONTEXT, field)?),
                "tracking" => label.tracking = Some(fields::float(CONTEXT, field)?),
                "pivot" => label.pivot = Some(fields::enumeration(CONTEXT, field, Pivot::from_ident)?),
                "blend_mode" => {
                    label.blend_mode = Some(fields::enumeration(CONTEXT, field, BlendMode::from_ident)?);
                }
                "line_break" => label.line_break = Some(fields::boolean(CONTEXT, field)?),
                "text" => label.text = Some(fields::string(CONTEXT, field)?),
                "font" => label.font = Some(fields::asset(CONTEXT, field)?),
                "material" => label.material = Some(fields::asset(CONTEXT, field)?),
                _ => label.extra.push_field(field.clone()),
            }
        }
        Ok(label)
    }

    /// Encode in engine field order
    pub fn to_document(&self) -> Document {
        let mut document = Document::new();
        self.size.encode(&mut document, "size", Vector4::ZERO);
        self.color.encode(&mut document, "color", Vector4::ONE);
        self.outline.encode(&mut document, "outline", Vector4::W_ONE);
        self.shadow.encode(&mut document, "shadow", Vector4::W_ONE);
        fields::push_opt(&mut document, "leading", self.leading.map(FieldValue::float));
        fields::push_opt(&mut document, "tracking", self.tracking.map(FieldValue::float));
        fields::push_opt(&mut document, "pivot", self.pivot.map(|p| FieldValue::ident(p.as_ident())));
        fields::push_opt(
            &mut document,
            "blend_mode",
            self.blend_mode.map(|m| FieldValue::ident(m.as_ident())),
        );
        fields::push_opt(
            &mut document,
            "line_break",
            self.line_break.map(|b| FieldValue::ident(if b { "true" } else { "false" })),
        );
        fields::push_opt(&mut document, "text", self.text.as_ref().map(FieldValue::string));
        fields::push_opt(
            &mut document,
            "font",
            self.font.as_ref().map(|p| FieldValue::string(p.as_str())),
        );
        fields::push_opt(
            &mut document,
            "material",
            self.material.as_ref().map(|p| FieldValue::string(p.as_str())),
        );
        for field in self.extra.fields() {
            document.push_field(field.clone());
        }
        document
    }

    pub(crate) fn asset_references(&self) -> Vec<(AssetRole, AssetPath)> {
        let mut refs = Vec::new();
        if let Some(font) = &self.font {
            refs.push((AssetRole::Font, font.clone()));
        }
        if let Some(material) = &self.material {
            refs.push((AssetRole::Material, material.clone()));
        }
        refs
    }
}
