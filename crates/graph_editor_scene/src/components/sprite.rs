// SPDX-License-Identifier: MIT OR Apache-2.0
//! Sprite component payload.

use crate::asset::AssetPath;
use crate::components::BlendMode;
use crate::document::{Document, FieldValue};
use crate::fields;
use crate::math::Vector4;
use crate::model::{AssetRole, ModelError};
use serde::{Deserialize, Serialize};

const CONTEXT: &str = "sprite";
const TEXTURE_CONTEXT: &str = "sprite texture";

/// How a sprite picks its size
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SizeMode {
    /// `SIZE_MODE_MANUAL`
    Manual,
    /// `SIZE_MODE_AUTO`, from the current animation frame
    #[default]
    Auto,
}

impl SizeMode {
    /// Identifier as written in records
    pub fn as_ident(&self) -> &'static str {
        match self {
            Self::Manual => "SIZE_MODE_MANUAL",
            Self::Auto => "SIZE_MODE_AUTO",
        }
    }

    /// Parse a record identifier
    pub fn from_ident(ident: &str) -> Option<Self> {
        match ident {
            "SIZE_MODE_MANUAL" => Some(Self::Manual),
            "SIZE_MODE_AUTO" => Some(Self::Auto),
            _ => None,
        }
    }
}

/// A texture bound to one of the material's samplers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpriteTexture {
    /// Sampler name in the material
    pub sampler: String,
    /// Atlas or tile source providing the animations
    pub texture: AssetPath,
}

impl SpriteTexture {
    fn from_document(document: &Document) -> Result<Self, ModelError> {
        let mut sampler = None;
        let mut texture = None;
        for field in document.fields() {
            match field.name.as_str() {
                "sampler" => sampler = Some(fields::string(TEXTURE_CONTEXT, field)?),
                "texture" => texture = Some(fields::asset(TEXTURE_CONTEXT, field)?),
                other => {
                    return Err(ModelError::UnknownField {
                        context: TEXTURE_CONTEXT,
                        field: other.to_string(),
                    })
                }
            }
        }
        Ok(Self {
            sampler: sampler.unwrap_or_default(),
            texture: fields::required(TEXTURE_CONTEXT, "texture", texture)?,
        })
    }

    fn to_document(&self) -> Document {
        let mut document = Document::new();
        document.push("sampler", FieldValue::string(&self.sampler));
        document.push("texture", FieldValue::string(self.texture.as_str()));
        document
    }
}

/// Sprite parameters
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SpriteDesc {
    /// Legacy single texture source, superseded by `textures`
    pub tile_set: Option<AssetPath>,
    /// Animation played when the sprite is created
    pub default_animation: Option<String>,
    /// Render material
    pub material: Option<AssetPath>,
    /// Blend mode
    pub blend_mode: Option<BlendMode>,
    /// 9-slice margins, zero when omitted
    pub slice9: Vector4,
    /// Size in manual size mode, zero when omitted
    pub size: Vector4,
    /// Size mode
    pub size_mode: Option<SizeMode>,
    /// Normalized start offset of the default animation
    pub offset: Option<f32>,
    /// Playback speed multiplier
    pub playback_rate: Option<f32>,
    /// Sampler bindings
    pub textures: Vec<SpriteTexture>,
    /// Fields this crate does not model, kept verbatim
    pub extra: Document,
}

impl SpriteDesc {
    /// Decode a sprite payload
    pub fn from_document(document: &Document) -> Result<Self, ModelError> {
        let mut sprite = Self::default();
        for field in document.fields() {
            match field.name.as_str() {
                "tile_set" => sprite.tile_set = Some(fields::asset(CONTEXT, field)?),
                "default_animation" => sprite.default_animation = Some(fields::string(CONTEXT, field)?),
                "material" => sprite.material = Some(fields::asset(CONTEXT, field)?),
                "blend_mode" => {
                    sprite.blend_mode = Some(fields::enumeration(CONTEXT, field, BlendMode::from_ident)?);
                }
                "slice9" => sprite.slice9 = Vector4::decode(CONTEXT, field, Vector4::ZERO)?,
                "size" => sprite.size = Vector4::decode(CONTEXT, field, Vector4::ZERO)?,
                "size_mode" => {
                    sprite.size_mode = Some(fields::enumeration(CONTEXT, field, SizeMode::from_ident)?);
                }
                "offset" => sprite.offset = Some(fields::float(CONTEXT, field)?),
                "playback_rate" => sprite.playback_rate = Some(fields::float(CONTEXT, field)?),
                "textures" => {
                    let body = fields::block(CONTEXT, field)?;
                    sprite.textures.push(SpriteTexture::from_document(body)?);
                }
                _ => sprite.extra.push_field(field.clone()),
            }
        }
        Ok(sprite)
    }

    /// Encode in engine field order
    pub fn to_document(&self) -> Document {
        let mut document = Document::new();
        fields::push_opt(
            &mut document,
            "tile_set",
            self.tile_set.as_ref().map(|p| FieldValue::string(p.as_str())),
        );
        fields::push_opt(
            &mut document,
            "default_animation",
            self.default_animation.as_ref().map(FieldValue::string),
        );
        fields::push_opt(
            &mut document,
            "material",
            self.material.as_ref().map(|p| FieldValue::string(p.as_str())),
        );
        fields::push_opt(
            &mut document,
            "blend_mode",
            self.blend_mode.map(|m| FieldValue::ident(m.as_ident())),
        );
        self.slice9.encode(&mut document, "slice9", Vector4::ZERO);
        self.size.encode(&mut document, "size", Vector4::ZERO);
        fields::push_opt(
            &mut document,
            "size_mode",
            self.size_mode.map(|m| FieldValue::ident(m.as_ident())),
        );
        fields::push_opt(&mut document, "offset", self.offset.map(FieldValue::float));
        fields::push_opt(&mut document, "playback_rate", self.playback_rate.map(FieldValue::float));
        for texture in &self.textures {
            document.push("textures", FieldValue::Block(texture.to_document()));
        }
        for field in self.extra.fields() {
            document.push_field(field.clone());
        }
        document
    }

    /// Texture source for `sampler`, falling back to the legacy `tile_set`
    pub fn texture_for(&self, sampler: &str) -> Option<&AssetPath> {
        self.textures
            .iter()
            .find(|t| t.sampler == sampler)
            .map(|t| &t.texture)
            .or(self.tile_set.as_ref())
    }

    pub(crate) fn asset_references(&self) -> Vec<(AssetRole, AssetPath)> {
        let mut refs = Vec::new();
        if let Some(tile_set) = &self.tile_set {
            refs.push((AssetRole::Texture, tile_set.clone()));
        }
        if let Some(material) = &self.material {
            refs.push((AssetRole::Material, material.clone()));
        }
        refs.extend(self.textures.iter().map(|t| (AssetRole::Texture, t.texture.clone())));
        refs
    }
}
