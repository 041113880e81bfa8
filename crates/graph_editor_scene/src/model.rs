// SPDX-License-Identifier: MIT OR Apache-2.0
//! Typed game-object records.
//!
//! A game object is a flat list of component references (scripts, models
//! loaded from their own files) and embedded components (sprites, labels,
//! cameras described inline). Records are written in engine field order and
//! values at their defaults are left out, so decoding a saved file and
//! encoding it again reproduces the file.

use crate::asset::{AssetKind, AssetPath, AssetPathError};
use crate::components::{ComponentData, ComponentKind};
use crate::document::{Document, FieldValue};
use crate::fields;
use crate::math::Transform;
use crate::parser::{parse, ParseError};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

const OBJECT_CONTEXT: &str = "game object";
const COMPONENT_CONTEXT: &str = "component";
const EMBEDDED_CONTEXT: &str = "embedded component";
const PROPERTY_CONTEXT: &str = "property";

/// Engine fields of a component reference that precede `scale`
const BEFORE_SCALE: [&str; 1] = ["property_decls"];

/// Error raised while decoding or validating a record
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    /// The record text does not parse
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// The `data` payload of an embedded component does not parse
    #[error("data of embedded component `{id}` does not parse: {source}")]
    Payload {
        /// Embedded component id
        id: String,
        /// Position is relative to the payload text
        #[source]
        source: ParseError,
    },

    /// A field holds the wrong kind of value
    #[error("{context} field `{field}` must be a {expected}, found a {found}")]
    WrongKind {
        /// Record being decoded
        context: &'static str,
        /// Field name
        field: String,
        /// Expected value kind
        expected: &'static str,
        /// Value kind found
        found: &'static str,
    },

    /// A field that is not allowed in a closed block
    #[error("unknown {context} field `{field}`")]
    UnknownField {
        /// Record being decoded
        context: &'static str,
        /// Field name
        field: String,
    },

    /// A required field is absent
    #[error("{context} is missing `{field}`")]
    MissingField {
        /// Record being decoded
        context: &'static str,
        /// Field name
        field: &'static str,
    },

    /// A number out of range for its field
    #[error("{context} field `{field}` expects a {expected}, found `{raw}`")]
    InvalidNumber {
        /// Record being decoded
        context: &'static str,
        /// Field name
        field: String,
        /// Literal text
        raw: String,
        /// Expected number kind
        expected: &'static str,
    },

    /// Unknown enum identifier
    #[error("{context} field `{field}` has unknown value `{value}`")]
    UnknownEnumValue {
        /// Record being decoded
        context: &'static str,
        /// Field name
        field: String,
        /// Identifier found
        value: String,
    },

    /// A resource path that is not well formed
    #[error("{context} field `{field}`: {source}")]
    InvalidAssetPath {
        /// Record being decoded
        context: &'static str,
        /// Field name
        field: String,
        /// Why the path was rejected
        #[source]
        source: AssetPathError,
    },

    /// A component with an empty id
    #[error("{0} has an empty id")]
    EmptyId(&'static str),

    /// Two components of one game object share an id
    #[error("duplicate component id `{0}`")]
    DuplicateId(String),
}

/// Type of a script property override
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PropertyType {
    /// `PROPERTY_TYPE_NUMBER`
    Number,
    /// `PROPERTY_TYPE_HASH`
    Hash,
    /// `PROPERTY_TYPE_URL`
    Url,
    /// `PROPERTY_TYPE_VECTOR3`
    Vector3,
    /// `PROPERTY_TYPE_VECTOR4`
    Vector4,
    /// `PROPERTY_TYPE_QUAT`
    Quat,
    /// `PROPERTY_TYPE_BOOLEAN`
    Boolean,
}

impl PropertyType {
    /// Identifier as written in records
    pub fn as_ident(&self) -> &'static str {
        match self {
            Self::Number => "PROPERTY_TYPE_NUMBER",
            Self::Hash => "PROPERTY_TYPE_HASH",
            Self::Url => "PROPERTY_TYPE_URL",
            Self::Vector3 => "PROPERTY_TYPE_VECTOR3",
            Self::Vector4 => "PROPERTY_TYPE_VECTOR4",
            Self::Quat => "PROPERTY_TYPE_QUAT",
            Self::Boolean => "PROPERTY_TYPE_BOOLEAN",
        }
    }

    /// Parse a record identifier
    pub fn from_ident(ident: &str) -> Option<Self> {
        match ident {
            "PROPERTY_TYPE_NUMBER" => Some(Self::Number),
            "PROPERTY_TYPE_HASH" => Some(Self::Hash),
            "PROPERTY_TYPE_URL" => Some(Self::Url),
            "PROPERTY_TYPE_VECTOR3" => Some(Self::Vector3),
            "PROPERTY_TYPE_VECTOR4" => Some(Self::Vector4),
            "PROPERTY_TYPE_QUAT" => Some(Self::Quat),
            "PROPERTY_TYPE_BOOLEAN" => Some(Self::Boolean),
            _ => None,
        }
    }
}

/// Override of a script property on a component reference
///
/// The value is kept as the string the engine stores, e.g. `"10.0"`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyOverride {
    /// Property name declared by the script
    pub id: String,
    /// Serialized value
    pub value: String,
    /// Declared type
    pub property_type: PropertyType,
    /// Fields this crate does not model, kept verbatim
    #[serde(default)]
    pub extra: Document,
}

impl PropertyOverride {
    /// Create an override
    pub fn new(id: impl Into<String>, value: impl Into<String>, property_type: PropertyType) -> Self {
        Self {
            id: id.into(),
            value: value.into(),
            property_type,
            extra: Document::new(),
        }
    }

    fn from_document(document: &Document) -> Result<Self, ModelError> {
        let mut id = None;
        let mut value = None;
        let mut property_type = None;
        let mut extra = Document::new();
        for field in document.fields() {
            match field.name.as_str() {
                "id" => id = Some(fields::string(PROPERTY_CONTEXT, field)?),
                "value" => value = Some(fields::string(PROPERTY_CONTEXT, field)?),
                "type" => {
                    property_type =
                        Some(fields::enumeration(PROPERTY_CONTEXT, field, PropertyType::from_ident)?);
                }
                _ => extra.push_field(field.clone()),
            }
        }
        Ok(Self {
            id: fields::required(PROPERTY_CONTEXT, "id", id)?,
            value: fields::required(PROPERTY_CONTEXT, "value", value)?,
            property_type: fields::required(PROPERTY_CONTEXT, "type", property_type)?,
            extra,
        })
    }

    fn to_document(&self) -> Document {
        let mut document = Document::new();
        document.push("id", FieldValue::string(&self.id));
        document.push("value", FieldValue::string(&self.value));
        document.push("type", FieldValue::ident(self.property_type.as_ident()));
        for field in self.extra.fields() {
            document.push_field(field.clone());
        }
        document
    }

    /// The value as a number, for `PROPERTY_TYPE_NUMBER` overrides
    pub fn as_number(&self) -> Option<f64> {
        match self.property_type {
            PropertyType::Number => self.value.trim().parse().ok(),
            _ => None,
        }
    }
}

/// Component loaded from its own resource file, e.g. a script or model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentRef {
    /// Id, unique within the game object
    pub id: String,
    /// Resource implementing the component
    pub component: AssetPath,
    /// Local transform
    pub transform: Transform,
    /// Script property overrides
    pub properties: Vec<PropertyOverride>,
    /// Fields this crate does not model, kept verbatim
    pub extra: Document,
}

impl ComponentRef {
    /// Reference `component` under `id`
    pub fn new(id: impl Into<String>, component: AssetPath) -> Self {
        Self {
            id: id.into(),
            component,
            transform: Transform::IDENTITY,
            properties: Vec::new(),
            extra: Document::new(),
        }
    }

    /// Decode the body of a `components` block
    pub fn from_document(document: &Document) -> Result<Self, ModelError> {
        let mut id = None;
        let mut component = None;
        let mut transform = Transform::IDENTITY;
        let mut properties = Vec::new();
        let mut extra = Document::new();
        for field in document.fields() {
            if transform.decode_field(COMPONENT_CONTEXT, field)? {
                continue;
            }
            match field.name.as_str() {
                "id" => id = Some(fields::string(COMPONENT_CONTEXT, field)?),
                "component" => component = Some(fields::asset(COMPONENT_CONTEXT, field)?),
                "properties" => {
                    let body = fields::block(COMPONENT_CONTEXT, field)?;
                    properties.push(PropertyOverride::from_document(body)?);
                }
                _ => extra.push_field(field.clone()),
            }
        }
        Ok(Self {
            id: fields::required(COMPONENT_CONTEXT, "id", id)?,
            component: fields::required(COMPONENT_CONTEXT, "component", component)?,
            transform,
            properties,
            extra,
        })
    }

    /// Encode as the body of a `components` block
    pub fn to_document(&self) -> Document {
        let mut document = Document::new();
        document.push("id", FieldValue::string(&self.id));
        document.push("component", FieldValue::string(self.component.as_str()));
        self.transform.encode_position_rotation(&mut document);
        for property in &self.properties {
            document.push("properties", FieldValue::Block(property.to_document()));
        }
        let (before_scale, after_scale): (Vec<_>, Vec<_>) = self
            .extra
            .fields()
            .iter()
            .partition(|field| BEFORE_SCALE.contains(&field.name.as_str()));
        for field in before_scale {
            document.push_field(field.clone());
        }
        self.transform.encode_scale(&mut document);
        for field in after_scale {
            document.push_field(field.clone());
        }
        document
    }

    /// Override for property `id`
    pub fn property(&self, id: &str) -> Option<&PropertyOverride> {
        self.properties.iter().find(|p| p.id == id)
    }

    /// Replace or add a property override
    pub fn set_property(&mut self, property: PropertyOverride) {
        match self.properties.iter_mut().find(|p| p.id == property.id) {
            Some(existing) => *existing = property,
            None => self.properties.push(property),
        }
    }

    /// Remove the override for `id`, returning it
    pub fn remove_property(&mut self, id: &str) -> Option<PropertyOverride> {
        let index = self.properties.iter().position(|p| p.id == id)?;
        Some(self.properties.remove(index))
    }
}

/// Visual element described inline in the game object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddedComponent {
    /// Id, unique within the game object
    pub id: String,
    /// Engine component type
    pub kind: ComponentKind,
    /// Type specific parameters
    pub data: ComponentData,
    /// Local transform
    pub transform: Transform,
    /// Fields this crate does not model, kept verbatim
    pub extra: Document,
}

impl EmbeddedComponent {
    /// Embedded component of type `kind` with an empty payload
    pub fn new(id: impl Into<String>, kind: ComponentKind) -> Self {
        let data = ComponentData::empty(&kind);
        Self {
            id: id.into(),
            kind,
            data,
            transform: Transform::IDENTITY,
            extra: Document::new(),
        }
    }

    /// Decode the body of an `embedded_components` block
    pub fn from_document(document: &Document) -> Result<Self, ModelError> {
        let mut id = None;
        let mut kind = None;
        let mut payload = None;
        let mut transform = Transform::IDENTITY;
        let mut extra = Document::new();
        for field in document.fields() {
            if transform.decode_field(EMBEDDED_CONTEXT, field)? {
                continue;
            }
            match field.name.as_str() {
                "id" => id = Some(fields::string(EMBEDDED_CONTEXT, field)?),
                "type" => kind = Some(ComponentKind::from(fields::string(EMBEDDED_CONTEXT, field)?)),
                "data" => payload = Some(fields::string(EMBEDDED_CONTEXT, field)?),
                _ => extra.push_field(field.clone()),
            }
        }

        let id = fields::required(EMBEDDED_CONTEXT, "id", id)?;
        let kind = fields::required(EMBEDDED_CONTEXT, "type", kind)?;
        let data = ComponentData::decode(&kind, payload.as_deref().unwrap_or_default())
            .map_err(|source| ModelError::Payload {
                id: id.clone(),
                source,
            })?;

        Ok(Self {
            id,
            kind,
            data,
            transform,
            extra,
        })
    }

    /// Encode as the body of an `embedded_components` block
    pub fn to_document(&self) -> Document {
        let mut document = Document::new();
        document.push("id", FieldValue::string(&self.id));
        document.push("type", FieldValue::string(self.kind.as_str()));
        document.push("data", FieldValue::Str(self.data.to_payload()));
        self.transform.encode_position_rotation(&mut document);
        self.transform.encode_scale(&mut document);
        for field in self.extra.fields() {
            document.push_field(field.clone());
        }
        document
    }
}

/// What a referenced resource is used for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AssetRole {
    /// Component script
    Script,
    /// Model component
    Model,
    /// Any other referenced component resource
    Component,
    /// Label font
    Font,
    /// Render material
    Material,
    /// Sprite texture source
    Texture,
    /// Anything found in an untyped payload
    Other,
}

impl AssetRole {
    /// Role implied by a resource kind when nothing else is known
    pub fn from_kind(kind: &AssetKind) -> Self {
        match kind {
            AssetKind::Script => Self::Script,
            AssetKind::Model => Self::Model,
            AssetKind::Font => Self::Font,
            AssetKind::Material => Self::Material,
            AssetKind::Atlas | AssetKind::TileSource | AssetKind::Image => Self::Texture,
            _ => Self::Other,
        }
    }

    /// Lowercase name for listings
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Script => "script",
            Self::Model => "model",
            Self::Component => "component",
            Self::Font => "font",
            Self::Material => "material",
            Self::Texture => "texture",
            Self::Other => "other",
        }
    }
}

impl fmt::Display for AssetRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A resource referenced from a game object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetReference {
    /// Id of the component holding the reference
    pub owner: String,
    /// What the resource is used for
    pub role: AssetRole,
    /// The referenced path
    pub path: AssetPath,
}

/// A game-object record
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GameObject {
    /// Referenced components, in file order
    pub components: Vec<ComponentRef>,
    /// Inline components, in file order
    pub embedded_components: Vec<EmbeddedComponent>,
    /// Top-level fields this crate does not model, kept verbatim
    pub extra: Document,
}

impl GameObject {
    /// Create an empty game object
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse and decode record text
    pub fn parse(text: &str) -> Result<Self, ModelError> {
        Self::from_document(&parse(text)?)
    }

    /// Decode a parsed record and validate it
    pub fn from_document(document: &Document) -> Result<Self, ModelError> {
        let mut object = Self::new();
        for field in document.fields() {
            match field.name.as_str() {
                "components" => {
                    let body = fields::block(OBJECT_CONTEXT, field)?;
                    object.components.push(ComponentRef::from_document(body)?);
                }
                "embedded_components" => {
                    let body = fields::block(OBJECT_CONTEXT, field)?;
                    object
                        .embedded_components
                        .push(EmbeddedComponent::from_document(body)?);
                }
                _ => object.extra.push_field(field.clone()),
            }
        }
        object.validate()?;
        Ok(object)
    }

    /// Encode as a record document
    pub fn to_document(&self) -> Document {
        let mut document = Document::new();
        for component in &self.components {
            document.push("components", FieldValue::Block(component.to_document()));
        }
        for embedded in &self.embedded_components {
            document.push("embedded_components", FieldValue::Block(embedded.to_document()));
        }
        for field in self.extra.fields() {
            document.push_field(field.clone());
        }
        document
    }

    /// Encode as record text
    pub fn to_text(&self) -> String {
        self.to_document().to_text()
    }

    /// Check that every component has a non-empty id not shared with any other
    pub fn validate(&self) -> Result<(), ModelError> {
        let mut seen = HashSet::new();
        let component_ids = self.components.iter().map(|c| (COMPONENT_CONTEXT, &c.id));
        let embedded_ids = self
            .embedded_components
            .iter()
            .map(|e| (EMBEDDED_CONTEXT, &e.id));
        for (context, id) in component_ids.chain(embedded_ids) {
            if id.is_empty() {
                return Err(ModelError::EmptyId(context));
            }
            if !seen.insert(id.as_str()) {
                return Err(ModelError::DuplicateId(id.clone()));
            }
        }
        Ok(())
    }

    /// All component ids in file order
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.components
            .iter()
            .map(|c| c.id.as_str())
            .chain(self.embedded_components.iter().map(|e| e.id.as_str()))
    }

    /// Referenced component by id
    pub fn component(&self, id: &str) -> Option<&ComponentRef> {
        self.components.iter().find(|c| c.id == id)
    }

    /// Mutable referenced component by id
    pub fn component_mut(&mut self, id: &str) -> Option<&mut ComponentRef> {
        self.components.iter_mut().find(|c| c.id == id)
    }

    /// Embedded component by id
    pub fn embedded(&self, id: &str) -> Option<&EmbeddedComponent> {
        self.embedded_components.iter().find(|e| e.id == id)
    }

    /// Mutable embedded component by id
    pub fn embedded_mut(&mut self, id: &str) -> Option<&mut EmbeddedComponent> {
        self.embedded_components.iter_mut().find(|e| e.id == id)
    }

    /// Embedded components of one type
    pub fn embedded_of_kind<'a>(
        &'a self,
        kind: &'a ComponentKind,
    ) -> impl Iterator<Item = &'a EmbeddedComponent> + 'a {
        self.embedded_components.iter().filter(move |e| &e.kind == kind)
    }

    /// Add a referenced component, rejecting a taken id
    pub fn add_component(&mut self, component: ComponentRef) -> Result<(), ModelError> {
        self.ensure_free(&component.id)?;
        self.components.push(component);
        Ok(())
    }

    /// Add an embedded component, rejecting a taken id
    pub fn add_embedded(&mut self, embedded: EmbeddedComponent) -> Result<(), ModelError> {
        self.ensure_free(&embedded.id)?;
        self.embedded_components.push(embedded);
        Ok(())
    }

    /// Remove the component with `id` from either list
    pub fn remove(&mut self, id: &str) -> bool {
        let before = self.components.len() + self.embedded_components.len();
        self.components.retain(|c| c.id != id);
        self.embedded_components.retain(|e| e.id != id);
        before != self.components.len() + self.embedded_components.len()
    }

    fn ensure_free(&self, id: &str) -> Result<(), ModelError> {
        if id.is_empty() {
            return Err(ModelError::EmptyId(OBJECT_CONTEXT));
        }
        if self.ids().any(|existing| existing == id) {
            return Err(ModelError::DuplicateId(id.to_string()));
        }
        Ok(())
    }

    /// Every resource the record references, in file order
    pub fn asset_references(&self) -> Vec<AssetReference> {
        let mut refs: Vec<AssetReference> = self
            .components
            .iter()
            .map(|c| AssetReference {
                owner: c.id.clone(),
                role: match c.component.kind() {
                    AssetKind::Script => AssetRole::Script,
                    AssetKind::Model => AssetRole::Model,
                    _ => AssetRole::Component,
                },
                path: c.component.clone(),
            })
            .collect();
        for embedded in &self.embedded_components {
            refs.extend(
                embedded
                    .data
                    .asset_references()
                    .into_iter()
                    .map(|(role, path)| AssetReference {
                        owner: embedded.id.clone(),
                        role,
                        path,
                    }),
            );
        }
        refs
    }
}
