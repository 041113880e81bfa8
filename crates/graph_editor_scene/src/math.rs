// SPDX-License-Identifier: MIT OR Apache-2.0
//! Vectors, rotations and local transforms as stored in records.
//!
//! Components equal to their default are omitted from the text, so every
//! vector field is read against a default profile: positions default to
//! zero, scales to one, rotations to identity, colors to opaque white.

use crate::document::{Document, Field};
use crate::fields;
use crate::model::ModelError;
use serde::{Deserialize, Serialize};

const XYZ: [&str; 3] = ["x", "y", "z"];
const XYZW: [&str; 4] = ["x", "y", "z", "w"];

/// 3D vector
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Vector3 {
    /// X component
    pub x: f32,
    /// Y component
    pub y: f32,
    /// Z component
    pub z: f32,
}

impl Vector3 {
    /// All zeros
    pub const ZERO: Self = Self::new(0.0, 0.0, 0.0);
    /// All ones
    pub const ONE: Self = Self::new(1.0, 1.0, 1.0);

    /// Create a vector
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    fn to_array(self) -> [f32; 3] {
        [self.x, self.y, self.z]
    }

    fn from_array([x, y, z]: [f32; 3]) -> Self {
        Self { x, y, z }
    }

    /// Read a vector block, filling omitted components from `default`
    pub fn decode(context: &'static str, field: &Field, default: Self) -> Result<Self, ModelError> {
        fields::components(context, field, XYZ, default.to_array()).map(Self::from_array)
    }

    /// Append a block named `name`, or nothing when `self == default`
    pub fn encode(&self, document: &mut Document, name: &str, default: Self) {
        fields::push_components(document, name, XYZ, self.to_array(), default.to_array());
    }
}

/// 4D vector, also used for colors
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Vector4 {
    /// X component (red)
    pub x: f32,
    /// Y component (green)
    pub y: f32,
    /// Z component (blue)
    pub z: f32,
    /// W component (alpha)
    pub w: f32,
}

impl Vector4 {
    /// All zeros
    pub const ZERO: Self = Self::new(0.0, 0.0, 0.0, 0.0);
    /// All ones, opaque white
    pub const ONE: Self = Self::new(1.0, 1.0, 1.0, 1.0);
    /// Zeros with `w = 1`, opaque black
    pub const W_ONE: Self = Self::new(0.0, 0.0, 0.0, 1.0);

    /// Create a vector
    pub const fn new(x: f32, y: f32, z: f32, w: f32) -> Self {
        Self { x, y, z, w }
    }

    fn to_array(self) -> [f32; 4] {
        [self.x, self.y, self.z, self.w]
    }

    fn from_array([x, y, z, w]: [f32; 4]) -> Self {
        Self { x, y, z, w }
    }

    /// Read a vector block, filling omitted components from `default`
    pub fn decode(context: &'static str, field: &Field, default: Self) -> Result<Self, ModelError> {
        fields::components(context, field, XYZW, default.to_array()).map(Self::from_array)
    }

    /// Append a block named `name`, or nothing when `self == default`
    pub fn encode(&self, document: &mut Document, name: &str, default: Self) {
        fields::push_components(document, name, XYZW, self.to_array(), default.to_array());
    }
}

impl Default for Vector4 {
    fn default() -> Self {
        Self::ZERO
    }
}

/// Rotation quaternion
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Quat {
    /// X component
    pub x: f32,
    /// Y component
    pub y: f32,
    /// Z component
    pub z: f32,
    /// W component
    pub w: f32,
}

impl Quat {
    /// No rotation
    pub const IDENTITY: Self = Self::new(0.0, 0.0, 0.0, 1.0);

    /// Create a quaternion from raw components
    pub const fn new(x: f32, y: f32, z: f32, w: f32) -> Self {
        Self { x, y, z, w }
    }

    /// Rotation of `angle` radians about the X axis
    pub fn from_rotation_x(angle: f32) -> Self {
        let (s, c) = (angle * 0.5).sin_cos();
        Self::new(s, 0.0, 0.0, c)
    }

    /// Rotation of `angle` radians about the Z axis
    pub fn from_rotation_z(angle: f32) -> Self {
        let (s, c) = (angle * 0.5).sin_cos();
        Self::new(0.0, 0.0, s, c)
    }

    /// Whether this is exactly the identity rotation
    pub fn is_identity(&self) -> bool {
        *self == Self::IDENTITY
    }

    /// Read a rotation block, filling omitted components from the identity
    pub fn decode(context: &'static str, field: &Field) -> Result<Self, ModelError> {
        let [x, y, z, w] =
            fields::components(context, field, XYZW, [0.0, 0.0, 0.0, 1.0])?;
        Ok(Self { x, y, z, w })
    }

    /// Append a `rotation` style block, or nothing for the identity
    pub fn encode(&self, document: &mut Document, name: &str) {
        fields::push_components(
            document,
            name,
            XYZW,
            [self.x, self.y, self.z, self.w],
            [0.0, 0.0, 0.0, 1.0],
        );
    }
}

impl Default for Quat {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Local transform of a component within its game object
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    /// Translation, zero when omitted
    pub position: Vector3,
    /// Rotation, identity when omitted
    pub rotation: Quat,
    /// Scale, one when omitted
    pub scale: Vector3,
}

impl Transform {
    /// The identity transform
    pub const IDENTITY: Self = Self {
        position: Vector3::ZERO,
        rotation: Quat::IDENTITY,
        scale: Vector3::ONE,
    };

    /// Identity transform moved to `position`
    pub fn from_position(position: Vector3) -> Self {
        Self {
            position,
            ..Self::IDENTITY
        }
    }

    /// Whether all three parts are at their defaults
    pub fn is_identity(&self) -> bool {
        *self == Self::IDENTITY
    }

    /// Consume `field` if it is one of `position`, `rotation` or `scale`
    pub(crate) fn decode_field(&mut self, context: &'static str, field: &Field) -> Result<bool, ModelError> {
        match field.name.as_str() {
            "position" => self.position = Vector3::decode(context, field, Vector3::ZERO)?,
            "rotation" => self.rotation = Quat::decode(context, field)?,
            "scale" => self.scale = Vector3::decode(context, field, Vector3::ONE)?,
            _ => return Ok(false),
        }
        Ok(true)
    }

    pub(crate) fn encode_position_rotation(&self, document: &mut Document) {
        self.position.encode(document, "position", Vector3::ZERO);
        self.rotation.encode(document, "rotation");
    }

    pub(crate) fn encode_scale(&self, document: &mut Document) {
        self.scale.encode(document, "scale", Vector3::ONE);
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::FieldValue;
    use crate::parser::parse;

    fn field(text: &str) -> Field {
        parse(text).unwrap().fields()[0].clone()
    }

    #[test]
    fn test_omitted_components_take_defaults() {
        let color = Vector4::decode("label", &field("color {\n  y: 0.0\n  z: 0.0\n}\n"), Vector4::ONE)
            .unwrap();
        assert_eq!(color, Vector4::new(1.0, 0.0, 0.0, 1.0));

        let rotation = Quat::decode("test", &field("rotation {\n  x: -0.70710677\n  w: 0.70710677\n}\n"))
            .unwrap();
        assert_eq!(rotation.y, 0.0);
        assert_eq!(rotation.w, 0.70710677);
    }

    #[test]
    fn test_encode_skips_default_components() {
        let mut doc = Document::new();
        Vector3::new(0.01, 0.01, 0.01).encode(&mut doc, "scale", Vector3::ONE);
        Vector3::ZERO.encode(&mut doc, "position", Vector3::ZERO);
        Vector4::new(1.0, 1.0, 1.0, 1.0).encode(&mut doc, "outline", Vector4::W_ONE);
        assert_eq!(
            doc.to_text(),
            "scale {\n  x: 0.01\n  y: 0.01\n  z: 0.01\n}\noutline {\n  x: 1.0\n  y: 1.0\n  z: 1.0\n}\n"
        );
    }

    #[test]
    fn test_unknown_component_is_rejected() {
        let err = Vector3::decode("test", &field("position { q: 1.0 }"), Vector3::ZERO).unwrap_err();
        assert!(matches!(err, ModelError::UnknownField { ref field, .. } if field == "position.q"));
    }

    #[test]
    fn test_vector_must_be_a_block() {
        let f = Field::new("position", FieldValue::float(1.0));
        let err = Vector3::decode("test", &f, Vector3::ZERO).unwrap_err();
        assert!(matches!(err, ModelError::WrongKind { expected: "block", .. }));
    }

    #[test]
    fn test_transform_decode_field() {
        let mut transform = Transform::default();
        assert!(transform.decode_field("test", &field("position { y: 14.0 }")).unwrap());
        assert!(!transform.decode_field("test", &field("id: \"x\"")).unwrap());
        assert_eq!(transform.position, Vector3::new(0.0, 14.0, 0.0));
        assert!(!transform.is_identity());
    }

    #[test]
    fn test_rotation_helpers() {
        let q = Quat::from_rotation_x(-std::f32::consts::FRAC_PI_2);
        assert!((q.x + std::f32::consts::FRAC_1_SQRT_2).abs() < 1e-6);
        assert!((q.w - std::f32::consts::FRAC_1_SQRT_2).abs() < 1e-6);
        assert!(Quat::from_rotation_z(0.0).is_identity());
    }
}
