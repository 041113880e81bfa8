// SPDX-License-Identifier: MIT OR Apache-2.0
//! Camera component payload.

use crate::document::{Document, FieldValue};
use crate::fields;
use crate::model::ModelError;
use serde::{Deserialize, Serialize};

const CONTEXT: &str = "camera";

/// Camera projection parameters
///
/// Every field is optional and written only when set, in engine order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CameraDesc {
    /// Width over height, used when `auto_aspect_ratio` is off
    pub aspect_ratio: Option<f32>,
    /// Vertical field of view in radians
    pub fov: Option<f32>,
    /// Near clipping plane
    pub near_z: Option<f32>,
    /// Far clipping plane
    pub far_z: Option<f32>,
    /// `1` to follow the window's aspect ratio
    pub auto_aspect_ratio: Option<u32>,
    /// `1` for an orthographic projection
    pub orthographic_projection: Option<u32>,
    /// Zoom applied in orthographic mode
    pub orthographic_zoom: Option<f32>,
    /// Fields this crate does not model, kept verbatim
    pub extra: Document,
}

impl CameraDesc {
    /// Decode a camera payload
    pub fn from_document(document: &Document) -> Result<Self, ModelError> {
        let mut camera = Self::default();
        for field in document.fields() {
            match field.name.as_str() {
                "aspect_ratio" => camera.aspect_ratio = Some(fields::float(CONTEXT, field)?),
                "fov" => camera.fov = Some(fields::float(CONTEXT, field)?),
                "near_z" => camera.near_z = Some(fields::float(CONTEXT, field)?),
                "far_z" => camera.far_z = Some(fields::float(CONTEXT, field)?),
                "auto_aspect_ratio" => camera.auto_aspect_ratio = Some(fields::uint(CONTEXT, field)?),
                "orthographic_projection" => {
                    camera.orthographic_projection = Some(fields::uint(CONTEXT, field)?);
                }
                "orthographic_zoom" => camera.orthographic_zoom = Some(fields::float(CONTEXT, field)?),
                _ => camera.extra.push_field(field.clone()),
            }
        }
        Ok(camera)
    }

    /// Encode in engine field order
    pub fn to_document(&self) -> Document {
        let mut document = Document::new();
        fields::push_opt(&mut document, "aspect_ratio", self.aspect_ratio.map(FieldValue::float));
        fields::push_opt(&mut document, "fov", self.fov.map(FieldValue::float));
        fields::push_opt(&mut document, "near_z", self.near_z.map(FieldValue::float));
        fields::push_opt(&mut document, "far_z", self.far_z.map(FieldValue::float));
        fields::push_opt(&mut document, "auto_aspect_ratio", self.auto_aspect_ratio.map(FieldValue::uint));
        fields::push_opt(
            &mut document,
            "orthographic_projection",
            self.orthographic_projection.map(FieldValue::uint),
        );
        fields::push_opt(&mut document, "orthographic_zoom", self.orthographic_zoom.map(FieldValue::float));
        for field in self.extra.fields() {
            document.push_field(field.clone());
        }
        document
    }

    /// Whether the projection follows the window's aspect ratio
    pub fn is_auto_aspect(&self) -> bool {
        self.auto_aspect_ratio.unwrap_or(0) != 0
    }

    /// Whether the projection is orthographic
    pub fn is_orthographic(&self) -> bool {
        self.orthographic_projection.unwrap_or(0) != 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    const EDITOR_CAMERA_3D: &str = "aspect_ratio: 1.0\nfov: 0.7854\nnear_z: 0.1\nfar_z: 100.0\nauto_aspect_ratio: 1\northographic_zoom: 10.0\n";

    #[test]
    fn test_decode_editor_camera() {
        let camera = CameraDesc::from_document(&parse(EDITOR_CAMERA_3D).unwrap()).unwrap();
        assert_eq!(camera.fov, Some(0.7854));
        assert_eq!(camera.far_z, Some(100.0));
        assert!(camera.is_auto_aspect());
        assert!(!camera.is_orthographic());
        assert_eq!(camera.orthographic_zoom, Some(10.0));
        assert!(camera.extra.is_empty());
    }

    #[test]
    fn test_encode_matches_engine_layout() {
        let camera = CameraDesc::from_document(&parse(EDITOR_CAMERA_3D).unwrap()).unwrap();
        assert_eq!(camera.to_document().to_text(), EDITOR_CAMERA_3D);
    }

    #[test]
    fn test_unknown_fields_are_kept_last() {
        let camera = CameraDesc::from_document(&parse("fov: 1.0\nlegacy_mode: 2\n").unwrap()).unwrap();
        assert_eq!(camera.extra.len(), 1);
        assert_eq!(camera.to_document().to_text(), "fov: 1.0\nlegacy_mode: 2\n");
    }

    #[test]
    fn test_auto_aspect_must_be_unsigned() {
        let err = CameraDesc::from_document(&parse("auto_aspect_ratio: 1.5\n").unwrap()).unwrap_err();
        assert!(matches!(err, ModelError::InvalidNumber { expected: "unsigned integer", .. }));
    }
}
