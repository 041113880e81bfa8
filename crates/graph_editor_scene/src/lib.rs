// SPDX-License-Identifier: MIT OR Apache-2.0
//! Game-object records for the graph editor.
//!
//! The editor canvas is populated from `.go` records: brace-delimited
//! key/value files describing a game object, the scripts and models it
//! references and the sprites, labels and cameras embedded inline.
//!
//! ## Architecture
//!
//! The crate is layered:
//! - [`lexer`] and [`parser`] turn text into a lossless [`Document`]
//! - [`document`] holds fields in file order and writes the canonical layout
//! - [`model`] decodes a document into a typed [`GameObject`]
//! - [`components`] types the `data` payload of embedded components
//! - [`asset`] validates the resource paths records point at
//!
//! Writing a parsed [`Document`] back reproduces canonical input byte for
//! byte, including the escaped interior of `data` literals.

pub mod asset;
pub mod components;
pub mod document;
mod fields;
pub mod lexer;
pub mod math;
pub mod model;
pub mod parser;

pub use asset::{AssetKind, AssetPath, AssetPathError};
pub use components::{
    BlendMode, CameraDesc, ComponentData, ComponentKind, LabelDesc, Pivot, SizeMode, SpriteDesc,
    SpriteTexture,
};
pub use document::{Document, Field, FieldValue, Number, TextString};
pub use math::{Quat, Transform, Vector3, Vector4};
pub use model::{
    AssetReference, AssetRole, ComponentRef, EmbeddedComponent, GameObject, ModelError,
    PropertyOverride, PropertyType,
};
pub use parser::{parse, ParseError, ParseErrorKind};
