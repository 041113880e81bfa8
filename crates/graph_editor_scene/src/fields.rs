// SPDX-License-Identifier: MIT OR Apache-2.0
//! Typed access to document fields, shared by the record decoders.

use crate::asset::AssetPath;
use crate::document::{Document, Field, FieldValue};
use crate::model::ModelError;

fn wrong_kind(context: &'static str, field: &Field, expected: &'static str) -> ModelError {
    ModelError::WrongKind {
        context,
        field: field.name.clone(),
        expected,
        found: field.value.kind_name(),
    }
}

pub(crate) fn string(context: &'static str, field: &Field) -> Result<String, ModelError> {
    field
        .value
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| wrong_kind(context, field, "string"))
}

pub(crate) fn asset(context: &'static str, field: &Field) -> Result<AssetPath, ModelError> {
    let path = string(context, field)?;
    AssetPath::parse(path).map_err(|source| ModelError::InvalidAssetPath {
        context,
        field: field.name.clone(),
        source,
    })
}

pub(crate) fn float(context: &'static str, field: &Field) -> Result<f32, ModelError> {
    let number = field
        .value
        .as_number()
        .ok_or_else(|| wrong_kind(context, field, "number"))?;
    number.as_f32().ok_or_else(|| ModelError::InvalidNumber {
        context,
        field: field.name.clone(),
        raw: number.raw().to_string(),
        expected: "float",
    })
}

pub(crate) fn uint(context: &'static str, field: &Field) -> Result<u32, ModelError> {
    let number = field
        .value
        .as_number()
        .ok_or_else(|| wrong_kind(context, field, "number"))?;
    number.as_u32().ok_or_else(|| ModelError::InvalidNumber {
        context,
        field: field.name.clone(),
        raw: number.raw().to_string(),
        expected: "unsigned integer",
    })
}

pub(crate) fn boolean(context: &'static str, field: &Field) -> Result<bool, ModelError> {
    match &field.value {
        FieldValue::Ident(ident) if ident == "true" => Ok(true),
        FieldValue::Ident(ident) if ident == "false" => Ok(false),
        FieldValue::Ident(ident) => Err(ModelError::UnknownEnumValue {
            context,
            field: field.name.clone(),
            value: ident.clone(),
        }),
        _ => Err(wrong_kind(context, field, "boolean")),
    }
}

/// Decode an identifier through `lookup`, typically an enum's `from_ident`
pub(crate) fn enumeration<T>(
    context: &'static str,
    field: &Field,
    lookup: fn(&str) -> Option<T>,
) -> Result<T, ModelError> {
    let ident = field
        .value
        .as_ident()
        .ok_or_else(|| wrong_kind(context, field, "identifier"))?;
    lookup(ident).ok_or_else(|| ModelError::UnknownEnumValue {
        context,
        field: field.name.clone(),
        value: ident.to_string(),
    })
}

pub(crate) fn block<'a>(context: &'static str, field: &'a Field) -> Result<&'a Document, ModelError> {
    field
        .value
        .as_block()
        .ok_or_else(|| wrong_kind(context, field, "block"))
}

pub(crate) fn required<T>(context: &'static str, name: &'static str, value: Option<T>) -> Result<T, ModelError> {
    value.ok_or(ModelError::MissingField {
        context,
        field: name,
    })
}

/// Read a vector block: every field must be one of `names`, missing ones keep `defaults`
pub(crate) fn components<const N: usize>(
    context: &'static str,
    field: &Field,
    names: [&'static str; N],
    defaults: [f32; N],
) -> Result<[f32; N], ModelError> {
    let body = block(context, field)?;
    let mut values = defaults;
    for inner in body.fields() {
        let Some(index) = names.iter().position(|n| *n == inner.name) else {
            return Err(ModelError::UnknownField {
                context,
                field: format!("{}.{}", field.name, inner.name),
            });
        };
        values[index] = float(context, inner)?;
    }
    Ok(values)
}

/// Write a vector block holding only the components that differ from `defaults`
///
/// When every component is at its default the block is left out entirely.
pub(crate) fn push_components<const N: usize>(
    document: &mut Document,
    name: &str,
    names: [&'static str; N],
    values: [f32; N],
    defaults: [f32; N],
) {
    let body: Document = names
        .iter()
        .zip(values.iter().zip(defaults.iter()))
        .filter(|(_, (value, default))| value != default)
        .map(|(n, (value, _))| Field::new(*n, FieldValue::float(*value)))
        .collect();
    if !body.is_empty() {
        document.push(name, FieldValue::Block(body));
    }
}

pub(crate) fn push_opt(document: &mut Document, name: &str, value: Option<FieldValue>) {
    if let Some(value) = value {
        document.push(name, value);
    }
}
