//! Type-directed application of a [`ConfigValue`] onto a [`Region`].
//!
//! [`Applier::apply`] walks a descriptor and a value in lock-step:
//!
//! - **Numeric / Enum** leaves need a scalar and are coerced per
//!   [`coerce`](crate::coerce).
//! - **Array** (fixed length) needs an array of exactly that length, applied
//!   element by element.
//! - **Compound** needs a compound. Fields named in it are applied; missing
//!   fields are default-initialised; keys that are not fields are collected
//!   and reported together.
//! - **Text containers** take a scalar, interpolate `<% %>` markers, and
//!   store one element per character.
//! - **Sequences** take an array; each element is staged in a scratch
//!   buffer, applied, then copied into the container.
//! - **Opaque / Pointer / Unsupported** are skipped with a warning.
//!
//! Containers are always emptied before being filled, so applying the same
//! value twice never accumulates elements.
//!
//! Errors carry the dotted path of the value being applied, starting at the
//! property name (`camera.size.width`, `waypoints[2].x`).

use std::collections::BTreeSet;

use crate::coerce;
use crate::error::ReflectfigError;
use crate::interpolate::Interpolator;
use crate::region::Region;
use crate::types::{ContainerKind, NumericKind, TypeDescriptor};
use crate::value::ConfigValue;

pub struct Applier<'a> {
    interpolator: &'a Interpolator<'a>,
}

impl<'a> Applier<'a> {
    pub fn new(interpolator: &'a Interpolator<'a>) -> Self {
        Self { interpolator }
    }

    /// Apply `value` to `region`, which must be laid out as `descriptor`.
    pub fn apply(
        &self,
        descriptor: &TypeDescriptor,
        region: &mut Region<'_>,
        value: &ConfigValue,
        path: &str,
    ) -> Result<(), ReflectfigError> {
        match descriptor {
            TypeDescriptor::Numeric { kind, size } => {
                let text = expect_scalar(descriptor, value, path)?;
                let bytes = coerce::numeric_bytes(*kind, *size, text, path, &descriptor.name())?;
                region.write(&bytes)
            }
            TypeDescriptor::Enum { size, values, .. } => {
                let text = expect_scalar(descriptor, value, path)?;
                let code = coerce::enum_code(values, *size, text, path, &descriptor.name())?;
                region.write(&code.to_ne_bytes())
            }
            TypeDescriptor::Array { element, length } => {
                let items = expect_array(descriptor, value, path)?;
                if items.len() != *length {
                    return Err(ReflectfigError::ArrayLengthMismatch {
                        path: path.to_string(),
                        target: descriptor.name(),
                        expected: *length,
                        found: items.len(),
                    });
                }
                let size = element.size();
                for (i, item) in items.iter().enumerate() {
                    let mut slot = region.field(i * size, size)?;
                    self.apply(element, &mut slot, item, &index_path(path, i))?;
                }
                Ok(())
            }
            TypeDescriptor::Compound { fields, .. } => {
                let map = match value {
                    ConfigValue::Compound(map) => map,
                    other => return Err(shape_mismatch(descriptor, "compound", other, path)),
                };
                let mut remaining: BTreeSet<&str> = map.keys().map(String::as_str).collect();

                for field in fields {
                    let field_path = child_path(path, &field.name);
                    let mut slot = region.field(field.offset, field.descriptor.size())?;
                    match map.get(&field.name) {
                        Some(field_value) => {
                            remaining.remove(field.name.as_str());
                            self.apply(&field.descriptor, &mut slot, field_value, &field_path)?;
                        }
                        None => default_init(&field.descriptor, &mut slot, &field_path)?,
                    }
                }

                if !remaining.is_empty() {
                    return Err(ReflectfigError::UnknownFields {
                        path: path.to_string(),
                        target: descriptor.name(),
                        fields: remaining.into_iter().map(str::to_string).collect(),
                    });
                }
                Ok(())
            }
            TypeDescriptor::Container {
                kind: ContainerKind::Text,
                element,
                ..
            } => {
                let text = expect_scalar(descriptor, value, path)?;
                let resolved = self.interpolator.resolve(text)?;
                let (width, encoded) = encode_text(element, &resolved, path)?;
                region.container_reset(element)?;
                for unit in encoded.chunks(width) {
                    region.container_push(unit)?;
                }
                Ok(())
            }
            TypeDescriptor::Container {
                kind: ContainerKind::Sequence,
                element,
                ..
            } => {
                let items = expect_array(descriptor, value, path)?;
                region.container_reset(element)?;
                for (i, item) in items.iter().enumerate() {
                    let mut scratch = vec![0u8; element.size()];
                    let applied = self.apply(
                        element,
                        &mut region.scratch(&mut scratch),
                        item,
                        &index_path(path, i),
                    );
                    if let Err(e) = applied {
                        region.release_scratch(element, &scratch);
                        return Err(e);
                    }
                    region.container_push(&scratch)?;
                }
                Ok(())
            }
            TypeDescriptor::Opaque { name, .. }
            | TypeDescriptor::Pointer { name }
            | TypeDescriptor::Unsupported { name, .. } => {
                tracing::warn!(path, type_name = %name, "type is not configurable, skipping");
                Ok(())
            }
        }
    }
}

/// Bring a region not mentioned in the configuration into a valid state.
///
/// Containers are emptied and compounds recurse into their fields. Numeric,
/// enum and fixed-array regions keep whatever bytes they already hold.
pub fn default_init(
    descriptor: &TypeDescriptor,
    region: &mut Region<'_>,
    path: &str,
) -> Result<(), ReflectfigError> {
    match descriptor {
        TypeDescriptor::Compound { fields, .. } => {
            for field in fields {
                let mut slot = region.field(field.offset, field.descriptor.size())?;
                default_init(&field.descriptor, &mut slot, &child_path(path, &field.name))?;
            }
            Ok(())
        }
        TypeDescriptor::Container { element, .. } => region.container_reset(element),
        TypeDescriptor::Unsupported { name, .. } => {
            tracing::warn!(path, type_name = %name, "cannot initialise unsupported type");
            Ok(())
        }
        TypeDescriptor::Numeric { .. }
        | TypeDescriptor::Enum { .. }
        | TypeDescriptor::Array { .. }
        | TypeDescriptor::Opaque { .. }
        | TypeDescriptor::Pointer { .. } => Ok(()),
    }
}

/// Encode text as container elements of the character type `element`.
/// Returns the element width and the concatenated elements.
fn encode_text(
    element: &TypeDescriptor,
    text: &str,
    path: &str,
) -> Result<(usize, Vec<u8>), ReflectfigError> {
    let TypeDescriptor::Numeric {
        kind: NumericKind::Signed | NumericKind::Unsigned,
        size,
    } = element
    else {
        return Err(ReflectfigError::InvalidDescriptor {
            path: path.to_string(),
            reason: format!(
                "string elements must be integer characters, got {}",
                element.name()
            ),
        });
    };

    let encoded = match size {
        1 => text.as_bytes().to_vec(),
        2 => text.encode_utf16().flat_map(u16::to_ne_bytes).collect(),
        4 => text.chars().flat_map(|c| u32::from(c).to_ne_bytes()).collect(),
        _ => {
            return Err(ReflectfigError::UnsupportedWidth {
                path: path.to_string(),
                target: element.name(),
                width: *size,
            });
        }
    };
    Ok((*size, encoded))
}

fn expect_scalar<'v>(
    descriptor: &TypeDescriptor,
    value: &'v ConfigValue,
    path: &str,
) -> Result<&'v str, ReflectfigError> {
    match value {
        ConfigValue::Scalar(s) => Ok(s),
        other => Err(shape_mismatch(descriptor, "scalar", other, path)),
    }
}

fn expect_array<'v>(
    descriptor: &TypeDescriptor,
    value: &'v ConfigValue,
    path: &str,
) -> Result<&'v [ConfigValue], ReflectfigError> {
    match value {
        ConfigValue::Array(items) => Ok(items),
        other => Err(shape_mismatch(descriptor, "array", other, path)),
    }
}

fn shape_mismatch(
    descriptor: &TypeDescriptor,
    expected: &'static str,
    found: &ConfigValue,
    path: &str,
) -> ReflectfigError {
    ReflectfigError::ShapeMismatch {
        path: path.to_string(),
        target: descriptor.name(),
        expected,
        found: found.kind_name(),
    }
}

pub(crate) fn child_path(parent: &str, name: &str) -> String {
    if parent.is_empty() {
        name.to_string()
    } else {
        format!("{parent}.{name}")
    }
}

pub(crate) fn index_path(parent: &str, index: usize) -> String {
    format!("{parent}[{index}]")
}
