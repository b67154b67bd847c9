//! Read a sample back into a [`ConfigValue`].
//!
//! The result has the same shape the applier accepts, so a value extracted
//! from a property can be applied to it again unchanged. Opaque, pointer
//! and unsupported fields have no textual form and are left out of
//! compounds.

use std::collections::BTreeMap;

use crate::apply::{child_path, index_path};
use crate::error::ReflectfigError;
use crate::region::{ContainerHeap, Sample, read_handle};
use crate::types::{ContainerKind, NumericKind, TypeDescriptor};
use crate::value::ConfigValue;

/// Extract the value held by `sample`, laid out as `descriptor`.
pub fn extract(descriptor: &TypeDescriptor, sample: &Sample) -> Result<ConfigValue, ReflectfigError> {
    read_value(descriptor, sample.bytes(), sample.heap(), "")
}

fn read_value(
    descriptor: &TypeDescriptor,
    bytes: &[u8],
    heap: &ContainerHeap,
    path: &str,
) -> Result<ConfigValue, ReflectfigError> {
    match descriptor {
        TypeDescriptor::Numeric { kind, size } => {
            let raw = slice(bytes, 0, *size)?;
            numeric_text(*kind, raw, path, descriptor).map(ConfigValue::Scalar)
        }
        TypeDescriptor::Enum { size, values, .. } => {
            if *size != 4 {
                return Err(ReflectfigError::UnsupportedWidth {
                    path: path.to_string(),
                    target: descriptor.name(),
                    width: *size,
                });
            }
            let code = i32::from_ne_bytes(fixed(slice(bytes, 0, 4)?));
            let name = values
                .iter()
                .find(|(_, v)| **v == code)
                .map(|(k, _)| k.clone())
                .unwrap_or_else(|| code.to_string());
            Ok(ConfigValue::Scalar(name))
        }
        TypeDescriptor::Array { element, length } => {
            let size = element.size();
            (0..*length)
                .map(|i| {
                    read_value(
                        element,
                        slice(bytes, i * size, size)?,
                        heap,
                        &index_path(path, i),
                    )
                })
                .collect::<Result<Vec<_>, _>>()
                .map(ConfigValue::Array)
        }
        TypeDescriptor::Compound { fields, .. } => {
            let mut map = BTreeMap::new();
            for field in fields {
                if matches!(
                    field.descriptor,
                    TypeDescriptor::Opaque { .. }
                        | TypeDescriptor::Pointer { .. }
                        | TypeDescriptor::Unsupported { .. }
                ) {
                    continue;
                }
                let raw = slice(bytes, field.offset, field.descriptor.size())?;
                let value = read_value(&field.descriptor, raw, heap, &child_path(path, &field.name))?;
                map.insert(field.name.clone(), value);
            }
            Ok(ConfigValue::Compound(map))
        }
        TypeDescriptor::Container { kind, element, .. } => {
            let handle = read_handle(bytes)?;
            let raw = if handle == 0 { &[][..] } else { heap.get(handle)? };
            match kind {
                ContainerKind::Text => decode_text(element, raw, path).map(ConfigValue::Scalar),
                ContainerKind::Sequence => {
                    let size = element.size();
                    if size == 0 {
                        return Ok(ConfigValue::Array(Vec::new()));
                    }
                    raw.chunks_exact(size)
                        .enumerate()
                        .map(|(i, chunk)| read_value(element, chunk, heap, &index_path(path, i)))
                        .collect::<Result<Vec<_>, _>>()
                        .map(ConfigValue::Array)
                }
            }
        }
        TypeDescriptor::Opaque { .. }
        | TypeDescriptor::Pointer { .. }
        | TypeDescriptor::Unsupported { .. } => Err(ReflectfigError::InvalidDescriptor {
            path: path.to_string(),
            reason: format!("{} has no readable value", descriptor.name()),
        }),
    }
}

fn numeric_text(
    kind: NumericKind,
    raw: &[u8],
    path: &str,
    descriptor: &TypeDescriptor,
) -> Result<String, ReflectfigError> {
    let text = match (kind, raw.len()) {
        (NumericKind::Signed, 1) => i8::from_ne_bytes(fixed(raw)).to_string(),
        (NumericKind::Signed, 2) => i16::from_ne_bytes(fixed(raw)).to_string(),
        (NumericKind::Signed, 4) => i32::from_ne_bytes(fixed(raw)).to_string(),
        (NumericKind::Signed, 8) => i64::from_ne_bytes(fixed(raw)).to_string(),
        (NumericKind::Unsigned, 1) => u8::from_ne_bytes(fixed(raw)).to_string(),
        (NumericKind::Unsigned, 2) => u16::from_ne_bytes(fixed(raw)).to_string(),
        (NumericKind::Unsigned, 4) => u32::from_ne_bytes(fixed(raw)).to_string(),
        (NumericKind::Unsigned, 8) => u64::from_ne_bytes(fixed(raw)).to_string(),
        (NumericKind::Float, 4) => f32::from_ne_bytes(fixed(raw)).to_string(),
        (NumericKind::Float, 8) => f64::from_ne_bytes(fixed(raw)).to_string(),
        (_, width) => {
            return Err(ReflectfigError::UnsupportedWidth {
                path: path.to_string(),
                target: descriptor.name(),
                width,
            });
        }
    };
    Ok(text)
}

fn decode_text(element: &TypeDescriptor, raw: &[u8], path: &str) -> Result<String, ReflectfigError> {
    match element.size() {
        1 => Ok(String::from_utf8_lossy(raw).into_owned()),
        2 => {
            let units: Vec<u16> = raw
                .chunks_exact(2)
                .map(|c| u16::from_ne_bytes(fixed(c)))
                .collect();
            Ok(String::from_utf16_lossy(&units))
        }
        4 => Ok(raw
            .chunks_exact(4)
            .filter_map(|c| char::from_u32(u32::from_ne_bytes(fixed(c))))
            .collect()),
        width => Err(ReflectfigError::UnsupportedWidth {
            path: path.to_string(),
            target: element.name(),
            width,
        }),
    }
}

fn slice(bytes: &[u8], offset: usize, len: usize) -> Result<&[u8], ReflectfigError> {
    offset
        .checked_add(len)
        .and_then(|end| bytes.get(offset..end))
        .ok_or(ReflectfigError::RegionOutOfBounds {
            offset,
            len,
            available: bytes.len(),
        })
}

/// Callers pass slices whose length matches `N`.
fn fixed<const N: usize>(raw: &[u8]) -> [u8; N] {
    let mut out = [0u8; N];
    out.copy_from_slice(&raw[..N]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::apply::Applier;
    use crate::bundle::BundlePaths;
    use crate::document::parse_plain;
    use crate::env::{Environment, UndefinedEnv};
    use crate::fixtures::test::{point, waypoint};
    use crate::interpolate::Interpolator;

    fn applied(descriptor: &TypeDescriptor, yaml_value: &ConfigValue) -> Sample {
        let env = Environment::from_vars(Vec::new());
        let paths = BundlePaths::default();
        let interp = Interpolator::new(&env, &paths, UndefinedEnv::Error);
        let mut sample = Sample::new(descriptor);
        Applier::new(&interp)
            .apply(descriptor, &mut sample.region(), yaml_value, "prop")
            .unwrap();
        sample
    }

    #[test]
    fn fresh_sample_reads_as_zeroes_and_empties() {
        let value = extract(&waypoint(), &Sample::new(&waypoint())).unwrap();
        assert_eq!(
            value.to_string(),
            r#"{"heading":"NORTH","name":"","position":{"x":"0","y":"0"}}"#
        );
    }

    #[test]
    fn applied_values_read_back() {
        let config = parse_plain("heading: SOUTH\nname: home\nposition: {x: -3, y: 7}").unwrap();
        let sample = applied(&waypoint(), &config);
        assert_eq!(extract(&waypoint(), &sample).unwrap(), config);
    }

    #[test]
    fn sequences_and_arrays_read_as_arrays() {
        let desc = TypeDescriptor::compound("/Path")
            .field("points", TypeDescriptor::sequence("/std/vector</Point>", point()))
            .field("weights", TypeDescriptor::array(TypeDescriptor::float64(), 2))
            .build();
        let config =
            parse_plain("points:\n  - {x: 1, y: 2}\n  - {x: 3, y: 4}\nweights: [0.5, 2]").unwrap();
        let value = extract(&desc, &applied(&desc, &config)).unwrap();
        assert_eq!(
            value.to_string(),
            r#"{"points":[{"x":"1","y":"2"},{"x":"3","y":"4"}],"weights":["0.5","2"]}"#
        );
    }

    #[test]
    fn unknown_enum_code_reads_as_number() {
        let desc = crate::fixtures::test::direction();
        let mut sample = Sample::new(&desc);
        sample.region().write(&7i32.to_ne_bytes()).unwrap();
        assert_eq!(extract(&desc, &sample).unwrap(), ConfigValue::scalar("7"));
    }

    #[test]
    fn opaque_fields_are_omitted() {
        let desc = TypeDescriptor::compound("/WithOpaque")
            .field("stamp", TypeDescriptor::opaque("/base/Time", 8))
            .field("x", TypeDescriptor::int32())
            .build();
        let value = extract(&desc, &Sample::new(&desc)).unwrap();
        assert_eq!(value.to_string(), r#"{"x":"0"}"#);
    }

    #[test]
    fn opaque_root_has_no_value() {
        let desc = TypeDescriptor::opaque("/base/Time", 8);
        assert!(matches!(
            extract(&desc, &Sample::new(&desc)),
            Err(ReflectfigError::InvalidDescriptor { .. })
        ));
    }
}
