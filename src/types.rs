//! Type descriptors: the reflected layout of the values being configured.
//!
//! Descriptors are supplied by the property store and describe both the
//! category of a value (how a [`ConfigValue`](crate::ConfigValue) is
//! coerced into it) and its binary layout (sizes and field offsets).
//!
//! Numeric and enum leaves hold native-endian values. Containers occupy a
//! [`CONTAINER_SLOT_SIZE`]-byte slot holding a handle into the owning
//! sample's container heap (see [`region`](crate::region)).

use std::collections::BTreeMap;

/// Size in bytes of a container slot inside a region.
pub const CONTAINER_SLOT_SIZE: usize = 8;

/// Size in bytes of a pointer slot.
pub const POINTER_SIZE: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumericKind {
    Signed,
    Unsigned,
    Float,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerKind {
    /// A string: configured from a scalar, one element per character.
    Text,
    /// Any other variable-length container: configured from an array.
    Sequence,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub name: String,
    pub offset: usize,
    pub descriptor: TypeDescriptor,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TypeDescriptor {
    Numeric {
        kind: NumericKind,
        size: usize,
    },
    Enum {
        name: String,
        size: usize,
        values: BTreeMap<String, i32>,
    },
    Array {
        element: Box<TypeDescriptor>,
        length: usize,
    },
    Container {
        name: String,
        kind: ContainerKind,
        element: Box<TypeDescriptor>,
    },
    Compound {
        name: String,
        size: usize,
        fields: Vec<Field>,
    },
    Opaque {
        name: String,
        size: usize,
    },
    Pointer {
        name: String,
    },
    Unsupported {
        name: String,
        size: usize,
    },
}

impl TypeDescriptor {
    pub fn int8() -> Self {
        Self::numeric(NumericKind::Signed, 1)
    }
    pub fn int16() -> Self {
        Self::numeric(NumericKind::Signed, 2)
    }
    pub fn int32() -> Self {
        Self::numeric(NumericKind::Signed, 4)
    }
    pub fn int64() -> Self {
        Self::numeric(NumericKind::Signed, 8)
    }
    pub fn uint8() -> Self {
        Self::numeric(NumericKind::Unsigned, 1)
    }
    pub fn uint16() -> Self {
        Self::numeric(NumericKind::Unsigned, 2)
    }
    pub fn uint32() -> Self {
        Self::numeric(NumericKind::Unsigned, 4)
    }
    pub fn uint64() -> Self {
        Self::numeric(NumericKind::Unsigned, 8)
    }
    pub fn float32() -> Self {
        Self::numeric(NumericKind::Float, 4)
    }
    pub fn float64() -> Self {
        Self::numeric(NumericKind::Float, 8)
    }

    /// Booleans are one-byte unsigned integers.
    pub fn boolean() -> Self {
        Self::uint8()
    }

    pub fn numeric(kind: NumericKind, size: usize) -> Self {
        TypeDescriptor::Numeric { kind, size }
    }

    /// A string of one-byte characters.
    pub fn string() -> Self {
        TypeDescriptor::Container {
            name: "/std/string".into(),
            kind: ContainerKind::Text,
            element: Box::new(Self::int8()),
        }
    }

    pub fn sequence(name: impl Into<String>, element: TypeDescriptor) -> Self {
        TypeDescriptor::Container {
            name: name.into(),
            kind: ContainerKind::Sequence,
            element: Box::new(element),
        }
    }

    pub fn array(element: TypeDescriptor, length: usize) -> Self {
        TypeDescriptor::Array {
            element: Box::new(element),
            length,
        }
    }

    /// A 32-bit enum.
    pub fn enumeration<K: Into<String>>(
        name: impl Into<String>,
        values: impl IntoIterator<Item = (K, i32)>,
    ) -> Self {
        TypeDescriptor::Enum {
            name: name.into(),
            size: 4,
            values: values.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }

    pub fn opaque(name: impl Into<String>, size: usize) -> Self {
        TypeDescriptor::Opaque {
            name: name.into(),
            size,
        }
    }

    pub fn pointer(name: impl Into<String>) -> Self {
        TypeDescriptor::Pointer { name: name.into() }
    }

    pub fn compound(name: impl Into<String>) -> CompoundBuilder {
        CompoundBuilder::new(name)
    }

    /// Number of bytes a value of this type occupies.
    pub fn size(&self) -> usize {
        match self {
            TypeDescriptor::Numeric { size, .. }
            | TypeDescriptor::Enum { size, .. }
            | TypeDescriptor::Compound { size, .. }
            | TypeDescriptor::Opaque { size, .. }
            | TypeDescriptor::Unsupported { size, .. } => *size,
            TypeDescriptor::Array { element, length } => element.size() * length,
            TypeDescriptor::Container { .. } => CONTAINER_SLOT_SIZE,
            TypeDescriptor::Pointer { .. } => POINTER_SIZE,
        }
    }

    /// Natural alignment, as a C compiler would lay the type out.
    pub fn alignment(&self) -> usize {
        match self {
            TypeDescriptor::Numeric { size, .. } | TypeDescriptor::Enum { size, .. } => {
                (*size).clamp(1, 8)
            }
            TypeDescriptor::Array { element, .. } => element.alignment(),
            TypeDescriptor::Container { .. } => CONTAINER_SLOT_SIZE,
            TypeDescriptor::Pointer { .. } => POINTER_SIZE,
            TypeDescriptor::Compound { fields, .. } => fields
                .iter()
                .map(|f| f.descriptor.alignment())
                .max()
                .unwrap_or(1),
            TypeDescriptor::Opaque { .. } | TypeDescriptor::Unsupported { .. } => 1,
        }
    }

    /// Human-readable type name for diagnostics.
    pub fn name(&self) -> String {
        match self {
            TypeDescriptor::Numeric { kind, size } => match kind {
                NumericKind::Signed => format!("/int{}_t", size * 8),
                NumericKind::Unsigned => format!("/uint{}_t", size * 8),
                NumericKind::Float if *size == 4 => "/float".to_string(),
                NumericKind::Float if *size == 8 => "/double".to_string(),
                NumericKind::Float => format!("/float{}", size * 8),
            },
            TypeDescriptor::Array { element, length } => format!("{}[{length}]", element.name()),
            TypeDescriptor::Enum { name, .. }
            | TypeDescriptor::Container { name, .. }
            | TypeDescriptor::Compound { name, .. }
            | TypeDescriptor::Opaque { name, .. }
            | TypeDescriptor::Pointer { name }
            | TypeDescriptor::Unsupported { name, .. } => name.clone(),
        }
    }
}

/// Lays out a compound field by field.
///
/// [`field`](Self::field) places each field at the next offset aligned for
/// its type; [`field_at`](Self::field_at) takes an explicit offset. The final
/// size is rounded up to the compound's alignment.
#[derive(Debug, Clone)]
#[must_use = "builders do nothing until .build() is called"]
pub struct CompoundBuilder {
    name: String,
    fields: Vec<Field>,
    end: usize,
}

impl CompoundBuilder {
    fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
            end: 0,
        }
    }

    pub fn field(self, name: impl Into<String>, descriptor: TypeDescriptor) -> Self {
        let offset = align_up(self.end, descriptor.alignment());
        self.field_at(name, descriptor, offset)
    }

    pub fn field_at(
        mut self,
        name: impl Into<String>,
        descriptor: TypeDescriptor,
        offset: usize,
    ) -> Self {
        self.end = self.end.max(offset + descriptor.size());
        self.fields.push(Field {
            name: name.into(),
            offset,
            descriptor,
        });
        self
    }

    pub fn build(self) -> TypeDescriptor {
        let align = self
            .fields
            .iter()
            .map(|f| f.descriptor.alignment())
            .max()
            .unwrap_or(1);
        TypeDescriptor::Compound {
            name: self.name,
            size: align_up(self.end, align),
            fields: self.fields,
        }
    }
}

fn align_up(offset: usize, align: usize) -> usize {
    offset.div_ceil(align) * align
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_sizes_and_names() {
        assert_eq!(TypeDescriptor::int32().size(), 4);
        assert_eq!(TypeDescriptor::uint64().size(), 8);
        assert_eq!(TypeDescriptor::int16().name(), "/int16_t");
        assert_eq!(TypeDescriptor::uint8().name(), "/uint8_t");
        assert_eq!(TypeDescriptor::float32().name(), "/float");
        assert_eq!(TypeDescriptor::float64().name(), "/double");
    }

    #[test]
    fn compound_fields_are_naturally_aligned() {
        let desc = TypeDescriptor::compound("/Sample")
            .field("flag", TypeDescriptor::uint8())
            .field("value", TypeDescriptor::float64())
            .field("count", TypeDescriptor::int16())
            .build();
        let TypeDescriptor::Compound { fields, size, .. } = &desc else {
            panic!("expected compound");
        };
        let offsets: Vec<usize> = fields.iter().map(|f| f.offset).collect();
        assert_eq!(offsets, vec![0, 8, 16]);
        assert_eq!(*size, 24);
        assert_eq!(desc.alignment(), 8);
    }

    #[test]
    fn explicit_offsets_are_kept() {
        let desc = TypeDescriptor::compound("/Packed")
            .field_at("a", TypeDescriptor::uint8(), 0)
            .field_at("b", TypeDescriptor::uint8(), 3)
            .build();
        assert_eq!(desc.size(), 4);
    }

    #[test]
    fn arrays_multiply_element_size() {
        let desc = TypeDescriptor::array(TypeDescriptor::int16(), 5);
        assert_eq!(desc.size(), 10);
        assert_eq!(desc.alignment(), 2);
        assert_eq!(desc.name(), "/int16_t[5]");
    }

    #[test]
    fn containers_occupy_a_slot() {
        assert_eq!(TypeDescriptor::string().size(), CONTAINER_SLOT_SIZE);
        let seq = TypeDescriptor::sequence("/std/vector</double>", TypeDescriptor::float64());
        assert_eq!(seq.size(), CONTAINER_SLOT_SIZE);
    }

    #[test]
    fn empty_compound_has_zero_size() {
        let desc = TypeDescriptor::compound("/Empty").build();
        assert_eq!(desc.size(), 0);
        assert_eq!(desc.alignment(), 1);
    }
}
