#[cfg(test)]
pub mod test {
    use crate::region::{Sample, read_handle};
    use crate::store::MemoryStore;
    use crate::types::TypeDescriptor;

    /// `{ x: int32 @0, y: uint8 @4 }`, 8 bytes.
    pub fn point() -> TypeDescriptor {
        TypeDescriptor::compound("/Point")
            .field("x", TypeDescriptor::int32())
            .field("y", TypeDescriptor::uint8())
            .build()
    }

    pub fn direction() -> TypeDescriptor {
        TypeDescriptor::enumeration("/Direction", [("NORTH", 0), ("SOUTH", 1)])
    }

    /// `{ heading: Direction @0, name: string @8, position: Point @16 }`.
    pub fn waypoint() -> TypeDescriptor {
        TypeDescriptor::compound("/Waypoint")
            .field("heading", direction())
            .field("name", TypeDescriptor::string())
            .field("position", point())
            .build()
    }

    /// A component with one property of each interesting shape.
    pub fn camera_store() -> MemoryStore {
        MemoryStore::new("camera")
            .with_property("fps", TypeDescriptor::int32())
            .with_property("exposure", TypeDescriptor::float64())
            .with_property("device", TypeDescriptor::string())
            .with_property("origin", point())
            .with_property(
                "route",
                TypeDescriptor::sequence("/std/vector</Waypoint>", waypoint()),
            )
    }

    pub fn read_i32(bytes: &[u8], offset: usize) -> i32 {
        i32::from_ne_bytes(bytes[offset..offset + 4].try_into().unwrap())
    }

    pub fn read_f64(bytes: &[u8], offset: usize) -> f64 {
        f64::from_ne_bytes(bytes[offset..offset + 8].try_into().unwrap())
    }

    /// The one-byte string stored in the container slot at `offset`.
    pub fn read_string(sample: &Sample, offset: usize) -> String {
        let handle = read_handle(&sample.bytes()[offset..]).unwrap();
        if handle == 0 {
            return String::new();
        }
        String::from_utf8(sample.heap().get(handle).unwrap().to_vec()).unwrap()
    }

    #[test]
    fn waypoint_layout() {
        let TypeDescriptor::Compound { fields, size, .. } = waypoint() else {
            panic!("expected compound");
        };
        let offsets: Vec<usize> = fields.iter().map(|f| f.offset).collect();
        assert_eq!(offsets, vec![0, 8, 16]);
        assert_eq!(size, 24);
        assert_eq!(point().size(), 8);
    }
}
