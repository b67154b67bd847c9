//! Owned byte arenas and bounds-checked views into them.
//!
//! A [`Sample`] is the engine's staging copy of one property: a byte buffer
//! laid out per the property's descriptor, plus a [`ContainerHeap`] holding
//! the contents of every variable-length container reachable from it.
//! A container slot stores a native-endian `u64` handle into that heap;
//! handle `0` is a slot that was never initialised.
//!
//! [`Region`] is a mutable window (`bytes` + heap) that the applier walks.
//! Sub-regions are carved with [`Region::field`], which checks bounds
//! instead of trusting offsets coming from external descriptors.

use crate::error::ReflectfigError;
use crate::types::{CONTAINER_SLOT_SIZE, TypeDescriptor};

/// Storage for container contents, addressed by handle.
///
/// Released handles go on a free list and are handed out again by the next
/// allocation, so re-applying a configuration does not grow the heap.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContainerHeap {
    buffers: Vec<Vec<u8>>,
    free: Vec<u64>,
}

impl ContainerHeap {
    fn allocate(&mut self) -> u64 {
        if let Some(handle) = self.free.pop() {
            return handle;
        }
        self.buffers.push(Vec::new());
        self.buffers.len() as u64
    }

    /// Raw element bytes of the container behind `handle`.
    pub fn get(&self, handle: u64) -> Result<&[u8], ReflectfigError> {
        handle
            .checked_sub(1)
            .and_then(|idx| self.buffers.get(idx as usize))
            .map(Vec::as_slice)
            .ok_or(ReflectfigError::InvalidContainerHandle(handle))
    }

    fn get_mut(&mut self, handle: u64) -> Result<&mut Vec<u8>, ReflectfigError> {
        handle
            .checked_sub(1)
            .and_then(|idx| self.buffers.get_mut(idx as usize))
            .ok_or(ReflectfigError::InvalidContainerHandle(handle))
    }

    /// Number of buffers, in use or free.
    pub fn len(&self) -> usize {
        self.buffers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffers.is_empty()
    }

    /// Number of buffers waiting to be reused.
    pub fn free_count(&self) -> usize {
        self.free.len()
    }

    /// Release every container reachable from `bytes`, laid out as
    /// `descriptor`. Unset and unknown handles are skipped.
    pub fn release_within(&mut self, descriptor: &TypeDescriptor, bytes: &[u8]) {
        match descriptor {
            TypeDescriptor::Container { element, .. } => {
                if let Ok(handle) = read_handle(bytes) {
                    self.release(handle, element);
                }
            }
            TypeDescriptor::Compound { fields, .. } => {
                for field in fields {
                    let end = field.offset.checked_add(field.descriptor.size());
                    if let Some(raw) = end.and_then(|end| bytes.get(field.offset..end)) {
                        self.release_within(&field.descriptor, raw);
                    }
                }
            }
            TypeDescriptor::Array { element, .. } => self.release_elements(element, bytes),
            TypeDescriptor::Numeric { .. }
            | TypeDescriptor::Enum { .. }
            | TypeDescriptor::Opaque { .. }
            | TypeDescriptor::Pointer { .. }
            | TypeDescriptor::Unsupported { .. } => {}
        }
    }

    fn release(&mut self, handle: u64, element: &TypeDescriptor) {
        if handle == 0 || self.free.contains(&handle) {
            return;
        }
        let Ok(buffer) = self.get_mut(handle) else {
            return;
        };
        let contents = std::mem::take(buffer);
        self.release_elements(element, &contents);
        self.free.push(handle);
    }

    fn release_elements(&mut self, element: &TypeDescriptor, contents: &[u8]) {
        let size = element.size();
        if size == 0 {
            return;
        }
        for chunk in contents.chunks_exact(size) {
            self.release_within(element, chunk);
        }
    }
}

/// An owned, zero-initialised value of some descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sample {
    bytes: Vec<u8>,
    heap: ContainerHeap,
}

impl Sample {
    pub fn new(descriptor: &TypeDescriptor) -> Self {
        Self {
            bytes: vec![0; descriptor.size()],
            heap: ContainerHeap::default(),
        }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn heap(&self) -> &ContainerHeap {
        &self.heap
    }

    /// A mutable view over the whole sample.
    pub fn region(&mut self) -> Region<'_> {
        Region {
            bytes: &mut self.bytes,
            heap: &mut self.heap,
        }
    }
}

/// Read the container handle stored in a slot.
pub fn read_handle(slot: &[u8]) -> Result<u64, ReflectfigError> {
    let raw: [u8; CONTAINER_SLOT_SIZE] =
        slot.get(..CONTAINER_SLOT_SIZE)
            .and_then(|s| s.try_into().ok())
            .ok_or(ReflectfigError::RegionOutOfBounds {
                offset: 0,
                len: CONTAINER_SLOT_SIZE,
                available: slot.len(),
            })?;
    Ok(u64::from_ne_bytes(raw))
}

/// A bounds-checked mutable view into a sample or a scratch buffer.
#[derive(Debug)]
pub struct Region<'a> {
    bytes: &'a mut [u8],
    heap: &'a mut ContainerHeap,
}

impl<'a> Region<'a> {
    pub fn new(bytes: &'a mut [u8], heap: &'a mut ContainerHeap) -> Self {
        Self { bytes, heap }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn bytes(&self) -> &[u8] {
        self.bytes
    }

    /// The `len` bytes at `offset`, sharing this region's heap.
    pub fn field(&mut self, offset: usize, len: usize) -> Result<Region<'_>, ReflectfigError> {
        let available = self.bytes.len();
        let end = offset
            .checked_add(len)
            .filter(|end| *end <= available)
            .ok_or(ReflectfigError::RegionOutOfBounds {
                offset,
                len,
                available,
            })?;
        Ok(Region {
            bytes: &mut self.bytes[offset..end],
            heap: &mut *self.heap,
        })
    }

    /// A region over a caller-owned scratch buffer that shares this heap,
    /// so containers nested in the scratch value stay valid once copied.
    pub fn scratch<'b>(&'b mut self, bytes: &'b mut [u8]) -> Region<'b> {
        Region {
            bytes,
            heap: &mut *self.heap,
        }
    }

    /// Overwrite the region with `data`, which must be exactly as long.
    pub fn write(&mut self, data: &[u8]) -> Result<(), ReflectfigError> {
        if data.len() != self.bytes.len() {
            return Err(ReflectfigError::RegionOutOfBounds {
                offset: 0,
                len: data.len(),
                available: self.bytes.len(),
            });
        }
        self.bytes.copy_from_slice(data);
        Ok(())
    }

    /// Treat this region as a container slot of `element`s and make it
    /// empty, allocating storage if the slot was never initialised.
    /// Containers nested in the old elements are released.
    pub fn container_reset(&mut self, element: &TypeDescriptor) -> Result<(), ReflectfigError> {
        let handle = read_handle(self.bytes)?;
        if handle == 0 {
            let handle = self.heap.allocate();
            self.bytes[..CONTAINER_SLOT_SIZE].copy_from_slice(&handle.to_ne_bytes());
        } else {
            let contents = std::mem::take(self.heap.get_mut(handle)?);
            self.heap.release_elements(element, &contents);
        }
        Ok(())
    }

    /// Release the containers reachable from a scratch buffer that will not
    /// be pushed.
    pub fn release_scratch(&mut self, descriptor: &TypeDescriptor, bytes: &[u8]) {
        self.heap.release_within(descriptor, bytes);
    }

    /// Append one element's bytes to the container in this slot.
    pub fn container_push(&mut self, element: &[u8]) -> Result<(), ReflectfigError> {
        let handle = read_handle(self.bytes)?;
        self.heap.get_mut(handle)?.extend_from_slice(element);
        Ok(())
    }

    /// Raw contents of the container in this slot.
    pub fn container_bytes(&self) -> Result<&[u8], ReflectfigError> {
        self.heap.get(read_handle(self.bytes)?)
    }
}
