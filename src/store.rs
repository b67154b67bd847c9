//! The property store seam.
//!
//! A [`PropertyStore`] exposes named, typed properties of a live component.
//! Reads and writes may cross a process boundary and block; the engine calls
//! them synchronously and never retries.

use std::collections::BTreeMap;

use crate::error::ReflectfigError;
use crate::region::Sample;
use crate::types::TypeDescriptor;

pub trait PropertyStore {
    type Handle;

    /// Name of the component, used in diagnostics.
    fn name(&self) -> String;

    fn property(&self, name: &str) -> Option<Self::Handle>;

    fn property_names(&self) -> Vec<String>;

    fn type_descriptor(&self, handle: &Self::Handle) -> Result<TypeDescriptor, ReflectfigError>;

    /// Copy the current value into `sample`. Returns `false` when the
    /// property has no value yet; `sample` is then left untouched.
    fn read_into(
        &mut self,
        handle: &Self::Handle,
        sample: &mut Sample,
    ) -> Result<bool, ReflectfigError>;

    /// Called after a successful read, for stores whose native
    /// representation must be converted into the sample layout.
    fn refresh_after_read(
        &mut self,
        _handle: &Self::Handle,
        _sample: &mut Sample,
    ) -> Result<(), ReflectfigError> {
        Ok(())
    }

    /// Called once the sample has been modified, before it is written back.
    fn refresh_after_write(
        &mut self,
        _handle: &Self::Handle,
        _sample: &mut Sample,
    ) -> Result<(), ReflectfigError> {
        Ok(())
    }

    fn write_from(&mut self, handle: &Self::Handle, sample: &Sample) -> Result<(), ReflectfigError>;
}

#[derive(Debug, Clone)]
struct StoredProperty {
    descriptor: TypeDescriptor,
    value: Option<Sample>,
    writes: usize,
}

/// An in-process property store.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    name: String,
    properties: BTreeMap<String, StoredProperty>,
}

impl MemoryStore {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            properties: BTreeMap::new(),
        }
    }

    /// Declare a property with no value yet.
    pub fn with_property(mut self, name: impl Into<String>, descriptor: TypeDescriptor) -> Self {
        self.insert(name, descriptor);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, descriptor: TypeDescriptor) {
        self.properties.insert(
            name.into(),
            StoredProperty {
                descriptor,
                value: None,
                writes: 0,
            },
        );
    }

    /// Current value of a property, if it was ever written.
    pub fn sample(&self, name: &str) -> Option<&Sample> {
        self.properties.get(name).and_then(|p| p.value.as_ref())
    }

    pub fn descriptor(&self, name: &str) -> Option<&TypeDescriptor> {
        self.properties.get(name).map(|p| &p.descriptor)
    }

    /// How many times a property was written back.
    pub fn write_count(&self, name: &str) -> usize {
        self.properties.get(name).map_or(0, |p| p.writes)
    }

    fn stored(&self, name: &str) -> Result<&StoredProperty, ReflectfigError> {
        self.properties.get(name).ok_or_else(|| self.missing(name))
    }

    fn missing(&self, name: &str) -> ReflectfigError {
        ReflectfigError::PropertyNotFound {
            property: name.to_string(),
            component: self.name.clone(),
            known: self.property_names(),
        }
    }
}

impl PropertyStore for MemoryStore {
    type Handle = String;

    fn name(&self) -> String {
        self.name.clone()
    }

    fn property(&self, name: &str) -> Option<String> {
        self.properties.contains_key(name).then(|| name.to_string())
    }

    fn property_names(&self) -> Vec<String> {
        self.properties.keys().cloned().collect()
    }

    fn type_descriptor(&self, handle: &String) -> Result<TypeDescriptor, ReflectfigError> {
        Ok(self.stored(handle)?.descriptor.clone())
    }

    fn read_into(&mut self, handle: &String, sample: &mut Sample) -> Result<bool, ReflectfigError> {
        match &self.stored(handle)?.value {
            Some(value) => {
                sample.clone_from(value);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn write_from(&mut self, handle: &String, sample: &Sample) -> Result<(), ReflectfigError> {
        let Some(stored) = self.properties.get_mut(handle) else {
            return Err(self.missing(handle));
        };
        if sample.bytes().len() != stored.descriptor.size() {
            return Err(ReflectfigError::Store {
                property: handle.clone(),
                reason: format!(
                    "sample holds {} bytes, {} expects {}",
                    sample.bytes().len(),
                    stored.descriptor.name(),
                    stored.descriptor.size()
                ),
            });
        }
        stored.value = Some(sample.clone());
        stored.writes += 1;
        Ok(())
    }
}
