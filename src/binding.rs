//! Apply configuration values to the properties of a [`PropertyStore`].
//!
//! Each property goes through read → refresh → apply → refresh → write on
//! its own staging [`Sample`]. A property whose store has no value yet is
//! applied onto a zeroed sample. Nothing is written back if applying fails.

use tracing::debug;

use crate::apply::Applier;
use crate::error::ReflectfigError;
use crate::inspect;
use crate::interpolate::Interpolator;
use crate::region::Sample;
use crate::store::PropertyStore;
use crate::value::ConfigValue;

/// Apply `value` to the property `name` of `store`.
pub fn apply_to_property<S: PropertyStore + ?Sized>(
    interpolator: &Interpolator<'_>,
    store: &mut S,
    name: &str,
    value: &ConfigValue,
) -> Result<(), ReflectfigError> {
    let handle = lookup(store, name)?;
    let descriptor = store.type_descriptor(&handle)?;

    let mut sample = Sample::new(&descriptor);
    if store.read_into(&handle, &mut sample)? {
        store.refresh_after_read(&handle, &mut sample)?;
    }

    Applier::new(interpolator).apply(&descriptor, &mut sample.region(), value, name)?;

    store.refresh_after_write(&handle, &mut sample)?;
    store.write_from(&handle, &sample)?;
    debug!(component = %store.name(), property = name, "applied configuration");
    Ok(())
}

/// Apply every entry of a compound to the property of the same name.
///
/// Properties are visited in key order. The first failure stops the batch
/// and is returned wrapped in [`ReflectfigError::ApplyFailed`]; properties
/// written before it keep their new values.
pub fn apply_all<S: PropertyStore + ?Sized>(
    interpolator: &Interpolator<'_>,
    store: &mut S,
    config: &ConfigValue,
) -> Result<(), ReflectfigError> {
    let ConfigValue::Compound(entries) = config else {
        return Err(ReflectfigError::ShapeMismatch {
            path: String::new(),
            target: store.name(),
            expected: "compound",
            found: config.kind_name(),
        });
    };

    for (name, value) in entries {
        apply_to_property(interpolator, store, name, value).map_err(|e| {
            ReflectfigError::ApplyFailed {
                property: name.clone(),
                component: store.name(),
                source: Box::new(e),
            }
        })?;
    }
    Ok(())
}

/// Current value of the property `name`, as a [`ConfigValue`].
pub fn property_value<S: PropertyStore + ?Sized>(
    store: &mut S,
    name: &str,
) -> Result<ConfigValue, ReflectfigError> {
    let handle = lookup(store, name)?;
    let descriptor = store.type_descriptor(&handle)?;

    let mut sample = Sample::new(&descriptor);
    if store.read_into(&handle, &mut sample)? {
        store.refresh_after_read(&handle, &mut sample)?;
    }
    inspect::extract(&descriptor, &sample)
}

fn lookup<S: PropertyStore + ?Sized>(store: &S, name: &str) -> Result<S::Handle, ReflectfigError> {
    store
        .property(name)
        .ok_or_else(|| ReflectfigError::PropertyNotFound {
            property: name.to_string(),
            component: store.name(),
            known: store.property_names(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bundle::BundlePaths;
    use crate::document::parse_plain;
    use crate::env::{Environment, UndefinedEnv};
    use crate::fixtures::test::{camera_store, read_f64, read_i32, read_string};
    use crate::store::MemoryStore;
    use crate::types::TypeDescriptor;

    fn with_interpolator<T>(f: impl FnOnce(&Interpolator<'_>) -> T) -> T {
        let env = Environment::from_vars(vec![("DEV".to_string(), "/dev/video0".to_string())]);
        let paths = BundlePaths::default();
        f(&Interpolator::new(&env, &paths, UndefinedEnv::Error))
    }

    #[test]
    fn scalar_property_is_written() {
        let mut store = camera_store();
        with_interpolator(|i| apply_to_property(i, &mut store, "fps", &"30".into())).unwrap();
        assert_eq!(read_i32(store.sample("fps").unwrap().bytes(), 0), 30);
        assert_eq!(store.write_count("fps"), 1);
    }

    #[test]
    fn unknown_property_lists_known_names() {
        let mut store = camera_store();
        let err = with_interpolator(|i| apply_to_property(i, &mut store, "gain", &"1".into()))
            .unwrap_err();
        match err {
            ReflectfigError::PropertyNotFound {
                property,
                component,
                known,
            } => {
                assert_eq!(property, "gain");
                assert_eq!(component, "camera");
                assert!(known.contains(&"fps".to_string()));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn failed_apply_does_not_write() {
        let mut store = camera_store();
        let err = with_interpolator(|i| apply_to_property(i, &mut store, "fps", &"fast".into()))
            .unwrap_err();
        assert!(matches!(err, ReflectfigError::ValueMismatch { ref path, .. } if path == "fps"));
        assert_eq!(store.write_count("fps"), 0);
        assert!(store.sample("fps").is_none());
    }

    #[test]
    fn partial_update_keeps_existing_fields() {
        let mut store = camera_store();
        with_interpolator(|i| {
            apply_to_property(i, &mut store, "origin", &parse_plain("x: 4\ny: 2").unwrap())?;
            apply_to_property(i, &mut store, "origin", &parse_plain("y: 9").unwrap())
        })
        .unwrap();
        let sample = store.sample("origin").unwrap();
        assert_eq!(read_i32(sample.bytes(), 0), 4);
        assert_eq!(sample.bytes()[4], 9);
    }

    #[test]
    fn apply_all_visits_every_entry() {
        let mut store = camera_store();
        let config =
            parse_plain("fps: 25\nexposure: 0.5\ndevice: \"<%= ENV['DEV'] %>\"").unwrap();
        with_interpolator(|i| apply_all(i, &mut store, &config)).unwrap();
        assert_eq!(read_i32(store.sample("fps").unwrap().bytes(), 0), 25);
        assert_eq!(read_f64(store.sample("exposure").unwrap().bytes(), 0), 0.5);
        assert_eq!(read_string(store.sample("device").unwrap(), 0), "/dev/video0");
    }

    #[test]
    fn string_properties_receive_the_text_as_written() {
        let mut store = MemoryStore::new("gps")
            .with_property("serial", TypeDescriptor::string())
            .with_property("hexid", TypeDescriptor::string())
            .with_property("offset", TypeDescriptor::string())
            .with_property("unset", TypeDescriptor::string());
        let config = parse_plain("serial: 007\nhexid: 0x1F\noffset: +5\nunset: ~").unwrap();
        with_interpolator(|i| apply_all(i, &mut store, &config)).unwrap();

        assert_eq!(read_string(store.sample("serial").unwrap(), 0), "007");
        assert_eq!(read_string(store.sample("hexid").unwrap(), 0), "0x1F");
        assert_eq!(read_string(store.sample("offset").unwrap(), 0), "+5");
        assert_eq!(read_string(store.sample("unset").unwrap(), 0), "~");
    }

    #[test]
    fn apply_all_stops_at_first_failure_without_rollback() {
        let mut store = camera_store();
        let config = parse_plain("device: cam\nexposure: bright\nfps: 10").unwrap();
        let err = with_interpolator(|i| apply_all(i, &mut store, &config)).unwrap_err();
        match &err {
            ReflectfigError::ApplyFailed {
                property,
                component,
                ..
            } => {
                assert_eq!(property, "exposure");
                assert_eq!(component, "camera");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(matches!(err.root_cause(), ReflectfigError::ValueMismatch { .. }));
        assert_eq!(store.write_count("device"), 1);
        assert_eq!(store.write_count("fps"), 0);
    }

    #[test]
    fn apply_all_needs_a_compound() {
        let mut store = camera_store();
        let err = with_interpolator(|i| apply_all(i, &mut store, &"5".into())).unwrap_err();
        assert!(matches!(err, ReflectfigError::ShapeMismatch { .. }));
    }

    #[test]
    fn property_value_reads_back() {
        let mut store = camera_store();
        let route = parse_plain("route:\n  - {name: a, heading: SOUTH, position: {x: 1, y: 2}}")
            .unwrap();
        with_interpolator(|i| apply_all(i, &mut store, &route)).unwrap();
        assert_eq!(
            property_value(&mut store, "route").unwrap(),
            route.get("route").unwrap().clone()
        );
    }

    #[test]
    fn property_value_of_unwritten_property_is_default() {
        let mut store = camera_store();
        assert_eq!(property_value(&mut store, "fps").unwrap(), "0".into());
        assert_eq!(
            property_value(&mut store, "device").unwrap(),
            ConfigValue::scalar("")
        );
        store.insert("raw", TypeDescriptor::uint16());
        assert_eq!(property_value(&mut store, "raw").unwrap(), "0".into());
    }
}
