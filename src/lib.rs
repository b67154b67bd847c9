//! Sectioned YAML configuration, injected into reflected properties.
//!
//! Reflectfig loads configuration files split into named sections, overlays
//! the sections you ask for, and writes the result into the properties of a
//! live component. The layout of each property is not known at compile
//! time: it comes from a [`TypeDescriptor`] supplied by the component, and
//! values are coerced into raw bytes laid out as that descriptor says.
//!
//! ```ignore
//! let mut cfg = Reflectfig::builder().bundle("/opt/bundles/rover").build()?;
//! cfg.apply_config("camera.yml", &mut camera, &["default", "outdoor"])?;
//! ```
//!
//! # Document format
//!
//! A configuration file is a sequence of sections. A line starting with
//! `--- name:` opens a section; everything up to the next such line is
//! plain YAML and must be a mapping at the top level:
//!
//! ```yaml
//! --- name:default
//! fps: 30
//! device: /dev/video0
//! --- name:outdoor
//! exposure: 0.002
//! ```
//!
//! Every scalar is kept as text; how it is interpreted depends on the
//! property it lands in. Lines before the first section header are ignored.
//! The section name is the rest of the header line, kept verbatim.
//!
//! # Merging
//!
//! [`Configurator::merge_sections`] overlays sections left to right.
//! Mappings merge key by key, recursively; anything else (scalars, and
//! arrays as a whole) is replaced by the later section. Asking for a section
//! that does not exist fails and lists the known section names.
//!
//! # Applying values
//!
//! Each top-level key names a property. The property's current value is
//! read into a staging [`Sample`], the configuration value is applied on top
//! of it, and the sample is written back:
//!
//! | Descriptor | Accepts | Notes |
//! |------------|---------|-------|
//! | numeric | scalar | unsigned targets accept `true`/`false`; floats accept `nan`, `.inf` |
//! | enum | scalar | `NAME` or `:NAME`; unknown names list the valid ones |
//! | fixed array | array | length must match exactly |
//! | compound | mapping | missing fields keep their value; unknown keys are errors |
//! | string | scalar | `<% %>` markers are expanded first |
//! | sequence | array | emptied, then filled element by element |
//! | opaque, pointer | anything | skipped with a warning |
//!
//! [`Configurator::apply_all`] stops at the first failing property. Earlier
//! properties stay written; there is no rollback.
//!
//! # Interpolation
//!
//! String values may contain markers:
//!
//! - `<%= ENV['HOME'] %>` is replaced by an environment variable. What an
//!   unset variable does is set by [`UndefinedEnv`].
//! - `<%= BUNDLES['data/map.bin'] %>` is replaced by the absolute path of a
//!   file found in the bundle roots.
//!
//! # Bundles and settings
//!
//! Bundle roots and the interpolation policy come from [`Settings`], loaded
//! with confique from defaults, an optional TOML file and `REFLECTFIG_*`
//! environment variables. The active bundle's configuration directory holds
//! one `<model>.yml` per component model, used by
//! [`Configurator::apply_component`].
//!
//! # Stores and components
//!
//! The engine talks to components through the [`PropertyStore`] and
//! [`Component`] traits. [`MemoryStore`] is an in-process implementation.

pub mod error;
pub mod types;

mod apply;
mod binding;
mod builder;
mod bundle;
mod coerce;
mod component;
mod configurator;
mod context;
mod document;
mod env;
pub mod inspect;
mod interpolate;
pub(crate) mod merge;
pub mod region;
mod settings;
mod store;
mod value;

#[cfg(test)]
mod fixtures;

pub use apply::{Applier, default_init};
pub use builder::{Reflectfig, ReflectfigBuilder};
pub use bundle::{BundlePaths, PathResolver};
pub use component::{Component, NoPlugins, PluginLoader};
pub use configurator::Configurator;
pub use context::Context;
pub use document::{Document, Section, parse_plain};
pub use env::{Environment, UndefinedEnv};
pub use error::ReflectfigError;
pub use interpolate::Interpolator;
pub use merge::{deep_merge, merge_sections};
pub use region::Sample;
pub use settings::Settings;
pub use store::{MemoryStore, PropertyStore};
pub use types::{ContainerKind, Field, NumericKind, TypeDescriptor};
pub use value::ConfigValue;
