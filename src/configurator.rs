//! The loader/applier facade.
//!
//! A [`Configurator`] owns a [`Context`] and at most one loaded
//! [`Document`]. Loading again replaces the document wholesale; a failed
//! load leaves no document behind.

use std::path::Path;

use tracing::debug;

use crate::binding;
use crate::component::{Component, PluginLoader};
use crate::context::Context;
use crate::document::{self, Document};
use crate::error::ReflectfigError;
use crate::merge;
use crate::store::PropertyStore;
use crate::value::ConfigValue;

pub struct Configurator {
    context: Context,
    document: Option<Document>,
}

impl Configurator {
    pub fn new(context: Context) -> Self {
        Self {
            context,
            document: None,
        }
    }

    pub fn context(&self) -> &Context {
        &self.context
    }

    /// Load a sectioned configuration file, replacing any previous one.
    pub fn load(&mut self, path: impl AsRef<Path>) -> Result<&Document, ReflectfigError> {
        self.document = None;
        Ok(self.document.insert(Document::load(path)?))
    }

    /// Parse sectioned configuration text, replacing any previous document.
    pub fn load_str(&mut self, text: &str) -> Result<&Document, ReflectfigError> {
        self.document = None;
        Ok(self.document.insert(Document::parse(text)?))
    }

    pub fn document(&self) -> Option<&Document> {
        self.document.as_ref()
    }

    /// Overlay the named sections of the loaded document, left to right.
    pub fn merge_sections<S: AsRef<str>>(&self, names: &[S]) -> Result<ConfigValue, ReflectfigError> {
        let document = self.document.as_ref().ok_or(ReflectfigError::NoDocumentLoaded)?;
        merge::merge_sections(document, names)
    }

    pub fn resolve_string(&self, text: &str) -> Result<String, ReflectfigError> {
        self.context.resolve_string(text)
    }

    pub fn apply_to_property<S: PropertyStore + ?Sized>(
        &self,
        store: &mut S,
        name: &str,
        value: &ConfigValue,
    ) -> Result<(), ReflectfigError> {
        binding::apply_to_property(&self.context.interpolator(), store, name, value)
    }

    pub fn apply_all<S: PropertyStore + ?Sized>(
        &self,
        store: &mut S,
        config: &ConfigValue,
    ) -> Result<(), ReflectfigError> {
        binding::apply_all(&self.context.interpolator(), store, config)
    }

    /// Load `path`, merge `names` and apply the result to `store`.
    pub fn apply_config<S, N>(
        &mut self,
        path: impl AsRef<Path>,
        store: &mut S,
        names: &[N],
    ) -> Result<(), ReflectfigError>
    where
        S: PropertyStore + ?Sized,
        N: AsRef<str>,
    {
        self.load(path)?;
        let merged = self.merge_sections(names)?;
        self.apply_all(store, &merged)
    }

    /// Apply plain (unsectioned) YAML to `store`. The loaded document, if
    /// any, is left alone.
    pub fn apply_config_string<S: PropertyStore + ?Sized>(
        &self,
        store: &mut S,
        yaml: &str,
    ) -> Result<(), ReflectfigError> {
        let config = document::parse_plain(yaml)?;
        self.apply_all(store, &config)
    }

    /// Configure a component from `<configuration directory>/<model>.yml`.
    ///
    /// The model's plugins are loaded first. A remote proxy is rebound when
    /// that loaded anything, so its property types are up to date.
    pub fn apply_component<C, N>(
        &mut self,
        component: &mut C,
        plugins: &mut dyn PluginLoader,
        names: &[N],
    ) -> Result<(), ReflectfigError>
    where
        C: Component,
        N: AsRef<str>,
    {
        let model = component
            .model_name()
            .map_err(|e| ReflectfigError::ModelNameUnavailable {
                component: component.name(),
                reason: e.to_string(),
            })?;
        if model.is_empty() {
            return Err(ReflectfigError::ModelNameUnavailable {
                component: component.name(),
                reason: "model name is empty".into(),
            });
        }

        if plugins.ensure_plugins_loaded(&model)? && component.is_remote_proxy() {
            debug!(component = %component.name(), model = %model, "rebinding remote proxy");
            component.rebind()?;
        }

        let path = self.context.model_config_path(&model)?;
        self.apply_config(path, component, names)
    }

    /// Current value of a property, read back from the store.
    pub fn property_value<S: PropertyStore + ?Sized>(
        &self,
        store: &mut S,
        name: &str,
    ) -> Result<ConfigValue, ReflectfigError> {
        binding::property_value(store, name)
    }
}
