use std::path::PathBuf;

use crate::bundle::{BundlePaths, PathResolver};
use crate::configurator::Configurator;
use crate::context::Context;
use crate::env::{Environment, UndefinedEnv};
use crate::error::ReflectfigError;
use crate::settings::Settings;

/// Entry point for building a [`Configurator`].
pub struct Reflectfig;

impl Reflectfig {
    pub fn builder() -> ReflectfigBuilder {
        ReflectfigBuilder::new()
    }
}

/// Builder for a [`Configurator`] and the [`Context`] it runs in.
///
/// Three independent inputs, each with a default:
///
/// - **Settings**: [`settings()`](Self::settings) or
///   [`settings_file()`](Self::settings_file). Default: [`Settings::load`]
///   (defaults overridden by `REFLECTFIG_*` variables).
/// - **Bundle resolution**: [`resolver()`](Self::resolver) or
///   [`bundle()`](Self::bundle). Default: [`BundlePaths`] built from the
///   settings.
/// - **Environment** for `ENV[...]` markers: [`env_vars()`](Self::env_vars)
///   or [`process_env()`](Self::process_env). Default: the process
///   environment.
pub struct ReflectfigBuilder {
    settings: Option<Settings>,
    settings_file: Option<PathBuf>,
    resolver: Option<Box<dyn PathResolver>>,
    bundle: Option<PathBuf>,
    env: Environment,
    undefined_env: Option<UndefinedEnv>,
}

impl ReflectfigBuilder {
    fn new() -> Self {
        Self {
            settings: None,
            settings_file: None,
            resolver: None,
            bundle: None,
            env: Environment::Process,
            undefined_env: None,
        }
    }

    /// Use these settings instead of loading them.
    pub fn settings(mut self, settings: Settings) -> Self {
        self.settings = Some(settings);
        self
    }

    /// Load settings from a TOML file (environment still takes precedence).
    /// Ignored when [`settings()`](Self::settings) is also given.
    pub fn settings_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.settings_file = Some(path.into());
        self
    }

    /// Resolve bundle paths with a custom resolver.
    pub fn resolver(mut self, resolver: impl PathResolver + 'static) -> Self {
        self.resolver = Some(Box::new(resolver));
        self
    }

    /// Override the active bundle root from the settings.
    pub fn bundle(mut self, root: impl Into<PathBuf>) -> Self {
        self.bundle = Some(root.into());
        self
    }

    /// Read `ENV[...]` markers from a fixed set of variables.
    pub fn env_vars<K, V>(mut self, vars: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.env = Environment::from_vars(vars.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    /// Read `ENV[...]` markers from the process environment.
    pub fn process_env(mut self) -> Self {
        self.env = Environment::Process;
        self
    }

    /// Override the unset-variable policy from the settings.
    pub fn undefined_env(mut self, policy: UndefinedEnv) -> Self {
        self.undefined_env = Some(policy);
        self
    }

    fn effective_settings(&self) -> Result<Settings, ReflectfigError> {
        let mut settings = match (&self.settings, &self.settings_file) {
            (Some(settings), _) => settings.clone(),
            (None, Some(path)) => Settings::from_file(path)?,
            (None, None) => Settings::load()?,
        };
        if let Some(root) = &self.bundle {
            settings.active_bundle = Some(root.clone());
        }
        if let Some(policy) = self.undefined_env {
            settings.undefined_env = policy;
        }
        Ok(settings)
    }

    pub fn build(self) -> Result<Configurator, ReflectfigError> {
        let settings = self.effective_settings()?;
        let resolver = self
            .resolver
            .unwrap_or_else(|| Box::new(BundlePaths::from_settings(&settings)));
        let context = Context::from_boxed(resolver)
            .with_env(self.env)
            .with_undefined_env(settings.undefined_env);
        Ok(Configurator::new(context))
    }
}
