use std::path::PathBuf;

use crate::bundle::{BundlePaths, PathResolver};
use crate::env::{Environment, UndefinedEnv};
use crate::error::ReflectfigError;
use crate::interpolate::Interpolator;
use crate::settings::Settings;

/// Everything loading and applying needs from the outside world: where
/// bundle files live, which environment `ENV[...]` reads, and what to do
/// when a variable is unset.
pub struct Context {
    resolver: Box<dyn PathResolver>,
    env: Environment,
    undefined_env: UndefinedEnv,
}

impl Context {
    pub fn new(resolver: impl PathResolver + 'static) -> Self {
        Self::from_boxed(Box::new(resolver))
    }

    pub(crate) fn from_boxed(resolver: Box<dyn PathResolver>) -> Self {
        Self {
            resolver,
            env: Environment::default(),
            undefined_env: UndefinedEnv::default(),
        }
    }

    /// Bundle roots and policy taken from `settings`, process environment.
    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(BundlePaths::from_settings(settings)).with_undefined_env(settings.undefined_env)
    }

    pub fn with_env(mut self, env: Environment) -> Self {
        self.env = env;
        self
    }

    pub fn with_undefined_env(mut self, policy: UndefinedEnv) -> Self {
        self.undefined_env = policy;
        self
    }

    pub fn resolver(&self) -> &dyn PathResolver {
        self.resolver.as_ref()
    }

    pub fn env(&self) -> &Environment {
        &self.env
    }

    pub fn undefined_env(&self) -> UndefinedEnv {
        self.undefined_env
    }

    pub fn interpolator(&self) -> Interpolator<'_> {
        Interpolator::new(&self.env, self.resolver.as_ref(), self.undefined_env)
    }

    /// Expand `<% %>` markers in `text`.
    pub fn resolve_string(&self, text: &str) -> Result<String, ReflectfigError> {
        self.interpolator().resolve(text)
    }

    /// `<configuration directory>/<model>.yml`
    pub fn model_config_path(&self, model: &str) -> Result<PathBuf, ReflectfigError> {
        Ok(self
            .resolver
            .configuration_directory()?
            .join(format!("{model}.yml")))
    }
}
