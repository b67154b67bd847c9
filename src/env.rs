use std::collections::HashMap;

use serde::Deserialize;

/// Where `<%= ENV[...] %>` markers read variables from.
///
/// `Process` reads the live process environment at resolution time; `Fixed`
/// holds a snapshot so tests (and sandboxed callers) can pass synthetic data
/// instead of `std::env::vars()`.
#[derive(Debug, Clone, Default)]
pub enum Environment {
    #[default]
    Process,
    Fixed(HashMap<String, String>),
}

impl Environment {
    /// Build a fixed environment from `(name, value)` pairs.
    pub fn from_vars(vars: impl IntoIterator<Item = (String, String)>) -> Self {
        Environment::Fixed(vars.into_iter().collect())
    }

    /// Look a variable up by exact name.
    ///
    /// Values that are not valid unicode count as unset.
    pub fn var(&self, name: &str) -> Option<String> {
        match self {
            Environment::Process => std::env::var(name).ok(),
            Environment::Fixed(vars) => vars.get(name).cloned(),
        }
    }
}

/// What to do when an interpolated environment variable is not set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UndefinedEnv {
    /// Fail with [`EnvVarUndefined`](crate::ReflectfigError::EnvVarUndefined).
    #[default]
    Error,
    /// Substitute an empty string.
    Empty,
}
