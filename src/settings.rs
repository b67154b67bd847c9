//! Settings of the engine itself: where bundles live and how interpolation
//! treats unset variables.
//!
//! Loaded through confique, so every field has a documented default and the
//! active bundle can come from the environment:
//!
//! ```toml
//! active_bundle = "/opt/bundles/rover"
//! bundle_paths = ["/opt/bundles/common"]
//! config_subdir = "config/orogen"
//! undefined_env = "empty"
//! ```

use std::path::{Path, PathBuf};

use confique::Config;

use crate::env::UndefinedEnv;
use crate::error::ReflectfigError;

pub(crate) const DEFAULT_CONFIG_SUBDIR: &str = "config/orogen";

#[derive(Config, Debug, Clone, PartialEq)]
pub struct Settings {
    /// Root of the active bundle.
    #[config(env = "REFLECTFIG_BUNDLE")]
    pub active_bundle: Option<PathBuf>,

    /// Additional bundle roots, searched after the active bundle in order.
    #[config(default = [])]
    pub bundle_paths: Vec<PathBuf>,

    /// Configuration directory, relative to the active bundle.
    #[config(default = "config/orogen")]
    pub config_subdir: PathBuf,

    /// Behaviour of `<%= ENV[...] %>` for unset variables: "error" or "empty".
    #[config(default = "error")]
    pub undefined_env: UndefinedEnv,
}

impl Settings {
    /// Defaults, overridden by `REFLECTFIG_*` environment variables.
    pub fn load() -> Result<Self, ReflectfigError> {
        Self::builder().env().load().map_err(ReflectfigError::from)
    }

    /// Layer environment variables over a TOML settings file over defaults.
    /// A missing file is treated as empty.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ReflectfigError> {
        Self::builder()
            .env()
            .file(path.as_ref())
            .load()
            .map_err(ReflectfigError::from)
    }

    /// Parse TOML settings text over defaults. The environment is not consulted.
    pub fn from_toml_str(text: &str) -> Result<Self, ReflectfigError> {
        let layer: <Settings as Config>::Layer =
            toml::from_str(text).map_err(|e| ReflectfigError::SettingsParse {
                path: PathBuf::from("<string>"),
                source: e,
            })?;
        Self::builder()
            .preloaded(layer)
            .load()
            .map_err(ReflectfigError::from)
    }
}
