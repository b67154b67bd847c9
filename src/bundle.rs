//! Bundle-relative path resolution.
//!
//! A bundle is a directory tree holding configuration and data files. The
//! active bundle comes first, further bundle roots follow in the order they
//! were given; [`BundlePaths::find_file`] returns the first root that
//! contains the requested relative path, the same first-match walk used
//! for config discovery elsewhere. Per-model configuration files live in
//! the configuration directory of the active bundle.

use std::path::{Path, PathBuf};

use crate::error::ReflectfigError;
use crate::settings::Settings;

/// Maps bundle-relative paths to absolute paths.
pub trait PathResolver {
    /// Resolve `relative` against the bundle roots.
    fn find_file(&self, relative: &str) -> Result<PathBuf, ReflectfigError>;

    /// Directory holding per-model configuration files.
    fn configuration_directory(&self) -> Result<PathBuf, ReflectfigError>;
}

/// Filesystem-backed bundle roots.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BundlePaths {
    active: Option<PathBuf>,
    extra: Vec<PathBuf>,
    config_subdir: PathBuf,
}

impl BundlePaths {
    pub fn new(active: impl Into<PathBuf>) -> Self {
        Self {
            active: Some(active.into()),
            extra: Vec::new(),
            config_subdir: PathBuf::from(crate::settings::DEFAULT_CONFIG_SUBDIR),
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            active: settings.active_bundle.clone(),
            extra: settings.bundle_paths.clone(),
            config_subdir: settings.config_subdir.clone(),
        }
    }

    /// Append a bundle root searched after the ones already present.
    pub fn with_bundle(mut self, root: impl Into<PathBuf>) -> Self {
        self.extra.push(root.into());
        self
    }

    pub fn with_config_subdir(mut self, subdir: impl Into<PathBuf>) -> Self {
        self.config_subdir = subdir.into();
        self
    }

    /// All roots in search order.
    pub fn roots(&self) -> Vec<&Path> {
        self.active
            .iter()
            .chain(self.extra.iter())
            .map(PathBuf::as_path)
            .collect()
    }
}

impl PathResolver for BundlePaths {
    fn find_file(&self, relative: &str) -> Result<PathBuf, ReflectfigError> {
        let roots = self.roots();
        for root in &roots {
            let candidate = root.join(relative);
            if candidate.exists() {
                return Ok(candidate);
            }
        }
        Err(ReflectfigError::BundleFileNotFound {
            path: relative.to_string(),
            searched: roots.iter().map(|r| r.to_path_buf()).collect(),
        })
    }

    fn configuration_directory(&self) -> Result<PathBuf, ReflectfigError> {
        self.active
            .as_ref()
            .map(|root| root.join(&self.config_subdir))
            .ok_or(ReflectfigError::NoActiveBundle)
    }
}
