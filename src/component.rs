//! Components: property stores that know their model.
//!
//! A component's configuration file is looked up by model name. Loading a
//! model's plugins may change the types a remote component exposes, in
//! which case a remote proxy has to be rebound to pick them up.

use crate::error::ReflectfigError;
use crate::store::PropertyStore;

pub trait Component: PropertyStore {
    /// Name of the model this component instantiates.
    fn model_name(&mut self) -> Result<String, ReflectfigError>;

    /// Whether this handle talks to a component in another process.
    fn is_remote_proxy(&self) -> bool {
        false
    }

    /// Re-create the handle so it sees newly loaded types.
    fn rebind(&mut self) -> Result<(), ReflectfigError> {
        Ok(())
    }
}

/// Loads the type plugins a model depends on.
pub trait PluginLoader {
    /// Returns `true` if anything was loaded by this call.
    fn ensure_plugins_loaded(&mut self, model_name: &str) -> Result<bool, ReflectfigError>;
}

/// A loader for setups where every type is known up front.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoPlugins;

impl PluginLoader for NoPlugins {
    fn ensure_plugins_loaded(&mut self, _model_name: &str) -> Result<bool, ReflectfigError> {
        Ok(false)
    }
}
