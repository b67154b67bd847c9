use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReflectfigError {
    #[error("Could not find config file {0}")]
    FileNotFound(PathBuf),

    #[error("Failed to read {path}: {source}")]
    IoError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error(
        "Malformed section header in {origin} (line {line}): sections must begin with '--- name:<Name>', found '{content}'"
    )]
    MalformedSection {
        origin: String,
        line: usize,
        content: String,
    },

    #[error("Section '{section}' in {origin} should only contain YAML maps")]
    NonMapDocument { origin: String, section: String },

    #[error("Failed to parse section '{section}' in {origin}: {source}")]
    Yaml {
        origin: String,
        section: String,
        source: yaml_rust2::ScanError,
    },

    #[error("Unsupported YAML in section '{section}' of {origin}: {reason}")]
    UnsupportedYaml {
        origin: String,
        section: String,
        reason: String,
    },

    #[error("No section names given to merge")]
    EmptySectionList,

    #[error("Section '{name}' not found, known sections: {known:?}")]
    MergeSectionNotFound { name: String, known: Vec<String> },

    #[error("Could not set '{value}' on '{path}': not a valid {target}")]
    ValueMismatch {
        path: String,
        value: String,
        target: String,
    },

    #[error("Value of '{path}' ({target}) must be a {expected}, got a {found}")]
    ShapeMismatch {
        path: String,
        target: String,
        expected: &'static str,
        found: &'static str,
    },

    #[error("Array '{path}' ({target}) has {expected} elements, config gives {found}")]
    ArrayLengthMismatch {
        path: String,
        target: String,
        expected: usize,
        found: usize,
    },

    #[error("Unsupported {width}-byte representation for '{path}' ({target})")]
    UnsupportedWidth {
        path: String,
        target: String,
        width: usize,
    },

    #[error("Invalid type descriptor at '{path}': {reason}")]
    InvalidDescriptor { path: String, reason: String },

    #[error("'{value}' is not a valid name of enum {target} at '{path}', valid names: {known:?}")]
    UnknownEnumName {
        path: String,
        value: String,
        target: String,
        known: Vec<String>,
    },

    #[error("{fields:?} is/are not members of {target} at '{path}'")]
    UnknownFields {
        path: String,
        target: String,
        fields: Vec<String>,
    },

    #[error("There is no property '{property}' in {component}, known properties: {known:?}")]
    PropertyNotFound {
        property: String,
        component: String,
        known: Vec<String>,
    },

    #[error("Could not get a valid model name from {component}: {reason}")]
    ModelNameUnavailable { component: String, reason: String },

    #[error("Environment variable '{0}' is not set")]
    EnvVarUndefined(String),

    #[error("Malformed interpolation marker in '{text}': {reason}")]
    MalformedMarker { text: String, reason: String },

    #[error("Property store failed on '{property}': {reason}")]
    Store { property: String, reason: String },

    #[error("Could not find '{path}' in any bundle, searched: {searched:?}")]
    BundleFileNotFound { path: String, searched: Vec<PathBuf> },

    #[error("No active bundle configured — set active_bundle or REFLECTFIG_BUNDLE")]
    NoActiveBundle,

    #[error("Region access out of bounds: {len} bytes at offset {offset}, region holds {available}")]
    RegionOutOfBounds {
        offset: usize,
        len: usize,
        available: usize,
    },

    #[error("Invalid container handle {0}")]
    InvalidContainerHandle(u64),

    #[error("No configuration document loaded — call .load() first")]
    NoDocumentLoaded,

    #[error("Settings error: {0}")]
    Settings(#[from] confique::Error),

    #[error("Failed to parse settings {path}: {source}")]
    SettingsParse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Configuration of '{property}' failed for {component}: {source}")]
    ApplyFailed {
        property: String,
        component: String,
        source: Box<ReflectfigError>,
    },
}

impl ReflectfigError {
    /// Strip any `ApplyFailed` wrappers and return the failure underneath.
    pub fn root_cause(&self) -> &ReflectfigError {
        match self {
            ReflectfigError::ApplyFailed { source, .. } => source.root_cause(),
            other => other,
        }
    }
}
