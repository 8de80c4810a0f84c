//! Mutation configuration loading.
//!
//! The webhook is driven by a YAML document listing `mutations`: each entry
//! pairs a resource selector (group/version/kind) with an ordered list of
//! RFC 6902 patch operations. The document is parsed once at startup; any
//! format error is fatal before the listener comes up.

use std::fs;
use std::path::{Path, PathBuf};

use json_patch::PatchOperation;
use kube::core::GroupVersionKind;
use serde::Deserialize;
use thiserror::Error;

/// Errors raised while loading the mutation configuration.
///
/// Both variants are fatal at startup: the server must not start with an
/// empty or partial rule set.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config file could not be read
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The config file is not valid YAML for the expected schema
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_yaml::Error),
}

/// Root of the mutation configuration document.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub mutations: Vec<Mutation>,
}

/// One configured mutation: a resource selector plus the patch operations
/// to emit for matching admission requests.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Mutation {
    /// The resource type this mutation applies to
    pub resource: ResourceSelector,

    /// RFC 6902 operations in declaration order. A mutation may carry no
    /// patches, in which case it contributes nothing.
    #[serde(default)]
    pub patches: Vec<PatchOperation>,
}

/// Exact-match selector for a Kubernetes resource type.
///
/// All three fields are compared with case-sensitive string equality; there
/// are no wildcards. The core API group (Pods, Services, ...) is the empty
/// string.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ResourceSelector {
    #[serde(default)]
    pub group: String,
    pub version: String,
    pub kind: String,
}

impl ResourceSelector {
    /// Whether this selector identifies `gvk`.
    ///
    /// An empty `group` matches only requests whose group is literally
    /// empty, which is how the core API group is represented.
    pub fn matches(&self, gvk: &GroupVersionKind) -> bool {
        self.group == gvk.group && self.version == gvk.version && self.kind == gvk.kind
    }
}

impl Config {
    /// Load the configuration from a YAML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&raw)
    }

    /// Parse the configuration from a YAML string.
    pub fn from_yaml(raw: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(raw)?)
    }
}
