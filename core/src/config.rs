//! Named configuration groups.
//!
//! Each group names a service base URL and an optional authorization block.
//! Groups are loaded once from TOML and never mutated after a client has been
//! built from them.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{RestError, Result};

/// Credentials for one service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthConfig {
    pub method: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

/// One configuration group.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupConfig {
    /// Base URL. A trailing slash is allowed.
    #[serde(default)]
    pub service: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authorization: Option<AuthConfig>,
}

impl GroupConfig {
    pub fn new(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
            authorization: None,
        }
    }

    pub fn with_authorization(mut self, method: &str, username: &str, password: &str) -> Self {
        self.authorization = Some(AuthConfig {
            method: method.to_string(),
            username: username.to_string(),
            password: password.to_string(),
        });
        self
    }
}

/// All configuration groups known to a registry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestConfig {
    /// Global timeout applied by the bundled transport, in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
    #[serde(default)]
    pub groups: BTreeMap<String, GroupConfig>,
}

impl RestConfig {
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        toml::from_str(raw).map_err(|e| RestError::config(format!("invalid config: {e}")))
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|e| RestError::config(format!("cannot read {}: {e}", path.display())))?;
        let config = Self::from_toml_str(&raw)?;
        tracing::debug!(path = %path.display(), groups = config.groups.len(), "loaded rest config");
        Ok(config)
    }

    pub fn group(&self, name: &str) -> Result<&GroupConfig> {
        self.groups
            .get(name)
            .ok_or_else(|| RestError::config(format!("no configuration group named \"{name}\"")))
    }

    pub fn insert(&mut self, name: impl Into<String>, group: GroupConfig) -> &mut Self {
        self.groups.insert(name.into(), group);
        self
    }
}
