//! Sandbox configuration.
//!
//! A TOML file declares one or more named mounts:
//!
//! ```toml
//! [[mounts]]
//! name = "workspace"
//! backend = "local"          # "local" (default) or "memory"
//! read_only = false
//! symlink_mode = "INTERNAL_ONLY"
//! allowed_paths = ["/srv/project"]
//! denied_paths = ["/srv/project/.env"]
//!
//! [mounts.root_paths]
//! "/data" = "/srv/project"
//! "/data/logs" = "/var/log/project"
//! ```

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use crate::sandbox::{AccessPolicy, RootMap, SymlinkMode};
use crate::vfs::{VfsError, VfsResult};

/// Which provider backs a mount.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    #[default]
    Local,
    Memory,
}

/// One mount's settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MountConfig {
    pub name: String,
    pub backend: Backend,
    /// Virtual root → real directory. Ignored by the memory backend.
    pub root_paths: BTreeMap<String, String>,
    pub read_only: bool,
    /// Canonical path globs or prefixes; empty allows everything.
    pub allowed_paths: Vec<String>,
    pub denied_paths: Vec<String>,
    pub symlink_mode: SymlinkMode,
}

impl MountConfig {
    /// A local mount with no roots yet.
    pub fn local(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// An in-memory mount.
    pub fn memory(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            backend: Backend::Memory,
            ..Default::default()
        }
    }

    pub fn with_root(mut self, virtual_root: impl Into<String>, real: impl Into<String>) -> Self {
        self.root_paths.insert(virtual_root.into(), real.into());
        self
    }

    pub fn with_read_only(mut self, read_only: bool) -> Self {
        self.read_only = read_only;
        self
    }

    pub fn with_symlink_mode(mut self, mode: SymlinkMode) -> Self {
        self.symlink_mode = mode;
        self
    }

    pub fn with_allowed(mut self, pattern: impl Into<String>) -> Self {
        self.allowed_paths.push(pattern.into());
        self
    }

    pub fn with_denied(mut self, pattern: impl Into<String>) -> Self {
        self.denied_paths.push(pattern.into());
        self
    }

    pub fn root_map(&self) -> RootMap {
        self.root_paths.iter().collect()
    }

    pub fn access_policy(&self) -> AccessPolicy {
        AccessPolicy::new(&self.allowed_paths, &self.denied_paths)
    }
}

/// The whole configuration file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SandboxConfig {
    pub mounts: Vec<MountConfig>,
}

impl SandboxConfig {
    /// Parse and validate TOML text.
    pub fn parse(text: &str) -> VfsResult<Self> {
        let config: Self =
            toml::from_str(text).map_err(|e| VfsError::config(format!("parse error: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a config file.
    pub fn load(path: impl AsRef<Path>) -> VfsResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| VfsError::config(format!("{}: {e}", path.display())))?;
        Self::parse(&text)
    }

    /// Mount names must be present and unique.
    pub fn validate(&self) -> VfsResult<()> {
        let mut seen = BTreeSet::new();
        for mount in &self.mounts {
            if mount.name.trim().is_empty() {
                return Err(VfsError::config("mount name must not be empty"));
            }
            if !seen.insert(mount.name.as_str()) {
                return Err(VfsError::config(format!(
                    "duplicate mount name: {}",
                    mount.name
                )));
            }
            if mount.backend == Backend::Local && mount.root_paths.is_empty() {
                tracing::warn!(mount = %mount.name, "local mount has no root_paths");
            }
        }
        Ok(())
    }

    pub fn mount(&self, name: &str) -> Option<&MountConfig> {
        self.mounts.iter().find(|m| m.name == name)
    }
}
