//! Named mounts and their lifecycle.
//!
//! A [`Mount`] binds one provider to the built-in tool set. The
//! [`MountRegistry`] routes tool calls by mount name; registering a name
//! again replaces the old mount and closes it.

use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;

use crate::config::{Backend, MountConfig, SandboxConfig};
use crate::file_tools::registry_for;
use crate::provider::{LocalProvider, MemoryProvider, Provider};
use crate::tools::{ToolInfo, ToolRegistry};
use crate::vfs::{VfsError, VfsResult};

/// Information about a mount.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MountInfo {
    pub name: String,
    /// Provider kind ("local", "memory").
    pub kind: &'static str,
    pub read_only: bool,
    pub roots: Vec<String>,
}

/// A provider plus the tools bound to it.
pub struct Mount {
    name: String,
    provider: Arc<dyn Provider>,
    tools: ToolRegistry,
    closed: AtomicBool,
}

impl std::fmt::Debug for Mount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Mount")
            .field("name", &self.name)
            .field("kind", &self.provider.kind())
            .field("tools", &self.tools)
            .field("closed", &self.is_closed())
            .finish()
    }
}

impl Mount {
    /// Build the provider described by `config`.
    pub fn open(config: &MountConfig) -> VfsResult<Self> {
        let provider: Arc<dyn Provider> = match config.backend {
            Backend::Local => Arc::new(LocalProvider::new(
                config.root_map(),
                config.access_policy(),
                config.symlink_mode,
                config.read_only,
            )),
            Backend::Memory => Arc::new(MemoryProvider::new(config.read_only)),
        };
        Ok(Self::with_provider(config.name.clone(), provider))
    }

    /// Wrap an already-built provider.
    pub fn with_provider(name: impl Into<String>, provider: Arc<dyn Provider>) -> Self {
        let tools = registry_for(provider.clone());
        Self {
            name: name.into(),
            provider,
            tools,
            closed: AtomicBool::new(false),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn provider(&self) -> &Arc<dyn Provider> {
        &self.provider
    }

    pub fn info(&self) -> MountInfo {
        MountInfo {
            name: self.name.clone(),
            kind: self.provider.kind(),
            read_only: self.provider.fs().read_only(),
            roots: self.provider.roots(),
        }
    }

    pub fn list_tools(&self) -> Vec<ToolInfo> {
        self.tools.list()
    }

    /// Dispatch a tool call.
    pub async fn call(
        &self,
        tool: &str,
        params: &Value,
        cancel: &CancellationToken,
    ) -> VfsResult<Value> {
        if self.is_closed() {
            return Err(VfsError::other(format!("mount {} is closed", self.name)));
        }
        self.tools.call(tool, params, cancel).await
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Release the provider. Idempotent.
    pub fn close(&self) -> VfsResult<()> {
        if self.closed.swap(true, Ordering::AcqRel) {
            return Ok(());
        }
        tracing::info!(mount = %self.name, kind = self.provider.kind(), "closing mount");
        self.provider.close()
    }
}

/// Mounts keyed by name.
#[derive(Debug, Default)]
pub struct MountRegistry {
    mounts: RwLock<BTreeMap<String, Arc<Mount>>>,
}

impl MountRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open every mount in `config`.
    pub async fn from_config(config: &SandboxConfig) -> VfsResult<Self> {
        let registry = Self::new();
        for mount in &config.mounts {
            registry.register(Mount::open(mount)?).await;
        }
        Ok(registry)
    }

    /// Register a mount, replacing and closing any mount with the same name.
    pub async fn register(&self, mount: Mount) -> Arc<Mount> {
        let mount = Arc::new(mount);
        let previous = {
            let mut mounts = self.mounts.write().await;
            mounts.insert(mount.name.clone(), mount.clone())
        };
        tracing::info!(mount = %mount.name, kind = mount.provider.kind(), "registered mount");
        if let Some(old) = previous {
            if let Err(e) = old.close() {
                tracing::warn!(mount = %old.name, error = %e, "failed to close replaced mount");
            }
        }
        mount
    }

    /// Remove and close a mount. Returns `false` if nothing was registered.
    pub async fn unregister(&self, name: &str) -> VfsResult<bool> {
        let removed = self.mounts.write().await.remove(name);
        match removed {
            Some(mount) => {
                mount.close()?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    pub async fn get(&self, name: &str) -> Option<Arc<Mount>> {
        self.mounts.read().await.get(name).cloned()
    }

    /// All mounts, sorted by name.
    pub async fn list(&self) -> Vec<MountInfo> {
        self.mounts.read().await.values().map(|m| m.info()).collect()
    }

    /// Dispatch a tool call to a named mount.
    pub async fn call(
        &self,
        mount: &str,
        tool: &str,
        params: &Value,
        cancel: &CancellationToken,
    ) -> VfsResult<Value> {
        let target = self
            .get(mount)
            .await
            .ok_or_else(|| VfsError::UnknownMount(mount.to_string()))?;
        target.call(tool, params, cancel).await
    }

    /// Close and drop every mount; the first close error is returned.
    pub async fn close_all(&self) -> VfsResult<()> {
        let mounts = std::mem::take(&mut *self.mounts.write().await);
        let mut first_err = None;
        for mount in mounts.into_values() {
            if let Err(e) = mount.close() {
                first_err.get_or_insert(e);
            }
        }
        first_err.map_or(Ok(()), Err)
    }
}
