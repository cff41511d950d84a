//! Local OS provider.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::Provider;
use crate::sandbox::{AccessPolicy, RootMap, SymlinkMode, canonicalize_within};
use crate::vfs::{OpenFile, OsBackend, VfsError, VfsOps, VfsResult};

/// Provider for directories on the local filesystem.
///
/// Every resolution recomputes the canonical path from scratch: root lookup,
/// symlink-safe canonicalization, then the access policy. Nothing is cached.
#[derive(Debug)]
pub struct LocalProvider {
    roots: RootMap,
    policy: AccessPolicy,
    mode: SymlinkMode,
    fs: Arc<OsBackend>,
}

impl LocalProvider {
    pub fn new(roots: RootMap, policy: AccessPolicy, mode: SymlinkMode, read_only: bool) -> Self {
        let fs = OsBackend::new()
            .with_read_only(read_only)
            .with_nofollow(mode.denies_links());
        Self {
            roots,
            policy,
            mode,
            fs: Arc::new(fs),
        }
    }
}

#[async_trait]
impl Provider for LocalProvider {
    fn kind(&self) -> &'static str {
        "local"
    }

    fn fs(&self) -> Arc<dyn VfsOps> {
        self.fs.clone()
    }

    fn resolve_path(&self, virtual_path: &str) -> VfsResult<PathBuf> {
        if self.roots.is_empty() {
            return Err(VfsError::NoRootsDefined);
        }
        let matched = self.roots.find_root(virtual_path)?;
        let canonical = canonicalize_within(matched.real_root, &matched.relative, self.mode)
            .map_err(|e| match e {
                VfsError::RootResolutionFailed { .. } => e.with_path(matched.virtual_root),
                e => e.with_path(virtual_path),
            })?;
        self.policy.check(&canonical)?;
        Ok(canonical)
    }

    fn check_access(&self, path: &Path) -> VfsResult<()> {
        self.policy.check(path)
    }

    fn roots(&self) -> Vec<String> {
        self.roots.virtual_roots()
    }

    /// Under DENY the open itself refuses a symlinked leaf, so a link
    /// swapped in after resolution is not followed.
    async fn open_file(&self, virtual_path: &str) -> VfsResult<(PathBuf, OpenFile)> {
        let path = self.resolve_path(virtual_path)?;
        let file = self
            .fs
            .open_read(&path)
            .await
            .map_err(|e| e.with_path(virtual_path))?;
        Ok((path, file))
    }

    fn close(&self) -> VfsResult<()> {
        tracing::debug!(roots = self.roots.len(), "closing local provider");
        Ok(())
    }
}
