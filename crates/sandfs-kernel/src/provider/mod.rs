//! Providers: the seam between tool handlers and a backing filesystem.
//!
//! A provider owns one filesystem handle and the rule for turning a
//! caller-supplied virtual path into a path that handle understands.
//! Handlers never build backend paths themselves.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::vfs::{OpenFile, VfsOps, VfsResult};

mod local;
mod memory;

pub use local::LocalProvider;
pub use memory::MemoryProvider;

/// Backend-specific path resolution plus the filesystem it resolves into.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Backend name for logs ("local", "memory").
    fn kind(&self) -> &'static str;

    /// Filesystem handle that accepts paths from [`resolve_path`](Self::resolve_path).
    fn fs(&self) -> Arc<dyn VfsOps>;

    /// Map a virtual path to a backend path, or refuse it.
    fn resolve_path(&self, virtual_path: &str) -> VfsResult<PathBuf>;

    /// Apply the access policy to a backend path reached without going
    /// through [`resolve_path`](Self::resolve_path), e.g. by a directory walk.
    fn check_access(&self, _path: &Path) -> VfsResult<()> {
        Ok(())
    }

    /// Virtual roots callers may address, sorted.
    fn roots(&self) -> Vec<String>;

    /// Resolve and open for reading in one step.
    async fn open_file(&self, virtual_path: &str) -> VfsResult<(PathBuf, OpenFile)> {
        let path = self.resolve_path(virtual_path)?;
        let file = self.fs().open_read(&path).await?;
        Ok((path, file))
    }

    /// Release backend resources.
    fn close(&self) -> VfsResult<()> {
        Ok(())
    }
}
