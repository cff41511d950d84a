//! In-memory provider.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::Provider;
use crate::sandbox::clean_path;
use crate::vfs::{MemoryBackend, VfsOps, VfsResult};

/// Ephemeral filesystem with a single root at `/`.
///
/// There is nothing outside the tree to escape to, so resolution is only
/// lexical cleaning: `..` never climbs above `/`.
#[derive(Debug)]
pub struct MemoryProvider {
    fs: Arc<MemoryBackend>,
}

impl Default for MemoryProvider {
    fn default() -> Self {
        Self::new(false)
    }
}

impl MemoryProvider {
    pub fn new(read_only: bool) -> Self {
        Self {
            fs: Arc::new(MemoryBackend::new().with_read_only(read_only)),
        }
    }

    /// Wrap an existing backend, e.g. one seeded before being made read-only.
    pub fn with_backend(fs: Arc<MemoryBackend>) -> Self {
        Self { fs }
    }
}

#[async_trait]
impl Provider for MemoryProvider {
    fn kind(&self) -> &'static str {
        "memory"
    }

    fn fs(&self) -> Arc<dyn VfsOps> {
        self.fs.clone()
    }

    fn resolve_path(&self, virtual_path: &str) -> VfsResult<PathBuf> {
        Ok(clean_path(&Path::new("/").join(virtual_path.trim_start_matches('/'))))
    }

    fn roots(&self) -> Vec<String> {
        vec!["/".to_string()]
    }
}
