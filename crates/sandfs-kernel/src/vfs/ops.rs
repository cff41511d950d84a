//! VFS operations trait.
//!
//! A `VfsOps` handle performs one filesystem primitive on a path that has
//! already been resolved by a provider. It makes no sandboxing decisions of
//! its own beyond the read-only flag.

use async_trait::async_trait;
use std::fmt;
use std::path::Path;
use tokio::io::{AsyncRead, AsyncReadExt};

use super::types::{DirEntry, FileAttr};
use super::{VfsError, VfsResult};

/// Boxed reader handed out by [`VfsOps::open_read`].
pub type FileReader = Box<dyn AsyncRead + Send + Unpin>;

/// A file opened for reading together with the attributes of the opened
/// handle.
pub struct OpenFile {
    pub attr: FileAttr,
    pub reader: FileReader,
}

impl fmt::Debug for OpenFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenFile")
            .field("attr", &self.attr)
            .finish_non_exhaustive()
    }
}

impl OpenFile {
    /// Read the remaining contents, failing once more than `limit` bytes
    /// would be returned.
    pub async fn read_to_end_limited(mut self, limit: u64) -> VfsResult<Vec<u8>> {
        let mut buf = Vec::with_capacity(self.attr.size.min(limit) as usize);
        (&mut self.reader)
            .take(limit + 1)
            .read_to_end(&mut buf)
            .await?;
        if buf.len() as u64 > limit {
            return Err(VfsError::SizeLimitExceeded { limit });
        }
        Ok(buf)
    }
}

/// Core VFS operations trait.
///
/// Paths are whatever the owning provider's `resolve_path` produced: real
/// absolute paths for the OS backend, cleaned virtual paths for the memory
/// backend.
#[async_trait]
pub trait VfsOps: Send + Sync {
    // ========================================================================
    // Reading
    // ========================================================================

    /// Get file attributes, following symlinks.
    async fn getattr(&self, path: &Path) -> VfsResult<FileAttr>;

    /// Get file attributes of the path itself.
    async fn lgetattr(&self, path: &Path) -> VfsResult<FileAttr> {
        self.getattr(path).await
    }

    /// Read directory entries, sorted by name.
    async fn readdir(&self, path: &Path) -> VfsResult<Vec<DirEntry>>;

    /// Open a file for streaming reads.
    async fn open_read(&self, path: &Path) -> VfsResult<OpenFile>;

    // ========================================================================
    // Writing
    // ========================================================================

    /// Create or truncate a file and write `data` to it.
    async fn write_all(&self, path: &Path, data: &[u8]) -> VfsResult<()>;

    /// Create a directory and all missing parents.
    async fn create_dir_all(&self, path: &Path) -> VfsResult<()>;

    /// Rename a file or directory.
    async fn rename(&self, from: &Path, to: &Path) -> VfsResult<()>;

    /// Remove a file or an empty directory.
    async fn remove(&self, path: &Path) -> VfsResult<()>;

    /// Remove a path and everything beneath it.
    async fn remove_all(&self, path: &Path) -> VfsResult<()>;

    // ========================================================================
    // Metadata
    // ========================================================================

    /// Returns true if this filesystem is read-only.
    fn read_only(&self) -> bool;

    // ========================================================================
    // Convenience methods (default implementations)
    // ========================================================================

    /// Check if a path exists.
    async fn exists(&self, path: &Path) -> bool {
        self.getattr(path).await.is_ok()
    }

    /// Read entire file contents.
    async fn read_all(&self, path: &Path) -> VfsResult<Vec<u8>> {
        let file = self.open_read(path).await?;
        file.read_to_end_limited(u64::MAX - 1).await
    }
}
