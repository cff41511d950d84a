//! Real filesystem backend.
//!
//! Operates on absolute paths produced by a provider's resolver. Path
//! security lives in the resolver; this backend only enforces the read-only
//! flag and, when asked, refuses to follow a symlinked final component.

use async_trait::async_trait;
use std::io;
use std::path::Path;
use tokio::fs;

use crate::vfs::error::{VfsError, VfsResult};
use crate::vfs::ops::{OpenFile, VfsOps};
use crate::vfs::types::{DirEntry, FileAttr};

/// Real filesystem backend.
#[derive(Debug, Clone, Default)]
pub struct OsBackend {
    read_only: bool,
    nofollow: bool,
}

impl OsBackend {
    /// Create a writable backend.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set whether this filesystem is read-only.
    pub fn with_read_only(mut self, read_only: bool) -> Self {
        self.read_only = read_only;
        self
    }

    /// Refuse to open a path whose last component is a symlink.
    pub fn with_nofollow(mut self, nofollow: bool) -> Self {
        self.nofollow = nofollow;
        self
    }

    /// Check if write operations are allowed.
    fn check_writable(&self) -> VfsResult<()> {
        if self.read_only {
            Err(VfsError::ReadOnly)
        } else {
            Ok(())
        }
    }

    fn apply_nofollow(&self, opts: &mut fs::OpenOptions) {
        #[cfg(unix)]
        {
            if self.nofollow {
                opts.custom_flags(rustix::fs::OFlags::NOFOLLOW.bits() as i32);
            }
        }
        #[cfg(not(unix))]
        {
            let _ = opts;
        }
    }

    fn map_err(&self, path: &Path, e: io::Error) -> VfsError {
        #[cfg(unix)]
        {
            if self.nofollow && e.raw_os_error() == Some(rustix::io::Errno::LOOP.raw_os_error()) {
                return VfsError::symlinks_disabled(path.display().to_string());
            }
        }
        match e.kind() {
            io::ErrorKind::NotFound => VfsError::not_found(path.display().to_string()),
            _ => VfsError::Io(e),
        }
    }
}

#[async_trait]
impl VfsOps for OsBackend {
    async fn getattr(&self, path: &Path) -> VfsResult<FileAttr> {
        let meta = fs::metadata(path).await.map_err(|e| self.map_err(path, e))?;
        Ok(FileAttr::from_metadata(&meta))
    }

    async fn lgetattr(&self, path: &Path) -> VfsResult<FileAttr> {
        let meta = fs::symlink_metadata(path)
            .await
            .map_err(|e| self.map_err(path, e))?;
        Ok(FileAttr::from_metadata(&meta))
    }

    async fn readdir(&self, path: &Path) -> VfsResult<Vec<DirEntry>> {
        let mut entries = Vec::new();
        let mut dir = fs::read_dir(path).await.map_err(|e| self.map_err(path, e))?;

        while let Some(entry) = dir.next_entry().await? {
            // DirEntry::metadata does not traverse symlinks.
            let meta = entry.metadata().await?;
            let attr = FileAttr::from_metadata(&meta);
            entries.push(DirEntry::new(
                entry.file_name().to_string_lossy().into_owned(),
                attr.kind,
                attr.size,
            ));
        }

        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }

    async fn open_read(&self, path: &Path) -> VfsResult<OpenFile> {
        let mut opts = fs::OpenOptions::new();
        opts.read(true);
        self.apply_nofollow(&mut opts);

        let file = opts.open(path).await.map_err(|e| self.map_err(path, e))?;
        let meta = file.metadata().await?;
        Ok(OpenFile {
            attr: FileAttr::from_metadata(&meta),
            reader: Box::new(file),
        })
    }

    async fn write_all(&self, path: &Path, data: &[u8]) -> VfsResult<()> {
        use tokio::io::AsyncWriteExt;

        self.check_writable()?;
        let mut opts = fs::OpenOptions::new();
        opts.write(true).create(true).truncate(true);
        #[cfg(unix)]
        opts.mode(0o600);
        self.apply_nofollow(&mut opts);

        let mut file = opts.open(path).await.map_err(|e| self.map_err(path, e))?;
        file.write_all(data).await?;
        file.flush().await?;
        Ok(())
    }

    async fn create_dir_all(&self, path: &Path) -> VfsResult<()> {
        self.check_writable()?;
        fs::create_dir_all(path).await.map_err(VfsError::from)
    }

    async fn rename(&self, from: &Path, to: &Path) -> VfsResult<()> {
        self.check_writable()?;
        fs::rename(from, to).await.map_err(|e| self.map_err(from, e))
    }

    async fn remove(&self, path: &Path) -> VfsResult<()> {
        self.check_writable()?;
        let meta = fs::symlink_metadata(path)
            .await
            .map_err(|e| self.map_err(path, e))?;
        let result = if meta.is_dir() {
            fs::remove_dir(path).await
        } else {
            fs::remove_file(path).await
        };
        result.map_err(|e| self.map_err(path, e))
    }

    async fn remove_all(&self, path: &Path) -> VfsResult<()> {
        self.check_writable()?;
        let meta = match fs::symlink_metadata(path).await {
            Ok(meta) => meta,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(e.into()),
        };
        let result = if meta.is_dir() {
            fs::remove_dir_all(path).await
        } else {
            fs::remove_file(path).await
        };
        result.map_err(|e| self.map_err(path, e))
    }

    fn read_only(&self) -> bool {
        self.read_only
    }
}
