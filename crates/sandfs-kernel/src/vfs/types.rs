//! Core VFS types.
//!
//! These are the shapes every backend reports metadata in, regardless of
//! whether the bytes live on disk or in memory.

use serde::{Deserialize, Serialize};
use std::time::SystemTime;

/// File type enumeration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileType {
    /// Regular file.
    File,
    /// Directory.
    Directory,
    /// Symbolic link.
    Symlink,
    /// Device, socket, fifo.
    Other,
}

impl FileType {
    /// Returns true if this is a regular file.
    pub fn is_file(&self) -> bool {
        matches!(self, FileType::File)
    }

    /// Returns true if this is a directory.
    pub fn is_dir(&self) -> bool {
        matches!(self, FileType::Directory)
    }

    /// Returns true if this is a symbolic link.
    pub fn is_symlink(&self) -> bool {
        matches!(self, FileType::Symlink)
    }

    pub(crate) fn from_std(ft: std::fs::FileType) -> Self {
        if ft.is_dir() {
            FileType::Directory
        } else if ft.is_symlink() {
            FileType::Symlink
        } else if ft.is_file() {
            FileType::File
        } else {
            FileType::Other
        }
    }
}

/// File attributes (metadata).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileAttr {
    /// Size in bytes.
    pub size: u64,
    /// File type.
    pub kind: FileType,
    /// Unix permissions (e.g., 0o644).
    pub perm: u32,
    /// Last modification time.
    pub mtime: SystemTime,
}

impl FileAttr {
    /// Create attributes for a new file.
    pub fn file(size: u64, perm: u32) -> Self {
        Self {
            size,
            kind: FileType::File,
            perm,
            mtime: SystemTime::now(),
        }
    }

    /// Create attributes for a new directory.
    pub fn directory(perm: u32) -> Self {
        Self {
            size: 0,
            kind: FileType::Directory,
            perm,
            mtime: SystemTime::now(),
        }
    }

    pub(crate) fn from_metadata(meta: &std::fs::Metadata) -> Self {
        #[cfg(unix)]
        let perm = {
            use std::os::unix::fs::PermissionsExt;
            meta.permissions().mode()
        };
        #[cfg(not(unix))]
        let perm = if meta.permissions().readonly() { 0o444 } else { 0o644 };

        Self {
            size: meta.len(),
            kind: FileType::from_std(meta.file_type()),
            perm,
            mtime: meta.modified().unwrap_or(SystemTime::UNIX_EPOCH),
        }
    }

    /// Returns true if this is a regular file.
    pub fn is_file(&self) -> bool {
        self.kind.is_file()
    }

    /// Returns true if this is a directory.
    pub fn is_dir(&self) -> bool {
        self.kind.is_dir()
    }

    /// Returns true if this is a symbolic link.
    pub fn is_symlink(&self) -> bool {
        self.kind.is_symlink()
    }
}

/// Directory entry.
///
/// `kind` and `size` describe the entry itself, not a symlink's target.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DirEntry {
    /// Entry name (not full path).
    pub name: String,
    /// Entry type.
    pub kind: FileType,
    /// Size in bytes.
    pub size: u64,
}

impl DirEntry {
    /// Create a new directory entry.
    pub fn new(name: impl Into<String>, kind: FileType, size: u64) -> Self {
        Self {
            name: name.into(),
            kind,
            size,
        }
    }

    /// Create a file entry.
    pub fn file(name: impl Into<String>, size: u64) -> Self {
        Self::new(name, FileType::File, size)
    }

    /// Create a directory entry.
    pub fn directory(name: impl Into<String>) -> Self {
        Self::new(name, FileType::Directory, 0)
    }

    /// Dot-prefixed names other than `.` and `..`.
    pub fn is_hidden(&self) -> bool {
        is_hidden_name(&self.name)
    }
}

pub(crate) fn is_hidden_name(name: &str) -> bool {
    name.starts_with('.') && name != "." && name != ".."
}
