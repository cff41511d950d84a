//! In-memory filesystem backend.
//!
//! Backs `memory` mounts and tests. All data is ephemeral.

use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::io;
use std::path::{Component, Path, PathBuf};
use std::time::SystemTime;

use crate::vfs::error::{VfsError, VfsResult};
use crate::vfs::ops::{OpenFile, VfsOps};
use crate::vfs::types::{DirEntry, FileAttr, FileType};

/// Entry in the memory filesystem.
#[derive(Debug, Clone)]
enum Entry {
    File { data: Vec<u8>, attr: FileAttr },
    Directory { attr: FileAttr },
}

impl Entry {
    fn attr(&self) -> &FileAttr {
        match self {
            Entry::File { attr, .. } => attr,
            Entry::Directory { attr } => attr,
        }
    }

    fn new_dir() -> Self {
        Entry::Directory {
            attr: FileAttr::directory(0o755),
        }
    }
}

/// In-memory filesystem backend.
///
/// Keys are normalized relative paths; the empty path is the root directory.
#[derive(Debug)]
pub struct MemoryBackend {
    entries: RwLock<HashMap<PathBuf, Entry>>,
    read_only: bool,
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryBackend {
    /// Create a new empty in-memory filesystem.
    pub fn new() -> Self {
        let mut entries = HashMap::new();
        entries.insert(PathBuf::new(), Entry::new_dir());
        Self {
            entries: RwLock::new(entries),
            read_only: false,
        }
    }

    /// Set whether this filesystem is read-only.
    pub fn with_read_only(mut self, read_only: bool) -> Self {
        self.read_only = read_only;
        self
    }

    /// Normalize a path: remove leading `/`, resolve `.` and `..`.
    fn normalize(path: &Path) -> PathBuf {
        let mut result = PathBuf::new();
        for component in path.components() {
            match component {
                Component::ParentDir => {
                    result.pop();
                }
                Component::Normal(s) => result.push(s),
                Component::RootDir | Component::CurDir | Component::Prefix(_) => {}
            }
        }
        result
    }

    fn path_str(path: &Path) -> String {
        format!("/{}", path.display())
    }

    fn check_writable(&self) -> VfsResult<()> {
        if self.read_only {
            Err(VfsError::ReadOnly)
        } else {
            Ok(())
        }
    }

    /// The parent of `path` must exist and be a directory.
    fn check_parent(entries: &HashMap<PathBuf, Entry>, path: &Path) -> VfsResult<()> {
        let parent = path.parent().unwrap_or(Path::new(""));
        match entries.get(parent) {
            Some(Entry::Directory { .. }) => Ok(()),
            Some(_) => Err(VfsError::not_a_directory(Self::path_str(parent))),
            None => Err(VfsError::not_found(Self::path_str(parent))),
        }
    }

    fn has_children(entries: &HashMap<PathBuf, Entry>, path: &Path) -> bool {
        entries.keys().any(|k| k.parent() == Some(path))
    }
}

#[async_trait]
impl VfsOps for MemoryBackend {
    async fn getattr(&self, path: &Path) -> VfsResult<FileAttr> {
        let normalized = Self::normalize(path);
        self.entries
            .read()
            .get(&normalized)
            .map(|e| e.attr().clone())
            .ok_or_else(|| VfsError::not_found(Self::path_str(&normalized)))
    }

    async fn readdir(&self, path: &Path) -> VfsResult<Vec<DirEntry>> {
        let normalized = Self::normalize(path);
        let entries = self.entries.read();

        match entries.get(&normalized) {
            Some(Entry::Directory { .. }) => {}
            Some(_) => return Err(VfsError::not_a_directory(Self::path_str(&normalized))),
            None => return Err(VfsError::not_found(Self::path_str(&normalized))),
        }

        let mut result: Vec<DirEntry> = entries
            .iter()
            .filter(|(p, _)| p.parent() == Some(normalized.as_path()))
            .filter_map(|(p, entry)| {
                let name = p.file_name()?.to_string_lossy().into_owned();
                let attr = entry.attr();
                Some(DirEntry::new(name, attr.kind, attr.size))
            })
            .collect();

        result.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(result)
    }

    async fn open_read(&self, path: &Path) -> VfsResult<OpenFile> {
        let normalized = Self::normalize(path);
        let entries = self.entries.read();

        match entries.get(&normalized) {
            Some(Entry::File { data, attr }) => Ok(OpenFile {
                attr: attr.clone(),
                reader: Box::new(io::Cursor::new(data.clone())),
            }),
            Some(Entry::Directory { .. }) => {
                Err(VfsError::is_a_directory(Self::path_str(&normalized)))
            }
            None => Err(VfsError::not_found(Self::path_str(&normalized))),
        }
    }

    async fn write_all(&self, path: &Path, data: &[u8]) -> VfsResult<()> {
        self.check_writable()?;
        let normalized = Self::normalize(path);
        let mut entries = self.entries.write();

        if matches!(entries.get(&normalized), Some(Entry::Directory { .. })) {
            return Err(VfsError::is_a_directory(Self::path_str(&normalized)));
        }
        Self::check_parent(&entries, &normalized)?;

        let perm = match entries.get(&normalized) {
            Some(Entry::File { attr, .. }) => attr.perm,
            _ => 0o644,
        };
        entries.insert(
            normalized,
            Entry::File {
                data: data.to_vec(),
                attr: FileAttr::file(data.len() as u64, perm),
            },
        );
        Ok(())
    }

    async fn create_dir_all(&self, path: &Path) -> VfsResult<()> {
        self.check_writable()?;
        let normalized = Self::normalize(path);
        let mut entries = self.entries.write();

        let mut current = PathBuf::new();
        for component in normalized.components() {
            current.push(component);
            match entries.get(&current) {
                Some(Entry::Directory { .. }) => {}
                Some(Entry::File { .. }) => {
                    return Err(VfsError::not_a_directory(Self::path_str(&current)));
                }
                None => {
                    entries.insert(current.clone(), Entry::new_dir());
                }
            }
        }
        Ok(())
    }

    async fn rename(&self, from: &Path, to: &Path) -> VfsResult<()> {
        self.check_writable()?;
        let from = Self::normalize(from);
        let to = Self::normalize(to);
        if from == to {
            return Ok(());
        }
        if from.as_os_str().is_empty() || to.starts_with(&from) {
            return Err(VfsError::other(format!(
                "cannot move {} into itself",
                Self::path_str(&from)
            )));
        }

        let mut entries = self.entries.write();
        if !entries.contains_key(&from) {
            return Err(VfsError::not_found(Self::path_str(&from)));
        }
        Self::check_parent(&entries, &to)?;
        if matches!(entries.get(&to), Some(Entry::Directory { .. }))
            && Self::has_children(&entries, &to)
        {
            return Err(VfsError::Io(io::Error::new(
                io::ErrorKind::DirectoryNotEmpty,
                Self::path_str(&to),
            )));
        }

        let moved: Vec<PathBuf> = entries
            .keys()
            .filter(|k| k.starts_with(&from))
            .cloned()
            .collect();
        for old in moved {
            if let Some(mut entry) = entries.remove(&old) {
                let relative = old.strip_prefix(&from).unwrap_or(Path::new(""));
                if let Entry::File { attr, .. } | Entry::Directory { attr } = &mut entry {
                    attr.mtime = SystemTime::now();
                }
                entries.insert(to.join(relative), entry);
            }
        }
        Ok(())
    }

    async fn remove(&self, path: &Path) -> VfsResult<()> {
        self.check_writable()?;
        let normalized = Self::normalize(path);
        if normalized.as_os_str().is_empty() {
            return Err(VfsError::access_denied("cannot remove root"));
        }

        let mut entries = self.entries.write();
        match entries.get(&normalized) {
            Some(entry) if entry.attr().kind == FileType::Directory => {
                if Self::has_children(&entries, &normalized) {
                    return Err(VfsError::Io(io::Error::new(
                        io::ErrorKind::DirectoryNotEmpty,
                        Self::path_str(&normalized),
                    )));
                }
            }
            Some(_) => {}
            None => return Err(VfsError::not_found(Self::path_str(&normalized))),
        }
        entries.remove(&normalized);
        Ok(())
    }

    async fn remove_all(&self, path: &Path) -> VfsResult<()> {
        self.check_writable()?;
        let normalized = Self::normalize(path);
        if normalized.as_os_str().is_empty() {
            return Err(VfsError::access_denied("cannot remove root"));
        }

        self.entries.write().retain(|k, _| !k.starts_with(&normalized));
        Ok(())
    }

    fn read_only(&self) -> bool {
        self.read_only
    }
}
