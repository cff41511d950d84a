//! # sandfs-kernel
//!
//! Sandboxed virtual filesystem for tool-driven agents.
//!
//! A mount maps caller-facing virtual roots onto real directories (or an
//! in-memory tree) and exposes a fixed set of filesystem tools over it:
//! - Virtual paths resolve by longest-prefix root match
//! - Resolution canonicalizes symlinks and never leaves the matched root
//! - Allow/deny lists are checked against the canonical path, deny first
//! - Content search runs on a worker pool with match and size caps and a
//!   cancellation token

pub mod config;
pub mod file_tools;
pub mod mount;
pub mod provider;
pub mod sandbox;
pub mod search;
pub mod tools;
pub mod vfs;

pub use config::{Backend, MountConfig, SandboxConfig};
pub use file_tools::{
    DeleteFileEngine, GetFileInfoEngine, ListAllowedDirectoriesEngine, ListDirectoryEngine,
    MoveFileEngine, ReadFileEngine, SearchFilesEngine, WriteFileEngine, builtin_tools,
    registry_for,
};
pub use mount::{Mount, MountInfo, MountRegistry};
pub use provider::{LocalProvider, MemoryProvider, Provider};
pub use sandbox::{AccessPolicy, RootMap, SymlinkMode};
pub use search::{ContentSearch, MAX_FILE_SIZE, MAX_MATCHES, SearchMatch};
pub use tools::{FsTool, ToolInfo, ToolRegistry};
pub use vfs::{
    DirEntry, FileAttr, FileType, MemoryBackend, OpenFile, OsBackend, VfsError, VfsOps, VfsResult,
};

pub use tokio_util::sync::CancellationToken;
