//! Virtual Filesystem abstraction.
//!
//! Key components:
//!
//! - [`VfsOps`] - Filesystem handle a provider hands out
//! - [`OsBackend`] - Real filesystem access on already-resolved paths
//! - [`MemoryBackend`] - In-memory filesystem (ephemeral mounts, testing)
//!
//! ## Design Decisions
//!
//! - **Resolve first, then act**: backends never see caller input. A
//!   provider maps the virtual path to a backend path and only that result
//!   reaches `VfsOps`.
//! - **Streaming reads**: `open_read` hands back a reader so size caps are
//!   enforced while reading, not after.

pub mod backends;
mod error;
mod ops;
mod types;

pub use backends::{MemoryBackend, OsBackend};
pub use error::{VfsError, VfsResult};
pub use ops::{FileReader, OpenFile, VfsOps};
pub use types::{DirEntry, FileAttr, FileType};
pub(crate) use types::is_hidden_name;

