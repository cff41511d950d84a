//! VFS backends.
//!
//! Backends implement [`VfsOps`](super::VfsOps) for different storage types.

mod memory;
mod os;

pub use memory::MemoryBackend;
pub use os::OsBackend;
