//! Filesystem tool engines.
//!
//! Every engine follows the same shape: validate arguments, resolve each
//! virtual path through the mount's [`Provider`], perform one filesystem
//! primitive, and shape the JSON result.
//!
//! ```text
//! tool call (JSON args, virtual paths)
//!          │
//!          ▼
//!   engine (validate) ──► Provider::resolve_path ──► backend path
//!          │                                            │
//!          ▼                                            ▼
//!   JSON result  ◄──────────────  VfsOps primitive on the backend path
//! ```

use std::io;
use std::path::Path;
use std::sync::Arc;

use crate::provider::Provider;
use crate::tools::{FsTool, ToolRegistry};
use crate::vfs::{VfsError, VfsOps, VfsResult};

pub mod delete;
pub mod info;
pub mod list;
pub mod read;
pub mod rename;
pub mod roots;
pub mod search;
pub mod write;

pub use delete::DeleteFileEngine;
pub use info::GetFileInfoEngine;
pub use list::ListDirectoryEngine;
pub use read::{MAX_READ_SIZE, ReadFileEngine};
pub use rename::MoveFileEngine;
pub use roots::ListAllowedDirectoriesEngine;
pub use search::SearchFilesEngine;
pub use write::WriteFileEngine;

/// Every tool, bound to one provider.
pub fn builtin_tools(provider: Arc<dyn Provider>) -> Vec<Arc<dyn FsTool>> {
    vec![
        Arc::new(ListDirectoryEngine::new(provider.clone())),
        Arc::new(ReadFileEngine::new(provider.clone())),
        Arc::new(WriteFileEngine::new(provider.clone())),
        Arc::new(MoveFileEngine::new(provider.clone())),
        Arc::new(DeleteFileEngine::new(provider.clone())),
        Arc::new(GetFileInfoEngine::new(provider.clone())),
        Arc::new(SearchFilesEngine::new(provider.clone())),
        Arc::new(ListAllowedDirectoriesEngine::new(provider)),
    ]
}

/// A registry holding [`builtin_tools`].
pub fn registry_for(provider: Arc<dyn Provider>) -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    for tool in builtin_tools(provider) {
        registry.register(tool);
    }
    registry
}

/// Mutating tools refuse before looking at their arguments.
fn check_writable(provider: &dyn Provider) -> VfsResult<()> {
    if provider.fs().read_only() {
        Err(VfsError::ReadOnly)
    } else {
        Ok(())
    }
}

/// Create the parent directory of `path` if needed.
async fn ensure_parent(fs: &dyn VfsOps, path: &Path) -> VfsResult<()> {
    let Some(parent) = path.parent() else {
        return Ok(());
    };
    match fs.create_dir_all(parent).await {
        Ok(()) => Ok(()),
        Err(VfsError::Io(e)) => Err(VfsError::ParentDirectory(e)),
        Err(VfsError::NotADirectory(_)) => Err(VfsError::ParentDirectory(io::Error::from(
            io::ErrorKind::NotADirectory,
        ))),
        Err(e) => Err(e),
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::provider::{LocalProvider, MemoryProvider};
    use crate::sandbox::{AccessPolicy, SymlinkMode};
    use serde_json::Value;
    use tempfile::TempDir;
    use tokio_util::sync::CancellationToken;

    /// A local provider mounting a fresh temp dir at `/data`.
    pub fn local(read_only: bool) -> (TempDir, Arc<dyn Provider>) {
        let dir = TempDir::new().unwrap();
        let provider = LocalProvider::new(
            [("/data", dir.path().to_path_buf())].into_iter().collect(),
            AccessPolicy::permissive(),
            SymlinkMode::Allow,
            read_only,
        );
        (dir, Arc::new(provider))
    }

    pub fn memory() -> Arc<dyn Provider> {
        Arc::new(MemoryProvider::default())
    }

    pub async fn call(tool: &dyn FsTool, params: Value) -> VfsResult<Value> {
        tool.execute(&params, &CancellationToken::new()).await
    }
}
