//! ReadFileEngine — whole-file reads with a size cap.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};
use tokio_util::sync::CancellationToken;

use crate::provider::Provider;
use crate::tools::{FsTool, parse_params, required};
use crate::vfs::{FileAttr, VfsError, VfsResult};

/// Largest file `read_file` will load (10 MiB).
pub const MAX_READ_SIZE: u64 = 10 * 1024 * 1024;

/// Engine for reading a whole file.
pub struct ReadFileEngine {
    provider: Arc<dyn Provider>,
    max_size: u64,
}

impl ReadFileEngine {
    pub fn new(provider: Arc<dyn Provider>) -> Self {
        Self {
            provider,
            max_size: MAX_READ_SIZE,
        }
    }

    pub fn with_max_size(mut self, max_size: u64) -> Self {
        self.max_size = max_size;
        self
    }

    fn check_readable(&self, path: &str, attr: &FileAttr) -> VfsResult<()> {
        if attr.is_dir() {
            return Err(VfsError::is_a_directory(path));
        }
        if !attr.is_file() {
            return Err(VfsError::NotRegularFile(path.to_string()));
        }
        if attr.size > self.max_size {
            return Err(VfsError::SizeLimitExceeded {
                limit: self.max_size,
            });
        }
        Ok(())
    }
}

#[derive(Deserialize)]
struct ReadParams {
    path: Option<String>,
}

#[async_trait]
impl FsTool for ReadFileEngine {
    fn name(&self) -> &str {
        "read_file"
    }

    fn description(&self) -> &str {
        "Read the complete contents of a file."
    }

    fn schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "path": {
                    "type": "string",
                    "description": "The path of the file to read."
                }
            },
            "required": ["path"]
        })
    }

    #[tracing::instrument(skip(self, params, _cancel), name = "engine.read_file")]
    async fn execute(&self, params: &Value, _cancel: &CancellationToken) -> VfsResult<Value> {
        let p: ReadParams = parse_params(params)?;
        let path = required(p.path, "path")?;

        let resolved = self.provider.resolve_path(&path)?;
        let fs = self.provider.fs();

        // Stat first: opening a fifo for reading would block.
        let attr = fs.getattr(&resolved).await.map_err(|e| e.with_path(&path))?;
        self.check_readable(&path, &attr)?;

        let file = fs.open_read(&resolved).await.map_err(|e| e.with_path(&path))?;
        self.check_readable(&path, &file.attr)?;
        let data = file.read_to_end_limited(self.max_size).await?;

        Ok(json!({ "content": String::from_utf8_lossy(&data) }))
    }
}
