//! DeleteFileEngine — remove files and directories.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};
use tokio_util::sync::CancellationToken;

use super::check_writable;
use crate::provider::Provider;
use crate::tools::{FsTool, parse_params, required};
use crate::vfs::VfsResult;

/// Engine for deleting a path.
///
/// Without `recursive`, only files and empty directories go.
pub struct DeleteFileEngine {
    provider: Arc<dyn Provider>,
}

impl DeleteFileEngine {
    pub fn new(provider: Arc<dyn Provider>) -> Self {
        Self { provider }
    }
}

#[derive(Deserialize)]
struct DeleteParams {
    path: Option<String>,
    #[serde(default)]
    recursive: bool,
}

#[async_trait]
impl FsTool for DeleteFileEngine {
    fn name(&self) -> &str {
        "delete_file"
    }

    fn description(&self) -> &str {
        "Delete a file or directory."
    }

    fn schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "path": {
                    "type": "string",
                    "description": "The path to delete."
                },
                "recursive": {
                    "type": "boolean",
                    "description": "Delete directories and their contents.",
                    "default": false
                }
            },
            "required": ["path"]
        })
    }

    #[tracing::instrument(skip(self, params, _cancel), name = "engine.delete_file")]
    async fn execute(&self, params: &Value, _cancel: &CancellationToken) -> VfsResult<Value> {
        check_writable(self.provider.as_ref())?;

        let p: DeleteParams = parse_params(params)?;
        let path = required(p.path, "path")?;

        let resolved = self.provider.resolve_path(&path)?;
        let fs = self.provider.fs();
        if p.recursive {
            fs.remove_all(&resolved).await.map_err(|e| e.with_path(&path))?;
        } else {
            fs.remove(&resolved).await.map_err(|e| e.with_path(&path))?;
        }

        tracing::debug!(%path, recursive = p.recursive, "deleted");
        Ok(json!({ "success": true }))
    }
}
