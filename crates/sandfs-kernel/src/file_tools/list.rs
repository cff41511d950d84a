//! ListDirectoryEngine — directory listing.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};
use tokio_util::sync::CancellationToken;

use crate::provider::Provider;
use crate::tools::{FsTool, parse_params, required};
use crate::vfs::VfsResult;

/// Engine for listing a directory.
pub struct ListDirectoryEngine {
    provider: Arc<dyn Provider>,
}

impl ListDirectoryEngine {
    pub fn new(provider: Arc<dyn Provider>) -> Self {
        Self { provider }
    }
}

#[derive(Deserialize)]
struct ListParams {
    path: Option<String>,
}

#[async_trait]
impl FsTool for ListDirectoryEngine {
    fn name(&self) -> &str {
        "list_directory"
    }

    fn description(&self) -> &str {
        "List files and directories in a given path."
    }

    fn schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "path": {
                    "type": "string",
                    "description": "The path to list."
                }
            },
            "required": ["path"]
        })
    }

    #[tracing::instrument(skip(self, params, _cancel), name = "engine.list_directory")]
    async fn execute(&self, params: &Value, _cancel: &CancellationToken) -> VfsResult<Value> {
        let p: ListParams = parse_params(params)?;
        let path = required(p.path, "path")?;

        let resolved = self.provider.resolve_path(&path)?;
        let entries = self
            .provider
            .fs()
            .readdir(&resolved)
            .await
            .map_err(|e| e.with_path(&path))?;

        let entries: Vec<Value> = entries
            .into_iter()
            .map(|e| {
                json!({
                    "name": e.name,
                    "is_dir": e.kind.is_dir(),
                    "size": e.size,
                })
            })
            .collect();
        Ok(json!({ "entries": entries }))
    }
}
