//! WriteFileEngine — create or overwrite a file.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};
use tokio_util::sync::CancellationToken;

use super::{check_writable, ensure_parent};
use crate::provider::Provider;
use crate::tools::{FsTool, parse_params, required};
use crate::vfs::VfsResult;

/// Engine for writing a whole file.
///
/// Missing parent directories are created. New files are owner-only on
/// unix backends.
pub struct WriteFileEngine {
    provider: Arc<dyn Provider>,
}

impl WriteFileEngine {
    pub fn new(provider: Arc<dyn Provider>) -> Self {
        Self { provider }
    }
}

#[derive(Deserialize)]
struct WriteParams {
    path: Option<String>,
    content: Option<String>,
}

#[async_trait]
impl FsTool for WriteFileEngine {
    fn name(&self) -> &str {
        "write_file"
    }

    fn description(&self) -> &str {
        "Create a new file or overwrite an existing one."
    }

    fn schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "path": {
                    "type": "string",
                    "description": "The path of the file to write."
                },
                "content": {
                    "type": "string",
                    "description": "The content to write."
                }
            },
            "required": ["path", "content"]
        })
    }

    #[tracing::instrument(skip(self, params, _cancel), name = "engine.write_file")]
    async fn execute(&self, params: &Value, _cancel: &CancellationToken) -> VfsResult<Value> {
        check_writable(self.provider.as_ref())?;

        let p: WriteParams = parse_params(params)?;
        let path = required(p.path, "path")?;
        let content = required(p.content, "content")?;

        let resolved = self.provider.resolve_path(&path)?;
        let fs = self.provider.fs();
        ensure_parent(fs.as_ref(), &resolved).await?;
        fs.write_all(&resolved, content.as_bytes())
            .await
            .map_err(|e| e.with_path(&path))?;

        tracing::debug!(path = %path, bytes = content.len(), "wrote file");
        Ok(json!({ "success": true }))
    }
}
