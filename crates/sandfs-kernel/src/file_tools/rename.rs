//! MoveFileEngine — rename within a mount.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};
use tokio_util::sync::CancellationToken;

use super::{check_writable, ensure_parent};
use crate::provider::Provider;
use crate::tools::{FsTool, parse_params, required};
use crate::vfs::VfsResult;

/// Engine for moving or renaming a file or directory.
///
/// Both ends are resolved independently, so each must fall under a root
/// and pass the access policy.
pub struct MoveFileEngine {
    provider: Arc<dyn Provider>,
}

impl MoveFileEngine {
    pub fn new(provider: Arc<dyn Provider>) -> Self {
        Self { provider }
    }
}

#[derive(Deserialize)]
struct MoveParams {
    source: Option<String>,
    destination: Option<String>,
}

#[async_trait]
impl FsTool for MoveFileEngine {
    fn name(&self) -> &str {
        "move_file"
    }

    fn description(&self) -> &str {
        "Move or rename a file or directory."
    }

    fn schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "source": {
                    "type": "string",
                    "description": "The path to move."
                },
                "destination": {
                    "type": "string",
                    "description": "The new path."
                }
            },
            "required": ["source", "destination"]
        })
    }

    #[tracing::instrument(skip(self, params, _cancel), name = "engine.move_file")]
    async fn execute(&self, params: &Value, _cancel: &CancellationToken) -> VfsResult<Value> {
        check_writable(self.provider.as_ref())?;

        let p: MoveParams = parse_params(params)?;
        let source = required(p.source, "source")?;
        let destination = required(p.destination, "destination")?;

        let from = self.provider.resolve_path(&source)?;
        let to = self.provider.resolve_path(&destination)?;

        let fs = self.provider.fs();
        // The source must exist before any destination parent is created.
        fs.lgetattr(&from).await.map_err(|e| e.with_path(&source))?;
        ensure_parent(fs.as_ref(), &to).await?;
        fs.rename(&from, &to).await.map_err(|e| e.with_path(&source))?;

        tracing::debug!(%source, %destination, "moved");
        Ok(json!({ "success": true }))
    }
}
