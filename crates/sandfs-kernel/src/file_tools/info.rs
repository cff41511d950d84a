//! GetFileInfoEngine — stat a path.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::Deserialize;
use serde_json::{Value, json};
use tokio_util::sync::CancellationToken;

use crate::provider::Provider;
use crate::tools::{FsTool, parse_params, required};
use crate::vfs::VfsResult;

/// Engine reporting name, kind, size and modification time.
pub struct GetFileInfoEngine {
    provider: Arc<dyn Provider>,
}

impl GetFileInfoEngine {
    pub fn new(provider: Arc<dyn Provider>) -> Self {
        Self { provider }
    }
}

#[derive(Deserialize)]
struct InfoParams {
    path: Option<String>,
}

#[async_trait]
impl FsTool for GetFileInfoEngine {
    fn name(&self) -> &str {
        "get_file_info"
    }

    fn description(&self) -> &str {
        "Retrieve metadata about a file or directory."
    }

    fn schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "path": {
                    "type": "string",
                    "description": "The path to inspect."
                }
            },
            "required": ["path"]
        })
    }

    #[tracing::instrument(skip(self, params, _cancel), name = "engine.get_file_info")]
    async fn execute(&self, params: &Value, _cancel: &CancellationToken) -> VfsResult<Value> {
        let p: InfoParams = parse_params(params)?;
        let path = required(p.path, "path")?;

        let resolved = self.provider.resolve_path(&path)?;
        let attr = self
            .provider
            .fs()
            .getattr(&resolved)
            .await
            .map_err(|e| e.with_path(&path))?;

        let name = resolved
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "/".to_string());
        let mod_time = DateTime::<Utc>::from(attr.mtime).to_rfc3339_opts(SecondsFormat::Secs, true);

        Ok(json!({
            "name": name,
            "is_dir": attr.is_dir(),
            "size": attr.size,
            "mod_time": mod_time,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::file_tools::test_support::{call, local, memory};

    #[tokio::test]
    async fn test_file_info() {
        let (dir, provider) = local(false);
        std::fs::write(dir.path().join("notes.md"), b"12345").unwrap();

        let engine = GetFileInfoEngine::new(provider);
        let out = call(&engine, json!({ "path": "/data/notes.md" })).await.unwrap();
        assert_eq!(out["name"], "notes.md");
        assert_eq!(out["is_dir"], false);
        assert_eq!(out["size"], 5);

        let mod_time = out["mod_time"].as_str().unwrap();
        assert!(DateTime::parse_from_rfc3339(mod_time).is_ok());
        assert!(mod_time.ends_with('Z'));
    }

    #[tokio::test]
    async fn test_directory_info() {
        let engine = GetFileInfoEngine::new(memory());
        let out = call(&engine, json!({ "path": "/" })).await.unwrap();
        assert_eq!(out["name"], "/");
        assert_eq!(out["is_dir"], true);
    }

    #[tokio::test]
    async fn test_missing() {
        let engine = GetFileInfoEngine::new(memory());
        assert!(call(&engine, json!({ "path": "/ghost" })).await.is_err());
    }
}
