//! SearchFilesEngine — regex content search under a directory.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};
use tokio_util::sync::CancellationToken;

use crate::provider::Provider;
use crate::search::{ContentSearch, compile_excludes, compile_pattern};
use crate::tools::{FsTool, parse_params, required};
use crate::vfs::VfsResult;

/// Engine for searching file contents.
///
/// Hidden entries and paths the access policy rejects are never searched;
/// at most 100 matches come back.
pub struct SearchFilesEngine {
    provider: Arc<dyn Provider>,
    workers: Option<usize>,
}

impl SearchFilesEngine {
    pub fn new(provider: Arc<dyn Provider>) -> Self {
        Self {
            provider,
            workers: None,
        }
    }

    /// Override the worker pool size.
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = Some(workers);
        self
    }
}

#[derive(Deserialize)]
struct SearchParams {
    path: Option<String>,
    pattern: Option<String>,
    #[serde(default)]
    exclude_patterns: Vec<String>,
}

#[async_trait]
impl FsTool for SearchFilesEngine {
    fn name(&self) -> &str {
        "search_files"
    }

    fn description(&self) -> &str {
        "Recursively search file contents for a regular expression."
    }

    fn schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "path": {
                    "type": "string",
                    "description": "The directory (or file) to search."
                },
                "pattern": {
                    "type": "string",
                    "description": "Regular expression matched against each line."
                },
                "exclude_patterns": {
                    "type": "array",
                    "items": { "type": "string" },
                    "description": "Glob patterns for names or relative paths to skip."
                }
            },
            "required": ["path", "pattern"]
        })
    }

    #[tracing::instrument(skip(self, params, cancel), name = "engine.search_files")]
    async fn execute(&self, params: &Value, cancel: &CancellationToken) -> VfsResult<Value> {
        let p: SearchParams = parse_params(params)?;
        let path = required(p.path, "path")?;
        let pattern = required(p.pattern, "pattern")?;

        // Bad patterns fail before any filesystem access.
        let regex = compile_pattern(&pattern)?;
        let excludes = compile_excludes(&p.exclude_patterns)?;

        let resolved = self.provider.resolve_path(&path)?;
        let provider = self.provider.clone();
        let mut search = ContentSearch::new(self.provider.fs(), resolved, path, regex)
            .with_excludes(excludes)
            .with_filter(move |p| provider.check_access(p).is_ok());
        if let Some(workers) = self.workers {
            search = search.with_workers(workers);
        }
        let matches = search.run(cancel).await?;

        tracing::debug!(count = matches.len(), "search finished");
        Ok(json!({ "matches": matches }))
    }
}
