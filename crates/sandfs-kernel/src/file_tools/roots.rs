//! ListAllowedDirectoriesEngine — the virtual roots a mount exposes.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Value, json};
use tokio_util::sync::CancellationToken;

use crate::provider::Provider;
use crate::tools::FsTool;
use crate::vfs::VfsResult;

/// Engine reporting the mount's virtual roots.
pub struct ListAllowedDirectoriesEngine {
    provider: Arc<dyn Provider>,
}

impl ListAllowedDirectoriesEngine {
    pub fn new(provider: Arc<dyn Provider>) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl FsTool for ListAllowedDirectoriesEngine {
    fn name(&self) -> &str {
        "list_allowed_directories"
    }

    fn description(&self) -> &str {
        "List the root directories this filesystem may access."
    }

    fn schema(&self) -> Value {
        json!({ "type": "object", "properties": {} })
    }

    #[tracing::instrument(skip_all, name = "engine.list_allowed_directories")]
    async fn execute(&self, _params: &Value, _cancel: &CancellationToken) -> VfsResult<Value> {
        Ok(json!({ "roots": self.provider.roots() }))
    }
}
