//! Tool abstraction and registry.
//!
//! A tool takes a JSON argument object and returns a JSON result object.
//! Engines live in [`crate::file_tools`]; a [`ToolRegistry`] holds the set a
//! mount exposes and dispatches calls by name.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio_util::sync::CancellationToken;

use crate::vfs::{VfsError, VfsResult};

// ============================================================================
// Tool Info
// ============================================================================

/// Information about a tool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolInfo {
    /// Tool name (unique identifier).
    pub name: String,
    /// Human-readable description.
    pub description: String,
    /// JSON Schema of the argument object.
    pub input_schema: Value,
}

impl ToolInfo {
    /// Create a new tool info.
    pub fn new(name: impl Into<String>, description: impl Into<String>, input_schema: Value) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            input_schema,
        }
    }
}

// ============================================================================
// Tool Trait
// ============================================================================

/// A filesystem tool.
#[async_trait]
pub trait FsTool: Send + Sync {
    /// Get the tool name.
    fn name(&self) -> &str;

    /// Get the tool description.
    fn description(&self) -> &str;

    /// Get the JSON Schema for tool input parameters.
    fn schema(&self) -> Value;

    /// Run the tool. Long-running tools poll `cancel`.
    async fn execute(&self, params: &Value, cancel: &CancellationToken) -> VfsResult<Value>;

    /// Describe this tool.
    fn info(&self) -> ToolInfo {
        ToolInfo::new(self.name(), self.description(), self.schema())
    }
}

/// Deserialize a tool's argument object.
///
/// `null` is treated as an empty object so tools can report the specific
/// missing argument.
pub fn parse_params<T: DeserializeOwned>(params: &Value) -> VfsResult<T> {
    let params = match params {
        Value::Null => Value::Object(Default::default()),
        Value::Object(_) => params.clone(),
        other => {
            return Err(VfsError::InvalidArguments(format!(
                "expected an object, got {other}"
            )));
        }
    };
    serde_json::from_value(params).map_err(|e| VfsError::InvalidArguments(e.to_string()))
}

/// Unwrap a required argument.
pub fn required<T>(value: Option<T>, name: &'static str) -> VfsResult<T> {
    value.ok_or(VfsError::MissingArgument(name))
}

// ============================================================================
// Registry
// ============================================================================

/// Registry of tools, keyed by name.
#[derive(Default, Clone)]
pub struct ToolRegistry {
    tools: BTreeMap<String, Arc<dyn FsTool>>,
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("tools", &self.tools.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl ToolRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool, replacing any tool with the same name.
    pub fn register(&mut self, tool: Arc<dyn FsTool>) {
        self.tools.insert(tool.name().to_string(), tool);
    }

    /// Remove a tool.
    pub fn remove(&mut self, name: &str) -> bool {
        self.tools.remove(name).is_some()
    }

    /// Get a tool by name.
    pub fn get(&self, name: &str) -> Option<Arc<dyn FsTool>> {
        self.tools.get(name).cloned()
    }

    /// Check if a tool is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    /// Describe all tools, sorted by name.
    pub fn list(&self) -> Vec<ToolInfo> {
        self.tools.values().map(|t| t.info()).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Dispatch a call by tool name.
    pub async fn call(
        &self,
        name: &str,
        params: &Value,
        cancel: &CancellationToken,
    ) -> VfsResult<Value> {
        let tool = self
            .get(name)
            .ok_or_else(|| VfsError::UnknownTool(name.to_string()))?;
        tool.execute(params, cancel).await
    }
}
