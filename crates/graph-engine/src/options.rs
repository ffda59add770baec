//! Compile options

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Options passed to [`StateGraph::compile`](crate::StateGraph)
///
/// Every field is optional when loaded from JSON.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CompileOptions {
    /// Name of the compiled graph; falls back to the state schema name
    pub name: Option<String>,
    /// Nodes an executor should pause before running
    pub interrupt_before: Vec<String>,
    /// Nodes an executor should pause after running
    pub interrupt_after: Vec<String>,
    /// Emit verbose information during execution
    pub debug: bool,
}

impl CompileOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load options from their JSON representation
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn interrupt_before(mut self, node: impl Into<String>) -> Self {
        self.interrupt_before.push(node.into());
        self
    }

    pub fn interrupt_after(mut self, node: impl Into<String>) -> Self {
        self.interrupt_after.push(node.into());
        self
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }
}
