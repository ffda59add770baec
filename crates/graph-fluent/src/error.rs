//! Error types for the fluent builder

use graph_engine::EngineError;
use thiserror::Error;

/// Result type alias using FluentError
pub type Result<T> = std::result::Result<T, FluentError>;

/// Errors raised while assembling a workflow
///
/// Every variant is a precondition violation detected at the call that
/// returns it; nothing is retried or rolled back.
#[derive(Debug, Error)]
pub enum FluentError {
    /// Node used for edge creation before it was registered
    #[error("Node '{0}' must be added to a workflow before creating edges")]
    NotRegistered(String),

    /// The workflow the node was registered into no longer exists
    #[error("Workflow owning node '{0}' has been dropped")]
    WorkflowDropped(String),

    /// Nodes belong to different workflow instances
    #[error("Nodes '{source_node}' and '{target_node}' belong to different workflows")]
    CrossWorkflow {
        source_node: String,
        target_node: String,
    },

    /// Edge target is neither a node, the end marker, nor a registered name
    #[error("Invalid edge target '{target}' from node '{source_node}'")]
    InvalidTarget { source_node: String, target: String },

    /// Node registered without an action
    #[error("Node '{0}' must have an action bound before adding to a workflow")]
    MissingCallable(String),

    /// Node already belongs to another workflow instance
    #[error("Node '{0}' is already registered in another workflow")]
    ForeignNode(String),

    /// Reference to a node that is not registered
    #[error("Node '{name}' not found in workflow. Available nodes: {available:?}")]
    UnknownNode {
        name: String,
        available: Vec<String>,
    },

    /// A different node is already registered under this name
    #[error("A different node named '{0}' is already registered")]
    DuplicateNode(String),

    /// The workflow is borrowed elsewhere, usually by a live `engine()` guard
    #[error("Workflow is borrowed; release any engine() reference before changing it")]
    WorkflowBorrowed,

    /// Compile attempted without an entry point
    #[error("Entry point must be set before compiling")]
    NoEntryPoint,

    /// The underlying engine rejected the operation
    #[error("Engine error: {0}")]
    Engine(#[from] EngineError),
}
