//! Error types for the graph engine

use thiserror::Error;

use crate::validation::ValidationError;

/// Result type alias using EngineError
pub type Result<T> = std::result::Result<T, EngineError>;

/// Errors that can occur while assembling or compiling a state graph
#[derive(Debug, Error)]
pub enum EngineError {
    /// Node name collides with a sentinel or is empty
    #[error("Node name '{0}' is reserved")]
    ReservedName(String),

    /// A node with this name was already added
    #[error("Node '{0}' is already present in the graph")]
    DuplicateNode(String),

    /// The terminal marker was used as an edge or branch source
    #[error("The end marker cannot be the source of an edge")]
    EndAsSource,

    /// Structural validation failed during compile
    #[error("Graph validation failed with {} error(s): {}", .0.len(), join_errors(.0))]
    Invalid(Vec<ValidationError>),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

impl EngineError {
    /// Validation errors carried by an `Invalid` error, empty otherwise
    pub fn validation_errors(&self) -> &[ValidationError] {
        match self {
            Self::Invalid(errors) => errors,
            _ => &[],
        }
    }
}
