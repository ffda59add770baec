//! Graph Engine - state graph assembly and compilation
//!
//! This crate records the structure of a stateful workflow graph and turns
//! it into an immutable, validated artifact. It supports:
//!
//! - Named nodes carrying an action over a JSON state
//! - Plain edges and conditional edges routed by a function of the state
//! - A single sentinel for workflow completion ([`Target::End`])
//! - Compile-time validation that reports every structural problem at once
//!
//! Running a compiled graph is left to an executor.
//!
//! # Example
//!
//! ```ignore
//! use graph_engine::{GraphEngine, StateGraph, StateSchema, Target, CompileOptions};
//!
//! let mut graph = StateGraph::new(StateSchema::new("Doc"));
//! graph.add_node("parse", parse_action)?;
//! graph.add_edge("parse", Target::End)?;
//! graph.set_entry_point("parse")?;
//! let compiled = graph.compile(CompileOptions::default())?;
//! ```

pub mod compiled;
pub mod engine;
pub mod error;
pub mod graph;
pub mod options;
pub mod schema;
pub mod types;
pub mod validation;

// Re-export key types
pub use compiled::CompiledGraph;
pub use engine::GraphEngine;
pub use error::{EngineError, Result};
pub use graph::{Branch, BranchDescription, GraphEdge, GraphNode, GraphStructure, StateGraph};
pub use options::CompileOptions;
pub use schema::{Channel, ChannelType, StateSchema};
pub use types::{
    is_end, is_reserved, NodeAction, NodeName, RouteFn, State, StateUpdate, Target, END, END_ALIAS,
    START, START_ALIAS,
};
pub use validation::{find_unreachable, validate_graph, ValidationError};
