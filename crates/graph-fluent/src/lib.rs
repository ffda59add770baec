//! Graph Fluent - chaining builder over a state graph engine
//!
//! Wraps a [`GraphEngine`] so workflows read as a chain of calls on node
//! handles instead of string-keyed edge registration. It supports:
//!
//! - Node handles carrying a name and an action
//! - `connect_to` chains that hand back the next node to wire from
//! - Conditional routing with node handles or the end marker as targets
//! - Precondition checks before anything reaches the engine
//!
//! # Example
//!
//! ```ignore
//! use graph_fluent::{create_workflow, Node, CompileOptions, StateSchema, END};
//!
//! let workflow = create_workflow(StateSchema::new("Doc"));
//! let parse = workflow.register(&Node::new("parse").bind(parse_document))?;
//! let store = workflow.register(&Node::new("store").bind(store_document))?;
//!
//! parse.connect_to(&store)?.connect_to(END)?;
//! workflow.set_entry_point(&parse)?;
//! let compiled = workflow.compile(CompileOptions::default())?;
//! ```

pub mod error;
pub mod node;
pub mod workflow;

// Re-export key types
pub use error::{FluentError, Result};
pub use node::{EdgeTarget, Node, NodeRef};
pub use workflow::{create_workflow, BuilderState, Workflow};

// Re-export engine types that consumers will need
pub use graph_engine::{
    ChannelType, CompileOptions, CompiledGraph, EngineError, GraphEngine, NodeAction, RouteFn,
    State, StateGraph, StateSchema, StateUpdate, Target, END,
};
