//! The engine seam
//!
//! Builders drive an engine exclusively through this trait, one call per
//! structural change. [`StateGraph`](crate::StateGraph) is the in-process
//! implementation; anything else that can record nodes, edges and branches
//! and turn them into an executable artifact can stand in for it.

use std::collections::BTreeMap;

use crate::error::Result;
use crate::types::{NodeAction, RouteFn, Target};

/// Operations a graph engine exposes to builders
pub trait GraphEngine {
    /// Options accepted by `compile`
    type Options: Default;

    /// Artifact produced by `compile`
    type Compiled;

    /// Register a node under `name` with the action it runs
    fn add_node(&mut self, name: &str, action: NodeAction) -> Result<()>;

    /// Add a directed edge from `from` to a node or the terminal marker
    fn add_edge(&mut self, from: &str, to: Target) -> Result<()>;

    /// Designate the node the workflow starts at
    fn set_entry_point(&mut self, name: &str) -> Result<()>;

    /// Route out of `source` by the key `route` returns, looked up in `mapping`
    fn add_conditional_edges(
        &mut self,
        source: &str,
        route: RouteFn,
        mapping: BTreeMap<String, Target>,
    ) -> Result<()>;

    /// Finalise the recorded structure into an executable artifact
    fn compile(&mut self, options: Self::Options) -> Result<Self::Compiled>;
}
