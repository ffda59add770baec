//! In-process state graph
//!
//! `StateGraph` records the structure a builder describes: nodes with their
//! actions, plain edges, conditional branches and the entry point. Names are
//! only checked for collisions while recording; whether edges point at real
//! nodes is decided once, at compile time, so a graph can be wired in any
//! order.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::compiled::CompiledGraph;
use crate::engine::GraphEngine;
use crate::error::{EngineError, Result};
use crate::options::CompileOptions;
use crate::schema::StateSchema;
use crate::types::{is_end, is_reserved, NodeAction, NodeName, RouteFn, Target};
use crate::validation::{find_unreachable, validate_graph};

/// A node together with the action it runs
#[derive(Clone)]
pub struct GraphNode {
    pub name: NodeName,
    pub action: NodeAction,
}

impl fmt::Debug for GraphNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GraphNode")
            .field("name", &self.name)
            .finish()
    }
}

/// A directed edge between two nodes, or from a node to the end
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GraphEdge {
    pub source: NodeName,
    pub target: Target,
}

/// Conditional edges leaving a single node
#[derive(Clone)]
pub struct Branch {
    pub source: NodeName,
    pub route: RouteFn,
    pub mapping: BTreeMap<String, Target>,
}

impl Branch {
    /// Targets this branch can route to
    pub fn targets(&self) -> impl Iterator<Item = &Target> {
        self.mapping.values()
    }
}

impl fmt::Debug for Branch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Branch")
            .field("source", &self.source)
            .field("mapping", &self.mapping)
            .finish()
    }
}

/// Serializable description of conditional edges
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BranchDescription {
    pub source: NodeName,
    pub mapping: BTreeMap<String, Target>,
}

/// Serializable snapshot of a graph's structure (actions omitted)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphStructure {
    pub name: String,
    pub entry_point: Option<NodeName>,
    pub nodes: Vec<NodeName>,
    pub edges: Vec<GraphEdge>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub branches: Vec<BranchDescription>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub interrupt_before: Vec<NodeName>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub interrupt_after: Vec<NodeName>,
}

/// Mutable graph under construction
pub struct StateGraph {
    schema: StateSchema,
    nodes: Vec<GraphNode>,
    edges: Vec<GraphEdge>,
    branches: Vec<Branch>,
    entry_point: Option<NodeName>,
}

impl StateGraph {
    /// Create an empty graph over the given state schema
    pub fn new(schema: StateSchema) -> Self {
        Self {
            schema,
            nodes: Vec::new(),
            edges: Vec::new(),
            branches: Vec::new(),
            entry_point: None,
        }
    }

    pub fn schema(&self) -> &StateSchema {
        &self.schema
    }

    /// Node names in insertion order
    pub fn node_names(&self) -> Vec<&str> {
        self.nodes.iter().map(|n| n.name.as_str()).collect()
    }

    pub fn has_node(&self, name: &str) -> bool {
        self.nodes.iter().any(|n| n.name == name)
    }

    /// Find a node by name
    pub fn find_node(&self, name: &str) -> Option<&GraphNode> {
        self.nodes.iter().find(|n| n.name == name)
    }

    pub fn nodes(&self) -> &[GraphNode] {
        &self.nodes
    }

    pub fn edges(&self) -> &[GraphEdge] {
        &self.edges
    }

    pub fn branches(&self) -> &[Branch] {
        &self.branches
    }

    pub fn entry_point(&self) -> Option<&str> {
        self.entry_point.as_deref()
    }

    /// Get edges going out of a node
    pub fn outgoing_edges<'a, 'b>(
        &'a self,
        name: &'b str,
    ) -> impl Iterator<Item = &'a GraphEdge> + 'b
    where
        'a: 'b,
    {
        self.edges.iter().filter(move |e| e.source == name)
    }

    /// Every target reachable in one step from `name`, through edges or branches
    pub fn successors(&self, name: &str) -> Vec<&Target> {
        let mut targets: Vec<&Target> = self
            .edges
            .iter()
            .filter(|e| e.source == name)
            .map(|e| &e.target)
            .collect();
        for branch in self.branches.iter().filter(|b| b.source == name) {
            targets.extend(branch.targets());
        }
        targets
    }

    /// Snapshot of the recorded structure
    pub fn structure(&self) -> GraphStructure {
        GraphStructure {
            name: self.schema.name.clone(),
            entry_point: self.entry_point.clone(),
            nodes: self.nodes.iter().map(|n| n.name.clone()).collect(),
            edges: self.edges.clone(),
            branches: self
                .branches
                .iter()
                .map(|b| BranchDescription {
                    source: b.source.clone(),
                    mapping: b.mapping.clone(),
                })
                .collect(),
            interrupt_before: Vec::new(),
            interrupt_after: Vec::new(),
        }
    }
}

impl GraphEngine for StateGraph {
    type Options = CompileOptions;
    type Compiled = CompiledGraph;

    fn add_node(&mut self, name: &str, action: NodeAction) -> Result<()> {
        if is_reserved(name) {
            return Err(EngineError::ReservedName(name.to_string()));
        }
        if self.has_node(name) {
            return Err(EngineError::DuplicateNode(name.to_string()));
        }

        log::debug!("state graph '{}': add node '{}'", self.schema.name, name);
        self.nodes.push(GraphNode {
            name: name.to_string(),
            action,
        });
        Ok(())
    }

    fn add_edge(&mut self, from: &str, to: Target) -> Result<()> {
        if is_end(from) {
            return Err(EngineError::EndAsSource);
        }

        let edge = GraphEdge {
            source: from.to_string(),
            target: to,
        };
        if self.edges.contains(&edge) {
            log::debug!(
                "state graph '{}': edge {} -> {} already present",
                self.schema.name,
                edge.source,
                edge.target
            );
            return Ok(());
        }

        log::debug!(
            "state graph '{}': add edge {} -> {}",
            self.schema.name,
            edge.source,
            edge.target
        );
        self.edges.push(edge);
        Ok(())
    }

    fn set_entry_point(&mut self, name: &str) -> Result<()> {
        if is_reserved(name) {
            return Err(EngineError::ReservedName(name.to_string()));
        }

        log::debug!("state graph '{}': entry point '{}'", self.schema.name, name);
        self.entry_point = Some(name.to_string());
        Ok(())
    }

    fn add_conditional_edges(
        &mut self,
        source: &str,
        route: RouteFn,
        mapping: BTreeMap<String, Target>,
    ) -> Result<()> {
        if is_end(source) {
            return Err(EngineError::EndAsSource);
        }

        log::debug!(
            "state graph '{}': add conditional edges from '{}' over {} route(s)",
            self.schema.name,
            source,
            mapping.len()
        );
        self.branches.push(Branch {
            source: source.to_string(),
            route,
            mapping,
        });
        Ok(())
    }

    fn compile(&mut self, options: CompileOptions) -> Result<CompiledGraph> {
        let errors = validate_graph(self, &options);
        if !errors.is_empty() {
            return Err(EngineError::Invalid(errors));
        }

        let unreachable = find_unreachable(self);
        if !unreachable.is_empty() {
            log::warn!(
                "state graph '{}': nodes unreachable from the entry point: {:?}",
                self.schema.name,
                unreachable
            );
        }

        let compiled = CompiledGraph::from_parts(
            options,
            self.schema.clone(),
            self.entry_point.clone().unwrap_or_default(),
            self.nodes.clone(),
            self.edges.clone(),
            self.branches.clone(),
        );
        log::info!(
            "compiled state graph '{}' with {} node(s), {} edge(s), {} branch(es)",
            compiled.name(),
            compiled.node_names().len(),
            compiled.edges().len(),
            compiled.branches().len()
        );
        Ok(compiled)
    }
}

impl fmt::Debug for StateGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateGraph")
            .field("schema", &self.schema.name)
            .field("nodes", &self.node_names())
            .field("edges", &self.edges)
            .field("branches", &self.branches)
            .field("entry_point", &self.entry_point)
            .finish()
    }
}
