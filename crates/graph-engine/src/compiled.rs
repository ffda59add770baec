//! Compiled, immutable state graphs

use std::fmt;

use crate::error::Result;
use crate::graph::{Branch, GraphEdge, GraphNode, GraphStructure};
use crate::options::CompileOptions;
use crate::schema::StateSchema;
use crate::types::{NodeAction, State, Target};

/// A validated graph ready to hand to an executor
///
/// Produced by `StateGraph::compile`. Nothing in it can change; later
/// mutations of the `StateGraph` it came from are not reflected here.
#[derive(Clone)]
pub struct CompiledGraph {
    name: String,
    schema: StateSchema,
    entry_point: String,
    nodes: Vec<GraphNode>,
    edges: Vec<GraphEdge>,
    branches: Vec<Branch>,
    interrupt_before: Vec<String>,
    interrupt_after: Vec<String>,
    debug: bool,
}

impl CompiledGraph {
    pub(crate) fn from_parts(
        options: CompileOptions,
        schema: StateSchema,
        entry_point: String,
        nodes: Vec<GraphNode>,
        edges: Vec<GraphEdge>,
        branches: Vec<Branch>,
    ) -> Self {
        Self {
            name: options.name.unwrap_or_else(|| schema.name.clone()),
            schema,
            entry_point,
            nodes,
            edges,
            branches,
            interrupt_before: options.interrupt_before,
            interrupt_after: options.interrupt_after,
            debug: options.debug,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn schema(&self) -> &StateSchema {
        &self.schema
    }

    pub fn entry_point(&self) -> &str {
        &self.entry_point
    }

    /// Node names in registration order
    pub fn node_names(&self) -> Vec<&str> {
        self.nodes.iter().map(|n| n.name.as_str()).collect()
    }

    /// Action registered for a node
    pub fn action(&self, name: &str) -> Option<&NodeAction> {
        self.nodes
            .iter()
            .find(|n| n.name == name)
            .map(|n| &n.action)
    }

    pub fn edges(&self) -> &[GraphEdge] {
        &self.edges
    }

    pub fn branches(&self) -> &[Branch] {
        &self.branches
    }

    /// Conditional edges leaving a node, if any
    pub fn branches_from<'a, 'b>(&'a self, name: &'b str) -> impl Iterator<Item = &'a Branch> + 'b
    where
        'a: 'b,
    {
        self.branches.iter().filter(move |b| b.source == name)
    }

    /// Plain edge targets leaving a node
    pub fn edge_targets(&self, name: &str) -> Vec<&Target> {
        self.edges
            .iter()
            .filter(|e| e.source == name)
            .map(|e| &e.target)
            .collect()
    }

    pub fn interrupt_before(&self) -> &[String] {
        &self.interrupt_before
    }

    pub fn interrupt_after(&self) -> &[String] {
        &self.interrupt_after
    }

    pub fn is_debug(&self) -> bool {
        self.debug
    }

    /// State with every schema channel at its initial value
    pub fn initial_state(&self) -> State {
        self.schema.initial_state()
    }

    /// Serializable description of the compiled structure
    pub fn structure(&self) -> GraphStructure {
        GraphStructure {
            name: self.name.clone(),
            entry_point: Some(self.entry_point.clone()),
            nodes: self.nodes.iter().map(|n| n.name.clone()).collect(),
            edges: self.edges.clone(),
            branches: self
                .branches
                .iter()
                .map(|b| crate::graph::BranchDescription {
                    source: b.source.clone(),
                    mapping: b.mapping.clone(),
                })
                .collect(),
            interrupt_before: self.interrupt_before.clone(),
            interrupt_after: self.interrupt_after.clone(),
        }
    }

    /// Structure as pretty-printed JSON
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.structure())?)
    }
}

impl fmt::Debug for CompiledGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompiledGraph")
            .field("name", &self.name)
            .field("entry_point", &self.entry_point)
            .field("nodes", &self.node_names())
            .field("edges", &self.edges)
            .field("branches", &self.branches)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::sync::Arc;

    use super::*;
    use crate::engine::GraphEngine;
    use crate::graph::StateGraph;
    use crate::schema::ChannelType;
    use crate::types::StateUpdate;

    fn compiled(options: CompileOptions) -> CompiledGraph {
        let schema = StateSchema::new("Review")
            .channel("draft", ChannelType::String)
            .channel("approved", ChannelType::Boolean);
        let mut graph = StateGraph::new(schema);
        graph
            .add_node(
                "write",
                Arc::new(|_: &State| {
                    let mut update = StateUpdate::new();
                    update.insert("draft".to_string(), serde_json::json!("v1"));
                    update
                }),
            )
            .unwrap();
        graph
            .add_node("review", Arc::new(|_: &State| StateUpdate::new()))
            .unwrap();
        graph.add_edge("write", Target::parse("review")).unwrap();
        graph
            .add_conditional_edges(
                "review",
                Arc::new(|state: &State| {
                    if state.get_bool("approved").unwrap_or(false) {
                        "approved".to_string()
                    } else {
                        "rejected".to_string()
                    }
                }),
                BTreeMap::from([
                    ("approved".to_string(), Target::End),
                    ("rejected".to_string(), Target::parse("write")),
                ]),
            )
            .unwrap();
        graph.set_entry_point("write").unwrap();
        graph.compile(options).unwrap()
    }

    #[test]
    fn test_name_falls_back_to_schema() {
        assert_eq!(compiled(CompileOptions::default()).name(), "Review");
        assert_eq!(
            compiled(CompileOptions::new().with_name("review-loop")).name(),
            "review-loop"
        );
    }

    #[test]
    fn test_actions_and_routes_are_preserved() {
        let graph = compiled(CompileOptions::default());
        let state = graph.initial_state();

        let update = (graph.action("write").unwrap())(&state);
        assert_eq!(update.get("draft"), Some(&serde_json::json!("v1")));

        let branch = graph.branches_from("review").next().unwrap();
        assert_eq!((branch.route)(&state), "rejected");
        assert_eq!(graph.edge_targets("write"), vec![&Target::parse("review")]);
    }

    #[test]
    fn test_branches_outlive_the_queried_name() {
        let graph = compiled(CompileOptions::default());

        let branches: Vec<&Branch> = {
            let name = String::from("review");
            graph.branches_from(&name).collect()
        };

        assert_eq!(branches.len(), 1);
        assert_eq!(branches[0].source, "review");
    }

    #[test]
    fn test_structure_json() {
        let graph = compiled(CompileOptions::new().interrupt_before("review"));
        let json: serde_json::Value = serde_json::from_str(&graph.to_json().unwrap()).unwrap();

        assert_eq!(json["entryPoint"], "write");
        assert_eq!(json["nodes"], serde_json::json!(["write", "review"]));
        assert_eq!(json["interruptBefore"], serde_json::json!(["review"]));
        assert_eq!(
            json["branches"][0]["mapping"],
            serde_json::json!({"approved": "__end__", "rejected": "write"})
        );
    }
}
