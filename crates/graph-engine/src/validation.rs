//! Graph validation for state graphs
//!
//! Validates that the entry point, every edge endpoint, every branch and
//! every interrupt refers to a node that exists. Cycles are allowed: loops
//! are expressed with conditional edges.

use std::collections::{HashSet, VecDeque};

use crate::graph::StateGraph;
use crate::options::CompileOptions;
use crate::types::Target;

/// Validation error with location context
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// No entry point was set
    MissingEntryPoint,
    /// The entry point names a node that does not exist
    UnknownEntryPoint { node_id: String },
    /// An edge starts at a node that does not exist
    UnknownEdgeSource { source: String, target: String },
    /// An edge ends at a node that does not exist
    UnknownEdgeTarget { source: String, target: String },
    /// Conditional edges leave a node that does not exist
    UnknownBranchSource { source: String },
    /// A branch route resolves to a node that does not exist
    UnknownBranchTarget {
        source: String,
        key: String,
        target: String,
    },
    /// Conditional edges were added with nothing to route to
    EmptyBranch { source: String },
    /// An interrupt names a node that does not exist
    UnknownInterrupt { node_id: String },
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingEntryPoint => write!(f, "No entry point set"),
            Self::UnknownEntryPoint { node_id } => {
                write!(f, "Entry point '{}' is not a node", node_id)
            }
            Self::UnknownEdgeSource { source, target } => {
                write!(
                    f,
                    "Edge '{}' -> '{}' starts at unknown node '{}'",
                    source, target, source
                )
            }
            Self::UnknownEdgeTarget { source, target } => {
                write!(
                    f,
                    "Edge '{}' -> '{}' ends at unknown node '{}'",
                    source, target, target
                )
            }
            Self::UnknownBranchSource { source } => {
                write!(f, "Conditional edges leave unknown node '{}'", source)
            }
            Self::UnknownBranchTarget {
                source,
                key,
                target,
            } => {
                write!(
                    f,
                    "Route '{}' from '{}' leads to unknown node '{}'",
                    key, source, target
                )
            }
            Self::EmptyBranch { source } => {
                write!(f, "Conditional edges from '{}' have no routes", source)
            }
            Self::UnknownInterrupt { node_id } => {
                write!(f, "Interrupt references unknown node '{}'", node_id)
            }
        }
    }
}

impl std::error::Error for ValidationError {}

/// Validate a state graph before compiling it
///
/// Returns all validation errors found (not just the first).
pub fn validate_graph(graph: &StateGraph, options: &CompileOptions) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    validate_entry_point(graph, &mut errors);
    validate_edge_references(graph, &mut errors);
    validate_branches(graph, &mut errors);
    validate_interrupts(graph, options, &mut errors);

    errors
}

/// Nodes that cannot be reached from the entry point
///
/// Returns an empty list when no valid entry point is set.
pub fn find_unreachable(graph: &StateGraph) -> Vec<String> {
    let Some(entry) = graph.entry_point().filter(|e| graph.has_node(e)) else {
        return Vec::new();
    };

    let mut visited: HashSet<&str> = HashSet::new();
    let mut queue: VecDeque<&str> = VecDeque::new();
    visited.insert(entry);
    queue.push_back(entry);

    while let Some(node_id) = queue.pop_front() {
        for target in graph.successors(node_id) {
            if let Target::Node(next) = target {
                if visited.insert(next.as_str()) {
                    queue.push_back(next.as_str());
                }
            }
        }
    }

    graph
        .node_names()
        .into_iter()
        .filter(|name| !visited.contains(name))
        .map(str::to_string)
        .collect()
}

fn validate_entry_point(graph: &StateGraph, errors: &mut Vec<ValidationError>) {
    match graph.entry_point() {
        None => errors.push(ValidationError::MissingEntryPoint),
        Some(entry) if !graph.has_node(entry) => {
            errors.push(ValidationError::UnknownEntryPoint {
                node_id: entry.to_string(),
            });
        }
        Some(_) => {}
    }
}

/// Check that all edge source/target nodes exist
fn validate_edge_references(graph: &StateGraph, errors: &mut Vec<ValidationError>) {
    let node_ids: HashSet<&str> = graph.node_names().into_iter().collect();

    for edge in graph.edges() {
        if !node_ids.contains(edge.source.as_str()) {
            errors.push(ValidationError::UnknownEdgeSource {
                source: edge.source.clone(),
                target: edge.target.to_string(),
            });
        }
        if let Target::Node(target) = &edge.target {
            if !node_ids.contains(target.as_str()) {
                errors.push(ValidationError::UnknownEdgeTarget {
                    source: edge.source.clone(),
                    target: target.clone(),
                });
            }
        }
    }
}

fn validate_branches(graph: &StateGraph, errors: &mut Vec<ValidationError>) {
    for branch in graph.branches() {
        if !graph.has_node(&branch.source) {
            errors.push(ValidationError::UnknownBranchSource {
                source: branch.source.clone(),
            });
        }
        if branch.mapping.is_empty() {
            errors.push(ValidationError::EmptyBranch {
                source: branch.source.clone(),
            });
        }
        for (key, target) in &branch.mapping {
            if let Target::Node(name) = target {
                if !graph.has_node(name) {
                    errors.push(ValidationError::UnknownBranchTarget {
                        source: branch.source.clone(),
                        key: key.clone(),
                        target: name.clone(),
                    });
                }
            }
        }
    }
}

fn validate_interrupts(
    graph: &StateGraph,
    options: &CompileOptions,
    errors: &mut Vec<ValidationError>,
) {
    for node_id in options
        .interrupt_before
        .iter()
        .chain(options.interrupt_after.iter())
    {
        if !graph.has_node(node_id) {
            errors.push(ValidationError::UnknownInterrupt {
                node_id: node_id.clone(),
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::sync::Arc;

    use super::*;
    use crate::engine::GraphEngine;
    use crate::schema::StateSchema;
    use crate::types::{NodeAction, RouteFn, State, StateUpdate};

    fn noop() -> NodeAction {
        Arc::new(|_: &State| StateUpdate::new())
    }

    fn route() -> RouteFn {
        Arc::new(|_: &State| "ok".to_string())
    }

    fn graph_with(nodes: &[&str]) -> StateGraph {
        let mut graph = StateGraph::new(StateSchema::new("Test"));
        for name in nodes {
            graph.add_node(name, noop()).unwrap();
        }
        graph
    }

    #[test]
    fn test_valid_graph() {
        let mut graph = graph_with(&["a", "b"]);
        graph.add_edge("a", Target::parse("b")).unwrap();
        graph.add_edge("b", Target::End).unwrap();
        graph.set_entry_point("a").unwrap();

        let errors = validate_graph(&graph, &CompileOptions::default());
        assert!(errors.is_empty(), "Expected no errors, got: {:?}", errors);
    }

    #[test]
    fn test_cycles_are_allowed() {
        let mut graph = graph_with(&["a", "b"]);
        graph.add_edge("a", Target::parse("b")).unwrap();
        graph.add_edge("b", Target::parse("a")).unwrap();
        graph.set_entry_point("a").unwrap();

        assert!(validate_graph(&graph, &CompileOptions::default()).is_empty());
    }

    #[test]
    fn test_missing_entry_point() {
        let graph = graph_with(&["a"]);
        let errors = validate_graph(&graph, &CompileOptions::default());
        assert_eq!(errors, vec![ValidationError::MissingEntryPoint]);
    }

    #[test]
    fn test_unknown_entry_point() {
        let mut graph = graph_with(&["a"]);
        graph.set_entry_point("b").unwrap();
        let errors = validate_graph(&graph, &CompileOptions::default());
        assert_eq!(
            errors,
            vec![ValidationError::UnknownEntryPoint {
                node_id: "b".to_string()
            }]
        );
    }

    #[test]
    fn test_edge_references_missing_node() {
        let mut graph = graph_with(&["a"]);
        graph.set_entry_point("a").unwrap();
        graph.add_edge("a", Target::parse("missing")).unwrap();

        let errors = validate_graph(&graph, &CompileOptions::default());
        assert!(errors.iter().any(|e| matches!(
            e,
            ValidationError::UnknownEdgeTarget { target, .. } if target == "missing"
        )));
    }

    #[test]
    fn test_branch_errors() {
        let mut graph = graph_with(&["a"]);
        graph.set_entry_point("a").unwrap();
        graph
            .add_conditional_edges(
                "a",
                route(),
                BTreeMap::from([("ok".to_string(), Target::parse("ghost"))]),
            )
            .unwrap();
        graph
            .add_conditional_edges("nobody", route(), BTreeMap::new())
            .unwrap();

        let errors = validate_graph(&graph, &CompileOptions::default());
        assert!(errors
            .iter()
            .any(|e| matches!(e, ValidationError::UnknownBranchTarget { key, .. } if key == "ok")));
        assert!(errors
            .iter()
            .any(|e| matches!(e, ValidationError::UnknownBranchSource { .. })));
        assert!(errors
            .iter()
            .any(|e| matches!(e, ValidationError::EmptyBranch { .. })));
    }

    #[test]
    fn test_unknown_interrupt() {
        let mut graph = graph_with(&["a"]);
        graph.set_entry_point("a").unwrap();
        let options = CompileOptions::new()
            .interrupt_before("a")
            .interrupt_after("review");

        let errors = validate_graph(&graph, &options);
        assert_eq!(
            errors,
            vec![ValidationError::UnknownInterrupt {
                node_id: "review".to_string()
            }]
        );
    }

    #[test]
    fn test_find_unreachable() {
        let mut graph = graph_with(&["a", "b", "c", "orphan"]);
        graph.set_entry_point("a").unwrap();
        graph.add_edge("a", Target::parse("b")).unwrap();
        graph
            .add_conditional_edges(
                "b",
                route(),
                BTreeMap::from([
                    ("ok".to_string(), Target::parse("c")),
                    ("done".to_string(), Target::End),
                ]),
            )
            .unwrap();

        assert_eq!(find_unreachable(&graph), vec!["orphan"]);
    }

    #[test]
    fn test_find_unreachable_without_entry_point() {
        let graph = graph_with(&["a", "b"]);
        assert!(find_unreachable(&graph).is_empty());
    }
}
