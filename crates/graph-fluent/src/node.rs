//! Node handles and edge chaining
//!
//! A [`Node`] is a cheap, cloneable handle. Clones share one identity: binding
//! an action or registering through any clone is visible through all of
//! them. Two handles created by separate `Node::new` calls are different
//! nodes even when their names match.

use std::cell::{RefCell, RefMut};
use std::fmt;
use std::rc::{Rc, Weak};
use std::sync::Arc;

use graph_engine::{is_end, NodeAction, State, StateUpdate, Target};

use crate::error::{FluentError, Result};
use crate::workflow::Wiring;

pub(crate) type WorkflowRef = Weak<RefCell<dyn Wiring>>;

struct NodeInner {
    name: String,
    action: RefCell<Option<NodeAction>>,
    workflow: RefCell<Option<WorkflowRef>>,
}

/// A named unit of work that can be wired into a workflow
#[derive(Clone)]
pub struct Node {
    inner: Rc<NodeInner>,
}

impl Node {
    /// Create a detached node with no action
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            inner: Rc::new(NodeInner {
                name: name.into(),
                action: RefCell::new(None),
                workflow: RefCell::new(None),
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Set the action this node runs
    ///
    /// The signature is not checked here. Binding after registration does not
    /// change the action the workflow's engine already holds.
    pub fn bind<F>(self, action: F) -> Self
    where
        F: Fn(&State) -> StateUpdate + Send + Sync + 'static,
    {
        self.bind_action(Arc::new(action))
    }

    /// Set an already shared action
    pub fn bind_action(self, action: NodeAction) -> Self {
        *self.inner.action.borrow_mut() = Some(action);
        self
    }

    pub fn action(&self) -> Option<NodeAction> {
        self.inner.action.borrow().clone()
    }

    pub fn is_bound(&self) -> bool {
        self.inner.action.borrow().is_some()
    }

    /// Whether the node has been registered into a workflow
    pub fn is_registered(&self) -> bool {
        self.inner.workflow.borrow().is_some()
    }

    /// Whether `other` is a handle to this same node
    pub fn same_node(&self, other: &Node) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    /// Add an edge from this node to `target`
    ///
    /// Returns the node the next call in a chain should go to: the target
    /// node for node targets, this node for the end marker or a name.
    ///
    /// ```ignore
    /// validate.connect_to(&process)?.connect_to(&save)?.connect_to(END)?;
    /// ```
    pub fn connect_to<'a>(&self, target: impl Into<EdgeTarget<'a>>) -> Result<Node> {
        let workflow = self.owning_workflow()?;

        match target.into() {
            EdgeTarget::Node(other) => {
                let other_owner = other
                    .owner()
                    .ok_or_else(|| FluentError::NotRegistered(other.name().to_string()))?;
                if !Weak::ptr_eq(&Rc::downgrade(&workflow), &other_owner) {
                    return Err(FluentError::CrossWorkflow {
                        source_node: self.name().to_string(),
                        target_node: other.name().to_string(),
                    });
                }

                wiring_mut(&workflow)?
                    .add_edge(self.name(), Target::Node(other.name().to_string()))?;
                log::debug!("edge {} -> {}", self.name(), other.name());
                Ok(other.clone())
            }
            EdgeTarget::End => {
                wiring_mut(&workflow)?.add_edge(self.name(), Target::End)?;
                log::debug!("edge {} -> end", self.name());
                Ok(self.clone())
            }
            EdgeTarget::Name(name) => match Target::parse(name) {
                Target::End => {
                    wiring_mut(&workflow)?.add_edge(self.name(), Target::End)?;
                    log::debug!("edge {} -> end", self.name());
                    Ok(self.clone())
                }
                Target::Node(name) => {
                    if !workflow.borrow().has_node(&name) {
                        return Err(FluentError::InvalidTarget {
                            source_node: self.name().to_string(),
                            target: name,
                        });
                    }
                    wiring_mut(&workflow)?.add_edge(self.name(), Target::Node(name.clone()))?;
                    log::debug!("edge {} -> {}", self.name(), name);
                    Ok(self.clone())
                }
            },
        }
    }

    pub(crate) fn owner(&self) -> Option<WorkflowRef> {
        self.inner.workflow.borrow().clone()
    }

    pub(crate) fn set_owner(&self, workflow: WorkflowRef) {
        *self.inner.workflow.borrow_mut() = Some(workflow);
    }

    fn owning_workflow(&self) -> Result<Rc<RefCell<dyn Wiring>>> {
        let owner = self
            .owner()
            .ok_or_else(|| FluentError::NotRegistered(self.name().to_string()))?;
        owner
            .upgrade()
            .ok_or_else(|| FluentError::WorkflowDropped(self.name().to_string()))
    }
}

fn wiring_mut(workflow: &RefCell<dyn Wiring>) -> Result<RefMut<'_, dyn Wiring + 'static>> {
    workflow
        .try_borrow_mut()
        .map_err(|_| FluentError::WorkflowBorrowed)
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Node({})", self.name())
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("name", &self.name())
            .field("bound", &self.is_bound())
            .field("registered", &self.is_registered())
            .finish()
    }
}

/// Where an edge or conditional route leads
///
/// Strings spelling the end marker (`"END"`, [`graph_engine::END`]) become
/// [`EdgeTarget::End`] on conversion.
#[derive(Debug, Clone)]
pub enum EdgeTarget<'a> {
    /// Another node handle
    Node(&'a Node),
    /// Workflow completion
    End,
    /// A node referenced by name
    Name(String),
}

impl<'a> From<&'a Node> for EdgeTarget<'a> {
    fn from(node: &'a Node) -> Self {
        Self::Node(node)
    }
}

impl From<&str> for EdgeTarget<'_> {
    fn from(raw: &str) -> Self {
        if is_end(raw) {
            Self::End
        } else {
            Self::Name(raw.to_string())
        }
    }
}

impl From<String> for EdgeTarget<'_> {
    fn from(raw: String) -> Self {
        if is_end(&raw) {
            Self::End
        } else {
            Self::Name(raw)
        }
    }
}

impl From<Target> for EdgeTarget<'_> {
    fn from(target: Target) -> Self {
        match target {
            Target::Node(name) => Self::Name(name),
            Target::End => Self::End,
        }
    }
}

/// A registered node, by handle or by name
#[derive(Debug, Clone)]
pub enum NodeRef<'a> {
    Node(&'a Node),
    Name(String),
}

impl NodeRef<'_> {
    pub fn name(&self) -> &str {
        match self {
            Self::Node(node) => node.name(),
            Self::Name(name) => name,
        }
    }
}

impl<'a> From<&'a Node> for NodeRef<'a> {
    fn from(node: &'a Node) -> Self {
        Self::Node(node)
    }
}

impl From<&str> for NodeRef<'_> {
    fn from(name: &str) -> Self {
        Self::Name(name.to_string())
    }
}

impl From<String> for NodeRef<'_> {
    fn from(name: String) -> Self {
        Self::Name(name)
    }
}

#[cfg(test)]
mod tests {
    use graph_engine::{StateSchema, END};

    use super::*;
    use crate::workflow::create_workflow;

    fn noop(_: &State) -> StateUpdate {
        StateUpdate::new()
    }

    fn node(name: &str) -> Node {
        Node::new(name).bind(noop)
    }

    #[test]
    fn test_connect_before_register_fails() {
        let a = node("a");
        let b = node("b");

        assert!(matches!(
            a.connect_to(&b),
            Err(FluentError::NotRegistered(name)) if name == "a"
        ));
        assert!(matches!(
            a.connect_to(END),
            Err(FluentError::NotRegistered(_))
        ));
    }

    #[test]
    fn test_connect_to_unregistered_target_fails() {
        let workflow = create_workflow(StateSchema::new("Test"));
        let a = workflow.register(&node("a")).unwrap();
        let b = node("b");

        assert!(matches!(
            a.connect_to(&b),
            Err(FluentError::NotRegistered(name)) if name == "b"
        ));
    }

    #[test]
    fn test_connect_across_workflows_fails() {
        let first = create_workflow(StateSchema::new("First"));
        let second = create_workflow(StateSchema::new("Second"));
        let a = first.register(&node("a")).unwrap();
        let b = second.register(&node("b")).unwrap();

        assert!(matches!(
            a.connect_to(&b),
            Err(FluentError::CrossWorkflow { source_node, target_node })
                if source_node == "a" && target_node == "b"
        ));
        assert!(first.engine().edges().is_empty());
        assert!(second.engine().edges().is_empty());
    }

    #[test]
    fn test_connect_to_node_returns_target() {
        let workflow = create_workflow(StateSchema::new("Test"));
        let a = workflow.register(&node("a")).unwrap();
        let b = workflow.register(&node("b")).unwrap();

        let next = a.connect_to(&b).unwrap();
        assert!(next.same_node(&b));
    }

    #[test]
    fn test_connect_to_end_returns_self() {
        let workflow = create_workflow(StateSchema::new("Test"));
        let a = workflow.register(&node("a")).unwrap();

        assert!(a.connect_to(END).unwrap().same_node(&a));
        assert!(a.connect_to("END").unwrap().same_node(&a));
        assert!(a.connect_to(EdgeTarget::End).unwrap().same_node(&a));

        let edges = workflow.engine().edges().to_vec();
        assert_eq!(edges.len(), 1);
        assert_eq!(edges[0].target, Target::End);
    }

    #[test]
    fn test_connect_to_registered_name_returns_self() {
        let workflow = create_workflow(StateSchema::new("Test"));
        let a = workflow.register(&node("a")).unwrap();
        workflow.register(&node("b")).unwrap();

        assert!(a.connect_to("b").unwrap().same_node(&a));
        assert_eq!(
            workflow.engine().edges()[0].target,
            Target::Node("b".to_string())
        );
    }

    #[test]
    fn test_connect_to_unknown_name_is_invalid_target() {
        let workflow = create_workflow(StateSchema::new("Test"));
        let a = workflow.register(&node("a")).unwrap();

        assert!(matches!(
            a.connect_to("missing"),
            Err(FluentError::InvalidTarget { target, .. }) if target == "missing"
        ));
        assert!(matches!(
            a.connect_to(""),
            Err(FluentError::InvalidTarget { .. })
        ));
        assert!(workflow.engine().edges().is_empty());
    }

    #[test]
    fn test_connect_after_workflow_dropped() {
        let a = {
            let workflow = create_workflow(StateSchema::new("Test"));
            let a = workflow.register(&node("a")).unwrap();
            a
        };

        assert!(a.is_registered());
        assert!(matches!(
            a.connect_to(END),
            Err(FluentError::WorkflowDropped(_))
        ));
    }

    #[test]
    fn test_connect_while_engine_borrowed() {
        let workflow = create_workflow(StateSchema::new("Test"));
        let a = workflow.register(&node("a")).unwrap();
        let b = workflow.register(&node("b")).unwrap();

        let engine = workflow.engine();
        assert!(matches!(a.connect_to(END), Err(FluentError::WorkflowBorrowed)));
        assert!(matches!(a.connect_to(&b), Err(FluentError::WorkflowBorrowed)));
        assert!(matches!(a.connect_to("b"), Err(FluentError::WorkflowBorrowed)));
        assert!(engine.edges().is_empty());
        drop(engine);

        assert!(a.connect_to(&b).unwrap().same_node(&b));
    }

    #[test]
    fn test_handles_with_same_name_are_distinct() {
        let first = node("a");
        let second = node("a");
        assert!(!first.same_node(&second));
        assert!(first.same_node(&first.clone()));
    }

    #[test]
    fn test_bind_and_display() {
        let unbound = Node::new("draft");
        assert!(!unbound.is_bound());
        assert_eq!(unbound.to_string(), "Node(draft)");

        let bound = unbound.bind(noop);
        assert!(bound.is_bound());
        assert!(!bound.is_registered());
        let update = (bound.action().unwrap())(&State::new());
        assert!(update.is_empty());
    }

    #[test]
    fn test_edge_target_conversions() {
        assert!(matches!(EdgeTarget::from("END"), EdgeTarget::End));
        assert!(matches!(EdgeTarget::from(END.to_string()), EdgeTarget::End));
        assert!(matches!(EdgeTarget::from(Target::End), EdgeTarget::End));
        assert!(matches!(EdgeTarget::from("next"), EdgeTarget::Name(n) if n == "next"));
    }
}
