//! Workflow builder
//!
//! A [`Workflow`] owns one engine instance and the name → node lookup of
//! everything registered into it. Structural calls are checked here first
//! and forwarded to the engine only once they are known to be valid, so a
//! failed call leaves both the builder and the engine untouched.
//!
//! # Lifecycle
//!
//! `Empty → HasNodes → HasEntryPoint → Compiled`. Registering, wiring and
//! choosing the entry point may happen in any order before `compile`. What
//! further structural calls do after `compile` is up to the engine and is
//! not guarded here.

use std::cell::{Ref, RefCell, RefMut};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::rc::{Rc, Weak};
use std::sync::Arc;

use graph_engine::{GraphEngine, State, StateGraph, StateSchema, Target};

use crate::error::{FluentError, Result};
use crate::node::{EdgeTarget, Node, NodeRef, WorkflowRef};

/// Edge creation as seen from a registered node
pub(crate) trait Wiring {
    fn has_node(&self, name: &str) -> bool;

    fn add_edge(&mut self, from: &str, to: Target) -> graph_engine::Result<()>;
}

/// Where a workflow is in its build lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuilderState {
    /// Nothing registered yet
    Empty,
    /// At least one node registered, no entry point
    HasNodes,
    /// Entry point chosen, ready to compile
    HasEntryPoint,
    /// `compile` has succeeded
    Compiled,
}

struct WorkflowInner<E> {
    engine: E,
    nodes: HashMap<String, Node>,
    entry_point: Option<String>,
    compiled: bool,
}

impl<E: GraphEngine> Wiring for WorkflowInner<E> {
    fn has_node(&self, name: &str) -> bool {
        self.nodes.contains_key(name)
    }

    fn add_edge(&mut self, from: &str, to: Target) -> graph_engine::Result<()> {
        self.engine.add_edge(from, to)
    }
}

/// Builder that assembles nodes and edges on top of a graph engine
///
/// Handles are single-threaded: the builder and its nodes share state
/// through `Rc`/`RefCell` and are not `Send`.
pub struct Workflow<E = StateGraph> {
    inner: Rc<RefCell<WorkflowInner<E>>>,
}

/// Create a workflow over a fresh [`StateGraph`]
pub fn create_workflow(schema: StateSchema) -> Workflow<StateGraph> {
    Workflow::new(schema)
}

impl Workflow<StateGraph> {
    /// Create a workflow over a fresh [`StateGraph`] for `schema`
    pub fn new(schema: StateSchema) -> Self {
        Self::with_engine(StateGraph::new(schema))
    }
}

impl<E: GraphEngine + 'static> Workflow<E> {
    /// Wrap an existing engine instance
    pub fn with_engine(engine: E) -> Self {
        Self {
            inner: Rc::new(RefCell::new(WorkflowInner {
                engine,
                nodes: HashMap::new(),
                entry_point: None,
                compiled: false,
            })),
        }
    }

    /// Register a node and return it, so edges can be chained from it
    ///
    /// On success the node's owning workflow is this one and the engine has
    /// received the node's name and action. Registering the same handle
    /// twice is a no-op.
    pub fn register(&self, node: &Node) -> Result<Node> {
        let name = node.name().to_string();
        let action = node
            .action()
            .ok_or_else(|| FluentError::MissingCallable(name.clone()))?;

        if let Some(owner) = node.owner() {
            if owner.upgrade().is_none() {
                return Err(FluentError::WorkflowDropped(name));
            }
            if !self.owns(&owner) {
                return Err(FluentError::ForeignNode(name));
            }
            if self.get(&name).is_some_and(|existing| existing.same_node(node)) {
                return Ok(node.clone());
            }
        }

        let mut inner = self.inner_mut()?;
        if inner.nodes.contains_key(&name) {
            return Err(FluentError::DuplicateNode(name));
        }

        inner.engine.add_node(&name, action)?;
        inner.nodes.insert(name.clone(), node.clone());
        node.set_owner(self.downgrade());

        log::debug!("registered node '{}'", name);
        Ok(node.clone())
    }

    /// Register a node and return the workflow, for builder-style chaining
    pub fn add_node(&self, node: &Node) -> Result<&Self> {
        self.register(node)?;
        Ok(self)
    }

    /// Choose the node execution starts at
    pub fn set_entry_point<'a>(&self, node: impl Into<NodeRef<'a>>) -> Result<&Self> {
        let name = self.resolve(node.into())?;

        let mut inner = self.inner_mut()?;
        inner.engine.set_entry_point(&name)?;
        log::debug!("entry point set to '{}'", name);
        inner.entry_point = Some(name);
        Ok(self)
    }

    /// Route out of `source` by the key `condition` returns
    ///
    /// Node handles in `mapping` are replaced by their names and end-marker
    /// spellings by [`Target::End`] before the engine sees them. The keys
    /// `condition` may return are not checked against `mapping`.
    pub fn add_conditional_edges<'a, F, I, K, T>(
        &self,
        source: impl Into<NodeRef<'a>>,
        condition: F,
        mapping: I,
    ) -> Result<&Self>
    where
        F: Fn(&State) -> String + Send + Sync + 'static,
        I: IntoIterator<Item = (K, T)>,
        K: Into<String>,
        T: Into<EdgeTarget<'a>>,
    {
        let source = self.resolve(source.into())?;

        let mut resolved = BTreeMap::new();
        for (key, target) in mapping {
            resolved.insert(key.into(), self.resolve_target(target.into())?);
        }

        log::debug!(
            "conditional edges from '{}': {:?}",
            source,
            resolved.keys().collect::<Vec<_>>()
        );
        self.inner_mut()?
            .engine
            .add_conditional_edges(&source, Arc::new(condition), resolved)?;
        Ok(self)
    }

    /// Look up a registered node by name
    pub fn get(&self, name: &str) -> Option<Node> {
        self.inner.borrow().nodes.get(name).cloned()
    }

    /// Copy of the name → node lookup
    ///
    /// Changing the returned map does not affect the workflow.
    pub fn nodes(&self) -> HashMap<String, Node> {
        self.inner.borrow().nodes.clone()
    }

    /// Registered node names, sorted
    pub fn node_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.inner.borrow().nodes.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn entry_point(&self) -> Option<String> {
        self.inner.borrow().entry_point.clone()
    }

    /// Borrow the wrapped engine
    ///
    /// While the returned guard is alive, calls that change the workflow fail
    /// with [`FluentError::WorkflowBorrowed`].
    pub fn engine(&self) -> Ref<'_, E> {
        Ref::map(self.inner.borrow(), |inner| &inner.engine)
    }

    pub fn state(&self) -> BuilderState {
        let inner = self.inner.borrow();
        if inner.compiled {
            BuilderState::Compiled
        } else if inner.entry_point.is_some() {
            BuilderState::HasEntryPoint
        } else if !inner.nodes.is_empty() {
            BuilderState::HasNodes
        } else {
            BuilderState::Empty
        }
    }

    /// Compile through the engine and return its artifact unchanged
    pub fn compile(&self, options: E::Options) -> Result<E::Compiled> {
        let mut inner = self.inner_mut()?;
        if inner.entry_point.is_none() {
            return Err(FluentError::NoEntryPoint);
        }

        let compiled = inner.engine.compile(options)?;
        inner.compiled = true;
        log::debug!("workflow compiled with {} node(s)", inner.nodes.len());
        Ok(compiled)
    }

    fn inner_mut(&self) -> Result<RefMut<'_, WorkflowInner<E>>> {
        self.inner
            .try_borrow_mut()
            .map_err(|_| FluentError::WorkflowBorrowed)
    }

    fn downgrade(&self) -> WorkflowRef {
        let strong: Rc<RefCell<dyn Wiring>> = self.inner.clone();
        Rc::downgrade(&strong)
    }

    fn owns(&self, owner: &WorkflowRef) -> bool {
        Weak::ptr_eq(owner, &self.downgrade())
    }

    fn check_owned(&self, node: &Node) -> Result<()> {
        match node.owner() {
            None => Err(FluentError::NotRegistered(node.name().to_string())),
            Some(owner) if owner.upgrade().is_none() => {
                Err(FluentError::WorkflowDropped(node.name().to_string()))
            }
            Some(owner) if !self.owns(&owner) => {
                Err(FluentError::ForeignNode(node.name().to_string()))
            }
            Some(_) => Ok(()),
        }
    }

    fn unknown(&self, name: &str) -> FluentError {
        FluentError::UnknownNode {
            name: name.to_string(),
            available: self.node_names(),
        }
    }

    /// Resolve a reference to the name of a node registered here
    fn resolve(&self, node: NodeRef<'_>) -> Result<String> {
        if let NodeRef::Node(handle) = &node {
            self.check_owned(handle)?;
        }
        let name = node.name();
        if self.inner.borrow().nodes.contains_key(name) {
            Ok(name.to_string())
        } else {
            Err(self.unknown(name))
        }
    }

    fn resolve_target(&self, target: EdgeTarget<'_>) -> Result<Target> {
        match target {
            EdgeTarget::End => Ok(Target::End),
            EdgeTarget::Node(node) => {
                self.check_owned(node)?;
                Ok(Target::Node(node.name().to_string()))
            }
            EdgeTarget::Name(name) => match Target::parse(name) {
                Target::End => Ok(Target::End),
                Target::Node(name) => {
                    if self.inner.borrow().nodes.contains_key(&name) {
                        Ok(Target::Node(name))
                    } else {
                        Err(self.unknown(&name))
                    }
                }
            },
        }
    }
}

impl<E> fmt::Display for Workflow<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.borrow();
        let mut names: Vec<&String> = inner.nodes.keys().collect();
        names.sort();
        write!(
            f,
            "Workflow(nodes={:?}, entry_point={:?})",
            names, inner.entry_point
        )
    }
}

impl<E> fmt::Debug for Workflow<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("Workflow")
            .field("nodes", &inner.nodes.len())
            .field("entry_point", &inner.entry_point)
            .field("compiled", &inner.compiled)
            .finish()
    }
}
