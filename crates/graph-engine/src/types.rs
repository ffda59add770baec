//! Core types shared by the engine and its builders
//!
//! The terminal marker has exactly one internal representation,
//! [`Target::End`]. String spellings of it (`"END"` and [`END`]) are only
//! accepted where raw names enter the engine and are normalised there.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Unique identifier for a node
pub type NodeName = String;

/// Canonical spelling of the terminal marker
pub const END: &str = "__end__";

/// Short alias for the terminal marker accepted at public boundaries
pub const END_ALIAS: &str = "END";

/// Canonical spelling of the virtual start node
pub const START: &str = "__start__";

/// Short alias for the virtual start node
pub const START_ALIAS: &str = "START";

/// Check whether a raw string names the terminal marker
pub fn is_end(raw: &str) -> bool {
    raw == END || raw == END_ALIAS
}

/// Check whether a name may not be used for a user node
pub fn is_reserved(name: &str) -> bool {
    name.trim().is_empty() || is_end(name) || name == START || name == START_ALIAS
}

/// Destination of an edge or branch: a named node or the terminal marker
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Target {
    /// A node registered under this name
    Node(NodeName),
    /// Workflow completion
    End,
}

impl Target {
    /// Normalise a raw name, mapping terminal aliases to [`Target::End`]
    pub fn parse(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        if is_end(&raw) {
            Self::End
        } else {
            Self::Node(raw)
        }
    }

    /// Name of the target node, `None` for the terminal marker
    pub fn node_name(&self) -> Option<&str> {
        match self {
            Self::Node(name) => Some(name),
            Self::End => None,
        }
    }

    pub fn is_end(&self) -> bool {
        matches!(self, Self::End)
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Node(name) => write!(f, "{}", name),
            Self::End => write!(f, "{}", END),
        }
    }
}

impl From<String> for Target {
    fn from(raw: String) -> Self {
        Self::parse(raw)
    }
}

impl From<&str> for Target {
    fn from(raw: &str) -> Self {
        Self::parse(raw)
    }
}

impl From<Target> for String {
    fn from(target: Target) -> Self {
        target.to_string()
    }
}

/// Partial state returned by a node action
pub type StateUpdate = serde_json::Map<String, Value>;

/// Workflow state handed to node actions and route functions
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct State(serde_json::Map<String, Value>);

impl State {
    /// Create an empty state
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Get a string channel, `None` if absent or not a string
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    /// Get a boolean channel, `None` if absent or not a boolean
    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.0.get(key).and_then(Value::as_bool)
    }

    /// Set a channel value, returning the previous one
    pub fn insert(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.0.insert(key.into(), value)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.0.keys()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Borrow the underlying JSON object
    pub fn as_map(&self) -> &serde_json::Map<String, Value> {
        &self.0
    }
}

impl From<serde_json::Map<String, Value>> for State {
    fn from(map: serde_json::Map<String, Value>) -> Self {
        Self(map)
    }
}

/// Unit of work attached to a node
///
/// Receives the current state and returns the channels it wants to update.
/// How updates are merged is up to whatever executes the compiled graph.
pub type NodeAction = Arc<dyn Fn(&State) -> StateUpdate + Send + Sync>;

/// Routing function for conditional edges
///
/// Returns one of the keys of the branch mapping it was registered with.
pub type RouteFn = Arc<dyn Fn(&State) -> String + Send + Sync>;
