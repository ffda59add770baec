//! State schema definitions
//!
//! A schema names the channels a workflow state carries and the kind of
//! value each one holds. The engine keeps the schema alongside the graph so
//! a compiled graph can hand out a correctly shaped initial state.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Result;
use crate::types::State;

/// The kind of value stored in a channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelType {
    /// Accepts any JSON value
    #[default]
    Any,
    /// Text string
    String,
    /// Boolean flag
    Boolean,
    /// Numeric value
    Number,
    /// Ordered list of values
    List,
    /// Arbitrary JSON object
    Json,
}

impl ChannelType {
    /// Value a channel of this type starts with
    pub fn default_value(&self) -> Value {
        match self {
            Self::Any => Value::Null,
            Self::String => Value::String(String::new()),
            Self::Boolean => Value::Bool(false),
            Self::Number => Value::from(0),
            Self::List => Value::Array(Vec::new()),
            Self::Json => Value::Object(serde_json::Map::new()),
        }
    }
}

/// A single named state channel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Channel {
    pub name: String,
    #[serde(default)]
    pub channel_type: ChannelType,
    /// Overrides the type's default initial value
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<Value>,
}

/// Describes the shape of a workflow state
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StateSchema {
    pub name: String,
    #[serde(default)]
    pub channels: Vec<Channel>,
}

impl StateSchema {
    /// Create a schema with no channels
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            channels: Vec::new(),
        }
    }

    /// Load a schema from its JSON representation
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Add a channel, replacing any existing channel of the same name
    pub fn channel(mut self, name: impl Into<String>, channel_type: ChannelType) -> Self {
        let name = name.into();
        self.channels.retain(|c| c.name != name);
        self.channels.push(Channel {
            name,
            channel_type,
            default_value: None,
        });
        self
    }

    /// Set the initial value of the most recently added channel
    ///
    /// Must be called immediately after `channel`.
    pub fn with_default(mut self, value: Value) -> Self {
        if let Some(channel) = self.channels.last_mut() {
            channel.default_value = Some(value);
        }
        self
    }

    pub fn get_channel(&self, name: &str) -> Option<&Channel> {
        self.channels.iter().find(|c| c.name == name)
    }

    pub fn channel_names(&self) -> Vec<&str> {
        self.channels.iter().map(|c| c.name.as_str()).collect()
    }

    /// Build a state with every channel set to its initial value
    pub fn initial_state(&self) -> State {
        let mut state = State::new();
        for channel in &self.channels {
            let value = channel
                .default_value
                .clone()
                .unwrap_or_else(|| channel.channel_type.default_value());
            state.insert(channel.name.clone(), value);
        }
        state
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_state_uses_type_defaults() {
        let schema = StateSchema::new("Doc")
            .channel("document", ChannelType::String)
            .channel("is_valid", ChannelType::Boolean)
            .channel("attempts", ChannelType::Number)
            .channel("history", ChannelType::List);

        let state = schema.initial_state();
        assert_eq!(state.get_str("document"), Some(""));
        assert_eq!(state.get_bool("is_valid"), Some(false));
        assert_eq!(state.get("attempts"), Some(&serde_json::json!(0)));
        assert_eq!(state.get("history"), Some(&serde_json::json!([])));
    }

    #[test]
    fn test_with_default_overrides_type_default() {
        let schema = StateSchema::new("Doc")
            .channel("step", ChannelType::String)
            .with_default(serde_json::json!("pending"));

        assert_eq!(schema.initial_state().get_str("step"), Some("pending"));
    }

    #[test]
    fn test_redeclared_channel_replaces_previous() {
        let schema = StateSchema::new("Doc")
            .channel("value", ChannelType::String)
            .channel("value", ChannelType::Number);

        assert_eq!(schema.channels.len(), 1);
        assert_eq!(
            schema.get_channel("value").map(|c| c.channel_type),
            Some(ChannelType::Number)
        );
    }

    #[test]
    fn test_schema_from_json() {
        let schema = StateSchema::from_json(
            r#"{
                "name": "Doc",
                "channels": [
                    {"name": "document", "channelType": "string"},
                    {"name": "meta"}
                ]
            }"#,
        )
        .unwrap();

        assert_eq!(schema.channel_names(), vec!["document", "meta"]);
        assert_eq!(
            schema.get_channel("meta").map(|c| c.channel_type),
            Some(ChannelType::Any)
        );
    }
}
