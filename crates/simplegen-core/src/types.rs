//! Core types — the chat message format, system-prompt placement, and a typed
//! view over a model's stored parameters.
//!
//! Model parameters live on disk as a loose JSON object so that provider
//! tuning knobs (`temperature`, `top_p`, `stop`, …) can be added without a
//! schema change. [`ChatParameters`] pulls out the handful of keys the
//! dispatcher understands and leaves the rest alone.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Provider model used when a configuration does not name one.
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-3.5-turbo";

// ─────────────────────────────────────────────
// Messages (OpenAI chat completions format)
// ─────────────────────────────────────────────

/// Author of a chat message.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    /// Only appears in history pre-seeded through [`Extras::messages`].
    Assistant,
}

/// A single role/content pair sent to the provider.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    /// Create a system message.
    pub fn system(content: impl Into<String>) -> Self {
        Message {
            role: Role::System,
            content: content.into(),
        }
    }

    /// Create a user message.
    pub fn user(content: impl Into<String>) -> Self {
        Message {
            role: Role::User,
            content: content.into(),
        }
    }

    /// Create an assistant message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Message {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

// ─────────────────────────────────────────────
// System prompt placement
// ─────────────────────────────────────────────

/// Where the system prompt goes relative to the rest of the message list.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SystemPromptPosition {
    /// Last element.
    #[default]
    Append,
    /// First element.
    Prepend,
    /// Both first and last.
    Bookend,
}

impl SystemPromptPosition {
    /// Whether the system message is inserted at the front.
    pub fn leads(self) -> bool {
        matches!(self, SystemPromptPosition::Prepend | SystemPromptPosition::Bookend)
    }

    /// Whether the system message is pushed at the back.
    pub fn trails(self) -> bool {
        matches!(self, SystemPromptPosition::Append | SystemPromptPosition::Bookend)
    }
}

// ─────────────────────────────────────────────
// Chat parameters
// ─────────────────────────────────────────────

/// The keys of a model configuration that drive a chat call.
///
/// Every field is optional on disk; `null` and absent are treated the same.
/// Any other key in the stored object is ignored here.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct ChatParameters {
    pub openai_api_key: Option<String>,
    pub openai_model: Option<String>,
    pub system_prompt: Option<String>,
    pub system_prompt_position: Option<SystemPromptPosition>,
    /// Merged verbatim into the outgoing request body.
    pub model_parameters: Option<Map<String, Value>>,
}

impl ChatParameters {
    /// Parse the typed view out of a stored parameter object.
    ///
    /// Fails when a known key has the wrong shape, e.g. an unrecognised
    /// `system_prompt_position` or a non-object `model_parameters`.
    pub fn from_map(parameters: &Map<String, Value>) -> Result<Self, serde_json::Error> {
        serde_json::from_value(Value::Object(parameters.clone()))
    }

    /// Provider model identifier, falling back to [`DEFAULT_OPENAI_MODEL`].
    pub fn model(&self) -> &str {
        self.openai_model.as_deref().unwrap_or(DEFAULT_OPENAI_MODEL)
    }

    /// Bearer credential; empty when unset.
    pub fn api_key(&self) -> &str {
        self.openai_api_key.as_deref().unwrap_or("")
    }

    /// The system prompt, if one is configured and non-empty.
    pub fn system_prompt(&self) -> Option<&str> {
        self.system_prompt.as_deref().filter(|s| !s.is_empty())
    }

    pub fn position(&self) -> SystemPromptPosition {
        self.system_prompt_position.unwrap_or_default()
    }

    /// Provider tuning overrides (empty when unset).
    pub fn model_parameters(&self) -> Map<String, Value> {
        self.model_parameters.clone().unwrap_or_default()
    }
}

// ─────────────────────────────────────────────
// Extras
// ─────────────────────────────────────────────

/// Optional caller-supplied context for a single call.
///
/// `messages` pre-seeds the message list; `values` carries anything else a
/// prompt transformer may want to read or write.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Extras {
    pub messages: Vec<Message>,
    pub values: Map<String, Value>,
}

impl Extras {
    /// Extras that only pre-seed history.
    pub fn with_messages(messages: Vec<Message>) -> Self {
        Extras {
            messages,
            values: Map::new(),
        }
    }

    /// Build extras from a JSON object, lifting out the `messages` array.
    ///
    /// `null` yields empty extras.
    pub fn from_value(value: Value) -> Result<Self, serde_json::Error> {
        use serde::de::Error as _;

        let mut values = match value {
            Value::Object(map) => map,
            Value::Null => Map::new(),
            other => {
                return Err(serde_json::Error::custom(format!(
                    "extras must be a JSON object, got {other}"
                )))
            }
        };

        let messages = match values.remove("messages") {
            Some(Value::Null) | None => Vec::new(),
            Some(raw) => serde_json::from_value(raw)?,
        };

        Ok(Extras { messages, values })
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn map(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(m) => m,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn test_message_serialization() {
        let json = serde_json::to_value(Message::user("hi")).unwrap();
        assert_eq!(json, json!({"role": "user", "content": "hi"}));

        let json = serde_json::to_value(Message::system("be brief")).unwrap();
        assert_eq!(json["role"], "system");
    }

    #[test]
    fn test_position_defaults_to_append() {
        let params = ChatParameters::from_map(&Map::new()).unwrap();
        assert_eq!(params.position(), SystemPromptPosition::Append);
        assert!(params.position().trails());
        assert!(!params.position().leads());
    }

    #[test]
    fn test_bookend_leads_and_trails() {
        let pos = SystemPromptPosition::Bookend;
        assert!(pos.leads());
        assert!(pos.trails());
    }

    #[test]
    fn test_parameters_defaults() {
        let params = ChatParameters::from_map(&map(json!({"openai_api_key": "k"}))).unwrap();
        assert_eq!(params.model(), "gpt-3.5-turbo");
        assert_eq!(params.api_key(), "k");
        assert!(params.system_prompt().is_none());
        assert!(params.model_parameters().is_empty());
    }

    #[test]
    fn test_parameters_full() {
        let params = ChatParameters::from_map(&map(json!({
            "openai_api_key": "k",
            "openai_model": "gpt-4",
            "system_prompt": "You are terse.",
            "system_prompt_position": "bookend",
            "model_parameters": {"temperature": 0.2},
            "disabled_reason": "ignored here"
        })))
        .unwrap();

        assert_eq!(params.model(), "gpt-4");
        assert_eq!(params.system_prompt(), Some("You are terse."));
        assert_eq!(params.position(), SystemPromptPosition::Bookend);
        assert_eq!(params.model_parameters()["temperature"], json!(0.2));
    }

    #[test]
    fn test_null_keys_are_absent() {
        let params = ChatParameters::from_map(&map(json!({
            "openai_model": null,
            "system_prompt": null,
            "model_parameters": null
        })))
        .unwrap();
        assert!(params.openai_model.is_none());
        assert_eq!(params.model(), DEFAULT_OPENAI_MODEL);
    }

    #[test]
    fn test_empty_system_prompt_is_none() {
        let params = ChatParameters::from_map(&map(json!({"system_prompt": ""}))).unwrap();
        assert!(params.system_prompt().is_none());
    }

    #[test]
    fn test_unknown_position_is_malformed() {
        let result = ChatParameters::from_map(&map(json!({"system_prompt_position": "middle"})));
        assert!(result.is_err());
    }

    #[test]
    fn test_non_object_model_parameters_is_malformed() {
        let result = ChatParameters::from_map(&map(json!({"model_parameters": [1, 2]})));
        assert!(result.is_err());
    }

    #[test]
    fn test_extras_from_value() {
        let extras = Extras::from_value(json!({
            "messages": [
                {"role": "user", "content": "earlier"},
                {"role": "assistant", "content": "reply"}
            ],
            "channel": "support"
        }))
        .unwrap();

        assert_eq!(extras.messages.len(), 2);
        assert_eq!(extras.messages[1], Message::assistant("reply"));
        assert_eq!(extras.values["channel"], "support");
        assert!(!extras.values.contains_key("messages"));
    }

    #[test]
    fn test_extras_from_null() {
        let extras = Extras::from_value(Value::Null).unwrap();
        assert_eq!(extras, Extras::default());
    }

    #[test]
    fn test_extras_rejects_non_object() {
        assert!(Extras::from_value(json!("nope")).is_err());
        assert!(Extras::from_value(json!({"messages": [{"role": "robot", "content": "x"}]})).is_err());
    }
}
