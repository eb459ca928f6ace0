pub mod metadata;

use serde::Serialize;
use serde_json::Value;

use crate::skills::{self, ComposedPrompt};

pub use metadata::SimulatedMetadata;

/// One message in an OpenAI-style conversation.
///
/// `content` is whatever JSON the client sent; an absent value is left out of
/// the serialized message.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatTurn {
    pub role: String,
    #[serde(skip_serializing_if = "Value::is_null")]
    pub content: Value,
}

impl ChatTurn {
    pub fn new(role: impl Into<String>, content: impl Into<Value>) -> Self {
        Self {
            role: role.into(),
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new("system", Into::<String>::into(content))
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new("user", Into::<String>::into(content))
    }
}

/// Map the UI's `"ai"` label to the upstream's `"assistant"`; every other role
/// passes through untouched.
pub fn normalize_role(role: &str) -> &str {
    if role == "ai" { "assistant" } else { role }
}

/// Parse client-supplied history leniently.
///
/// A non-array yields no history and entries that are not objects are
/// skipped.  A missing or non-string `role` becomes an empty string; `content`
/// is forwarded as sent.
pub fn history_from_value(value: &Value) -> Vec<ChatTurn> {
    let Some(items) = value.as_array() else {
        return Vec::new();
    };

    items
        .iter()
        .filter_map(Value::as_object)
        .map(|entry| {
            let role = entry
                .get("role")
                .and_then(Value::as_str)
                .unwrap_or_default();
            let content = entry.get("content").cloned().unwrap_or(Value::Null);
            ChatTurn::new(role, content)
        })
        .collect()
}

/// Assemble the upstream message array: system message, normalised history,
/// then the new user turn.
///
/// `max_history` keeps only the most recent turns when non-zero.
pub fn build_messages(
    prompt: &ComposedPrompt,
    history: &[ChatTurn],
    message: &str,
    max_history: usize,
) -> Vec<ChatTurn> {
    let start = if max_history > 0 {
        history.len().saturating_sub(max_history)
    } else {
        0
    };

    let mut messages = Vec::with_capacity(history.len() - start + 2);
    messages.push(ChatTurn::system(skills::system_message(prompt)));
    messages.extend(
        history[start..]
            .iter()
            .map(|turn| ChatTurn::new(normalize_role(&turn.role), turn.content.clone())),
    );
    messages.push(ChatTurn::user(message));
    messages
}
