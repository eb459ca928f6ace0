mod xai;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Result;

pub use xai::XaiClient;

// -- OpenAI-compatible request/response types ---

/// Body posted to `/chat/completions`.
///
/// `messages` is kept as raw JSON so the pass-through route can forward the
/// client's array verbatim; an absent value is omitted from the body.
#[derive(Debug, Clone, Serialize)]
pub struct CompletionRequest {
    pub model: String,
    #[serde(skip_serializing_if = "Value::is_null")]
    pub messages: Value,
    pub temperature: f32,
    pub max_tokens: u32,
}

/// Raw upstream reply: the HTTP status and whatever JSON came back.
#[derive(Debug, Clone)]
pub struct UpstreamResponse {
    pub status: u16,
    pub body: Value,
}

impl UpstreamResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// `error.message` from an `{error: {message}}` body, if present.
    pub fn error_message(&self) -> Option<String> {
        serde_json::from_value::<ErrorResponse>(self.body.clone())
            .ok()
            .and_then(|r| r.error)
            .and_then(|e| match e {
                ErrorField::Object { message } => message,
                ErrorField::Text(_) => None,
            })
            .filter(|m| !m.is_empty())
    }

    /// The `error` field rendered as text, whatever its shape.
    pub fn error_text(&self) -> Option<String> {
        let text = match self.body.get("error")? {
            Value::String(s) => Some(s.clone()),
            Value::Object(obj) => match obj.get("message") {
                Some(Value::String(m)) => Some(m.clone()),
                _ => Some(Value::Object(obj.clone()).to_string()),
            },
            Value::Null => None,
            other => Some(other.to_string()),
        };
        text.filter(|s| !s.is_empty())
    }

    /// Content of the first completion choice.
    pub fn first_choice_content(&self) -> Option<String> {
        serde_json::from_value::<ChatResponse>(self.body.clone())
            .ok()?
            .choices
            .into_iter()
            .next()?
            .message?
            .content
            .filter(|c| !c.is_empty())
    }
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    #[serde(default)]
    message: Option<ChoiceMessage>,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Deserialize)]
struct ErrorResponse {
    #[serde(default)]
    error: Option<ErrorField>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ErrorField {
    Object {
        #[serde(default)]
        message: Option<String>,
    },
    Text(String),
}

// -- Upstream trait -----------------------------------------------------------

/// An OpenAI-compatible chat completions endpoint.
///
/// Implementations make exactly one request per call and never retry.  A
/// non-2xx status is a normal return value; `Err` is reserved for transport
/// failures and success bodies that are not JSON.
#[async_trait::async_trait]
pub trait ChatCompletions: Send + Sync {
    /// Human-readable name of the upstream (e.g. "x.ai").
    fn name(&self) -> &str;

    async fn complete(&self, api_key: &str, request: &CompletionRequest)
    -> Result<UpstreamResponse>;
}
