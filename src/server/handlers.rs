use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde::Serialize;
use serde_json::Value;
use tracing::{error, info, warn};

use super::routes::AppState;
use crate::chat::{self, SimulatedMetadata};
use crate::llm::{CompletionRequest, UpstreamResponse};
use crate::skills::{self, registry};

const MISSING_KEY_MESSAGE: &str =
    "Server API key not configured. Please set XAI_API_KEY in your environment.";
const MISSING_MESSAGE: &str = "Message is required";
const AUTH_FAILED_MESSAGE: &str = "Authentication failed. Please ensure your XAI_API_KEY is correct and has access to the specified model.";
const RATE_LIMITED_MESSAGE: &str = "Rate limit exceeded. Please try again after some time.";
const CHAT_INTERNAL_MESSAGE: &str = "Internal server error. Please check server logs for details.";
const NO_CONTENT_FALLBACK: &str = "No response generated from AI.";
const UNKNOWN_UPSTREAM_MESSAGE: &str = "An unknown error occurred with the Grok API.";

const PASSTHROUGH_MISSING_KEY: &str = "API key is required";
const PASSTHROUGH_INTERNAL_MESSAGE: &str = "Internal server error";

/// `{ "error": ... }` response with an explicit status.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    /// Mirror the upstream status.  Codes axum cannot represent become 502.
    fn upstream(status: u16, message: String) -> Self {
        let status = StatusCode::from_u16(status).unwrap_or(StatusCode::BAD_GATEWAY);
        Self::new(status, message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(serde_json::json!({ "error": self.message })),
        )
            .into_response()
    }
}

#[derive(Debug, Serialize)]
pub struct ChatReply {
    pub message: String,
    pub metadata: SimulatedMetadata,
}

/// Map a failed upstream reply to the message shown to the user.
pub fn upstream_error_message(resp: &UpstreamResponse, model: &str) -> String {
    match resp.status {
        403 => AUTH_FAILED_MESSAGE.to_string(),
        404 => format!(
            "The model '{model}' was not found or your account does not have access to it. {}",
            resp.error_text().unwrap_or_default()
        )
        .trim_end()
        .to_string(),
        429 => RATE_LIMITED_MESSAGE.to_string(),
        _ => resp
            .error_message()
            .unwrap_or_else(|| UNKNOWN_UPSTREAM_MESSAGE.to_string()),
    }
}

fn completion_request(state: &AppState, messages: Value) -> CompletionRequest {
    let upstream = &state.config.upstream;
    CompletionRequest {
        model: upstream.model.clone(),
        messages,
        temperature: upstream.temperature,
        max_tokens: upstream.max_tokens,
    }
}

// -- Skill-pack chat relay -----------------------------------------------

pub async fn chat(State(state): State<AppState>, body: Bytes) -> Result<Json<ChatReply>, ApiError> {
    let internal = |e: &dyn std::fmt::Display| {
        error!("chat relay: {e}");
        ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, CHAT_INTERNAL_MESSAGE)
    };

    let body: Value = serde_json::from_slice(&body).map_err(|e| internal(&e))?;

    let Some(api_key) = state.api_key.as_deref() else {
        error!("XAI_API_KEY is not configured");
        return Err(ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, MISSING_KEY_MESSAGE));
    };

    let Some(message) = body.get("message").and_then(Value::as_str) else {
        return Err(ApiError::new(StatusCode::BAD_REQUEST, MISSING_MESSAGE));
    };

    let pack_ids = skills::pack_ids_from_value(body.get("activeSkillPackIds").unwrap_or(&Value::Null));
    let history = chat::history_from_value(body.get("messageHistory").unwrap_or(&Value::Null));

    let prompt = skills::compose(&pack_ids);
    let messages = chat::build_messages(
        &prompt,
        &history,
        message,
        state.config.chat.max_history_turns,
    );

    info!(
        packs = ?pack_ids,
        history = history.len(),
        forwarded = messages.len(),
        "relaying chat message"
    );

    let messages = serde_json::to_value(&messages).map_err(|e| internal(&e))?;
    let request = completion_request(&state, messages);

    let resp = state
        .upstream
        .complete(api_key, &request)
        .await
        .map_err(|e| internal(&e))?;

    if !resp.is_success() {
        let message = upstream_error_message(&resp, &request.model);
        warn!(status = resp.status, error = %message, "chat relay: upstream rejected request");
        return Err(ApiError::upstream(resp.status, message));
    }

    let content = resp
        .first_choice_content()
        .unwrap_or_else(|| NO_CONTENT_FALLBACK.to_string());

    Ok(Json(ChatReply {
        message: content,
        metadata: SimulatedMetadata::generate(pack_ids),
    }))
}

// -- Pass-through relay --------------------------------------------------

/// Forward `messages` verbatim using the caller's own key.  `skillPacks` is
/// accepted for compatibility and ignored.
pub async fn grok_chat(State(state): State<AppState>, body: Bytes) -> Result<Response, ApiError> {
    let internal = |e: &dyn std::fmt::Display| {
        error!("pass-through relay: {e}");
        ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, PASSTHROUGH_INTERNAL_MESSAGE)
    };

    let body: Value = serde_json::from_slice(&body).map_err(|e| internal(&e))?;

    let Some(api_key) = body
        .get("apiKey")
        .and_then(Value::as_str)
        .filter(|k| !k.is_empty())
    else {
        return Err(ApiError::new(StatusCode::BAD_REQUEST, PASSTHROUGH_MISSING_KEY));
    };

    let messages = body.get("messages").cloned().unwrap_or(Value::Null);
    let request = completion_request(&state, messages);

    let resp = state
        .upstream
        .complete(api_key, &request)
        .await
        .map_err(|e| internal(&e))?;

    if !resp.is_success() {
        let message = resp
            .error_message()
            .unwrap_or_else(|| format!("API Error: {}", resp.status));
        warn!(status = resp.status, error = %message, "pass-through relay: upstream rejected request");
        return Err(ApiError::upstream(resp.status, message));
    }

    Ok((StatusCode::OK, Json(resp.body)).into_response())
}

// -- Catalog & health ----------------------------------------------------

pub async fn list_skill_packs() -> Json<Value> {
    let packs: Vec<Value> = registry::all()
        .iter()
        .map(|p| {
            serde_json::json!({
                "id": p.id,
                "name": p.name,
                "description": p.description,
            })
        })
        .collect();

    Json(serde_json::json!({
        "default": registry::DEFAULT_PACK_ID,
        "skillPacks": packs,
    }))
}

pub async fn healthz(State(state): State<AppState>) -> impl IntoResponse {
    let body = serde_json::json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
        "checks": {
            "credential": if state.api_key.is_some() { "configured" } else { "missing" },
            "upstream": state.upstream.name(),
            "skill_packs": registry::len(),
        },
    });

    (StatusCode::OK, Json(body))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    use axum::body::Body;
    use axum::http::Request;
    use serde_json::json;
    use tower::ServiceExt;

    use crate::config::Config;
    use crate::error::{RelayError, Result};
    use crate::llm::ChatCompletions;

    /// Records every request and answers with a canned reply (or a
    /// transport error when `reply` is `None`).
    struct MockUpstream {
        calls: Mutex<Vec<(String, CompletionRequest)>>,
        reply: Option<UpstreamResponse>,
    }

    impl MockUpstream {
        fn replying(status: u16, body: Value) -> Arc<Self> {
            Arc::new(Self {
                calls: Mutex::new(Vec::new()),
                reply: Some(UpstreamResponse { status, body }),
            })
        }

        fn failing() -> Arc<Self> {
            Arc::new(Self {
                calls: Mutex::new(Vec::new()),
                reply: None,
            })
        }

        fn calls(&self) -> Vec<(String, CompletionRequest)> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait::async_trait]
    impl ChatCompletions for MockUpstream {
        fn name(&self) -> &str {
            "mock"
        }

        async fn complete(
            &self,
            api_key: &str,
            request: &CompletionRequest,
        ) -> Result<UpstreamResponse> {
            self.calls
                .lock()
                .unwrap()
                .push((api_key.to_string(), request.clone()));
            self.reply
                .clone()
                .ok_or_else(|| RelayError::Upstream("connection refused by 10.0.0.7".into()))
        }
    }

    fn ok_reply(content: &str) -> Value {
        json!({
            "id": "cmpl-1",
            "choices": [{"message": {"role": "assistant", "content": content}}],
            "usage": {"total_tokens": 42}
        })
    }

    fn app(upstream: Arc<MockUpstream>, api_key: Option<&str>) -> axum::Router {
        app_with_config(upstream, api_key, Config::default())
    }

    fn app_with_config(
        upstream: Arc<MockUpstream>,
        api_key: Option<&str>,
        mut config: Config,
    ) -> axum::Router {
        config.upstream.api_key = api_key.unwrap_or_default().to_string();
        let state = AppState::with_upstream(config, upstream);
        crate::server::routes::build(state)
    }

    async fn post(app: axum::Router, uri: &str, body: &str) -> (StatusCode, Value) {
        let req = Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        send(app, req).await
    }

    async fn get(app: axum::Router, uri: &str) -> (StatusCode, Value) {
        let req = Request::builder()
            .method("GET")
            .uri(uri)
            .body(Body::empty())
            .unwrap();
        send(app, req).await
    }

    async fn send(app: axum::Router, req: Request<Body>) -> (StatusCode, Value) {
        let res = app.oneshot(req).await.unwrap();
        let status = res.status();
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
        let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, json)
    }

    // -- /api/chat -----------------------------------------------------------

    #[tokio::test]
    async fn missing_credential_is_500_without_upstream_call() {
        let upstream = MockUpstream::replying(200, ok_reply("hi"));
        let body = json!({"message": "hello", "activeSkillPackIds": ["programming"], "messageHistory": []});

        let (status, json) = post(app(upstream.clone(), None), "/api/chat", &body.to_string()).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(json["error"].as_str().unwrap().contains("XAI_API_KEY"));
        assert!(upstream.calls().is_empty());
    }

    #[tokio::test]
    async fn single_pack_round_trip() {
        let upstream = MockUpstream::replying(200, ok_reply("Use a match."));
        let body = json!({"message": "How do I parse args?", "activeSkillPackIds": ["programming"], "messageHistory": []});

        let (status, json) =
            post(app(upstream.clone(), Some("sk-test")), "/api/chat", &body.to_string()).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["message"], "Use a match.");

        let calls = upstream.calls();
        assert_eq!(calls.len(), 1);
        let (key, request) = &calls[0];
        assert_eq!(key, "sk-test");
        assert_eq!(request.model, "grok-2-1212");
        assert!((request.temperature - 0.7).abs() < 0.001);
        assert_eq!(request.max_tokens, 1000);

        let messages = request.messages.as_array().unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0]["role"], "system");
        let programming = registry::lookup("programming").unwrap();
        assert!(messages[0]["content"].as_str().unwrap().contains(programming.system_prompt));
        assert_eq!(messages[1], json!({"role": "user", "content": "How do I parse args?"}));
    }

    #[tokio::test]
    async fn success_carries_simulated_metadata() {
        let upstream = MockUpstream::replying(200, ok_reply("ok"));
        let body = json!({"message": "hi", "activeSkillPackIds": ["business", "unknown"]});

        let (status, json) = post(app(upstream, Some("k")), "/api/chat", &body.to_string()).await;

        assert_eq!(status, StatusCode::OK);
        let meta = &json["metadata"];
        assert_eq!(meta["activeSkillPacks"], json!(["business", "unknown"]));
        assert_eq!(meta["costEstimate"], "0.0020");
        assert_eq!(meta["efficiency"], "67% more efficient than general AI");
        assert_eq!(meta["simulated"], true);
        let processing = meta["processingTime"].as_f64().unwrap();
        assert!((300.0..1300.0).contains(&processing));
        let tokens = meta["tokensUsed"].as_f64().unwrap();
        assert!((200.0..1000.0).contains(&tokens));
    }

    #[tokio::test]
    async fn history_roles_are_normalized() {
        let upstream = MockUpstream::replying(200, ok_reply("ok"));
        let body = json!({
            "message": "and now?",
            "activeSkillPackIds": [],
            "messageHistory": [
                {"role": "user", "content": "hello"},
                {"role": "ai", "content": "hi there"},
                {"role": "assistant", "content": "anything else?"}
            ]
        });

        post(app(upstream.clone(), Some("k")), "/api/chat", &body.to_string()).await;

        let calls = upstream.calls();
        let messages = calls[0].1.messages.as_array().unwrap().clone();
        let roles: Vec<_> = messages.iter().map(|m| m["role"].as_str().unwrap()).collect();
        assert_eq!(roles, ["system", "user", "assistant", "assistant", "user"]);
        assert_eq!(messages[2]["content"], "hi there");
        assert_eq!(messages[4]["content"], "and now?");
    }

    #[tokio::test]
    async fn history_content_is_forwarded_as_sent() {
        let upstream = MockUpstream::replying(200, ok_reply("ok"));
        let parts = json!([{"type": "text", "text": "look at this"}]);
        let body = json!({
            "message": "well?",
            "messageHistory": [
                {"role": "user", "content": parts},
                {"role": "ai", "content": null},
                {"role": "ai"}
            ]
        });

        post(app(upstream.clone(), Some("k")), "/api/chat", &body.to_string()).await;

        let calls = upstream.calls();
        let messages = calls[0].1.messages.as_array().unwrap().clone();
        assert_eq!(messages[1]["content"], parts);
        assert_eq!(messages[2], json!({"role": "assistant"}));
        assert_eq!(messages[3], json!({"role": "assistant"}));
    }

    #[tokio::test]
    async fn malformed_optional_fields_fall_back_to_default_pack() {
        let upstream = MockUpstream::replying(200, ok_reply("ok"));
        let body = json!({"message": "hi", "activeSkillPackIds": "programming", "messageHistory": {"role": "ai"}});

        let (status, json) =
            post(app(upstream.clone(), Some("k")), "/api/chat", &body.to_string()).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["metadata"]["activeSkillPacks"], json!([]));
        assert_eq!(json["metadata"]["costEstimate"], "0.0000");

        let calls = upstream.calls();
        let messages = calls[0].1.messages.as_array().unwrap();
        assert_eq!(messages.len(), 2);
        let system = messages[0]["content"].as_str().unwrap();
        assert!(system.starts_with(registry::default_pack().system_prompt));
        assert!(!system.contains("Currently using"));
    }

    #[tokio::test]
    async fn history_cap_keeps_most_recent_turns() {
        let upstream = MockUpstream::replying(200, ok_reply("ok"));
        let mut config = Config::default();
        config.chat.max_history_turns = 2;
        let history: Vec<_> = (0..6)
            .map(|i| json!({"role": "user", "content": format!("m{i}")}))
            .collect();
        let body = json!({"message": "latest", "messageHistory": history});

        post(
            app_with_config(upstream.clone(), Some("k"), config),
            "/api/chat",
            &body.to_string(),
        )
        .await;

        let calls = upstream.calls();
        let messages = calls[0].1.messages.as_array().unwrap();
        assert_eq!(messages.len(), 4);
        assert_eq!(messages[1]["content"], "m4");
        assert_eq!(messages[2]["content"], "m5");
    }

    #[tokio::test]
    async fn empty_completion_uses_fallback_text() {
        let upstream = MockUpstream::replying(200, json!({"choices": []}));
        let (status, json) =
            post(app(upstream, Some("k")), "/api/chat", r#"{"message": "hi"}"#).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["message"], NO_CONTENT_FALLBACK);
    }

    #[tokio::test]
    async fn rate_limit_is_mapped_and_status_preserved() {
        let upstream = MockUpstream::replying(
            429,
            json!({"error": {"message": "slow down, you are sending too many requests"}}),
        );
        let (status, json) =
            post(app(upstream, Some("k")), "/api/chat", r#"{"message": "hi"}"#).await;

        assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(json["error"], RATE_LIMITED_MESSAGE);
    }

    #[tokio::test]
    async fn forbidden_and_not_found_are_mapped() {
        let upstream = MockUpstream::replying(403, json!({"error": {"message": "nope"}}));
        let (status, json) =
            post(app(upstream, Some("k")), "/api/chat", r#"{"message": "hi"}"#).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(json["error"], AUTH_FAILED_MESSAGE);

        let upstream = MockUpstream::replying(404, json!({"error": "no such model"}));
        let (status, json) =
            post(app(upstream, Some("k")), "/api/chat", r#"{"message": "hi"}"#).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let error = json["error"].as_str().unwrap();
        assert!(error.contains("'grok-2-1212'"), "got: {error}");
        assert!(error.ends_with("no such model"), "got: {error}");
    }

    #[tokio::test]
    async fn unknown_status_uses_upstream_message_or_generic() {
        let upstream = MockUpstream::replying(400, json!({"error": {"message": "messages too long"}}));
        let (status, json) =
            post(app(upstream, Some("k")), "/api/chat", r#"{"message": "hi"}"#).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"], "messages too long");

        let upstream = MockUpstream::replying(503, Value::Null);
        let (status, json) =
            post(app(upstream, Some("k")), "/api/chat", r#"{"message": "hi"}"#).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(json["error"], "An unknown error occurred with the Grok API.");
    }

    #[tokio::test]
    async fn transport_failure_is_generic_500() {
        let upstream = MockUpstream::failing();
        let (status, json) =
            post(app(upstream.clone(), Some("k")), "/api/chat", r#"{"message": "hi"}"#).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json["error"], CHAT_INTERNAL_MESSAGE);
        assert!(!json.to_string().contains("10.0.0.7"));
        assert_eq!(upstream.calls().len(), 1);
    }

    #[tokio::test]
    async fn unparseable_body_is_generic_500() {
        let upstream = MockUpstream::replying(200, ok_reply("ok"));
        let (status, json) = post(app(upstream.clone(), Some("k")), "/api/chat", "{not json").await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json["error"], CHAT_INTERNAL_MESSAGE);
        assert!(upstream.calls().is_empty());
    }

    #[tokio::test]
    async fn missing_message_is_rejected() {
        let upstream = MockUpstream::replying(200, ok_reply("ok"));
        let (status, json) = post(
            app(upstream.clone(), Some("k")),
            "/api/chat",
            r#"{"activeSkillPackIds": ["programming"]}"#,
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"], MISSING_MESSAGE);
        assert!(upstream.calls().is_empty());
    }

    // -- /api/grok-chat ------------------------------------------------------

    #[tokio::test]
    async fn passthrough_requires_api_key() {
        let upstream = MockUpstream::replying(200, ok_reply("ok"));
        for body in [r#"{"messages": []}"#, r#"{"messages": [], "apiKey": ""}"#, r#"{"apiKey": 12}"#] {
            let (status, json) = post(app(upstream.clone(), Some("server")), "/api/grok-chat", body).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");
            assert_eq!(json["error"], PASSTHROUGH_MISSING_KEY);
        }
        assert!(upstream.calls().is_empty());
    }

    #[tokio::test]
    async fn passthrough_forwards_verbatim_with_client_key() {
        let reply = ok_reply("pong");
        let upstream = MockUpstream::replying(200, reply.clone());
        let messages = json!([{"role": "user", "content": "ping", "name": "alice"}]);
        let body = json!({"messages": messages, "skillPacks": ["ignored"], "apiKey": "xai-client"});

        let (status, json) = post(app(upstream.clone(), None), "/api/grok-chat", &body.to_string()).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json, reply);

        let calls = upstream.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, "xai-client");
        assert_eq!(calls[0].1.messages, messages);
        assert_eq!(calls[0].1.model, "grok-2-1212");
    }

    #[tokio::test]
    async fn passthrough_maps_upstream_errors() {
        let upstream = MockUpstream::replying(401, json!({"error": {"message": "invalid key"}}));
        let (status, json) =
            post(app(upstream, None), "/api/grok-chat", r#"{"apiKey": "bad"}"#).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(json["error"], "invalid key");

        let upstream = MockUpstream::replying(502, Value::Null);
        let (status, json) =
            post(app(upstream, None), "/api/grok-chat", r#"{"apiKey": "k"}"#).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(json["error"], "API Error: 502");
    }

    #[tokio::test]
    async fn passthrough_hides_internal_failures() {
        let (status, json) =
            post(app(MockUpstream::failing(), None), "/api/grok-chat", r#"{"apiKey": "k"}"#).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json["error"], PASSTHROUGH_INTERNAL_MESSAGE);
    }

    // -- catalog & health ----------------------------------------------------

    #[tokio::test]
    async fn skill_pack_catalog() {
        let (status, json) = get(app(MockUpstream::failing(), None), "/api/skill-packs").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["default"], "general-knowledge");
        let packs = json["skillPacks"].as_array().unwrap();
        assert_eq!(packs.len(), 6);
        assert_eq!(packs[0]["id"], "general-knowledge");
        assert_eq!(packs[1]["name"], "Programming");
        assert!(packs[0].get("system_prompt").is_none());
    }

    #[tokio::test]
    async fn healthz_reports_credential_state() {
        let (status, json) = get(app(MockUpstream::failing(), None), "/healthz").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["status"], "healthy");
        assert_eq!(json["checks"]["credential"], "missing");
        assert_eq!(json["checks"]["skill_packs"], 6);

        let (_, json) = get(app(MockUpstream::failing(), Some("k")), "/healthz").await;
        assert_eq!(json["checks"]["credential"], "configured");
    }

    // -- error mapping -------------------------------------------------------

    #[test]
    fn not_found_without_detail_has_no_trailing_space() {
        let resp = UpstreamResponse { status: 404, body: Value::Null };
        let msg = upstream_error_message(&resp, "grok-beta");
        assert_eq!(
            msg,
            "The model 'grok-beta' was not found or your account does not have access to it."
        );
    }

    #[test]
    fn rate_limit_ignores_upstream_wording() {
        for body in [json!({"error": {"message": "quota"}}), json!("text"), Value::Null] {
            let resp = UpstreamResponse { status: 429, body };
            assert_eq!(upstream_error_message(&resp, "m"), RATE_LIMITED_MESSAGE);
        }
    }
}
