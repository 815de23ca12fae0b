/// LLM Client — the single point of entry for all generative-model calls in Campus.
///
/// ARCHITECTURAL RULE: No other module may call the model API directly.
/// Everything goes through `TextGenerator`, which `LlmClient` implements.
///
/// The credential is injected at construction. Without one the client never
/// touches the network and every call fails with `GatewayError::ServiceUnavailable`.
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

pub mod attachment;
#[cfg(test)]
pub mod mock;
pub mod prompts;

pub use attachment::InlineAttachment;

const MAX_ATTEMPTS: u32 = 3;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);
const JSON_MIME: &str = "application/json";

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("no API credential is configured")]
    ServiceUnavailable,

    #[error("generation failed: {0}")]
    GenerationFailed(String),
}

/// One generation call: a prompt, an optional inline attachment, and an
/// optional structured-output schema passed through to the provider untouched.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub prompt: String,
    pub attachment: Option<InlineAttachment>,
    pub response_schema: Option<Value>,
}

impl GenerationRequest {
    pub fn text(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            attachment: None,
            response_schema: None,
        }
    }

    pub fn with_attachment(mut self, attachment: InlineAttachment) -> Self {
        self.attachment = Some(attachment);
        self
    }

    pub fn with_schema(mut self, schema: Value) -> Self {
        self.response_schema = Some(schema);
        self
    }
}

/// The gateway seam. Carried in `AppState` as `Arc<dyn TextGenerator>` so
/// services can be exercised against a scripted generator.
///
/// Returns the raw text of the model's answer. An empty string is a valid
/// "nothing produced" outcome, not an error.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, request: &GenerationRequest) -> Result<String, GatewayError>;
}

// ────────────────────────────────────────────────────────────────────────────
// Wire types (Gemini generateContent)
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: Vec<RequestContent<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestContent<'a> {
    role: &'a str,
    parts: Vec<RequestPart<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RequestPart<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    inline_data: Option<InlineData<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct InlineData<'a> {
    mime_type: &'a str,
    data: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig<'a> {
    response_mime_type: &'a str,
    response_schema: &'a Value,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    pub prompt_feedback: Option<PromptFeedback>,
    pub usage_metadata: Option<UsageMetadata>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    pub content: Option<CandidateContent>,
    pub finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CandidateContent {
    #[serde(default)]
    pub parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
pub struct ResponsePart {
    pub text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptFeedback {
    pub block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageMetadata {
    pub prompt_token_count: Option<u32>,
    pub candidates_token_count: Option<u32>,
}

impl GenerateContentResponse {
    /// Concatenated text parts of the first candidate. Empty when the model
    /// produced nothing.
    pub fn text(&self) -> String {
        self.candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .map(|content| {
                content
                    .parts
                    .iter()
                    .filter_map(|p| p.text.as_deref())
                    .collect::<String>()
            })
            .unwrap_or_default()
    }

    fn block_reason(&self) -> Option<&str> {
        self.prompt_feedback
            .as_ref()
            .and_then(|f| f.block_reason.as_deref())
    }
}

#[derive(Debug, Deserialize)]
struct ApiError {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
}

fn build_body(request: &GenerationRequest) -> GenerateContentRequest<'_> {
    let mut parts = vec![RequestPart {
        text: Some(request.prompt.as_str()),
        inline_data: None,
    }];
    if let Some(attachment) = &request.attachment {
        parts.push(RequestPart {
            text: None,
            inline_data: Some(InlineData {
                mime_type: &attachment.mime_type,
                data: &attachment.data,
            }),
        });
    }

    GenerateContentRequest {
        contents: vec![RequestContent {
            role: "user",
            parts,
        }],
        generation_config: request
            .response_schema
            .as_ref()
            .map(|schema| GenerationConfig {
                response_mime_type: JSON_MIME,
                response_schema: schema,
            }),
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Client
// ────────────────────────────────────────────────────────────────────────────

/// The single model client used by all services in Campus.
/// Wraps the Gemini `generateContent` API with retry on 429/5xx.
#[derive(Clone)]
pub struct LlmClient {
    client: Client,
    api_key: Option<String>,
    model: String,
    api_base: String,
}

impl LlmClient {
    pub fn new(
        api_key: Option<String>,
        model: impl Into<String>,
        api_base: impl Into<String>,
    ) -> anyhow::Result<Self> {
        Ok(Self {
            client: Client::builder().timeout(REQUEST_TIMEOUT).build()?,
            api_key: api_key
                .map(|k| k.trim().to_string())
                .filter(|k| !k.is_empty()),
            model: model.into(),
            api_base: api_base.into(),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.api_base.trim_end_matches('/'),
            self.model
        )
    }

    /// Makes the HTTP call, returning the full response object.
    /// Retries on 429, 5xx and transport errors with exponential backoff.
    pub async fn call(
        &self,
        request: &GenerationRequest,
    ) -> Result<GenerateContentResponse, GatewayError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(GatewayError::ServiceUnavailable)?;
        let body = build_body(request);
        let url = self.endpoint();

        let mut last_error: Option<GatewayError> = None;

        for attempt in 0..MAX_ATTEMPTS {
            if attempt > 0 {
                // Exponential backoff: 1s, 2s
                let delay = Duration::from_millis(1000 * (1 << (attempt - 1)));
                warn!(
                    "Model call attempt {} failed, retrying after {}ms...",
                    attempt,
                    delay.as_millis()
                );
                tokio::time::sleep(delay).await;
            }

            let response = self
                .client
                .post(&url)
                .header("x-goog-api-key", api_key)
                .json(&body)
                .send()
                .await;

            let response = match response {
                Ok(r) => r,
                Err(e) => {
                    last_error = Some(GatewayError::GenerationFailed(format!("HTTP error: {e}")));
                    continue;
                }
            };

            let status = response.status();

            if status.as_u16() == 429 || status.is_server_error() {
                let body = response.text().await.unwrap_or_default();
                warn!("Model API returned {}: {}", status, body);
                last_error = Some(GatewayError::GenerationFailed(format!(
                    "API error (status {}): {}",
                    status.as_u16(),
                    api_error_message(body)
                )));
                continue;
            }

            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(GatewayError::GenerationFailed(format!(
                    "API error (status {}): {}",
                    status.as_u16(),
                    api_error_message(body)
                )));
            }

            let parsed: GenerateContentResponse = response.json().await.map_err(|e| {
                GatewayError::GenerationFailed(format!("unreadable API response: {e}"))
            })?;

            if let Some(usage) = &parsed.usage_metadata {
                debug!(
                    "Model call succeeded: prompt_tokens={:?}, candidate_tokens={:?}",
                    usage.prompt_token_count, usage.candidates_token_count
                );
            }

            return Ok(parsed);
        }

        Err(last_error.unwrap_or_else(|| {
            GatewayError::GenerationFailed(format!("gave up after {MAX_ATTEMPTS} attempts"))
        }))
    }
}

#[async_trait]
impl TextGenerator for LlmClient {
    async fn generate(&self, request: &GenerationRequest) -> Result<String, GatewayError> {
        let response = self.call(request).await?;

        if response.candidates.is_empty() {
            if let Some(reason) = response.block_reason() {
                return Err(GatewayError::GenerationFailed(format!(
                    "prompt blocked by provider: {reason}"
                )));
            }
        }

        let text = response.text();
        if text.is_empty() {
            debug!(
                "Model produced no text (finish_reason={:?})",
                response
                    .candidates
                    .first()
                    .and_then(|c| c.finish_reason.as_deref())
            );
        }
        Ok(text)
    }
}

/// Pulls the provider's error message out of an error body, falling back to
/// the raw body.
fn api_error_message(body: String) -> String {
    serde_json::from_str::<ApiError>(&body)
        .map(|e| e.error.message)
        .unwrap_or(body)
}

/// Strips ```json ... ``` or ``` ... ``` code fences from model output.
/// Whatever info string follows the opening fence (`json`, `JSON`, `jsonc`) is dropped.
pub fn strip_json_fences(text: &str) -> &str {
    let text = text.trim();
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    let body = match rest.find('\n') {
        Some(i) if !rest[..i].trim_start().starts_with(['[', '{']) => &rest[i + 1..],
        Some(_) => rest,
        None => rest.trim_start_matches(|c: char| c.is_ascii_alphanumeric()),
    };
    let body = body.trim();
    body.strip_suffix("```").map(str::trim).unwrap_or(body)
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use axum::http::{HeaderMap, StatusCode};
    use axum::{Json, Router};
    use serde_json::json;

    use super::*;

    async fn serve(app: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}")
    }

    /// A provider that answers every request with `status` and `body`.
    async fn canned_provider(status: StatusCode, body: Value) -> (String, Arc<AtomicUsize>) {
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();
        let app = Router::new().fallback(move || {
            let counter = counter.clone();
            let body = body.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                (status, Json(body))
            }
        });
        (serve(app).await, hits)
    }

    fn unconfigured() -> LlmClient {
        // Port 9 (discard) on loopback: any accidental request would fail, not hang.
        LlmClient::new(None, "test-model", "http://127.0.0.1:9").unwrap()
    }

    #[tokio::test]
    async fn test_missing_credential_is_service_unavailable() {
        let client = unconfigured();
        assert!(!client.is_configured());

        let result = tokio::time::timeout(
            Duration::from_millis(100),
            client.generate(&GenerationRequest::text("hello")),
        )
        .await
        .expect("must not wait on the network");

        assert!(matches!(result, Err(GatewayError::ServiceUnavailable)));
    }

    #[tokio::test]
    async fn test_blank_credential_is_treated_as_missing() {
        let client = LlmClient::new(Some("   ".into()), "m", "http://127.0.0.1:9").unwrap();
        assert!(!client.is_configured());
        let result = client.generate(&GenerationRequest::text("hello")).await;
        assert!(matches!(result, Err(GatewayError::ServiceUnavailable)));
    }

    #[tokio::test]
    async fn test_unreachable_provider_is_generation_failed() {
        // Bind then drop so nothing is listening on the port.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());
        drop(listener);

        let client = LlmClient::new(Some("k".into()), "m", base).unwrap();
        let err = client
            .generate(&GenerationRequest::text("hello"))
            .await
            .unwrap_err();
        match err {
            GatewayError::GenerationFailed(msg) => assert!(msg.starts_with("HTTP error")),
            other => panic!("expected GenerationFailed, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_client_error_fails_without_retry() {
        let (base, hits) = canned_provider(
            StatusCode::BAD_REQUEST,
            json!({"error": {"code": 400, "message": "API key not valid"}}),
        )
        .await;
        let client = LlmClient::new(Some("k".into()), "m", base).unwrap();

        let err = client
            .generate(&GenerationRequest::text("hello"))
            .await
            .unwrap_err();

        assert_eq!(hits.load(Ordering::SeqCst), 1);
        match err {
            GatewayError::GenerationFailed(msg) => {
                assert!(msg.contains("status 400"));
                assert!(msg.contains("API key not valid"));
            }
            other => panic!("expected GenerationFailed, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_server_error_is_retried_then_fails() {
        let (base, hits) = canned_provider(
            StatusCode::SERVICE_UNAVAILABLE,
            json!({"error": {"code": 503, "message": "overloaded"}}),
        )
        .await;
        let client = LlmClient::new(Some("k".into()), "m", base).unwrap();

        let err = client
            .generate(&GenerationRequest::text("hello"))
            .await
            .unwrap_err();

        assert_eq!(hits.load(Ordering::SeqCst), MAX_ATTEMPTS as usize);
        match err {
            GatewayError::GenerationFailed(msg) => assert!(msg.contains("status 503")),
            other => panic!("expected GenerationFailed, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_configured_call_sends_key_and_returns_text() {
        let app = Router::new().fallback(|headers: HeaderMap, Json(req): Json<Value>| async move {
            let keyed = headers
                .get("x-goog-api-key")
                .and_then(|v| v.to_str().ok())
                == Some("k");
            let prompt = req["contents"][0]["parts"][0]["text"] == "List names";
            if keyed && prompt {
                (
                    StatusCode::OK,
                    Json(json!({"candidates": [{"content": {"parts": [{"text": "Alice\nBob"}]}}]})),
                )
            } else {
                (
                    StatusCode::BAD_REQUEST,
                    Json(json!({"error": {"message": "unexpected request"}})),
                )
            }
        });
        let client = LlmClient::new(Some(" k ".into()), "m", serve(app).await).unwrap();

        let text = client
            .generate(&GenerationRequest::text("List names"))
            .await
            .unwrap();
        assert_eq!(text, "Alice\nBob");
    }

    #[tokio::test]
    async fn test_blocked_prompt_is_generation_failed() {
        let (base, _) = canned_provider(
            StatusCode::OK,
            json!({"promptFeedback": {"blockReason": "SAFETY"}}),
        )
        .await;
        let client = LlmClient::new(Some("k".into()), "m", base).unwrap();

        let err = client
            .generate(&GenerationRequest::text("hello"))
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::GenerationFailed(msg) if msg.contains("SAFETY")));
    }

    #[test]
    fn test_endpoint_joins_base_and_model() {
        let client =
            LlmClient::new(Some("k".into()), "gemini-x", "https://example.test/v1beta/").unwrap();
        assert_eq!(
            client.endpoint(),
            "https://example.test/v1beta/models/gemini-x:generateContent"
        );
    }

    #[test]
    fn test_body_text_only_has_no_generation_config() {
        let request = GenerationRequest::text("Describe photosynthesis");
        let body = serde_json::to_value(build_body(&request)).unwrap();
        assert_eq!(
            body,
            json!({
                "contents": [{
                    "role": "user",
                    "parts": [{"text": "Describe photosynthesis"}]
                }]
            })
        );
    }

    #[test]
    fn test_body_carries_attachment_and_schema_untouched() {
        let schema = json!({"type": "ARRAY", "items": {"type": "STRING"}});
        let request = GenerationRequest::text("List names")
            .with_attachment(InlineAttachment::encode(b"abc", "image/png"))
            .with_schema(schema.clone());
        let body = serde_json::to_value(build_body(&request)).unwrap();

        assert_eq!(
            body["contents"][0]["parts"][1],
            json!({"inlineData": {"mimeType": "image/png", "data": "YWJj"}})
        );
        assert_eq!(
            body["generationConfig"],
            json!({"responseMimeType": "application/json", "responseSchema": schema})
        );
    }

    #[test]
    fn test_response_text_concatenates_first_candidate_parts() {
        let raw = json!({
            "candidates": [
                {"content": {"parts": [{"text": "Alice\n"}, {"text": "Bob"}]}, "finishReason": "STOP"},
                {"content": {"parts": [{"text": "ignored"}]}}
            ],
            "usageMetadata": {"promptTokenCount": 10, "candidatesTokenCount": 3}
        });
        let resp: GenerateContentResponse = serde_json::from_value(raw).unwrap();
        assert_eq!(resp.text(), "Alice\nBob");
    }

    #[test]
    fn test_response_without_candidates_is_empty_text() {
        let resp: GenerateContentResponse = serde_json::from_value(json!({})).unwrap();
        assert_eq!(resp.text(), "");
        assert!(resp.block_reason().is_none());
    }

    #[test]
    fn test_block_reason_is_read() {
        let resp: GenerateContentResponse =
            serde_json::from_value(json!({"promptFeedback": {"blockReason": "SAFETY"}})).unwrap();
        assert_eq!(resp.block_reason(), Some("SAFETY"));
    }

    #[test]
    fn test_api_error_message_prefers_provider_message() {
        let body = r#"{"error": {"code": 400, "message": "API key not valid", "status": "INVALID_ARGUMENT"}}"#;
        assert_eq!(api_error_message(body.to_string()), "API key not valid");
        assert_eq!(api_error_message("gateway timeout".to_string()), "gateway timeout");
    }

    #[test]
    fn test_strip_json_fences_with_json_tag() {
        let input = "```json\n[{\"name\": \"A\"}]\n```";
        assert_eq!(strip_json_fences(input), "[{\"name\": \"A\"}]");
    }

    #[test]
    fn test_strip_json_fences_without_tag() {
        let input = "```\n{\"key\": \"value\"}\n```";
        assert_eq!(strip_json_fences(input), "{\"key\": \"value\"}");
    }

    #[test]
    fn test_strip_json_fences_no_fences() {
        let input = "  {\"key\": \"value\"}\n";
        assert_eq!(strip_json_fences(input), "{\"key\": \"value\"}");
    }

    #[test]
    fn test_strip_json_fences_any_info_string() {
        assert_eq!(strip_json_fences("```JSON\n[1]\n```"), "[1]");
        assert_eq!(strip_json_fences("```jsonc\n{\"a\": 1}\n```"), "{\"a\": 1}");
        assert_eq!(strip_json_fences("```json [1]```"), "[1]");
    }

    #[test]
    fn test_strip_json_fences_payload_on_opening_line() {
        assert_eq!(strip_json_fences("```[1, 2]\n```"), "[1, 2]");
        assert_eq!(strip_json_fences("```\n```"), "");
    }

    #[test]
    fn test_strip_json_fences_unterminated() {
        let input = "```json\n[1, 2]";
        assert_eq!(strip_json_fences(input), "[1, 2]");
    }
}
