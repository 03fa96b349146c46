use async_trait::async_trait;
use bytes::Bytes;
use futures::{StreamExt, future, stream};
use serde::Deserialize;

use super::http_client::HttpClientTrait;
use crate::domain::DomainError;
use crate::domain::llm::{
    ContentPart, FinishReason, LlmProvider, LlmRequest, LlmResponse, LlmResponseFormat, LlmStream,
    Message, MessageRole, StreamChunk, TokenUsage,
};

pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

const PROVIDER: &str = "gemini";

/// Google Gemini `generateContent` provider
#[derive(Debug)]
pub struct GeminiProvider<C: HttpClientTrait> {
    client: C,
    api_key: String,
    base_url: String,
}

impl<C: HttpClientTrait> GeminiProvider<C> {
    pub fn new(client: C, api_key: impl Into<String>) -> Self {
        Self::with_base_url(client, api_key, DEFAULT_GEMINI_BASE_URL)
    }

    pub fn with_base_url(
        client: C,
        api_key: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Self {
        Self {
            client,
            api_key: api_key.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn model_path(model: &str) -> String {
        let trimmed = model.trim();
        if trimmed.starts_with("models/") {
            trimmed.to_string()
        } else {
            format!("models/{}", trimmed)
        }
    }

    fn generate_url(&self, model: &str) -> String {
        format!("{}/{}:generateContent", self.base_url, Self::model_path(model))
    }

    fn stream_url(&self, model: &str) -> String {
        format!(
            "{}/{}:streamGenerateContent?alt=sse",
            self.base_url,
            Self::model_path(model)
        )
    }

    fn headers(&self) -> Vec<(&str, &str)> {
        vec![
            ("x-goog-api-key", self.api_key.as_str()),
            ("Content-Type", "application/json"),
        ]
    }

    fn build_request(&self, request: &LlmRequest) -> serde_json::Value {
        let contents: Vec<serde_json::Value> =
            request.messages.iter().map(content_from_domain).collect();

        let mut generation_config = serde_json::Map::new();

        if request.response_format == LlmResponseFormat::Json {
            generation_config.insert(
                "responseMimeType".to_string(),
                serde_json::json!("application/json"),
            );
        }

        let mut body = serde_json::json!({ "contents": contents });
        if !generation_config.is_empty() {
            body["generationConfig"] = serde_json::Value::Object(generation_config);
        }

        body
    }
}

#[async_trait]
impl<C: HttpClientTrait> LlmProvider for GeminiProvider<C> {
    async fn chat(&self, model: &str, request: LlmRequest) -> Result<LlmResponse, DomainError> {
        let url = self.generate_url(model);
        let body = self.build_request(&request);
        let response = self.client.post_json(&url, self.headers(), &body).await?;

        parse_response(response, model)
    }

    async fn chat_stream(
        &self,
        model: &str,
        request: LlmRequest,
    ) -> Result<LlmStream, DomainError> {
        let url = self.stream_url(model);
        let body = self.build_request(&request);
        let byte_stream = self
            .client
            .post_json_stream(&url, self.headers(), &body)
            .await?;

        // SSE events may be split across network chunks, so lines are buffered.
        // `None` marks the end of the body and flushes an unterminated last line.
        let stream = byte_stream
            .map(Some)
            .chain(stream::once(future::ready(None)))
            .scan(
                SseBuffer::default(),
                |buffer, item: Option<Result<Bytes, DomainError>>| {
                    let items: Vec<Result<StreamChunk, DomainError>> = match item {
                        Some(Ok(bytes)) => parse_stream_events(buffer.push(&bytes)),
                        Some(Err(e)) => vec![Err(e)],
                        None => parse_stream_events(buffer.finish()),
                    };
                    future::ready(Some(stream::iter(items)))
                },
            )
            .flatten();

        Ok(Box::pin(stream))
    }

    fn provider_name(&self) -> &'static str {
        PROVIDER
    }
}

fn content_from_domain(message: &Message) -> serde_json::Value {
    let role = match message.role {
        MessageRole::User => "user",
        MessageRole::Model => "model",
    };

    let parts: Vec<serde_json::Value> = message
        .parts
        .iter()
        .map(|part| match part {
            ContentPart::Text { text } => serde_json::json!({ "text": text }),
            ContentPart::InlineImage { data, mime_type } => serde_json::json!({
                "inlineData": { "mimeType": mime_type, "data": data }
            }),
        })
        .collect();

    serde_json::json!({ "role": role, "parts": parts })
}

fn parse_response(json: serde_json::Value, model: &str) -> Result<LlmResponse, DomainError> {
    let response: GeminiResponse = serde_json::from_value(json).map_err(|e| {
        DomainError::provider(PROVIDER, format!("Failed to parse response: {}", e))
    })?;

    if let Some(error) = response.error {
        return Err(error.into_domain());
    }

    let candidate = response.candidates.into_iter().next().ok_or_else(|| {
        let reason = response
            .prompt_feedback
            .and_then(|f| f.block_reason)
            .unwrap_or_else(|| "no candidates".to_string());
        DomainError::provider(PROVIDER, format!("Empty response: {}", reason))
    })?;

    let mut llm_response = LlmResponse::new(
        response.model_version.unwrap_or_else(|| model.to_string()),
        candidate.text(),
    );

    if let Some(reason) = candidate.finish_reason {
        llm_response = llm_response.with_finish_reason(FinishReason::parse(&reason));
    }

    if let Some(usage) = response.usage_metadata {
        llm_response = llm_response.with_usage(TokenUsage::new(
            usage.prompt_token_count,
            usage.candidates_token_count,
        ));
    }

    Ok(llm_response)
}

fn parse_stream_event(data: &str) -> Option<Result<StreamChunk, DomainError>> {
    let data = data.trim();
    if data.is_empty() || data == "[DONE]" {
        return None;
    }

    let event: GeminiResponse = match serde_json::from_str(data) {
        Ok(event) => event,
        Err(e) => {
            return Some(Err(DomainError::provider(
                PROVIDER,
                format!("Malformed stream event: {}", e),
            )));
        }
    };

    if let Some(error) = event.error {
        return Some(Err(error.into_domain()));
    }

    let candidate = event.candidates.into_iter().next()?;
    let mut chunk = StreamChunk::new();

    let text = candidate.text();
    if !text.is_empty() {
        chunk = chunk.with_delta(text);
    }

    if let Some(reason) = candidate.finish_reason {
        chunk = chunk.with_finish_reason(FinishReason::parse(&reason));
    }

    Some(Ok(chunk))
}

fn parse_stream_events(events: Vec<String>) -> Vec<Result<StreamChunk, DomainError>> {
    events
        .iter()
        .filter_map(|data| parse_stream_event(data))
        .collect()
}

/// Accumulates bytes and yields complete `data:` payloads
///
/// Lines are decoded only once complete, so a character split across
/// network chunks survives.
#[derive(Debug, Default)]
struct SseBuffer {
    pending: Vec<u8>,
}

impl SseBuffer {
    fn push(&mut self, bytes: &[u8]) -> Vec<String> {
        self.pending.extend_from_slice(bytes);

        let mut events = Vec::new();
        while let Some(newline) = self.pending.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.pending.drain(..=newline).collect();
            events.extend(data_payload(&line));
        }

        events
    }

    /// Drains whatever is left once the body has ended
    fn finish(&mut self) -> Vec<String> {
        let line = std::mem::take(&mut self.pending);
        data_payload(&line).into_iter().collect()
    }
}

fn data_payload(line: &[u8]) -> Option<String> {
    let line = String::from_utf8_lossy(line);
    line.trim_end()
        .strip_prefix("data:")
        .map(|data| data.trim_start().to_string())
}

// Gemini API types

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
    usage_metadata: Option<GeminiUsage>,
    model_version: Option<String>,
    prompt_feedback: Option<GeminiPromptFeedback>,
    error: Option<GeminiError>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiCandidate {
    content: Option<GeminiContent>,
    finish_reason: Option<String>,
}

impl GeminiCandidate {
    fn text(&self) -> String {
        self.content
            .as_ref()
            .map(|c| c.parts.iter().filter_map(|p| p.text.as_deref()).collect())
            .unwrap_or_default()
    }
}

#[derive(Debug, Deserialize)]
struct GeminiContent {
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Deserialize)]
struct GeminiPart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiUsage {
    #[serde(default)]
    prompt_token_count: u32,
    #[serde(default)]
    candidates_token_count: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiPromptFeedback {
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeminiError {
    #[serde(default)]
    code: u16,
    #[serde(default)]
    status: String,
    #[serde(default)]
    message: String,
}

impl GeminiError {
    fn into_domain(self) -> DomainError {
        let message = format!("{} {}: {}", self.code, self.status, self.message);
        if self.code == 429 || self.status == "RESOURCE_EXHAUSTED" {
            DomainError::rate_limited(PROVIDER, message)
        } else {
            DomainError::provider(PROVIDER, message)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::llm::http_client::mock::MockHttpClient;
    use reqwest::StatusCode;

    const GENERATE_URL: &str =
        "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.0-flash:generateContent";
    const STREAM_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.0-flash:streamGenerateContent?alt=sse";

    fn text_response(text: &str) -> serde_json::Value {
        serde_json::json!({
            "candidates": [{
                "content": { "role": "model", "parts": [{ "text": text }] },
                "finishReason": "STOP"
            }],
            "usageMetadata": { "promptTokenCount": 12, "candidatesTokenCount": 4 },
            "modelVersion": "gemini-2.0-flash"
        })
    }

    #[tokio::test]
    async fn test_gemini_chat() {
        let client = MockHttpClient::new().with_response(GENERATE_URL, text_response("Nezuko Kamado"));
        let provider = GeminiProvider::new(client, "test-key");

        let response = provider
            .chat("gemini-2.0-flash", LlmRequest::prompt("Who?"))
            .await
            .unwrap();

        assert_eq!(response.text, "Nezuko Kamado");
        assert_eq!(response.model, "gemini-2.0-flash");
        assert_eq!(response.finish_reason, Some(FinishReason::Stop));
        assert_eq!(response.usage.unwrap().total_tokens, 16);
    }

    #[tokio::test]
    async fn test_gemini_request_body() {
        let client = MockHttpClient::new().with_response(GENERATE_URL, text_response("[]"));
        let provider = GeminiProvider::new(client, "test-key");

        let request = LlmRequest::builder()
            .message(Message::user_with_image("Who is this?", b"img", "image/png"))
            .json_output()
            .build();
        provider.chat("models/gemini-2.0-flash", request).await.unwrap();

        let body = &provider.client.bodies()[0];
        assert_eq!(body["contents"][0]["role"], "user");
        assert_eq!(body["contents"][0]["parts"][0]["text"], "Who is this?");
        assert_eq!(body["contents"][0]["parts"][1]["inlineData"]["mimeType"], "image/png");
        assert_eq!(body["generationConfig"]["responseMimeType"], "application/json");
    }

    #[tokio::test]
    async fn test_gemini_plain_request_has_no_generation_config() {
        let client = MockHttpClient::new().with_response(GENERATE_URL, text_response("ok"));
        let provider = GeminiProvider::new(client, "test-key");

        provider
            .chat("gemini-2.0-flash", LlmRequest::prompt("hi"))
            .await
            .unwrap();

        assert!(provider.client.bodies()[0].get("generationConfig").is_none());
    }

    #[tokio::test]
    async fn test_gemini_rate_limit_status() {
        let client = MockHttpClient::new().with_status_error(
            GENERATE_URL,
            StatusCode::TOO_MANY_REQUESTS,
            r#"{"error":{"code":429,"status":"RESOURCE_EXHAUSTED"}}"#,
        );
        let provider = GeminiProvider::new(client, "test-key");

        let error = provider
            .chat("gemini-2.0-flash", LlmRequest::prompt("hi"))
            .await
            .unwrap_err();
        assert!(error.is_rate_limited());
    }

    #[tokio::test]
    async fn test_gemini_blocked_prompt_is_error() {
        let client = MockHttpClient::new().with_response(
            GENERATE_URL,
            serde_json::json!({ "promptFeedback": { "blockReason": "SAFETY" } }),
        );
        let provider = GeminiProvider::new(client, "test-key");

        let error = provider
            .chat("gemini-2.0-flash", LlmRequest::prompt("hi"))
            .await
            .unwrap_err();
        assert!(error.to_string().contains("SAFETY"));
    }

    #[tokio::test]
    async fn test_gemini_stream_split_events() {
        let first = r#"data: {"candidates":[{"content":{"parts":[{"text":"Hello "}]}}]}"#;
        let second = r#"data: {"candidates":[{"content":{"parts":[{"text":"world"}]},"finishReason":"STOP"}]}"#;
        let (head, tail) = second.split_at(20);

        let client = MockHttpClient::new().with_stream_response(
            STREAM_URL,
            vec![
                Bytes::from(format!("{}\r\n\r\n{}", first, head)),
                Bytes::from(format!("{}\r\n\r\n", tail)),
            ],
        );
        let provider = GeminiProvider::new(client, "test-key");

        let chunks: Vec<_> = provider
            .chat_stream("gemini-2.0-flash", LlmRequest::prompt("hi"))
            .await
            .unwrap()
            .collect()
            .await;

        let text: String = chunks
            .iter()
            .filter_map(|c| c.as_ref().ok().and_then(|c| c.delta.clone()))
            .collect();
        assert_eq!(text, "Hello world");
        assert_eq!(
            chunks.last().unwrap().as_ref().unwrap().finish_reason,
            Some(FinishReason::Stop)
        );
    }

    #[tokio::test]
    async fn test_gemini_stream_error_event() {
        let event = r#"data: {"error":{"code":429,"status":"RESOURCE_EXHAUSTED","message":"quota"}}"#;
        let client = MockHttpClient::new()
            .with_stream_response(STREAM_URL, vec![Bytes::from(format!("{}\n\n", event))]);
        let provider = GeminiProvider::new(client, "test-key");

        let chunks: Vec<_> = provider
            .chat_stream("gemini-2.0-flash", LlmRequest::prompt("hi"))
            .await
            .unwrap()
            .collect()
            .await;

        assert_eq!(chunks.len(), 1);
        assert!(chunks[0].as_ref().unwrap_err().is_rate_limited());
    }

    #[tokio::test]
    async fn test_gemini_stream_last_event_without_newline() {
        let first = r#"data: {"candidates":[{"content":{"parts":[{"text":"Kamado "}]}}]}"#;
        let last = r#"data: {"candidates":[{"content":{"parts":[{"text":"Tanjiro"}]},"finishReason":"STOP"}]}"#;
        let client = MockHttpClient::new().with_stream_response(
            STREAM_URL,
            vec![Bytes::from(format!("{}\n\n", first)), Bytes::from(last)],
        );
        let provider = GeminiProvider::new(client, "test-key");

        let chunks: Vec<_> = provider
            .chat_stream("gemini-2.0-flash", LlmRequest::prompt("hi"))
            .await
            .unwrap()
            .collect()
            .await;

        let text: String = chunks
            .iter()
            .filter_map(|c| c.as_ref().ok().and_then(|c| c.delta.clone()))
            .collect();
        assert_eq!(text, "Kamado Tanjiro");
        assert_eq!(
            chunks.last().unwrap().as_ref().unwrap().finish_reason,
            Some(FinishReason::Stop)
        );
    }

    #[test]
    fn test_sse_buffer_holds_partial_lines() {
        let mut buffer = SseBuffer::default();
        assert!(buffer.push(b"data: {\"a\"").is_empty());
        assert_eq!(buffer.push(b":1}\n\n"), vec!["{\"a\":1}".to_string()]);
        assert!(buffer.finish().is_empty());
    }

    #[test]
    fn test_sse_buffer_keeps_characters_split_across_chunks() {
        let line = "data: {\"candidates\":[{\"content\":{\"parts\":[{\"text\":\"Hi 🌟\"}]}}]}\n";
        let star = line.find('🌟').unwrap();
        let (head, tail) = line.as_bytes().split_at(star + 2);

        let mut buffer = SseBuffer::default();
        assert!(buffer.push(head).is_empty());
        let events = buffer.push(tail);
        assert_eq!(events.len(), 1);

        let chunk = parse_stream_event(&events[0]).unwrap().unwrap();
        assert_eq!(chunk.delta.as_deref(), Some("Hi 🌟"));
    }

    #[test]
    fn test_sse_buffer_flushes_unterminated_line() {
        let mut buffer = SseBuffer::default();
        assert!(buffer.push(b"data: {\"a\":1}").is_empty());
        assert_eq!(buffer.finish(), vec!["{\"a\":1}".to_string()]);
        assert!(buffer.finish().is_empty());
    }
}
