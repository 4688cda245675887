//! Anthropic Messages API provider.
//!
//! Talks to `POST {base_url}/v1/messages` with `reqwest`. The system prompt
//! travels in the top-level `system` field, not as a message. Anthropic has
//! no frequency/presence penalties, so those are dropped. Temperature is sent
//! as given; values the API rejects come back as `ProviderError::Http`.
//!
//! # Environment Variables
//!
//! - `ANTHROPIC_API_KEY` - Anthropic API key

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};

use super::utils::{error_message, read_json, resolve_base_url, resolve_credential};
use super::ProviderOptions;
use crate::llms::error::ProviderError;
use crate::llms::provider::{Chunk, ChunkStream, CompletionRequest, Provider, Response, Usage};
use crate::llms::streaming::{failed_stream, open_stream, Framing};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

pub const ANTHROPIC_DEFAULT_BASE_URL: &str = "https://api.anthropic.com";
pub const ANTHROPIC_DEFAULT_MODEL: &str = "claude-3-5-sonnet-20241022";
pub const ANTHROPIC_VERSION: &str = "2023-06-01";

/// `max_tokens` is mandatory on this API; used when the state sets none.
pub const DEFAULT_MAX_TOKENS: u32 = 4096;

const LABEL: &str = "Anthropic";
const ENV_VAR: &str = "ANTHROPIC_API_KEY";

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
    usage: Option<MessagesUsage>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    block_type: String,
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct MessagesUsage {
    input_tokens: Option<u64>,
    output_tokens: Option<u64>,
}

impl MessagesUsage {
    fn into_usage(self) -> Option<Usage> {
        if self.input_tokens.is_none() && self.output_tokens.is_none() {
            return None;
        }
        Some(Usage::new(
            self.input_tokens.unwrap_or(0),
            self.output_tokens.unwrap_or(0),
        ))
    }
}

// ---------------------------------------------------------------------------
// AnthropicProvider
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct AnthropicProvider {
    client: reqwest::Client,
    api_key: Option<String>,
    base_url: String,
    model: String,
}

impl AnthropicProvider {
    pub fn new(options: ProviderOptions) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: resolve_credential(options.api_key, ENV_VAR),
            base_url: resolve_base_url(options.base_url, None, ANTHROPIC_DEFAULT_BASE_URL),
            model: options
                .model
                .unwrap_or_else(|| ANTHROPIC_DEFAULT_MODEL.to_string()),
        }
    }

    /// Build the JSON body for `/v1/messages`.
    pub fn build_request_body(&self, request: &CompletionRequest, stream: bool) -> Value {
        let params = &request.parameters;
        let mut body = json!({
            "model": request.model_or(&self.model),
            "max_tokens": params.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
            "messages": [{"role": "user", "content": request.user_prompt}],
            "temperature": params.temperature,
        });

        if !request.system_prompt.is_empty() {
            body["system"] = Value::String(request.system_prompt.clone());
        }
        if let Some(top_p) = params.top_p {
            body["top_p"] = json!(top_p);
        }
        if stream {
            body["stream"] = json!(true);
        }

        body
    }

    fn post(&self, body: &Value) -> Result<reqwest::RequestBuilder, ProviderError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| ProviderError::MissingCredential {
                provider: LABEL.to_string(),
                env_var: ENV_VAR,
            })?;

        Ok(self
            .client
            .post(format!("{}/v1/messages", self.base_url))
            .header("content-type", "application/json")
            .header("x-api-key", api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(body))
    }
}

#[async_trait]
impl Provider for AnthropicProvider {
    fn name(&self) -> &str {
        "anthropic"
    }

    fn default_model(&self) -> &str {
        &self.model
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<Response, ProviderError> {
        let model = request.model_or(&self.model).to_string();
        log::debug!("Anthropic complete: model={}", model);

        let body = self.build_request_body(request, false);
        let response = self.post(&body)?.send().await?;
        let message: MessagesResponse = read_json(LABEL, response).await?;

        let text = message
            .content
            .into_iter()
            .find(|block| block.block_type == "text")
            .and_then(|block| block.text)
            .unwrap_or_default();

        Ok(Response {
            text,
            state: String::new(),
            model,
            usage: message.usage.and_then(MessagesUsage::into_usage),
        })
    }

    fn stream(&self, request: &CompletionRequest) -> ChunkStream {
        log::debug!("Anthropic stream: model={}", request.model_or(&self.model));

        let body = self.build_request_body(request, true);
        let builder = match self.post(&body) {
            Ok(builder) => builder,
            Err(e) => return failed_stream(e),
        };

        open_stream(
            LABEL,
            async move { builder.send().await },
            Framing::ServerSentEvents,
            parse_frame,
        )
    }
}

/// Parse one SSE `data:` payload from a Messages stream.
///
/// Text deltas become chunks, `message_stop` becomes the terminal chunk and
/// an `error` event fails the stream. Everything else is skipped.
pub fn parse_frame(data: &str) -> Result<Option<Chunk>, ProviderError> {
    let Ok(event) = serde_json::from_str::<Value>(data) else {
        return Ok(None);
    };

    match event["type"].as_str() {
        Some("content_block_delta") if event["delta"]["type"] == "text_delta" => Ok(event["delta"]
            ["text"]
            .as_str()
            .map(Chunk::text)),
        Some("message_stop") => Ok(Some(Chunk::done())),
        Some("error") => Err(ProviderError::Stream {
            provider: LABEL.to_string(),
            message: error_message(&event["error"]),
        }),
        _ => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::states::StateParameters;
    use futures::StreamExt;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn request(temperature: f64) -> CompletionRequest {
        CompletionRequest {
            system_prompt: "Speak slowly.".into(),
            user_prompt: "Hello".into(),
            parameters: StateParameters {
                temperature,
                top_p: Some(0.95),
                frequency_penalty: Some(0.2),
                presence_penalty: Some(0.1),
                max_tokens: None,
            },
            model: None,
        }
    }

    fn provider(server: &MockServer) -> AnthropicProvider {
        AnthropicProvider::new(ProviderOptions {
            api_key: Some("sk-ant-test".into()),
            base_url: Some(server.uri()),
            model: None,
        })
    }

    #[test]
    fn test_request_body() {
        let provider = AnthropicProvider::new(ProviderOptions::default());
        let body = provider.build_request_body(&request(1.5), false);

        assert_eq!(body["model"], ANTHROPIC_DEFAULT_MODEL);
        assert_eq!(body["max_tokens"], DEFAULT_MAX_TOKENS);
        assert_eq!(body["system"], "Speak slowly.");
        assert_eq!(body["temperature"], 1.5);
        assert_eq!(body["messages"], json!([{"role": "user", "content": "Hello"}]));
        assert!(body.get("frequency_penalty").is_none());
        assert!(body.get("stream").is_none());
    }

    #[test]
    fn test_parse_frame() {
        let delta = r#"{"type":"content_block_delta","index":0,"delta":{"type":"text_delta","text":"Hi"}}"#;
        assert_eq!(parse_frame(delta).unwrap(), Some(Chunk::text("Hi")));

        let start = r#"{"type":"message_start","message":{"id":"msg_1"}}"#;
        assert_eq!(parse_frame(start).unwrap(), None);

        assert_eq!(
            parse_frame(r#"{"type":"message_stop"}"#).unwrap(),
            Some(Chunk::done())
        );

        let error = r#"{"type":"error","error":{"type":"overloaded_error","message":"Overloaded"}}"#;
        assert!(matches!(
            parse_frame(error),
            Err(ProviderError::Stream { message, .. }) if message == "Overloaded"
        ));
    }

    #[tokio::test]
    async fn test_complete() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/messages"))
            .and(header("x-api-key", "sk-ant-test"))
            .and(header("anthropic-version", ANTHROPIC_VERSION))
            .and(body_partial_json(json!({"temperature": 0.5, "system": "Speak slowly."})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "content": [{"type": "text", "text": "Hello there."}],
                "usage": {"input_tokens": 7, "output_tokens": 3}
            })))
            .mount(&server)
            .await;

        let response = provider(&server).complete(&request(0.5)).await.unwrap();
        assert_eq!(response.text, "Hello there.");
        assert_eq!(response.usage, Some(Usage::new(7, 3)));
    }

    #[tokio::test]
    async fn test_complete_with_partial_usage() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/messages"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "content": [{"type": "text", "text": "Hi."}],
                "usage": {"output_tokens": 3}
            })))
            .mount(&server)
            .await;

        let response = provider(&server).complete(&request(0.5)).await.unwrap();
        assert_eq!(response.text, "Hi.");
        assert_eq!(response.usage, Some(Usage::new(0, 3)));
    }

    #[tokio::test]
    async fn test_out_of_range_temperature_surfaces_vendor_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_partial_json(json!({"temperature": 1.5})))
            .respond_with(
                ResponseTemplate::new(400)
                    .set_body_string("temperature: range: 0..1"),
            )
            .expect(1)
            .mount(&server)
            .await;

        let err = provider(&server).complete(&request(1.5)).await.unwrap_err();
        assert_eq!(err.status(), Some(400));
    }

    #[tokio::test]
    async fn test_complete_captures_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_string("invalid x-api-key"))
            .mount(&server)
            .await;

        let err = provider(&server).complete(&request(0.5)).await.unwrap_err();
        assert_eq!(err.status(), Some(401));
    }

    #[tokio::test]
    async fn test_stream() {
        let server = MockServer::start().await;
        let sse = concat!(
            "event: message_start\n",
            "data: {\"type\":\"message_start\",\"message\":{}}\n\n",
            "event: content_block_delta\n",
            "data: {\"type\":\"content_block_delta\",\"delta\":{\"type\":\"text_delta\",\"text\":\"Slow\"}}\n\n",
            "event: content_block_delta\n",
            "data: {\"type\":\"content_block_delta\",\"delta\":{\"type\":\"text_delta\",\"text\":\"ly.\"}}\n\n",
            "event: message_stop\n",
            "data: {\"type\":\"message_stop\"}\n\n",
        );
        Mock::given(method("POST"))
            .and(body_partial_json(json!({"stream": true})))
            .respond_with(ResponseTemplate::new(200).set_body_raw(sse, "text/event-stream"))
            .mount(&server)
            .await;

        let chunks: Vec<Chunk> = provider(&server)
            .stream(&request(0.5))
            .map(|c| c.unwrap())
            .collect()
            .await;
        assert_eq!(
            chunks,
            vec![Chunk::text("Slow"), Chunk::text("ly."), Chunk::done()]
        );
    }
}
