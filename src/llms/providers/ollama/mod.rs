//! Ollama provider (local daemon).
//!
//! Talks to `POST {base_url}/api/chat`. Streaming responses are
//! newline-delimited JSON, one object per line. The hosted MindRx backend
//! speaks the same protocol and reuses this provider.
//!
//! # Environment Variables
//!
//! - `OLLAMA_BASE_URL` - daemon URL (defaults to `http://localhost:11434`)

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Map, Value};

use super::utils::{chat_messages, error_message, read_json, resolve_base_url};
use super::ProviderOptions;
use crate::llms::error::ProviderError;
use crate::llms::provider::{Chunk, ChunkStream, CompletionRequest, Provider, Response, Usage};
use crate::llms::streaming::{open_stream, Framing};

pub const OLLAMA_DEFAULT_BASE_URL: &str = "http://localhost:11434";
pub const OLLAMA_DEFAULT_MODEL: &str = "llama3.2";

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    message: Option<ChatMessage>,
    #[serde(default)]
    prompt_eval_count: Option<u64>,
    #[serde(default)]
    eval_count: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    #[serde(default)]
    content: String,
}

/// Provider for an Ollama-protocol server.
#[derive(Debug, Clone)]
pub struct OllamaProvider {
    name: &'static str,
    label: &'static str,
    client: reqwest::Client,
    base_url: String,
    model: String,
    /// Model name reported in responses instead of the one requested.
    reported_model: Option<&'static str>,
}

impl OllamaProvider {
    /// Local daemon: explicit URL, then `OLLAMA_BASE_URL`, then localhost.
    pub fn new(options: ProviderOptions) -> Self {
        Self {
            name: "ollama",
            label: "Ollama",
            client: reqwest::Client::new(),
            base_url: resolve_base_url(
                options.base_url,
                Some("OLLAMA_BASE_URL"),
                OLLAMA_DEFAULT_BASE_URL,
            ),
            model: options
                .model
                .unwrap_or_else(|| OLLAMA_DEFAULT_MODEL.to_string()),
            reported_model: None,
        }
    }

    /// Same protocol under a different identity.
    pub(crate) fn branded(
        name: &'static str,
        label: &'static str,
        base_url: String,
        model: String,
        reported_model: Option<&'static str>,
    ) -> Self {
        Self {
            name,
            label,
            client: reqwest::Client::new(),
            base_url,
            model,
            reported_model,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Build the JSON body for `/api/chat`.
    ///
    /// Sampling parameters go under `options`; `max_tokens` maps to
    /// `num_predict`.
    pub fn build_request_body(&self, request: &CompletionRequest, stream: bool) -> Value {
        let params = &request.parameters;
        let mut options = Map::new();
        options.insert("temperature".into(), json!(params.temperature));
        if let Some(top_p) = params.top_p {
            options.insert("top_p".into(), json!(top_p));
        }
        if let Some(penalty) = params.frequency_penalty {
            options.insert("frequency_penalty".into(), json!(penalty));
        }
        if let Some(penalty) = params.presence_penalty {
            options.insert("presence_penalty".into(), json!(penalty));
        }
        if let Some(max_tokens) = params.max_tokens {
            options.insert("num_predict".into(), json!(max_tokens));
        }

        json!({
            "model": request.model_or(&self.model),
            "messages": chat_messages(request),
            "options": options,
            "stream": stream,
        })
    }

    fn post(&self, body: &Value) -> reqwest::RequestBuilder {
        self.client
            .post(format!("{}/api/chat", self.base_url))
            .header("Content-Type", "application/json")
            .json(body)
    }
}

#[async_trait]
impl Provider for OllamaProvider {
    fn name(&self) -> &str {
        self.name
    }

    fn default_model(&self) -> &str {
        &self.model
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<Response, ProviderError> {
        let model = request.model_or(&self.model).to_string();
        log::debug!("{} complete: model={} url={}", self.label, model, self.base_url);

        let body = self.build_request_body(request, false);
        let response = self.post(&body).send().await?;
        let data: ChatResponse = read_json(self.label, response).await?;

        // Ollama omits or zeroes counts on cached prompts; report nothing then.
        let usage = match (data.prompt_eval_count, data.eval_count) {
            (Some(prompt), Some(completion)) if prompt > 0 && completion > 0 => {
                Some(Usage::new(prompt, completion))
            }
            _ => None,
        };

        Ok(Response {
            text: data.message.map(|m| m.content).unwrap_or_default(),
            state: String::new(),
            model: self.reported_model.map(str::to_string).unwrap_or(model),
            usage,
        })
    }

    fn stream(&self, request: &CompletionRequest) -> ChunkStream {
        log::debug!(
            "{} stream: model={} url={}",
            self.label,
            request.model_or(&self.model),
            self.base_url
        );

        let builder = self.post(&self.build_request_body(request, true));
        let label = self.label;
        open_stream(
            label,
            async move { builder.send().await },
            Framing::JsonLines,
            move |line| parse_frame(label, line),
        )
    }
}

/// Parse one NDJSON line from `/api/chat`.
///
/// Every well-formed line yields a chunk, even with empty text. A line
/// carrying an `error` field fails the stream.
pub fn parse_frame(label: &str, line: &str) -> Result<Option<Chunk>, ProviderError> {
    let Ok(value) = serde_json::from_str::<Value>(line) else {
        return Ok(None);
    };

    if let Some(error) = value.get("error") {
        return Err(ProviderError::Stream {
            provider: label.to_string(),
            message: error_message(error),
        });
    }

    Ok(Some(Chunk {
        text: value["message"]["content"]
            .as_str()
            .unwrap_or_default()
            .to_string(),
        done: value["done"].as_bool().unwrap_or(false),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::states::StateParameters;
    use futures::StreamExt;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn request() -> CompletionRequest {
        CompletionRequest {
            system_prompt: "Relax.".into(),
            user_prompt: "Hi".into(),
            parameters: StateParameters {
                temperature: 1.1,
                top_p: Some(0.9),
                frequency_penalty: None,
                presence_penalty: Some(0.4),
                max_tokens: Some(100),
            },
            model: None,
        }
    }

    fn provider(server: &MockServer) -> OllamaProvider {
        OllamaProvider::new(ProviderOptions {
            base_url: Some(server.uri()),
            ..Default::default()
        })
    }

    #[test]
    fn test_request_body() {
        let provider = OllamaProvider::new(ProviderOptions {
            base_url: Some("http://gpu-box:11434".into()),
            ..Default::default()
        });
        let body = provider.build_request_body(&request(), true);

        assert_eq!(body["model"], OLLAMA_DEFAULT_MODEL);
        assert_eq!(body["stream"], true);
        assert_eq!(
            body["options"],
            json!({"temperature": 1.1, "top_p": 0.9, "presence_penalty": 0.4, "num_predict": 100})
        );
        assert_eq!(body["messages"][0]["content"], "Relax.");
    }

    #[test]
    fn test_parse_frame() {
        assert_eq!(
            parse_frame("Ollama", r#"{"message":{"content":"Hi"},"done":false}"#).unwrap(),
            Some(Chunk::text("Hi"))
        );
        assert_eq!(
            parse_frame("Ollama", r#"{"message":{"content":""},"done":true}"#).unwrap(),
            Some(Chunk::done())
        );
        assert_eq!(parse_frame("Ollama", "{\"message\":").unwrap(), None);
        assert!(parse_frame("Ollama", r#"{"error":"model not found"}"#).is_err());
    }

    #[tokio::test]
    async fn test_complete() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .and(body_partial_json(json!({"stream": false, "options": {"temperature": 1.1}})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "model": "llama3.2",
                "message": {"role": "assistant", "content": "Chill."},
                "done": true,
                "prompt_eval_count": 20,
                "eval_count": 5
            })))
            .mount(&server)
            .await;

        let response = provider(&server).complete(&request()).await.unwrap();
        assert_eq!(response.text, "Chill.");
        assert_eq!(response.model, OLLAMA_DEFAULT_MODEL);
        assert_eq!(response.usage, Some(Usage::new(20, 5)));
    }

    #[tokio::test]
    async fn test_complete_without_counts_has_no_usage() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "message": {"role": "assistant", "content": "ok"},
                "done": true,
                "prompt_eval_count": 0,
                "eval_count": 3
            })))
            .mount(&server)
            .await;

        let response = provider(&server).complete(&request()).await.unwrap();
        assert_eq!(response.usage, None);
    }

    #[tokio::test]
    async fn test_complete_captures_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(404).set_body_string("model 'nope' not found"))
            .mount(&server)
            .await;

        let err = provider(&server).complete(&request()).await.unwrap_err();
        assert_eq!(err.status(), Some(404));
        assert_eq!(
            err.to_string(),
            "Ollama API error: 404 - model 'nope' not found"
        );
    }

    #[tokio::test]
    async fn test_stream() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(
                "{\"message\":{\"content\":\"Hi\"},\"done\":false}\n{\"message\":{\"content\":\"\"},\"done\":true}\n",
                "application/x-ndjson",
            ))
            .mount(&server)
            .await;

        let chunks: Vec<Chunk> = provider(&server)
            .stream(&request())
            .map(|c| c.unwrap())
            .collect()
            .await;
        assert_eq!(chunks, vec![Chunk::text("Hi"), Chunk::done()]);
    }

    #[tokio::test]
    async fn test_stream_error_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let items: Vec<_> = provider(&server).stream(&request()).collect().await;
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].as_ref().unwrap_err().status(), Some(500));
    }
}
