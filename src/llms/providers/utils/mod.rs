//! Helpers shared across provider implementations.

use serde::de::DeserializeOwned;
use serde_json::{json, Value};

use crate::llms::error::ProviderError;
use crate::llms::provider::CompletionRequest;

/// Resolve a credential: explicit value first, then the environment.
///
/// Empty strings count as unset in both places.
pub fn resolve_credential(explicit: Option<String>, env_var: &str) -> Option<String> {
    explicit
        .filter(|v| !v.is_empty())
        .or_else(|| std::env::var(env_var).ok().filter(|v| !v.is_empty()))
}

/// Resolve a base URL: explicit, then the environment, then `default`.
///
/// Trailing slashes are trimmed so paths can be appended with `format!`.
pub fn resolve_base_url(explicit: Option<String>, env_var: Option<&str>, default: &str) -> String {
    explicit
        .filter(|v| !v.is_empty())
        .or_else(|| env_var.and_then(|var| std::env::var(var).ok().filter(|v| !v.is_empty())))
        .unwrap_or_else(|| default.to_string())
        .trim_end_matches('/')
        .to_string()
}

/// System + user messages in chat format. An empty system prompt is left out.
pub fn chat_messages(request: &CompletionRequest) -> Value {
    let mut messages = Vec::with_capacity(2);
    if !request.system_prompt.is_empty() {
        messages.push(json!({"role": "system", "content": request.system_prompt}));
    }
    messages.push(json!({"role": "user", "content": request.user_prompt}));
    Value::Array(messages)
}

/// Turn a non-success response into [`ProviderError::Http`] with its body.
pub async fn ensure_success(
    provider: &str,
    response: reqwest::Response,
) -> Result<reqwest::Response, ProviderError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    log::debug!("{} request failed: {} - {}", provider, status, body);
    Err(ProviderError::Http {
        provider: provider.to_string(),
        status: status.as_u16(),
        body,
    })
}

/// Check the status, then decode the body as JSON.
pub async fn read_json<T: DeserializeOwned>(
    provider: &str,
    response: reqwest::Response,
) -> Result<T, ProviderError> {
    let response = ensure_success(provider, response).await?;
    let text = response.text().await?;
    serde_json::from_str(&text).map_err(|e| ProviderError::Decode {
        provider: provider.to_string(),
        message: format!("{} - Body: {}", e, truncate(&text, 500)),
    })
}

/// Message from a vendor error payload: a string, or an object's `message`.
pub fn error_message(error: &Value) -> String {
    match error {
        Value::String(s) => s.clone(),
        other => other
            .get("message")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| other.to_string()),
    }
}

fn truncate(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
