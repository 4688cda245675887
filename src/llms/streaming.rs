//! Streaming transport decoding.
//!
//! Backends stream in one of two framings:
//!
//! - **JSON lines** (Ollama): one JSON object per `\n`-terminated line.
//! - **Server-sent events** (OpenAI, Anthropic, and compatibles): `data:`
//!   lines carrying JSON, with `[DONE]` as an end sentinel.
//!
//! [`decode_chunks`] owns the buffering for both. Raw bytes are held until a
//! full line arrives, so a JSON object or a multi-byte character split
//! across reads is reassembled before it is parsed. Each complete payload
//! goes to a per-vendor frame parser, which returns:
//!
//! - `Ok(Some(chunk))` to yield a chunk,
//! - `Ok(None)` to skip the frame (malformed or uninteresting),
//! - `Err(_)` for an explicit error event, which ends the stream.

use std::future::Future;

use async_stream::try_stream;
use bytes::Bytes;
use futures::{Stream, StreamExt};

use super::error::ProviderError;
use super::provider::{Chunk, ChunkStream};
use super::providers::utils::ensure_success;

// ---------------------------------------------------------------------------
// Framing
// ---------------------------------------------------------------------------

/// How a transport delimits frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Framing {
    JsonLines,
    ServerSentEvents,
}

/// SSE end-of-stream sentinel.
pub const SSE_DONE: &str = "[DONE]";

/// Splits a byte stream into frame payloads.
#[derive(Debug)]
pub struct FrameBuffer {
    framing: Framing,
    pending: Vec<u8>,
}

impl FrameBuffer {
    pub fn new(framing: Framing) -> Self {
        Self {
            framing,
            pending: Vec::new(),
        }
    }

    /// Feed bytes, returning every payload completed by them.
    pub fn push(&mut self, bytes: &[u8]) -> Vec<String> {
        self.pending.extend_from_slice(bytes);

        let mut payloads = Vec::new();
        while let Some(pos) = self.pending.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.pending.drain(..=pos).collect();
            if let Some(payload) = self.payload(&line) {
                payloads.push(payload);
            }
        }
        payloads
    }

    /// Flush an unterminated trailing line once the transport has ended.
    pub fn finish(&mut self) -> Option<String> {
        let rest = std::mem::take(&mut self.pending);
        self.payload(&rest)
    }

    fn payload(&self, line: &[u8]) -> Option<String> {
        let line = String::from_utf8_lossy(line);
        let line = line.trim();
        if line.is_empty() {
            return None;
        }

        match self.framing {
            Framing::JsonLines => Some(line.to_string()),
            Framing::ServerSentEvents => {
                // `event:`, `id:` and `:` comment lines carry nothing we need.
                let data = line.strip_prefix("data:")?.trim();
                if data.is_empty() || data == SSE_DONE {
                    None
                } else {
                    Some(data.to_string())
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Decoding
// ---------------------------------------------------------------------------

/// Decode a raw byte stream into chunks with `parse`.
pub fn decode_chunks<S, F>(body: S, framing: Framing, parse: F) -> ChunkStream
where
    S: Stream<Item = Result<Bytes, reqwest::Error>> + Send + 'static,
    F: Fn(&str) -> Result<Option<Chunk>, ProviderError> + Send + 'static,
{
    Box::pin(frames(body, framing, parse))
}

fn frames<S, F>(
    body: S,
    framing: Framing,
    parse: F,
) -> impl Stream<Item = Result<Chunk, ProviderError>> + Send
where
    S: Stream<Item = Result<Bytes, reqwest::Error>> + Send + 'static,
    F: Fn(&str) -> Result<Option<Chunk>, ProviderError> + Send + 'static,
{
    try_stream! {
        let mut buffer = FrameBuffer::new(framing);
        let mut body = Box::pin(body);

        while let Some(bytes) = body.next().await {
            let bytes = bytes?;
            for payload in buffer.push(&bytes) {
                if let Some(chunk) = parse(&payload)? {
                    yield chunk;
                }
            }
        }

        if let Some(payload) = buffer.finish() {
            if let Some(chunk) = parse(&payload)? {
                yield chunk;
            }
        }
    }
}

/// Send a request when first polled, then decode its body.
///
/// A non-success status becomes [`ProviderError::Http`] carrying the
/// response body.
pub fn open_stream<Fut, F>(provider: &str, send: Fut, framing: Framing, parse: F) -> ChunkStream
where
    Fut: Future<Output = Result<reqwest::Response, reqwest::Error>> + Send + 'static,
    F: Fn(&str) -> Result<Option<Chunk>, ProviderError> + Send + 'static,
{
    Box::pin(open(provider.to_string(), send, framing, parse))
}

fn open<Fut, F>(
    provider: String,
    send: Fut,
    framing: Framing,
    parse: F,
) -> impl Stream<Item = Result<Chunk, ProviderError>> + Send
where
    Fut: Future<Output = Result<reqwest::Response, reqwest::Error>> + Send + 'static,
    F: Fn(&str) -> Result<Option<Chunk>, ProviderError> + Send + 'static,
{
    try_stream! {
        let response = send.await?;
        let response = ensure_success(&provider, response).await?;
        log::debug!("{} stream opened", provider);

        let mut chunks = decode_chunks(response.bytes_stream(), framing, parse);
        while let Some(chunk) = chunks.next().await {
            yield chunk?;
        }
    }
}

/// A stream that fails with `error` on first poll.
pub fn failed_stream(error: ProviderError) -> ChunkStream {
    Box::pin(futures::stream::once(async move { Err(error) }))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
