//! Shared HTTP transport for OpenAI-compatible chat endpoints.
//!
//! `HttpProvider` wraps a `reqwest::Client` with pre-configured headers and
//! endpoint URL. Provides `send()` for non-streaming and `stream_sse()` for
//! Server-Sent Events streaming. Non-2xx statuses are errors, so auth and
//! rate-limit failures surface at the backend boundary.

use crate::{Response, StreamChunk};
use anyhow::{Result, anyhow};
use async_stream::try_stream;
use futures_core::Stream;
use futures_util::{StreamExt, pin_mut};
use reqwest::{
    Client, Method,
    header::{self, HeaderMap, HeaderValue},
};
use serde::Serialize;

/// Shared HTTP transport for OpenAI-compatible providers.
///
/// Holds a `reqwest::Client`, pre-built headers (auth + content-type),
/// and the target endpoint URL.
#[derive(Clone)]
pub struct HttpProvider {
    client: Client,
    headers: HeaderMap,
    endpoint: String,
}

impl HttpProvider {
    /// Create a provider with Bearer token authentication.
    pub fn bearer(client: Client, key: &str, endpoint: &str) -> Result<Self> {
        let mut headers = json_headers();
        headers.insert(header::AUTHORIZATION, format!("Bearer {key}").parse()?);
        Ok(Self {
            client,
            headers,
            endpoint: endpoint.to_owned(),
        })
    }

    /// Send a non-streaming request and deserialize the response as JSON.
    pub async fn send(&self, body: &impl Serialize) -> Result<Response> {
        tracing::trace!("request: {}", serde_json::to_string(body)?);
        let text = self
            .client
            .request(Method::POST, &self.endpoint)
            .headers(self.headers.clone())
            .json(body)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        serde_json::from_str(&text).map_err(Into::into)
    }

    /// Stream an SSE response (OpenAI-compatible format).
    ///
    /// Parses `data: ` prefixed lines and stops at the `[DONE]` sentinel.
    /// A line that is not a valid chunk fails the stream.
    pub fn stream_sse<B: Serialize>(
        &self,
        body: B,
    ) -> impl Stream<Item = Result<StreamChunk>> + Send + use<B> {
        if let Ok(body) = serde_json::to_string(&body) {
            tracing::trace!("request: {}", body);
        }
        let request = self
            .client
            .request(Method::POST, &self.endpoint)
            .headers(self.headers.clone())
            .json(&body);

        try_stream! {
            let response = request.send().await?.error_for_status()?;
            let lines = lines(response.bytes_stream());
            pin_mut!(lines);
            while let Some(line) = lines.next().await {
                let line = line?;
                let Some(data) = line.trim().strip_prefix("data:") else {
                    continue;
                };
                let data = data.trim();
                if data.is_empty() {
                    continue;
                }
                if data.starts_with("[DONE]") {
                    break;
                }
                tracing::trace!("chunk: {}", data);
                let chunk: StreamChunk = serde_json::from_str(data)
                    .map_err(|e| anyhow!("malformed stream chunk: {e}"))?;
                yield chunk;
            }
        }
    }

    /// Get the endpoint URL.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Get a reference to the headers.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }
}

/// Split a byte stream into newline-terminated UTF-8 lines.
///
/// Bytes are buffered until a full line arrives, so a character split
/// across network chunks decodes intact. A trailing line without a newline
/// is yielded when the input ends. Invalid UTF-8 is an error.
pub fn lines<S, B, E>(bytes: S) -> impl Stream<Item = Result<String>> + Send
where
    S: Stream<Item = std::result::Result<B, E>> + Send,
    B: AsRef<[u8]> + Send,
    E: std::error::Error + Send + Sync + 'static,
{
    try_stream! {
        pin_mut!(bytes);
        let mut buffer = Vec::new();
        while let Some(next) = bytes.next().await {
            buffer.extend_from_slice(next?.as_ref());
            while let Some(end) = buffer.iter().position(|byte| *byte == b'\n') {
                let line: Vec<u8> = buffer.drain(..=end).collect();
                yield String::from_utf8(line)?;
            }
        }
        if !buffer.is_empty() {
            yield String::from_utf8(buffer)?;
        }
    }
}

fn json_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/json"),
    );
    headers.insert(header::ACCEPT, HeaderValue::from_static("application/json"));
    headers
}
