//! OpenAI-compatible remote backend.
//!
//! Covers the OpenAI API, Gemini's OpenAI-compatible endpoint, and any
//! other service exposing the chat completions API.

use compact_str::CompactString;
use llm::{Client, HttpProvider};

mod provider;

/// OpenAI-compatible endpoint URLs.
pub mod endpoint {
    /// OpenAI chat completions.
    pub const OPENAI: &str = "https://api.openai.com/v1/chat/completions";
    /// Gemini's OpenAI-compatible chat completions.
    pub const GEMINI: &str =
        "https://generativelanguage.googleapis.com/v1beta/openai/chat/completions";
}

/// Default remote model.
pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo";

/// An OpenAI-compatible remote backend.
#[derive(Clone)]
pub struct OpenAI {
    /// Shared HTTP transport.
    http: HttpProvider,
    /// Model identifier sent with every request.
    model: CompactString,
    /// Backend name for logging.
    name: CompactString,
}

impl OpenAI {
    /// Create a backend targeting the OpenAI API.
    pub fn api(client: Client, key: &str, model: &str) -> anyhow::Result<Self> {
        Self::named("openai", client, key, endpoint::OPENAI, model)
    }

    /// Create a backend targeting Gemini's OpenAI-compatible API.
    pub fn gemini(client: Client, key: &str, model: &str) -> anyhow::Result<Self> {
        Self::named("gemini", client, key, endpoint::GEMINI, model)
    }

    /// Create a backend targeting a custom OpenAI-compatible endpoint.
    pub fn custom(client: Client, key: &str, endpoint: &str, model: &str) -> anyhow::Result<Self> {
        Self::named("custom", client, key, endpoint, model)
    }

    fn named(
        name: &str,
        client: Client,
        key: &str,
        endpoint: &str,
        model: &str,
    ) -> anyhow::Result<Self> {
        Ok(Self {
            http: HttpProvider::bearer(client, key, endpoint)?,
            model: model.into(),
            name: name.into(),
        })
    }

    /// The model this backend requests.
    pub fn model(&self) -> &str {
        &self.model
    }

    /// The chat completions endpoint.
    pub fn endpoint(&self) -> &str {
        self.http.endpoint()
    }
}
