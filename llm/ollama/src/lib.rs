//! Local backend via an Ollama server.
//!
//! Talks to `/api/chat` with newline-delimited JSON streaming and maps
//! each line into the shared `StreamChunk` shape. Generation options are
//! owned here as [`LocalTuning`]; the per-call profile from the router is
//! not applied.

use compact_str::CompactString;
use llm::Client;
use serde::{Deserialize, Serialize};

mod provider;
mod wire;

/// Default Ollama host.
pub const DEFAULT_HOST: &str = "http://127.0.0.1";

/// Default Ollama port.
pub const DEFAULT_PORT: u16 = 11434;

/// Default local model.
pub const DEFAULT_MODEL: &str = "llama3.1";

/// Local backend talking to an Ollama server.
#[derive(Clone)]
pub struct Ollama {
    client: Client,
    /// Server base URL, e.g. `http://127.0.0.1:11434`.
    base: String,
    model: CompactString,
    tuning: LocalTuning,
}

impl Ollama {
    /// Create a backend for `model` on `host:port`.
    ///
    /// `host` may carry a scheme; plain hosts are treated as `http`.
    pub fn new(client: Client, host: &str, port: u16, model: &str) -> Self {
        let host = host.trim_end_matches('/');
        let base = if host.starts_with("http://") || host.starts_with("https://") {
            format!("{host}:{port}")
        } else {
            format!("http://{host}:{port}")
        };
        Self {
            client,
            base,
            model: model.into(),
            tuning: LocalTuning::default(),
        }
    }

    /// Replace the generation options.
    pub fn with_tuning(mut self, tuning: LocalTuning) -> Self {
        self.tuning = tuning;
        self
    }

    /// The chat endpoint.
    pub fn chat_endpoint(&self) -> String {
        format!("{}/api/chat", self.base)
    }

    /// The model this backend requests.
    pub fn model(&self) -> &str {
        &self.model
    }

    /// The active generation options.
    pub fn tuning(&self) -> &LocalTuning {
        &self.tuning
    }
}

/// Generation options sent as Ollama `options` on every request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocalTuning {
    pub temperature: f32,
    /// Maximum tokens to generate.
    pub num_predict: u32,
    /// Context window size.
    pub num_ctx: u32,
    pub num_batch: u32,
    pub num_thread: u32,
    pub repeat_penalty: f32,
    pub top_k: u32,
    pub top_p: f32,
    pub repeat_last_n: u32,
    /// Stop sequences.
    pub stop: Vec<String>,
}

impl Default for LocalTuning {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            num_predict: 5000,
            num_ctx: 2048,
            num_batch: 512,
            num_thread: 4,
            repeat_penalty: 1.1,
            top_k: 40,
            top_p: 0.9,
            repeat_last_n: 64,
            stop: vec!["\n\n".into(), "Human:".into(), "User:".into()],
        }
    }
}
