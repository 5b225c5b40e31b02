//! OpenAI-compatible chat completions request body.
//!
//! Shared by every backend that speaks the `/chat/completions` dialect.
//! Optional fields are skipped when unset so servers apply their defaults.

use crate::{General, Message, Tool, ToolChoice};
use serde::Serialize;
use serde_json::{Value, json};

/// OpenAI-compatible chat completions request body.
#[derive(Debug, Clone, Serialize)]
pub struct Request {
    /// The messages to send.
    pub messages: Vec<Message>,
    /// The model identifier.
    pub model: String,
    /// Maximum tokens to generate.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<usize>,
    /// Whether to stream the response.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stream: Option<bool>,
    /// Stream options (e.g. include_usage).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stream_options: Option<Value>,
    /// Temperature.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    /// Tool choice control.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_choice: Option<Value>,
    /// Tools the model may call.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<Value>,
    /// Top-p sampling.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,
}

impl Request {
    /// Build a request for `model` from the per-call chat config.
    pub fn new(model: impl Into<String>, config: &General) -> Self {
        let mut wire = Self {
            messages: Vec::new(),
            model: model.into(),
            max_tokens: config.max_tokens,
            stream: None,
            stream_options: None,
            temperature: config.temperature,
            tool_choice: None,
            tools: None,
            top_p: config.top_p,
        };

        if let Some(tools) = &config.tools {
            wire = wire.with_tools(tools);
        }
        if let Some(tool_choice) = &config.tool_choice {
            wire = wire.with_tool_choice(tool_choice.clone());
        }
        wire
    }

    /// Set the messages for the request.
    pub fn messages(mut self, messages: &[Message]) -> Self {
        self.messages = messages.to_vec();
        self
    }

    /// Enable streaming for the request.
    pub fn stream(mut self, usage: bool) -> Self {
        self.stream = Some(true);
        self.stream_options = if usage {
            Some(json!({ "include_usage": true }))
        } else {
            None
        };
        self
    }

    /// Set the tools for the request.
    fn with_tools(self, tools: &[Tool]) -> Self {
        let tools = tools
            .iter()
            .map(|tool| {
                json!({
                    "type": "function",
                    "function": json!(tool),
                })
            })
            .collect::<Vec<_>>();
        Self {
            tools: Some(json!(tools)),
            ..self
        }
    }

    /// Set the tool choice for the request.
    pub fn with_tool_choice(self, tool_choice: ToolChoice) -> Self {
        Self {
            tool_choice: match tool_choice {
                ToolChoice::None => Some(json!("none")),
                ToolChoice::Auto => Some(json!("auto")),
                ToolChoice::Required => Some(json!("required")),
                ToolChoice::Function(name) => Some(json!({
                    "type": "function",
                    "function": { "name": name }
                })),
            },
            ..self
        }
    }
}
