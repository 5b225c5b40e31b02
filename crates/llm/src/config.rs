//! Configuration for a chat

use crate::{Tool, ToolChoice};
use serde::{Deserialize, Serialize};

/// Chat configuration shared by every backend.
///
/// The model identifier is owned by each backend; this only carries the
/// per-call generation knobs. `None` means "let the backend decide".
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct General {
    /// Sampling temperature
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,

    /// Maximum number of tokens to generate
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<usize>,

    /// Nucleus sampling parameter
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,

    /// The tools the model may call
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<Tool>>,

    /// Controls which tool is called by the model
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_choice: Option<ToolChoice>,

    /// Whether to return the usage information in stream mode
    #[serde(default)]
    pub usage: bool,
}

impl General {
    /// Set the sampling parameters.
    pub fn with_sampling(mut self, temperature: f32, max_tokens: usize, top_p: f32) -> Self {
        self.temperature = Some(temperature);
        self.max_tokens = Some(max_tokens);
        self.top_p = Some(top_p);
        self
    }

    /// Set the token cap only.
    pub fn with_max_tokens(mut self, max_tokens: usize) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Set the tools. An empty list clears them.
    pub fn with_tools(mut self, tools: Vec<Tool>) -> Self {
        self.tools = if tools.is_empty() { None } else { Some(tools) };
        self
    }

    /// Set the tool choice.
    ///
    /// This should be used for per-message level.
    pub fn with_tool_choice(mut self, tool_choice: ToolChoice) -> Self {
        self.tool_choice = Some(tool_choice);
        self
    }
}
