//! Ollama `/api/chat` wire types and their mapping to the shared shapes.

use crate::LocalTuning;
use compact_str::{CompactString, format_compact};
use llm::{
    Choice, CompletionMeta, Delta, FinishReason, FunctionCall, General, Message, Response, Role,
    StreamChunk, ToolCall, Usage,
};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

/// Request body for `/api/chat`.
#[derive(Debug, Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<WireMessage>,
    pub stream: bool,
    pub options: LocalTuning,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<Value>,
}

impl ChatRequest {
    /// Build a request. Only the tools are taken from `config`.
    pub fn new(
        model: &str,
        tuning: &LocalTuning,
        config: &General,
        messages: &[Message],
        stream: bool,
    ) -> Self {
        let tools = config
            .tools
            .iter()
            .flatten()
            .map(|tool| json!({ "type": "function", "function": tool }))
            .collect();
        Self {
            model: model.to_owned(),
            messages: messages.iter().map(WireMessage::from).collect(),
            stream,
            options: tuning.clone(),
            tools,
        }
    }
}

/// A message as Ollama reads and writes it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WireMessage {
    #[serde(default)]
    pub role: Role,
    #[serde(default)]
    pub content: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<WireToolCall>,
}

impl From<&Message> for WireMessage {
    fn from(message: &Message) -> Self {
        Self {
            role: message.role,
            content: message.content.clone(),
            tool_calls: message
                .tool_calls
                .iter()
                .map(|call| WireToolCall {
                    function: WireFunction {
                        name: call.function.name.to_string(),
                        arguments: serde_json::from_str(&call.function.arguments)
                            .unwrap_or_else(|_| json!({})),
                    },
                })
                .collect(),
        }
    }
}

/// Ollama tool calls carry no id and take arguments as an object.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WireToolCall {
    pub function: WireFunction,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WireFunction {
    pub name: String,
    #[serde(default)]
    pub arguments: Value,
}

/// One NDJSON line of a `/api/chat` response.
#[derive(Debug, Default, Deserialize)]
pub struct ChatChunk {
    #[serde(default)]
    pub model: CompactString,
    pub message: Option<WireMessage>,
    #[serde(default)]
    pub done: bool,
    pub done_reason: Option<String>,
    pub prompt_eval_count: Option<u32>,
    pub eval_count: Option<u32>,
    pub error: Option<String>,
}

/// Maps Ollama lines onto `StreamChunk`s.
///
/// Ollama sends complete tool calls without ids, so the normalizer numbers
/// them across the whole stream.
#[derive(Default)]
pub struct Normalizer {
    calls: u32,
}

impl Normalizer {
    /// Normalize one line. Server-reported errors become `Err`.
    pub fn accept(&mut self, chunk: ChatChunk) -> anyhow::Result<StreamChunk> {
        if let Some(error) = chunk.error {
            anyhow::bail!("ollama: {error}");
        }

        let message = chunk.message.unwrap_or_default();
        let tool_calls = if message.tool_calls.is_empty() {
            None
        } else {
            Some(
                message
                    .tool_calls
                    .into_iter()
                    .map(|call| self.tool_call(call))
                    .collect::<anyhow::Result<Vec<_>>>()?,
            )
        };

        let finish_reason = chunk.done.then(|| {
            if self.calls > 0 {
                FinishReason::ToolCalls
            } else if chunk.done_reason.as_deref() == Some("length") {
                FinishReason::Length
            } else {
                FinishReason::Stop
            }
        });

        let usage = chunk
            .done
            .then(|| token_usage(chunk.prompt_eval_count, chunk.eval_count));

        Ok(StreamChunk {
            meta: CompletionMeta {
                model: chunk.model,
                ..Default::default()
            },
            choices: vec![Choice {
                index: 0,
                delta: Delta {
                    role: Some(Role::Assistant),
                    content: Some(message.content).filter(|c| !c.is_empty()),
                    tool_calls,
                },
                finish_reason,
            }],
            usage,
        })
    }

    fn tool_call(&mut self, call: WireToolCall) -> anyhow::Result<ToolCall> {
        let index = self.calls;
        self.calls += 1;
        let arguments = match call.function.arguments {
            Value::String(raw) => raw,
            Value::Null => "{}".to_owned(),
            value => serde_json::to_string(&value)?,
        };
        Ok(ToolCall {
            id: format_compact!("call_{index}"),
            index,
            call_type: "function".into(),
            function: FunctionCall {
                name: call.function.name.into(),
                arguments,
            },
        })
    }
}

/// Convert a non-streaming reply into a `Response`.
pub fn to_response(chunk: ChatChunk) -> anyhow::Result<Response> {
    let chunk = Normalizer::default().accept(chunk)?;
    Ok(Response {
        meta: chunk.meta,
        choices: chunk.choices,
        usage: chunk.usage,
    })
}

fn token_usage(prompt: Option<u32>, completion: Option<u32>) -> Usage {
    let prompt_tokens = prompt.unwrap_or_default();
    let completion_tokens = completion.unwrap_or_default();
    Usage {
        prompt_tokens,
        completion_tokens,
        total_tokens: prompt_tokens + completion_tokens,
    }
}
