//! Unified chat interface types and traits.
//!
//! This crate provides the shared types used by every inference backend:
//! `Message`, `Response`, `StreamChunk`, `Tool`, the `General` chat config
//! and the `LLM` trait. Also provides `HttpProvider` for OpenAI-compatible
//! HTTP transport and the matching wire `Request`.

pub use config::General;
#[cfg(feature = "http")]
pub use http::{HttpProvider, lines};
pub use message::{Message, MessageBuilder, Role};
pub use provider::LLM;
#[cfg(feature = "http")]
pub use request::Request;
#[cfg(feature = "http")]
pub use reqwest::{self, Client};
pub use response::{Choice, CompletionMeta, Delta, FinishReason, Response, Usage};
pub use stream::StreamChunk;
pub use tool::{FunctionCall, Tool, ToolCall, ToolChoice};

mod config;
#[cfg(feature = "http")]
mod http;
mod message;
mod provider;
#[cfg(feature = "http")]
mod request;
mod response;
mod stream;
mod tool;
